//! hp-adaptivity driven by a reference solution.
//!
//! The error of the coarse solution is measured against the solution on the
//! globally refined reference space. A [`AdaptStrategy`] marks the elements
//! to refine and the [`Selector`] picks, for each of them, between raising
//! the polynomial order and splitting the element.

mod error_estimate;
mod hp_adapt;
mod selector;
mod strategy;

pub use error_estimate::ErrorEstimate;
pub use hp_adapt::Adapt;
pub use selector::{Candidate, CandidateList, Refinement, Selector};
pub use strategy::AdaptStrategy;
