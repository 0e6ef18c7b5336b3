//! Discrete solutions.
//!
//! A [`Solution`] pairs a space with its coefficient vector and provides
//! pointwise evaluation, cell averages, L2 norms, projections between spaces
//! and derived quantities through [`QuantityFilter`].

mod discrete;
mod filters;
mod projection;

pub use discrete::Solution;
pub use filters::QuantityFilter;

pub(crate) use discrete::MAX_MODES;
