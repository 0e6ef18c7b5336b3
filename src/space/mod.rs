//! Discrete function spaces.
//!
//! The discontinuous space carries one polynomial order per element, shared
//! by all four solution components, and numbers the degrees of freedom
//! element by element.

mod l2_space;

pub use l2_space::{L2Space, MAX_ORDER, N_COMPONENTS};
