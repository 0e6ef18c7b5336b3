//! Strongly-typed indices for safer APIs.
//!
//! Active elements and face segments are both addressed by plain integers
//! inside the assembly loops; the newtypes keep them apart at API boundaries.

mod indices;

pub use indices::{ElementIndex, FaceIndex};
