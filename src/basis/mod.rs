//! Polynomial basis representations.
//!
//! This module provides the orthonormal tensor-product Legendre basis used
//! by every element, tabulation at quadrature points and a cache of
//! tabulated volume rules.

mod cache;
mod tensor;

pub use cache::BasisCache;
pub use tensor::{BasisTable, QuadBasis, VolumeRule};
