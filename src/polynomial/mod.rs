//! Polynomial evaluation and quadrature rules.
//!
//! This module provides:
//! - 1D Legendre polynomials and their orthonormal variant
//! - 2D tensor-product Legendre modes for quadrilateral elements
//! - 1D and tensor-product Gauss-Legendre quadrature

mod legendre;
mod legendre_2d;
mod quadrature;

pub use legendre::{
    legendre, legendre_and_derivative, legendre_derivative, legendre_norm, legendre_normalized_table,
};
pub use legendre_2d::{legendre_2d_normalized_with_gradient, mode_degrees, mode_index};
pub use quadrature::{gauss_legendre, gauss_legendre_2d};
