//! Tensor-product Legendre polynomials on the reference square [-1, 1]².
//!
//! Mode (i, j) is φ_{ij}(ξ, η) = L̂_i(ξ) L̂_j(η), where L̂ is the normalized
//! Legendre polynomial. Modes are ordered lexicographically with the ξ degree
//! varying fastest: k = j * n_1d + i.

use super::legendre::{legendre_and_derivative, legendre_norm};

/// Evaluate normalized tensor-product Legendre polynomial and its gradient.
///
/// Returns (φ_{ij}, ∂φ_{ij}/∂ξ, ∂φ_{ij}/∂η).
pub fn legendre_2d_normalized_with_gradient(i: usize, j: usize, xi: f64, eta: f64) -> (f64, f64, f64) {
    let norm = legendre_norm(i) * legendre_norm(j);
    let (p_i, dp_i) = legendre_and_derivative(i, xi);
    let (p_j, dp_j) = legendre_and_derivative(j, eta);
    (norm * p_i * p_j, norm * dp_i * p_j, norm * p_i * dp_j)
}

/// Get the mode index from 2D mode degrees (i, j).
#[inline]
pub fn mode_index(i: usize, j: usize, n_1d: usize) -> usize {
    j * n_1d + i
}

/// Get the mode degrees (i, j) from a mode index.
#[inline]
pub fn mode_degrees(mode: usize, n_1d: usize) -> (usize, usize) {
    (mode % n_1d, mode / n_1d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_index_roundtrip() {
        let n_1d = 4;
        for k in 0..n_1d * n_1d {
            let (i, j) = mode_degrees(k, n_1d);
            assert_eq!(mode_index(i, j, n_1d), k);
        }
        assert_eq!(mode_degrees(5, 3), (2, 1));
    }

    #[test]
    fn test_constant_mode_value() {
        // φ_00 = 1/2 on the reference square
        let (v, dx, dy) = legendre_2d_normalized_with_gradient(0, 0, 0.3, -0.8);
        assert!((v - 0.5).abs() < 1e-14);
        assert!(dx.abs() < 1e-14 && dy.abs() < 1e-14);
    }

    #[test]
    fn test_gradient_by_finite_difference() {
        let h = 1e-6;
        let (xi, eta) = (0.2, -0.4);
        for (i, j) in [(1, 0), (0, 2), (2, 3)] {
            let (_, dx, dy) = legendre_2d_normalized_with_gradient(i, j, xi, eta);
            let fd_x = (legendre_2d_normalized_with_gradient(i, j, xi + h, eta).0
                - legendre_2d_normalized_with_gradient(i, j, xi - h, eta).0)
                / (2.0 * h);
            let fd_y = (legendre_2d_normalized_with_gradient(i, j, xi, eta + h).0
                - legendre_2d_normalized_with_gradient(i, j, xi, eta - h).0)
                / (2.0 * h);
            assert!((dx - fd_x).abs() < 1e-6);
            assert!((dy - fd_y).abs() < 1e-6);
        }
    }
}
