//! Orthonormal tensor-product Legendre basis for quadrilateral elements.
//!
//! Each element of order p carries (p+1)² modal basis functions
//! φ_k(ξ, η) = L̂_i(ξ) L̂_j(η), k = j (p+1) + i, on the reference square
//! [-1, 1]². Because the basis is orthonormal and every element map is
//! affine, the element mass matrix is |det J| times the identity.
//!
//! Tabulated values and reference gradients at a point set are stored in
//! `faer` matrices (rows = points, columns = modes), mirroring the
//! Vandermonde layout used for nodal-modal transforms.

use faer::Mat;

use crate::polynomial::{gauss_legendre_2d, legendre_normalized_table, mode_degrees, mode_index};

/// Modal basis Q_p on the reference square.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuadBasis {
    /// Polynomial order per direction
    pub order: usize,
    /// Number of modes per direction = order+1
    pub n_1d: usize,
    /// Number of modes = (order+1)²
    pub n_modes: usize,
}

impl QuadBasis {
    /// Create the basis of the given order.
    pub fn new(order: usize) -> Self {
        let n_1d = order + 1;
        Self {
            order,
            n_1d,
            n_modes: n_1d * n_1d,
        }
    }

    /// Number of modes of an order-`order` basis.
    #[inline]
    pub fn modes_for_order(order: usize) -> usize {
        (order + 1) * (order + 1)
    }

    /// Mode degrees (i, j) of mode k.
    #[inline]
    pub fn mode_degrees(&self, k: usize) -> (usize, usize) {
        mode_degrees(k, self.n_1d)
    }

    /// Mode index of degrees (i, j).
    #[inline]
    pub fn mode_index(&self, i: usize, j: usize) -> usize {
        mode_index(i, j, self.n_1d)
    }

    /// Evaluate all basis functions at (ξ, η).
    pub fn evaluate(&self, xi: f64, eta: f64, values: &mut [f64]) {
        let mut lx = [0.0; 16];
        let mut dlx = [0.0; 16];
        let mut ly = [0.0; 16];
        let mut dly = [0.0; 16];
        debug_assert!(self.n_1d <= 16);
        legendre_normalized_table(self.order, xi, &mut lx, &mut dlx);
        legendre_normalized_table(self.order, eta, &mut ly, &mut dly);
        for j in 0..self.n_1d {
            for i in 0..self.n_1d {
                values[j * self.n_1d + i] = lx[i] * ly[j];
            }
        }
    }

    /// Evaluate all basis functions and their reference gradients at (ξ, η).
    pub fn evaluate_with_gradient(
        &self,
        xi: f64,
        eta: f64,
        values: &mut [f64],
        d_xi: &mut [f64],
        d_eta: &mut [f64],
    ) {
        let mut lx = [0.0; 16];
        let mut dlx = [0.0; 16];
        let mut ly = [0.0; 16];
        let mut dly = [0.0; 16];
        debug_assert!(self.n_1d <= 16);
        legendre_normalized_table(self.order, xi, &mut lx, &mut dlx);
        legendre_normalized_table(self.order, eta, &mut ly, &mut dly);
        for j in 0..self.n_1d {
            for i in 0..self.n_1d {
                let k = j * self.n_1d + i;
                values[k] = lx[i] * ly[j];
                d_xi[k] = dlx[i] * ly[j];
                d_eta[k] = lx[i] * dly[j];
            }
        }
    }

    /// Tabulate values and reference gradients at a set of points.
    pub fn tabulate(&self, points: &[(f64, f64)]) -> BasisTable {
        let n_points = points.len();
        let mut values = Mat::zeros(n_points, self.n_modes);
        let mut d_xi = Mat::zeros(n_points, self.n_modes);
        let mut d_eta = Mat::zeros(n_points, self.n_modes);

        let mut v = vec![0.0; self.n_modes];
        let mut dx = vec![0.0; self.n_modes];
        let mut dy = vec![0.0; self.n_modes];
        for (q, &(xi, eta)) in points.iter().enumerate() {
            self.evaluate_with_gradient(xi, eta, &mut v, &mut dx, &mut dy);
            for m in 0..self.n_modes {
                values[(q, m)] = v[m];
                d_xi[(q, m)] = dx[m];
                d_eta[(q, m)] = dy[m];
            }
        }

        BasisTable {
            order: self.order,
            values,
            d_xi,
            d_eta,
        }
    }
}

/// Basis values and reference gradients tabulated at a point set.
#[derive(Clone, Debug)]
pub struct BasisTable {
    /// Polynomial order of the tabulated basis
    pub order: usize,
    /// values[(q, m)] = φ_m(ξ_q, η_q)
    pub values: Mat<f64>,
    /// d_xi[(q, m)] = ∂φ_m/∂ξ(ξ_q, η_q)
    pub d_xi: Mat<f64>,
    /// d_eta[(q, m)] = ∂φ_m/∂η(ξ_q, η_q)
    pub d_eta: Mat<f64>,
}

impl BasisTable {
    /// Number of tabulation points.
    #[inline]
    pub fn n_points(&self) -> usize {
        self.values.nrows()
    }

    /// Number of modes.
    #[inline]
    pub fn n_modes(&self) -> usize {
        self.values.ncols()
    }

    /// Evaluate a modal expansion at tabulation point q.
    #[inline]
    pub fn interpolate(&self, q: usize, coefficients: &[f64]) -> f64 {
        let mut sum = 0.0;
        for (m, &c) in coefficients.iter().enumerate().take(self.n_modes()) {
            sum += c * self.values[(q, m)];
        }
        sum
    }
}

/// Tensor Gauss-Legendre rule on the reference square with the basis
/// tabulated at its points.
#[derive(Clone, Debug)]
pub struct VolumeRule {
    /// Quadrature points on [-1, 1]²
    pub points: Vec<(f64, f64)>,
    /// Reference weights (sum to 4)
    pub weights: Vec<f64>,
    /// Basis tabulated at the points
    pub table: BasisTable,
}

impl VolumeRule {
    /// Rule exact for products of two order-`order` functions and a linear
    /// coefficient.
    pub fn for_order(order: usize) -> Self {
        Self::with_points(order, order + 2)
    }

    /// Rule with an explicit number of points per direction.
    pub fn with_points(order: usize, n_points_1d: usize) -> Self {
        let (points, weights) = gauss_legendre_2d(n_points_1d);
        let table = QuadBasis::new(order).tabulate(&points);
        Self {
            points,
            weights,
            table,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_counts() {
        assert_eq!(QuadBasis::new(0).n_modes, 1);
        assert_eq!(QuadBasis::new(1).n_modes, 4);
        assert_eq!(QuadBasis::new(3).n_modes, 16);
        assert_eq!(QuadBasis::modes_for_order(2), 9);
    }

    #[test]
    fn test_reference_mass_matrix_is_identity() {
        for order in 0..=3 {
            let rule = VolumeRule::for_order(order);
            let n = rule.table.n_modes();
            for a in 0..n {
                for b in 0..n {
                    let mass: f64 = (0..rule.table.n_points())
                        .map(|q| rule.weights[q] * rule.table.values[(q, a)] * rule.table.values[(q, b)])
                        .sum();
                    let expected = if a == b { 1.0 } else { 0.0 };
                    assert!((mass - expected).abs() < 1e-12, "order {order}: ({a}, {b}) = {mass}");
                }
            }
        }
    }

    #[test]
    fn test_gradients_match_pointwise_modes() {
        let basis = QuadBasis::new(3);
        let mut values = vec![0.0; basis.n_modes];
        let mut d_xi = vec![0.0; basis.n_modes];
        let mut d_eta = vec![0.0; basis.n_modes];
        basis.evaluate_with_gradient(0.35, -0.6, &mut values, &mut d_xi, &mut d_eta);
        for k in 0..basis.n_modes {
            let (i, j) = basis.mode_degrees(k);
            let (v, dx, dy) = crate::polynomial::legendre_2d_normalized_with_gradient(i, j, 0.35, -0.6);
            assert!((values[k] - v).abs() < 1e-13);
            assert!((d_xi[k] - dx).abs() < 1e-12);
            assert!((d_eta[k] - dy).abs() < 1e-12);
        }
    }

    #[test]
    fn test_evaluate_matches_tabulate() {
        let basis = QuadBasis::new(2);
        let points = [(0.1, -0.7), (0.9, 0.4)];
        let table = basis.tabulate(&points);
        let mut values = vec![0.0; basis.n_modes];
        for (q, &(xi, eta)) in points.iter().enumerate() {
            basis.evaluate(xi, eta, &mut values);
            for m in 0..basis.n_modes {
                assert!((values[m] - table.values[(q, m)]).abs() < 1e-14);
            }
        }
    }

    #[test]
    fn test_interpolate_linear_function() {
        let basis = QuadBasis::new(1);
        let rule = VolumeRule::for_order(1);
        let coefficients = [2.0, 1.0, 0.0, 0.0];
        let mut values = vec![0.0; basis.n_modes];
        for q in 0..rule.table.n_points() {
            let (xi, eta) = rule.points[q];
            basis.evaluate(xi, eta, &mut values);
            let expected = 2.0 * values[0] + values[1];
            assert!((rule.table.interpolate(q, &coefficients) - expected).abs() < 1e-14);
        }
    }
}
