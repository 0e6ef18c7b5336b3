//! Gauss-Legendre quadrature.
//!
//! Volume and face integrals of the weak form are evaluated with tensor and
//! line Gauss-Legendre rules. An n-point rule integrates polynomials of
//! degree 2n-1 exactly on [-1, 1].

use std::f64::consts::PI;

use super::legendre::legendre_and_derivative;

/// Compute Gauss-Legendre nodes and weights on [-1, 1].
///
/// Nodes are the roots of P_n, found by Newton iteration from the
/// Chebyshev-like initial guess x_k = cos(π (k + 3/4) / (n + 1/2)).
/// Weights are w_k = 2 / ((1 - x_k²) P'_n(x_k)²).
///
/// Nodes are returned in ascending order.
pub fn gauss_legendre(n_points: usize) -> (Vec<f64>, Vec<f64>) {
    assert!(n_points > 0, "Need at least one quadrature point");

    let n = n_points;
    let mut nodes = vec![0.0; n];
    let mut weights = vec![0.0; n];

    for k in 0..n.div_ceil(2) {
        let mut x = (PI * (k as f64 + 0.75) / (n as f64 + 0.5)).cos();
        for _ in 0..100 {
            let (p, dp) = legendre_and_derivative(n, x);
            let dx = p / dp;
            x -= dx;
            if dx.abs() < 1e-15 {
                break;
            }
        }
        let (_, dp) = legendre_and_derivative(n, x);
        let w = 2.0 / ((1.0 - x * x) * dp * dp);

        // Symmetric placement: descending guess k maps to the upper half.
        nodes[n - 1 - k] = x;
        nodes[k] = -x;
        weights[n - 1 - k] = w;
        weights[k] = w;
    }

    // Middle node of odd rules is exactly zero.
    if n % 2 == 1 {
        nodes[n / 2] = 0.0;
    }

    (nodes, weights)
}

/// Tensor-product Gauss-Legendre rule on [-1, 1]².
///
/// Points are ordered with ξ varying fastest.
pub fn gauss_legendre_2d(n_points: usize) -> (Vec<(f64, f64)>, Vec<f64>) {
    let (nodes, weights) = gauss_legendre(n_points);
    let mut points = Vec::with_capacity(n_points * n_points);
    let mut weights_2d = Vec::with_capacity(n_points * n_points);
    for (&eta, &w_eta) in nodes.iter().zip(&weights) {
        for (&xi, &w_xi) in nodes.iter().zip(&weights) {
            points.push((xi, eta));
            weights_2d.push(w_xi * w_eta);
        }
    }
    (points, weights_2d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_two() {
        for n in 1..=10 {
            let (_, weights) = gauss_legendre(n);
            let sum: f64 = weights.iter().sum();
            assert!((sum - 2.0).abs() < 1e-13, "n = {n}: sum = {sum}");
        }
    }

    #[test]
    fn test_nodes_symmetric_and_sorted() {
        for n in 1..=9 {
            let (nodes, _) = gauss_legendre(n);
            for k in 0..n {
                assert!((nodes[k] + nodes[n - 1 - k]).abs() < 1e-14);
            }
            for k in 1..n {
                assert!(nodes[k] > nodes[k - 1]);
            }
        }
    }

    #[test]
    fn test_exactness() {
        // n points integrate x^(2n-1) and x^(2n-2) exactly
        for n in 1..=7 {
            let (nodes, weights) = gauss_legendre(n);
            for degree in [2 * n - 2, 2 * n - 1] {
                let integral: f64 = nodes
                    .iter()
                    .zip(&weights)
                    .map(|(&x, &w)| w * x.powi(degree as i32))
                    .sum();
                let expected = if degree % 2 == 0 { 2.0 / (degree as f64 + 1.0) } else { 0.0 };
                assert!((integral - expected).abs() < 1e-13, "n = {n}, degree = {degree}");
            }
        }
    }

    #[test]
    fn test_two_point_rule() {
        let (nodes, weights) = gauss_legendre(2);
        let x = 1.0 / 3.0_f64.sqrt();
        assert!((nodes[0] + x).abs() < 1e-14);
        assert!((nodes[1] - x).abs() < 1e-14);
        assert!((weights[0] - 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_2d_rule_area() {
        let (points, weights) = gauss_legendre_2d(3);
        assert_eq!(points.len(), 9);
        let area: f64 = weights.iter().sum();
        assert!((area - 4.0).abs() < 1e-13);
        // ∫∫ ξ² η² = 4/9
        let integral: f64 = points
            .iter()
            .zip(&weights)
            .map(|(&(xi, eta), &w)| w * xi * xi * eta * eta)
            .sum();
        assert!((integral - 4.0 / 9.0).abs() < 1e-13);
    }
}
