//! Legendre polynomials on [-1, 1].
//!
//! P_n satisfies ∫ P_m P_n dx = 2/(2n+1) δ_mn; the DG basis uses the
//! orthonormal variant L̂_n = √((2n+1)/2) P_n.

/// Advance (P_k, P'_k) from (P_{k-1}, P'_{k-1}) at x.
///
/// (k+1) P_{k+1} = (2k+1) x P_k − k P_{k-1} and
/// P'_{k+1} = P'_{k-1} + (2k+1) P_k.
#[inline]
fn step(k: usize, x: f64, prev: (f64, f64), curr: (f64, f64)) -> (f64, f64) {
    let c = (2 * k + 1) as f64;
    let p = (c * x * curr.0 - k as f64 * prev.0) / (k + 1) as f64;
    (p, prev.1 + c * curr.0)
}

/// P_n(x) and P'_n(x).
///
/// The derivative recurrence stays valid at x = ±1, where the closed form
/// n (x P_n − P_{n−1}) / (x² − 1) is singular.
pub fn legendre_and_derivative(n: usize, x: f64) -> (f64, f64) {
    let mut prev = (1.0, 0.0);
    if n == 0 {
        return prev;
    }
    let mut curr = (x, 1.0);
    for k in 1..n {
        let next = step(k, x, prev, curr);
        prev = curr;
        curr = next;
    }
    curr
}

/// P_n(x).
#[inline]
pub fn legendre(n: usize, x: f64) -> f64 {
    legendre_and_derivative(n, x).0
}

/// P'_n(x).
#[inline]
pub fn legendre_derivative(n: usize, x: f64) -> f64 {
    legendre_and_derivative(n, x).1
}

/// √((2n+1)/2).
#[inline]
pub fn legendre_norm(n: usize) -> f64 {
    ((2 * n + 1) as f64 / 2.0).sqrt()
}

/// L̂_0..=L̂_order and their derivatives at x, in one pass.
///
/// `values` and `derivatives` must hold at least `order + 1` entries.
pub fn legendre_normalized_table(order: usize, x: f64, values: &mut [f64], derivatives: &mut [f64]) {
    debug_assert!(values.len() > order && derivatives.len() > order);

    let mut prev = (1.0, 0.0);
    (values[0], derivatives[0]) = prev;
    if order >= 1 {
        let mut curr = (x, 1.0);
        (values[1], derivatives[1]) = curr;
        for k in 1..order {
            let next = step(k, x, prev, curr);
            (values[k + 1], derivatives[k + 1]) = next;
            prev = curr;
            curr = next;
        }
    }

    for (n, (v, d)) in values.iter_mut().zip(derivatives.iter_mut()).take(order + 1).enumerate() {
        let norm = legendre_norm(n);
        *v *= norm;
        *d *= norm;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_closed_forms() {
        for &x in &[-1.0, -0.4, 0.0, 0.5, 1.0] {
            let (p2, dp2) = (legendre(2, x), legendre_derivative(2, x));
            assert_relative_eq!(p2, 0.5 * (3.0 * x * x - 1.0), epsilon = 1e-14);
            assert_relative_eq!(dp2, 3.0 * x, epsilon = 1e-14);

            let (p3, dp3) = legendre_and_derivative(3, x);
            assert_relative_eq!(p3, 0.5 * (5.0 * x * x * x - 3.0 * x), epsilon = 1e-14);
            assert_relative_eq!(dp3, 0.5 * (15.0 * x * x - 3.0), epsilon = 1e-14);
        }
    }

    #[test]
    fn test_endpoint_values() {
        for n in 0..=6 {
            let (p, dp) = legendre_and_derivative(n, 1.0);
            assert_relative_eq!(p, 1.0, epsilon = 1e-14);
            assert_relative_eq!(dp, (n * (n + 1)) as f64 / 2.0, epsilon = 1e-12);

            let sign = if n % 2 == 0 { 1.0 } else { -1.0 };
            let (p, dp) = legendre_and_derivative(n, -1.0);
            assert_relative_eq!(p, sign, epsilon = 1e-14);
            assert_relative_eq!(dp, -sign * (n * (n + 1)) as f64 / 2.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_normalized_table_is_orthonormal() {
        let (nodes, weights) = crate::polynomial::gauss_legendre(6);
        let tables: Vec<[f64; 5]> = nodes
            .iter()
            .map(|&x| {
                let mut values = [0.0; 5];
                let mut derivatives = [0.0; 5];
                legendre_normalized_table(4, x, &mut values, &mut derivatives);
                values
            })
            .collect();
        for m in 0..5 {
            for n in 0..5 {
                let integral: f64 = tables.iter().zip(&weights).map(|(t, w)| w * t[m] * t[n]).sum();
                let expected = if m == n { 1.0 } else { 0.0 };
                assert_relative_eq!(integral, expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_table_matches_pointwise() {
        let mut values = [0.0; 6];
        let mut derivatives = [0.0; 6];
        legendre_normalized_table(5, 0.3, &mut values, &mut derivatives);
        for n in 0..=5 {
            let (p, dp) = legendre_and_derivative(n, 0.3);
            assert_relative_eq!(values[n], legendre_norm(n) * p, epsilon = 1e-14);
            assert_relative_eq!(derivatives[n], legendre_norm(n) * dp, epsilon = 1e-13);
        }
    }
}
