//! Vertex-based hierarchical discontinuity detection (Kuzmin).
//!
//! For each component the Q1 part of the solution is evaluated at the
//! element vertices and compared with the range of the cell averages of all
//! elements sharing the vertex. The largest factor α₁ ∈ [0, 1] that keeps
//! every vertex value inside its range measures how strongly the element
//! oscillates; α₁ < 1 marks a discontinuity.
//!
//! The second-order variant applies the same test to the x- and
//! y-derivatives of the Q2 part, compared with the derivatives at the
//! centers of the vertex patch, giving α₂.
//!
//! Only interior vertices take part in the test.
//!
//! Reference: D. Kuzmin, "A vertex-based hierarchical slope limiter for
//! p-adaptive discontinuous Galerkin methods", J. Comput. Appl. Math. 233
//! (2010).

use super::DiscontinuityDetector;
use crate::mesh::FaceSet;
use crate::solution::Solution;
use crate::space::N_COMPONENTS;
use crate::types::ElementIndex;

const REFERENCE_VERTICES: [(f64, f64); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

/// Threshold below which a limiting factor counts as active.
pub(crate) const ALPHA_TOLERANCE: f64 = 1e-10;

/// Kuzmin vertex-based detector.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KuzminDetector;

/// Limiting factors of one element, per component.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KuzminFactors {
    /// First-order factors α₁
    pub first: [f64; N_COMPONENTS],
    /// Second-order factors α₂ (1 for elements of order below 2)
    pub second: [f64; N_COMPONENTS],
}

impl KuzminFactors {
    /// Whether the first-order part needs limiting.
    pub fn first_order_active(&self) -> bool {
        self.first.iter().any(|&a| a < 1.0 - ALPHA_TOLERANCE)
    }

    /// Whether the second-order part needs limiting.
    pub fn second_order_active(&self) -> bool {
        self.second.iter().any(|&a| a < 1.0 - ALPHA_TOLERANCE)
    }
}

impl KuzminDetector {
    pub fn new() -> Self {
        Self
    }

    /// Limiting factors of every element.
    pub fn factors(&self, solution: &Solution, faces: &FaceSet) -> Vec<KuzminFactors> {
        let space = solution.space();
        let mesh = space.mesh();
        let averages = solution.cell_averages();

        mesh.elements()
            .map(|e| {
                let mut factors = KuzminFactors {
                    first: [1.0; N_COMPONENTS],
                    second: [1.0; N_COMPONENTS],
                };
                let order = space.order(e);
                if order == 0 {
                    return factors;
                }
                let patches = vertex_patches(solution, faces, e);
                for comp in 0..N_COMPONENTS {
                    let avg = averages[e.get()].component(comp);
                    for &((xi, eta), ref patch) in &patches {
                        let (lo, hi) = self.bounds(patch.iter().map(|nb| averages[nb.get()].component(comp)));
                        let (value, _, _) = truncated(solution, e, comp, 1, xi, eta);
                        factors.first[comp] = factors.first[comp].min(kuzmin_alpha(avg, value, lo, hi));
                    }

                    if order < 2 {
                        continue;
                    }
                    let (_, gx, gy) = truncated(solution, e, comp, 2, 0.0, 0.0);
                    for &((xi, eta), ref patch) in &patches {
                        let centers: Vec<(f64, f64)> = patch
                            .iter()
                            .map(|&nb| {
                                let (_, dx, dy) = truncated(solution, nb, comp, 2, 0.0, 0.0);
                                (dx, dy)
                            })
                            .collect();
                        let (lo_x, hi_x) = self.bounds(centers.iter().map(|c| c.0));
                        let (lo_y, hi_y) = self.bounds(centers.iter().map(|c| c.1));
                        let (_, vx, vy) = truncated(solution, e, comp, 2, xi, eta);
                        let alpha = kuzmin_alpha(gx, vx, lo_x, hi_x).min(kuzmin_alpha(gy, vy, lo_y, hi_y));
                        factors.second[comp] = factors.second[comp].min(alpha);
                    }
                }
                factors
            })
            .collect()
    }

    /// Elements whose second-order part oscillates.
    pub fn detect_second_order(&self, solution: &Solution, faces: &FaceSet) -> Vec<ElementIndex> {
        self.factors(solution, faces)
            .iter()
            .enumerate()
            .filter(|(_, f)| f.second_order_active())
            .map(|(e, _)| ElementIndex::new(e))
            .collect()
    }

    fn bounds<I>(&self, values: I) -> (f64, f64)
    where
        I: Iterator<Item = f64>,
    {
        values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
    }
}

impl DiscontinuityDetector for KuzminDetector {
    fn detect(&self, solution: &Solution, faces: &FaceSet) -> Vec<ElementIndex> {
        self.factors(solution, faces)
            .iter()
            .enumerate()
            .filter(|(_, f)| f.first_order_active())
            .map(|(e, _)| ElementIndex::new(e))
            .collect()
    }

    fn name(&self) -> &'static str {
        "kuzmin"
    }
}

/// Interior vertices of an element with the elements sharing them.
///
/// Vertices on the domain boundary are skipped: their patch only covers one
/// side of the vertex and would flag smooth fields.
fn vertex_patches(solution: &Solution, faces: &FaceSet, e: ElementIndex) -> Vec<((f64, f64), Vec<ElementIndex>)> {
    let mesh = solution.space().mesh();
    let geometry = mesh.geometry(e);
    let tol = 1e-9 * geometry.diameter;
    let on_boundary = |p: (f64, f64)| {
        faces.element_faces(e).iter().any(|&f| {
            let face = faces.face(f);
            face.is_boundary()
                && face
                    .endpoints
                    .iter()
                    .any(|q| (q.0 - p.0).abs() <= tol && (q.1 - p.1).abs() <= tol)
        })
    };

    geometry
        .corners()
        .iter()
        .zip(REFERENCE_VERTICES)
        .filter(|(corner, _)| !on_boundary(**corner))
        .map(|(&corner, reference)| (reference, faces.elements_at_point(mesh, e, corner)))
        .collect()
}

/// Largest α ∈ [0, 1] with avg + α (value − avg) inside [lo, hi].
#[inline]
pub(crate) fn kuzmin_alpha(avg: f64, value: f64, lo: f64, hi: f64) -> f64 {
    let deviation = value - avg;
    if deviation.abs() < 1e-14 {
        return 1.0;
    }

    let mut alpha: f64 = 1.0;
    if value < lo && deviation < 0.0 {
        alpha = alpha.min((avg - lo) / (avg - value));
    }
    if value > hi && deviation > 0.0 {
        alpha = alpha.min((hi - avg) / (value - avg));
    }
    alpha.clamp(0.0, 1.0)
}

/// Value and physical gradient of one component restricted to the modes
/// of degree at most `max_degree` in each direction.
pub(crate) fn truncated(
    solution: &Solution,
    e: ElementIndex,
    comp: usize,
    max_degree: usize,
    xi: f64,
    eta: f64,
) -> (f64, f64, f64) {
    let space = solution.space();
    let basis = space.basis(e);
    let n = basis.n_modes;
    let mut phi = vec![0.0; n];
    let mut d_xi = vec![0.0; n];
    let mut d_eta = vec![0.0; n];
    basis.evaluate_with_gradient(xi, eta, &mut phi, &mut d_xi, &mut d_eta);

    let coeffs = solution.element_coefficients(e, comp);
    let (mut value, mut g_xi, mut g_eta) = (0.0, 0.0, 0.0);
    for k in 0..n {
        let (i, j) = basis.mode_degrees(k);
        if i.max(j) > max_degree {
            continue;
        }
        value += coeffs[k] * phi[k];
        g_xi += coeffs[k] * d_xi[k];
        g_eta += coeffs[k] * d_eta[k];
    }
    let (gx, gy) = space.mesh().geometry(e).physical_gradient(g_xi, g_eta);
    (value, gx, gy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equations::EulerState;
    use crate::mesh::{AdaptiveMesh, BoundaryMarker, Mesh2D};
    use crate::space::L2Space;
    use std::sync::Arc;

    fn space(n: usize, order: usize) -> Arc<L2Space> {
        let sides = [1, 2, 3, 4].map(BoundaryMarker::new);
        let mesh = Mesh2D::uniform_rectangle_with_sides(0.0, 1.0, 0.0, 1.0, n, n, sides).unwrap();
        Arc::new(L2Space::new(AdaptiveMesh::new(mesh), order))
    }

    #[test]
    fn test_alpha() {
        assert_eq!(kuzmin_alpha(1.0, 1.5, 0.5, 2.0), 1.0);
        assert!((kuzmin_alpha(1.0, 3.0, 0.5, 2.0) - 0.5).abs() < 1e-14);
        assert!((kuzmin_alpha(1.0, 0.0, 0.5, 2.0) - 0.5).abs() < 1e-14);
        assert_eq!(kuzmin_alpha(1.0, 1.0, 1.0, 1.0), 1.0);
    }

    #[test]
    fn test_linear_field_is_smooth() {
        let space = space(4, 1);
        let faces = FaceSet::new(space.mesh());
        let solution = Solution::project_function(space, |x, y| EulerState::new(1.0 + x + 0.5 * y, x, y, 3.0));
        let detected = KuzminDetector::new().detect(&solution, &faces);
        assert!(detected.is_empty(), "{detected:?}");
    }

    #[test]
    fn test_step_is_detected() {
        let space = space(4, 1);
        let faces = FaceSet::new(space.mesh());
        let solution = Solution::project_function(space, |x, _| {
            let rho = if x < 0.6 { 1.0 } else { 0.1 };
            EulerState::new(rho, 0.0, 0.0, 2.5)
        });
        let detected = KuzminDetector::new().detect(&solution, &faces);
        // The column of elements cut by x = 0.6
        assert!(!detected.is_empty());
        let mesh = solution.space().mesh();
        for e in detected {
            let cx = mesh.geometry(e).center.0;
            assert!((cx - 0.625).abs() < 0.2, "unexpected element at x = {cx}");
        }
    }

    #[test]
    fn test_quadratic_is_not_second_order_oscillation() {
        let space = space(4, 2);
        let faces = FaceSet::new(space.mesh());
        let solution = Solution::project_function(space, |x, y| EulerState::new(1.0 + x * x, y, 0.0, 3.0));
        assert!(KuzminDetector::new().detect_second_order(&solution, &faces).is_empty());
    }
}
