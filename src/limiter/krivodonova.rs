//! Inflow-jump discontinuity detection (Krivodonova).
//!
//! On the inflow part ∂K⁻ of an element boundary (v·n < 0) the density jump
//! to the neighbour is integrated and normalized:
//!
//! ```text
//! I_K = |∫_{∂K⁻} (ρ_K − ρ_nb) ds| / (h^{(p+1)/2} |∂K⁻| ‖ρ_K‖_∞)
//! ```
//!
//! The jump is O(h^{p+1}) in smooth regions and O(1) at shocks, so I_K
//! grows without bound near discontinuities and vanishes elsewhere.
//!
//! Reference: L. Krivodonova et al., "Shock detection and limiting with
//! discontinuous Galerkin methods for hyperbolic conservation laws", Appl.
//! Numer. Math. 48 (2004).

use super::DiscontinuityDetector;
use crate::basis::BasisCache;
use crate::mesh::FaceSet;
use crate::solution::Solution;
use crate::types::ElementIndex;

/// Krivodonova detector with threshold `param`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KrivodonovaDetector {
    /// Elements with I_K above this value are discontinuous
    pub param: f64,
}

impl Default for KrivodonovaDetector {
    fn default() -> Self {
        Self { param: 1.0 }
    }
}

impl KrivodonovaDetector {
    /// Detector with the given threshold.
    pub fn new(param: f64) -> Self {
        Self { param }
    }

    /// Indicator I_K of every element (0 without inflow faces).
    pub fn indicators(&self, solution: &Solution, faces: &FaceSet) -> Vec<f64> {
        let space = solution.space();
        let mesh = space.mesh();
        let mut cache = BasisCache::new();

        mesh.elements()
            .map(|e| {
                let order = space.order(e);
                let rule = cache.for_order(order);
                let rho_max = (0..rule.table.n_points())
                    .map(|q| solution.evaluate_tabulated(e, &rule.table, q).rho.abs())
                    .fold(0.0, f64::max);

                let mut jump = 0.0;
                let mut inflow_length = 0.0;
                for &f in faces.element_faces(e) {
                    let face = faces.face(f);
                    let Some(nb) = face.neighbor_of(e) else {
                        continue;
                    };
                    let normal = face.normal_from(e);
                    let quad = face.gauss_quadrature(order.max(space.order(nb)) + 2);
                    let (own, other) = if face.minus == e {
                        (&quad.minus_points, &quad.plus_points)
                    } else {
                        (&quad.plus_points, &quad.minus_points)
                    };
                    for q in 0..quad.len() {
                        let w = solution.evaluate(e, own[q].0, own[q].1);
                        let (u, v) = w.velocity();
                        if u * normal.0 + v * normal.1 >= 0.0 {
                            continue;
                        }
                        let w_nb = solution.evaluate(nb, other[q].0, other[q].1);
                        jump += quad.weights[q] * (w.rho - w_nb.rho);
                        inflow_length += quad.weights[q];
                    }
                }

                if inflow_length <= 0.0 || rho_max <= 0.0 {
                    return 0.0;
                }
                let h = mesh.geometry(e).diameter;
                jump.abs() / (h.powf(0.5 * (order as f64 + 1.0)) * inflow_length * rho_max)
            })
            .collect()
    }
}

impl DiscontinuityDetector for KrivodonovaDetector {
    fn detect(&self, solution: &Solution, faces: &FaceSet) -> Vec<ElementIndex> {
        self.indicators(solution, faces)
            .iter()
            .enumerate()
            .filter(|(_, &i)| i > self.param)
            .map(|(e, _)| ElementIndex::new(e))
            .collect()
    }

    fn name(&self) -> &'static str {
        "krivodonova"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equations::EulerEquations;
    use crate::mesh::{AdaptiveMesh, BoundaryMarker, Mesh2D};
    use crate::space::L2Space;
    use std::sync::Arc;

    fn space() -> Arc<L2Space> {
        let sides = [1, 2, 3, 4].map(BoundaryMarker::new);
        let mesh = Mesh2D::uniform_rectangle_with_sides(0.0, 1.0, 0.0, 1.0, 4, 4, sides).unwrap();
        Arc::new(L2Space::new(AdaptiveMesh::new(mesh), 1))
    }

    #[test]
    fn test_uniform_flow_has_no_indicator() {
        let space = space();
        let faces = FaceSet::new(space.mesh());
        let euler = EulerEquations::default();
        let solution = Solution::constant(space, euler.from_primitives(1.0, 1.0, 0.5, 1.0));
        let detector = KrivodonovaDetector::default();
        assert!(detector.indicators(&solution, &faces).iter().all(|&i| i < 1e-12));
        assert!(detector.detect(&solution, &faces).is_empty());
    }

    #[test]
    fn test_shock_downstream_of_jump_is_detected() {
        let space = space();
        let faces = FaceSet::new(space.mesh());
        let euler = EulerEquations::default();
        // Flow to the right with a density jump on x = 0.5
        let solution = Solution::project_function(space, |x, _| {
            let rho = if x < 0.5 { 2.0 } else { 1.0 };
            euler.from_primitives(rho, 1.0, 0.0, 1.0)
        });
        let detected = KrivodonovaDetector::default().detect(&solution, &faces);
        assert!(!detected.is_empty());
        let mesh = solution.space().mesh();
        for e in detected {
            let cx = mesh.geometry(e).center.0;
            assert!((cx - 0.625).abs() < 1e-12, "unexpected element at x = {cx}");
        }
    }
}
