//! Density-jump indicator selecting elements for artificial viscosity.

use crate::mesh::FaceSet;
use crate::solution::Solution;

/// Feistauer shock indicator.
///
/// An element is flagged when
///
/// ```text
/// Σ_faces ∫ (ρ_K − ρ_nb)² ds / (diam_K · |K|^{3/4}) ≥ threshold
/// ```
///
/// with the sum over interior faces only.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeistauerIndicator {
    /// Flagging threshold
    pub threshold: f64,
}

impl Default for FeistauerIndicator {
    fn default() -> Self {
        Self { threshold: 1.0 }
    }
}

impl FeistauerIndicator {
    /// Indicator with the unit threshold.
    pub fn new() -> Self {
        Self::default()
    }

    /// Indicator value of every element.
    pub fn values(&self, solution: &Solution, faces: &FaceSet) -> Vec<f64> {
        let space = solution.space();
        let mesh = space.mesh();
        let mut sums = vec![0.0; mesh.n_elements()];

        for face in faces.faces() {
            let Some(plus) = face.plus else {
                continue;
            };
            let minus = face.minus;
            let quad = face.gauss_quadrature(space.order(minus).max(space.order(plus)) + 2);
            let mut integral = 0.0;
            for q in 0..quad.len() {
                let (xm, em) = quad.minus_points[q];
                let (xp, ep) = quad.plus_points[q];
                let jump = solution.evaluate(minus, xm, em).rho - solution.evaluate(plus, xp, ep).rho;
                integral += quad.weights[q] * jump * jump;
            }
            sums[minus.get()] += integral;
            sums[plus.get()] += integral;
        }

        mesh.elements()
            .map(|e| {
                let geometry = mesh.geometry(e);
                sums[e.get()] / (geometry.diameter * geometry.area.powf(0.75))
            })
            .collect()
    }

    /// Per-element flags for the stabilization terms.
    pub fn flags(&self, solution: &Solution, faces: &FaceSet) -> Vec<bool> {
        self.values(solution, faces)
            .into_iter()
            .map(|v| v >= self.threshold)
            .collect()
    }
}
