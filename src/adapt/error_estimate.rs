//! Element-wise L2 error between a coarse and a reference solution.

use crate::basis::BasisCache;
use crate::error::{EulerError, Result};
use crate::mesh::ElementGeometry;
use crate::solution::Solution;
use crate::types::ElementIndex;

/// Squared L2 errors ‖w_fine − w_coarse‖²_K over all components, per coarse
/// element, with the matching squared norms of the fine solution.
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorEstimate {
    errors: Vec<f64>,
    norms: Vec<f64>,
}

impl ErrorEstimate {
    /// Estimate the error of `coarse` against `fine`.
    ///
    /// Both solutions must live on the same base mesh; the fine mesh is
    /// normally the reference mesh of the coarse one.
    ///
    /// # Errors
    /// `EulerError::InvalidMesh` if the base meshes differ.
    pub fn compute(coarse: &Solution, fine: &Solution) -> Result<Self> {
        let coarse_mesh = coarse.space().mesh();
        let fine_mesh = fine.space().mesh();
        if coarse_mesh.base().n_elements != fine_mesh.base().n_elements {
            return Err(EulerError::InvalidMesh(format!(
                "error estimate between meshes of {} and {} base elements",
                coarse_mesh.base().n_elements,
                fine_mesh.base().n_elements
            )));
        }

        let mut cache = BasisCache::new();
        let mut errors = Vec::with_capacity(coarse_mesh.n_elements());
        let mut norms = Vec::with_capacity(coarse_mesh.n_elements());

        for k in coarse_mesh.elements() {
            let cell_k = coarse_mesh.cell(k);
            let p_k = coarse.space().order(k);
            let (mut err, mut norm) = (0.0, 0.0);

            if let Some(s) = fine_mesh.leaf_containing(cell_k) {
                // Fine element covers the coarse one
                let cell_s = fine_mesh.cell(s);
                let det_j = ElementGeometry::of_cell(coarse_mesh.base(), cell_k).det_j;
                let rule = cache.volume_rule(p_k, p_k.max(fine.space().order(s)) + 1);
                for (q, &(xi, eta)) in rule.points.iter().enumerate() {
                    let (xs, es) = cell_s.reference_from(cell_k, xi, eta);
                    let w_fine = fine.evaluate(s, xs, es);
                    let w_coarse = coarse.evaluate_tabulated(k, &rule.table, q);
                    err += det_j * rule.weights[q] * (w_fine - w_coarse).norm_squared();
                    norm += det_j * rule.weights[q] * w_fine.norm_squared();
                }
            } else {
                for s in fine_mesh.leaves_within(cell_k) {
                    let cell_s = fine_mesh.cell(s);
                    let p_s = fine.space().order(s);
                    let det_j = fine_mesh.geometry(s).det_j;
                    let rule = cache.volume_rule(p_s, p_s.max(p_k) + 1);
                    for (q, &(xi, eta)) in rule.points.iter().enumerate() {
                        let (xk, ek) = cell_k.reference_from(cell_s, xi, eta);
                        let w_fine = fine.evaluate_tabulated(s, &rule.table, q);
                        let w_coarse = coarse.evaluate(k, xk, ek);
                        err += det_j * rule.weights[q] * (w_fine - w_coarse).norm_squared();
                    }
                    norm += fine.element_l2_norm_squared(s);
                }
            }
            errors.push(err);
            norms.push(norm);
        }

        Ok(Self { errors, norms })
    }

    /// Squared error of one coarse element.
    #[inline]
    pub fn element_error_squared(&self, e: ElementIndex) -> f64 {
        self.errors[e.get()]
    }

    /// Squared errors of all coarse elements.
    #[inline]
    pub fn element_errors_squared(&self) -> &[f64] {
        &self.errors
    }

    /// Σ_K ‖e‖²_K.
    pub fn total_error_squared(&self) -> f64 {
        self.errors.iter().sum()
    }

    /// Σ_K ‖w_fine‖²_K.
    pub fn total_norm_squared(&self) -> f64 {
        self.norms.iter().sum()
    }

    /// Relative error sqrt(Σ err²) / sqrt(Σ ‖w_fine‖²); 0 for a vanishing
    /// fine solution.
    pub fn relative(&self) -> f64 {
        let norm = self.total_norm_squared();
        if norm > 0.0 {
            (self.total_error_squared() / norm).sqrt()
        } else {
            0.0
        }
    }

    /// Relative error in percent.
    pub fn relative_percent(&self) -> f64 {
        100.0 * self.relative()
    }
}
