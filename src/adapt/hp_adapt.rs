//! hp-adaptation of a coarse space from a reference solution.

use std::collections::HashMap;

use tracing::debug;

use super::error_estimate::ErrorEstimate;
use super::selector::{Refinement, Selector};
use super::strategy::AdaptStrategy;
use crate::basis::BasisCache;
use crate::error::{EulerError, Result};
use crate::solution::Solution;
use crate::space::L2Space;
use crate::types::ElementIndex;

/// Adapts a coarse space in place.
///
/// The usual cycle is: compute a reference solution on
/// [`L2Space::reference_space`], project it onto the coarse space, call
/// [`Adapt::calc_err_est`] and, if the error is too large, [`Adapt::adapt`].
#[derive(Debug)]
pub struct Adapt<'a> {
    space: &'a mut L2Space,
}

impl<'a> Adapt<'a> {
    /// Adapter that applies refinements to `space` in place.
    pub fn new(space: &'a mut L2Space) -> Self {
        Self { space }
    }

    /// The (possibly adapted) coarse space.
    #[inline]
    pub fn space(&self) -> &L2Space {
        self.space
    }

    /// Error estimate of `coarse` (a solution on the adapted space) against
    /// the reference solution `fine`.
    ///
    /// # Errors
    /// `EulerError::DimensionMismatch` if `coarse` does not live on this
    /// space; `EulerError::InvalidMesh` if the two meshes have different
    /// base meshes.
    pub fn calc_err_est(&self, coarse: &Solution, fine: &Solution) -> Result<ErrorEstimate> {
        if coarse.space().n_elements() != self.space.n_elements() {
            return Err(EulerError::dimension_mismatch(
                self.space.n_elements(),
                coarse.space().n_elements(),
            ));
        }
        if coarse.coefficients().len() != self.space.num_dofs() {
            return Err(EulerError::dimension_mismatch(
                self.space.num_dofs(),
                coarse.coefficients().len(),
            ));
        }
        ErrorEstimate::compute(coarse, fine)
    }

    /// Refine the elements marked by `strategy`, each with the candidate
    /// chosen by `selector`.
    ///
    /// Returns `true` when no element was refined.
    ///
    /// # Errors
    /// `EulerError::DimensionMismatch` if the estimate was computed for a
    /// different space.
    pub fn adapt(
        &mut self,
        selector: &Selector,
        strategy: AdaptStrategy,
        estimate: &ErrorEstimate,
        fine: &Solution,
    ) -> Result<bool> {
        let errors = estimate.element_errors_squared();
        if errors.len() != self.space.n_elements() {
            return Err(EulerError::dimension_mismatch(self.space.n_elements(), errors.len()));
        }
        strategy.validate()?;

        let mut cache = BasisCache::new();
        let mesh = self.space.mesh();
        let decisions: HashMap<ElementIndex, Refinement> = strategy
            .mark(errors)
            .into_iter()
            .filter_map(|e| {
                selector
                    .select(fine, mesh.cell(e), self.space.order(e), &mut cache)
                    .map(|r| (e, r))
            })
            .collect();

        if decisions.is_empty() {
            debug!("no element refined");
            return Ok(true);
        }

        let mut splits: Vec<ElementIndex> = decisions
            .iter()
            .filter(|(_, r)| matches!(r, Refinement::Split(_)))
            .map(|(&e, _)| e)
            .collect();
        splits.sort_unstable();

        let mut new_mesh = mesh.clone();
        new_mesh.refine_elements(&splits);

        let orders = new_mesh
            .leaves()
            .iter()
            .map(|&cell| {
                if let Some(e) = mesh.element_of(cell) {
                    return match decisions.get(&e) {
                        Some(Refinement::Order(p)) => *p,
                        _ => self.space.order(e),
                    };
                }
                let parent = cell.parent().and_then(|p| mesh.element_of(p));
                match parent.and_then(|e| decisions.get(&e)) {
                    Some(Refinement::Split(p)) => *p,
                    _ => mesh.leaf_containing(cell).map_or(0, |e| self.space.order(e)),
                }
            })
            .collect();

        debug!(
            refined = decisions.len(),
            split = splits.len(),
            elements = new_mesh.n_elements(),
            "adapted coarse space"
        );
        *self.space = L2Space::with_orders(new_mesh, orders)?;
        Ok(false)
    }
}
