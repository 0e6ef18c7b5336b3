//! Projection-based choice of the refinement of one element.
//!
//! Every candidate (raise the order, or split into four children) is scored
//! by how much it reduces the projection error of the reference solution per
//! added degree of freedom:
//!
//! ```text
//! score = (ln err₀ − ln err_c) / (dofs_c − dofs₀)^conv_exp
//! ```

use serde::{Deserialize, Serialize};

use crate::basis::{BasisCache, QuadBasis};
use crate::mesh::{CellId, ElementGeometry, MAX_LEVEL};
use crate::solution::Solution;
use crate::space::{MAX_ORDER, N_COMPONENTS};

const RELATIVE_ERROR_FLOOR: f64 = 1e-6;

/// Set of refinements considered for each element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateList {
    /// Order increase only
    PIso,
    /// Isotropic split with unchanged order
    HIso,
    /// Both order increases and isotropic splits
    HpIso,
}

/// Refinement of one element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Refinement {
    /// Keep the cell with a new order
    Order(usize),
    /// Split into four children of the given order
    Split(usize),
}

impl Refinement {
    /// Degrees of freedom per component after the refinement.
    pub fn dofs(&self) -> usize {
        match *self {
            Self::Order(p) => QuadBasis::modes_for_order(p),
            Self::Split(p) => 4 * QuadBasis::modes_for_order(p),
        }
    }

    fn is_split(&self) -> bool {
        matches!(self, Self::Split(_))
    }
}

/// A scored refinement candidate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub refinement: Refinement,
    /// Weighted projection error of the reference solution
    pub error: f64,
    pub score: f64,
}

/// hp refinement selector based on local L2 projections.
#[derive(Clone, Debug, PartialEq)]
pub struct Selector {
    candidates: CandidateList,
    conv_exp: f64,
    max_order: usize,
    weight_h: f64,
    weight_p: f64,
}

impl Selector {
    /// Selector with unit error weights. `max_order` is capped at
    /// [`MAX_ORDER`].
    pub fn new(candidates: CandidateList, conv_exp: f64, max_order: usize) -> Self {
        Self {
            candidates,
            conv_exp,
            max_order: max_order.min(MAX_ORDER),
            weight_h: 1.0,
            weight_p: 1.0,
        }
    }

    /// Multipliers applied to the errors of split and order-raising
    /// candidates. A larger weight makes that kind less attractive.
    pub fn set_error_weights(&mut self, weight_h: f64, weight_p: f64) {
        self.weight_h = weight_h;
        self.weight_p = weight_p;
    }

    #[inline]
    pub fn error_weight_h(&self) -> f64 {
        self.weight_h
    }

    #[inline]
    pub fn error_weight_p(&self) -> f64 {
        self.weight_p
    }

    #[inline]
    pub fn max_order(&self) -> usize {
        self.max_order
    }

    #[inline]
    pub fn candidate_list(&self) -> CandidateList {
        self.candidates
    }

    /// Refinements considered for a cell of the given level and order.
    pub fn candidates_for(&self, level: u8, order: usize) -> Vec<Refinement> {
        let mut list = Vec::new();
        if matches!(self.candidates, CandidateList::PIso | CandidateList::HpIso) {
            list.extend(
                (order + 1..=order + 2)
                    .filter(|&q| q <= self.max_order)
                    .map(Refinement::Order),
            );
        }
        if level < MAX_LEVEL {
            match self.candidates {
                CandidateList::HIso => list.push(Refinement::Split(order.min(self.max_order))),
                CandidateList::HpIso => {
                    let lowest = order.saturating_sub(1);
                    list.extend((lowest..=order.min(self.max_order)).map(Refinement::Split));
                }
                CandidateList::PIso => {}
            }
        }
        list
    }

    /// Score every candidate of a cell against the reference solution.
    pub fn evaluate_candidates(
        &self,
        reference: &Solution,
        cell: CellId,
        order: usize,
        cache: &mut BasisCache,
    ) -> Vec<Candidate> {
        let norm = cell_norm_squared(reference, cell, cache);
        // Errors at roundoff level count as equal
        let floor = (RELATIVE_ERROR_FLOOR * norm.sqrt()).max(f64::MIN_POSITIVE);
        let base_dofs = QuadBasis::modes_for_order(order);
        let base_error = projection_error(reference, cell, norm, Refinement::Order(order), cache)
            .sqrt()
            .max(floor);

        self.candidates_for(cell.level, order)
            .into_iter()
            .filter(|r| r.dofs() > base_dofs)
            .map(|refinement| {
                let weight = if refinement.is_split() { self.weight_h } else { self.weight_p };
                let error = weight * projection_error(reference, cell, norm, refinement, cache).sqrt();
                let added = (refinement.dofs() - base_dofs) as f64;
                let score = (base_error.ln() - error.max(floor).ln()) / added.powf(self.conv_exp);
                Candidate { refinement, error, score }
            })
            .collect()
    }

    /// Best refinement of a cell, `None` if no candidate adds degrees of
    /// freedom.
    pub fn select(&self, reference: &Solution, cell: CellId, order: usize, cache: &mut BasisCache) -> Option<Refinement> {
        self.evaluate_candidates(reference, cell, order, cache)
            .into_iter()
            .fold(None, |best: Option<Candidate>, c| match best {
                Some(b) if b.score >= c.score => Some(b),
                _ => Some(c),
            })
            .map(|c| c.refinement)
    }
}

/// ‖w − Π w‖² over a cell, all components, where Π projects onto the
/// refined local space.
fn projection_error(
    reference: &Solution,
    cell: CellId,
    norm_squared: f64,
    refinement: Refinement,
    cache: &mut BasisCache,
) -> f64 {
    let (cells, order): (Vec<CellId>, usize) = match refinement {
        Refinement::Order(p) => (vec![cell], p),
        Refinement::Split(p) => (cell.children().to_vec(), p),
    };
    let base = reference.space().mesh().base();
    let n_modes = QuadBasis::modes_for_order(order);
    let mut captured = 0.0;
    for c in &cells {
        let coeffs = reference.project_cell(*c, order, cache);
        let det_j = ElementGeometry::of_cell(base, *c).det_j;
        captured += det_j
            * coeffs
                .iter()
                .take(N_COMPONENTS)
                .map(|comp| comp[..n_modes].iter().map(|a| a * a).sum::<f64>())
                .sum::<f64>();
    }
    (norm_squared - captured).max(0.0)
}

/// ‖w‖² over a cell of the base mesh, all components.
fn cell_norm_squared(reference: &Solution, cell: CellId, cache: &mut BasisCache) -> f64 {
    let mesh = reference.space().mesh();
    match mesh.leaf_containing(cell) {
        Some(s) => {
            let det_j = ElementGeometry::of_cell(mesh.base(), cell).det_j;
            let cell_s = mesh.cell(s);
            let p = reference.space().order(s);
            let rule = cache.volume_rule(p, p + 1);
            rule.points
                .iter()
                .zip(&rule.weights)
                .map(|(&(xi, eta), w)| {
                    let (xs, es) = cell_s.reference_from(cell, xi, eta);
                    det_j * w * reference.evaluate(s, xs, es).norm_squared()
                })
                .sum()
        }
        None => mesh
            .leaves_within(cell)
            .into_iter()
            .map(|s| reference.element_l2_norm_squared(s))
            .sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equations::EulerState;
    use crate::mesh::{AdaptiveMesh, BoundaryMarker, Mesh2D};
    use crate::space::L2Space;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn reference<F>(order: usize, f: F) -> Solution
    where
        F: Fn(f64, f64) -> EulerState,
    {
        let sides = [1, 2, 3, 4].map(BoundaryMarker::new);
        let mesh = Mesh2D::uniform_rectangle_with_sides(0.0, 1.0, 0.0, 1.0, 1, 1, sides).unwrap();
        let coarse = L2Space::new(AdaptiveMesh::new(mesh), order);
        Solution::project_function(Arc::new(coarse.reference_space(1)), f)
    }

    #[test]
    fn test_candidate_lists() {
        let selector = Selector::new(CandidateList::HpIso, 1.0, 2);
        assert_eq!(
            selector.candidates_for(0, 1),
            vec![Refinement::Order(2), Refinement::Split(0), Refinement::Split(1)]
        );
        let selector = Selector::new(CandidateList::PIso, 1.0, 1);
        assert!(selector.candidates_for(0, 1).is_empty());
        let selector = Selector::new(CandidateList::HIso, 1.0, 3);
        assert_eq!(selector.candidates_for(0, 2), vec![Refinement::Split(2)]);
        assert!(selector.candidates_for(MAX_LEVEL, 2).is_empty());
    }

    #[test]
    fn test_projection_error_of_split() {
        // Piecewise constant on the children: the split captures it exactly
        let solution = reference(0, |x, _| EulerState::new(if x < 0.5 { 1.0 } else { 2.0 }, 0.0, 0.0, 0.0));
        let mut cache = BasisCache::new();
        let root = CellId::root(0);
        let norm = cell_norm_squared(&solution, root, &mut cache);
        assert_relative_eq!(norm, 2.5, epsilon = 1e-12);
        assert!(projection_error(&solution, root, norm, Refinement::Split(0), &mut cache) < 1e-12);
        // Constant approximation: variance of the step = 1/4
        assert_relative_eq!(
            projection_error(&solution, root, norm, Refinement::Order(0), &mut cache),
            0.25,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_selector_prefers_split_for_jumps_and_order_for_smooth_fields() {
        let selector = Selector::new(CandidateList::HpIso, 1.0, 3);
        let mut cache = BasisCache::new();
        let root = CellId::root(0);

        let step = reference(0, |x, _| EulerState::new(if x < 0.5 { 1.0 } else { 2.0 }, 0.0, 0.0, 0.0));
        assert_eq!(selector.select(&step, root, 0, &mut cache), Some(Refinement::Split(0)));

        let smooth = reference(1, |x, y| EulerState::new(1.0 + x * x, y, 0.0, 1.0));
        assert_eq!(selector.select(&smooth, root, 1, &mut cache), Some(Refinement::Order(2)));
    }

    #[test]
    fn test_error_weights() {
        let mut selector = Selector::new(CandidateList::HpIso, 1.0, 1);
        selector.set_error_weights(2.0, 1.0);
        assert_eq!(selector.error_weight_h(), 2.0);
        assert_eq!(selector.error_weight_p(), 1.0);
    }
}
