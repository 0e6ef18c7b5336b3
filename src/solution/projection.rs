//! L2-orthogonal projections between spaces and of initial conditions.
//!
//! Spaces over the same base mesh have nested cells, so the projection of a
//! solution is computed exactly by integrating over the finer of each pair
//! of overlapping cells.

use std::sync::Arc;

use super::discrete::{MAX_MODES, Solution};
use crate::basis::{BasisCache, QuadBasis};
use crate::equations::EulerState;
use crate::mesh::CellId;
use crate::space::{L2Space, N_COMPONENTS};

impl Solution {
    /// L2-orthogonal projection onto another space over the same base mesh.
    pub fn project_onto(&self, target: Arc<L2Space>) -> Solution {
        debug_assert_eq!(
            self.space().mesh().base().n_elements,
            target.mesh().base().n_elements
        );

        let mut cache = BasisCache::new();
        let mut projected = Solution::zero(Arc::clone(&target));

        for t in target.mesh().elements() {
            let p_t = target.order(t);
            let n_modes = QuadBasis::modes_for_order(p_t);
            let coeffs = self.project_cell(target.mesh().cell(t), p_t, &mut cache);
            for (comp, c) in coeffs.iter().enumerate() {
                projected
                    .element_coefficients_mut(t, comp)
                    .copy_from_slice(&c[..n_modes]);
            }
        }
        projected
    }

    /// Coefficients of the projection of this solution onto `Q_order` of a
    /// cell of the base mesh.
    pub(crate) fn project_cell(
        &self,
        cell_t: CellId,
        order: usize,
        cache: &mut BasisCache,
    ) -> [[f64; MAX_MODES]; N_COMPONENTS] {
        let source_space = self.space();
        let source_mesh = source_space.mesh();
        let basis_t = QuadBasis::new(order);
        let mut coeffs = [[0.0; MAX_MODES]; N_COMPONENTS];

        if let Some(s) = source_mesh.leaf_containing(cell_t) {
            // Target cell inside (or equal to) a source cell
            let cell_s = source_mesh.cell(s);
            let n_points = order.max(source_space.order(s)) + 1;
            let rule = cache.volume_rule(order, n_points);
            for (q, &(xi, eta)) in rule.points.iter().enumerate() {
                let (xs, es) = cell_s.reference_from(cell_t, xi, eta);
                let w = self.evaluate(s, xs, es).to_array();
                for k in 0..basis_t.n_modes {
                    let phi = rule.weights[q] * rule.table.values[(q, k)];
                    for comp in 0..N_COMPONENTS {
                        coeffs[comp][k] += phi * w[comp];
                    }
                }
            }
        } else {
            // Target cell split into several source cells
            let mut phi_t = [0.0; MAX_MODES];
            for s in source_mesh.leaves_within(cell_t) {
                let cell_s = source_mesh.cell(s);
                let p_s = source_space.order(s);
                let ratio = 0.25f64.powi((cell_s.level - cell_t.level) as i32);
                let rule = cache.volume_rule(p_s, order.max(p_s) + 1);
                for (q, &(xi, eta)) in rule.points.iter().enumerate() {
                    let w = self.evaluate_tabulated(s, &rule.table, q).to_array();
                    let (xt, et) = cell_t.reference_from(cell_s, xi, eta);
                    basis_t.evaluate(xt, et, &mut phi_t[..basis_t.n_modes]);
                    for k in 0..basis_t.n_modes {
                        let phi = ratio * rule.weights[q] * phi_t[k];
                        for comp in 0..N_COMPONENTS {
                            coeffs[comp][k] += phi * w[comp];
                        }
                    }
                }
            }
        }
        coeffs
    }

    /// L2-orthogonal projection of a function of the physical coordinates.
    pub fn project_function<F>(space: Arc<L2Space>, f: F) -> Solution
    where
        F: Fn(f64, f64) -> EulerState,
    {
        let mut cache = BasisCache::new();
        let mut projected = Solution::zero(Arc::clone(&space));
        let mesh = space.mesh();

        for e in mesh.elements() {
            let p = space.order(e);
            let n_modes = QuadBasis::modes_for_order(p);
            let rule = cache.volume_rule(p, p + 3);
            let geometry = mesh.geometry(e);
            let mut coeffs = [[0.0; MAX_MODES]; N_COMPONENTS];
            for (q, &(xi, eta)) in rule.points.iter().enumerate() {
                let (x, y) = geometry.to_physical(xi, eta);
                let w = f(x, y).to_array();
                for k in 0..n_modes {
                    let phi = rule.weights[q] * rule.table.values[(q, k)];
                    for comp in 0..N_COMPONENTS {
                        coeffs[comp][k] += phi * w[comp];
                    }
                }
            }
            for (comp, c) in coeffs.iter().enumerate() {
                projected.element_coefficients_mut(e, comp).copy_from_slice(&c[..n_modes]);
            }
        }
        projected
    }
}
