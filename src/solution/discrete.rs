//! Coefficient vectors over a discontinuous space.

use std::sync::Arc;

use crate::basis::BasisTable;
use crate::equations::{EulerEquations, EulerState};
use crate::error::{EulerError, Result};
use crate::space::{L2Space, MAX_ORDER, N_COMPONENTS};
use crate::types::ElementIndex;

/// Maximum number of modes per component on one element.
pub(crate) const MAX_MODES: usize = (MAX_ORDER + 1) * (MAX_ORDER + 1);

/// Discrete Euler solution: modal coefficients of all four components.
///
/// The value of the constant mode is 1/2 on the reference square, so a
/// component's cell average is half its first coefficient.
#[derive(Clone, Debug)]
pub struct Solution {
    space: Arc<L2Space>,
    coefficients: Vec<f64>,
}

impl Solution {
    /// Zero solution.
    pub fn zero(space: Arc<L2Space>) -> Self {
        let n = space.num_dofs();
        Self {
            space,
            coefficients: vec![0.0; n],
        }
    }

    /// Solution equal to a constant state everywhere.
    pub fn constant(space: Arc<L2Space>, state: EulerState) -> Self {
        let mut solution = Self::zero(space);
        let values = state.to_array();
        for e in solution.space.mesh().elements() {
            for (comp, &value) in values.iter().enumerate() {
                let dof = solution.space.dof(e, comp, 0);
                solution.coefficients[dof] = 2.0 * value;
            }
        }
        solution
    }

    /// Wrap a coefficient vector.
    ///
    /// # Errors
    /// `EulerError::DimensionMismatch` if the vector length differs from the
    /// number of DOFs of the space.
    pub fn from_vector(space: Arc<L2Space>, coefficients: Vec<f64>) -> Result<Self> {
        if coefficients.len() != space.num_dofs() {
            return Err(EulerError::dimension_mismatch(space.num_dofs(), coefficients.len()));
        }
        Ok(Self { space, coefficients })
    }

    /// The space of the solution.
    #[inline]
    pub fn space(&self) -> &L2Space {
        &self.space
    }

    /// Shared handle to the space.
    #[inline]
    pub fn space_shared(&self) -> Arc<L2Space> {
        Arc::clone(&self.space)
    }

    /// All coefficients.
    #[inline]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Mutable access to all coefficients.
    #[inline]
    pub fn coefficients_mut(&mut self) -> &mut [f64] {
        &mut self.coefficients
    }

    /// Coefficients of one component on an element.
    #[inline]
    pub fn element_coefficients(&self, e: ElementIndex, component: usize) -> &[f64] {
        &self.coefficients[self.space.component_dofs(e, component)]
    }

    /// Mutable coefficients of one component on an element.
    #[inline]
    pub fn element_coefficients_mut(&mut self, e: ElementIndex, component: usize) -> &mut [f64] {
        let range = self.space.component_dofs(e, component);
        &mut self.coefficients[range]
    }

    /// Value at reference coordinates of an element.
    pub fn evaluate(&self, e: ElementIndex, xi: f64, eta: f64) -> EulerState {
        let basis = self.space.basis(e);
        let mut phi = [0.0; MAX_MODES];
        basis.evaluate(xi, eta, &mut phi[..basis.n_modes]);
        self.combine(e, &phi[..basis.n_modes])
    }

    /// Value and physical gradient (∂/∂x, ∂/∂y) at reference coordinates.
    pub fn evaluate_with_gradient(&self, e: ElementIndex, xi: f64, eta: f64) -> (EulerState, EulerState, EulerState) {
        let basis = self.space.basis(e);
        let n = basis.n_modes;
        let mut phi = [0.0; MAX_MODES];
        let mut d_xi = [0.0; MAX_MODES];
        let mut d_eta = [0.0; MAX_MODES];
        basis.evaluate_with_gradient(xi, eta, &mut phi[..n], &mut d_xi[..n], &mut d_eta[..n]);

        let geometry = self.space.mesh().geometry(e);
        let mut dx = [0.0; MAX_MODES];
        let mut dy = [0.0; MAX_MODES];
        for k in 0..n {
            let (gx, gy) = geometry.physical_gradient(d_xi[k], d_eta[k]);
            dx[k] = gx;
            dy[k] = gy;
        }
        (
            self.combine(e, &phi[..n]),
            self.combine(e, &dx[..n]),
            self.combine(e, &dy[..n]),
        )
    }

    /// Value at tabulation point `q` of a table built for this element's order.
    #[inline]
    pub fn evaluate_tabulated(&self, e: ElementIndex, table: &BasisTable, q: usize) -> EulerState {
        debug_assert_eq!(table.order, self.space.order(e));
        let mut w = [0.0; N_COMPONENTS];
        for (comp, value) in w.iter_mut().enumerate() {
            *value = table.interpolate(q, self.element_coefficients(e, comp));
        }
        EulerState::from_array(w)
    }

    /// Cell average of an element.
    #[inline]
    pub fn cell_average(&self, e: ElementIndex) -> EulerState {
        let mut w = [0.0; N_COMPONENTS];
        for (comp, value) in w.iter_mut().enumerate() {
            *value = 0.5 * self.coefficients[self.space.dof(e, comp, 0)];
        }
        EulerState::from_array(w)
    }

    /// Cell averages of all elements.
    pub fn cell_averages(&self) -> Vec<EulerState> {
        self.space.mesh().elements().map(|e| self.cell_average(e)).collect()
    }

    /// ∫_K |w|² over one element, all components.
    pub fn element_l2_norm_squared(&self, e: ElementIndex) -> f64 {
        let det_j = self.space.mesh().geometry(e).det_j;
        let sum: f64 = self.coefficients[self.space.element_dofs(e)].iter().map(|c| c * c).sum();
        det_j * sum
    }

    /// ∫_Ω |w|² over the whole domain.
    pub fn l2_norm_squared(&self) -> f64 {
        self.space
            .mesh()
            .elements()
            .map(|e| self.element_l2_norm_squared(e))
            .sum()
    }

    /// Integral of each component over the domain.
    pub fn integral(&self) -> EulerState {
        let mesh = self.space.mesh();
        mesh.elements().fold(EulerState::zero(), |acc, e| {
            acc + self.cell_average(e) * mesh.geometry(e).area
        })
    }

    /// Check that every cell average has positive density and pressure.
    ///
    /// # Errors
    /// `EulerError::NonPhysicalState` for the first offending element.
    pub fn check_physical(&self, euler: &EulerEquations) -> Result<()> {
        for e in self.space.mesh().elements() {
            euler.check_physical(&self.cell_average(e), e.get())?;
        }
        Ok(())
    }

    fn combine(&self, e: ElementIndex, phi: &[f64]) -> EulerState {
        let mut w = [0.0; N_COMPONENTS];
        for (comp, value) in w.iter_mut().enumerate() {
            *value = self
                .element_coefficients(e, comp)
                .iter()
                .zip(phi)
                .map(|(c, p)| c * p)
                .sum();
        }
        EulerState::from_array(w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{AdaptiveMesh, BoundaryMarker, Mesh2D};
    use approx::assert_relative_eq;

    fn space(order: usize) -> Arc<L2Space> {
        let sides = [1, 2, 3, 4].map(BoundaryMarker::new);
        let mesh = Mesh2D::uniform_rectangle_with_sides(0.0, 2.0, 0.0, 1.0, 2, 1, sides).unwrap();
        Arc::new(L2Space::new(AdaptiveMesh::new(mesh), order))
    }

    #[test]
    fn test_constant_solution() {
        let state = EulerState::new(1.4, 4.2, 0.0, 8.8);
        let solution = Solution::constant(space(2), state);
        let e = ElementIndex::new(1);
        let w = solution.evaluate(e, 0.3, -0.8);
        assert_relative_eq!(w.rho, 1.4, epsilon = 1e-14);
        assert_relative_eq!(w.energy, 8.8, epsilon = 1e-14);
        assert_eq!(solution.cell_average(e), state);

        let (_, dx, dy) = solution.evaluate_with_gradient(e, 0.1, 0.2);
        assert_relative_eq!(dx.rho, 0.0);
        assert_relative_eq!(dy.energy, 0.0);

        // Domain area 2
        assert_relative_eq!(solution.integral().rho, 2.8, epsilon = 1e-13);
        assert_relative_eq!(solution.l2_norm_squared(), 2.0 * (1.4f64.powi(2) + 4.2f64.powi(2) + 8.8f64.powi(2)), epsilon = 1e-11);
    }

    #[test]
    fn test_gradient_of_linear_mode() {
        let space = space(1);
        let mut solution = Solution::zero(Arc::clone(&space));
        let e = ElementIndex::new(0);
        // L̂_1(ξ) L̂_0(η) = sqrt(3/2) ξ / sqrt(2)
        solution.element_coefficients_mut(e, 0)[1] = 1.0;
        let (w, dx, _) = solution.evaluate_with_gradient(e, 0.5, 0.0);
        let scale = (1.5f64).sqrt() / 2.0f64.sqrt();
        assert_relative_eq!(w.rho, 0.5 * scale, epsilon = 1e-14);
        // Element width 1, so ∂ξ/∂x = 2
        assert_relative_eq!(dx.rho, 2.0 * scale, epsilon = 1e-13);
    }

    #[test]
    fn test_from_vector_checks_length() {
        assert!(Solution::from_vector(space(0), vec![0.0; 3]).is_err());
        assert!(Solution::from_vector(space(0), vec![0.0; 8]).is_ok());
    }

    #[test]
    fn test_check_physical() {
        let euler = EulerEquations::default();
        let good = Solution::constant(space(1), euler.from_primitives(1.0, 0.5, 0.0, 1.0));
        assert!(good.check_physical(&euler).is_ok());
        let bad = Solution::constant(space(1), EulerState::new(-1.0, 0.0, 0.0, 1.0));
        assert!(bad.check_physical(&euler).is_err());
    }
}
