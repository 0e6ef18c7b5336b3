//! Semi-implicit DG weak form of the Euler equations.
//!
//! With τ the time step and w^n the previous solution, the unknown w^{n+1}
//! satisfies for every test function v
//!
//! ```text
//! ∫ w^{n+1} v − τ ∫ (A₁(w^n) w^{n+1} ∂v/∂x + A₂(w^n) w^{n+1} ∂v/∂y)
//!   + τ Σ_faces ∫ (P⁺(w_L^n) w_L^{n+1} + P⁻(w_R^n) w_R^{n+1}) [v]
//!   + τ Σ_boundary ∫ (J w^{n+1} + b) v = ∫ w^n v
//! ```
//!
//! where [v] = v_L − v_R across a face oriented from L to R. The Jacobians
//! are frozen at the previous time level, so each step is one linear solve.

use faer::Mat;

use super::jacobian_cache::FaceJacobianCache;
use crate::basis::{QuadBasis, VolumeRule};
use crate::boundary::{BoundaryConditions, BoundaryContext};
use crate::equations::EulerEquations;
use crate::error::{EulerError, Result};
use crate::flux::split_jacobians;
use crate::mesh::Face;
use crate::solution::Solution;
use crate::space::N_COMPONENTS;
use crate::types::{ElementIndex, FaceIndex};

/// Artificial viscosity coefficients of the Feistauer stabilization.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stabilization {
    /// Volume coefficient ν₁ (scaled by the element diameter)
    pub nu_1: f64,
    /// Interface jump coefficient ν₂
    pub nu_2: f64,
}

/// The four coupling blocks of an interior face.
///
/// Block `xy` has rows for test functions on x and columns for trial
/// functions on y, with local DOF numbering `comp * n_basis + k`.
#[derive(Clone, Debug)]
pub struct InterfaceBlocks {
    pub minus_minus: Mat<f64>,
    pub minus_plus: Mat<f64>,
    pub plus_minus: Mat<f64>,
    pub plus_plus: Mat<f64>,
}

impl InterfaceBlocks {
    fn zeros(n_minus: usize, n_plus: usize) -> Self {
        Self {
            minus_minus: Mat::zeros(n_minus, n_minus),
            minus_plus: Mat::zeros(n_minus, n_plus),
            plus_minus: Mat::zeros(n_plus, n_minus),
            plus_plus: Mat::zeros(n_plus, n_plus),
        }
    }
}

/// Semi-implicit weak form with Steger-Warming interface fluxes.
#[derive(Debug)]
pub struct SemiImplicitWeakForm {
    euler: EulerEquations,
    boundary_conditions: BoundaryConditions,
    time_step: f64,
    time: f64,
    fvm_only: bool,
    stabilization: Option<Stabilization>,
    discrete_indicator: Option<Vec<bool>>,
}

impl SemiImplicitWeakForm {
    /// Weak form with a unit time step and no stabilization.
    pub fn new(euler: EulerEquations, boundary_conditions: BoundaryConditions) -> Self {
        Self {
            euler,
            boundary_conditions,
            time_step: 1.0,
            time: 0.0,
            fvm_only: false,
            stabilization: None,
            discrete_indicator: None,
        }
    }

    /// Drop the volume flux term (finite volume scheme for p = 0).
    pub fn with_fvm_only(mut self, fvm_only: bool) -> Self {
        self.fvm_only = fvm_only;
        self
    }

    /// Whether the volume flux term is dropped.
    #[inline]
    pub fn fvm_only(&self) -> bool {
        self.fvm_only
    }

    /// Set the time step τ used by all forms.
    pub fn set_current_time_step(&mut self, time_step: f64) {
        self.time_step = time_step;
    }

    /// Current time step τ.
    #[inline]
    pub fn current_time_step(&self) -> f64 {
        self.time_step
    }

    /// Set the time passed to boundary conditions.
    pub fn set_current_time(&mut self, time: f64) {
        self.time = time;
    }

    /// Current time.
    #[inline]
    pub fn current_time(&self) -> f64 {
        self.time
    }

    /// Enable the Feistauer stabilization on flagged elements.
    pub fn set_stabilization(&mut self, nu_1: f64, nu_2: f64) {
        self.stabilization = Some(Stabilization { nu_1, nu_2 });
    }

    /// Stabilization coefficients, if enabled.
    #[inline]
    pub fn stabilization(&self) -> Option<Stabilization> {
        self.stabilization
    }

    /// Set the per-element flags selecting where the stabilization acts.
    pub fn set_discrete_indicator(&mut self, flags: Vec<bool>) {
        self.discrete_indicator = Some(flags);
    }

    /// Per-element stabilization flags.
    #[inline]
    pub fn discrete_indicator(&self) -> Option<&[bool]> {
        self.discrete_indicator.as_deref()
    }

    /// The equations.
    #[inline]
    pub fn euler(&self) -> &EulerEquations {
        &self.euler
    }

    /// Boundary conditions by marker.
    #[inline]
    pub fn boundary_conditions(&self) -> &BoundaryConditions {
        &self.boundary_conditions
    }

    fn is_flagged(&self, e: ElementIndex) -> bool {
        self.stabilization.is_some()
            && self
                .discrete_indicator
                .as_ref()
                .is_some_and(|flags| flags.get(e.get()).copied().unwrap_or(false))
    }

    /// Check the indicator against the number of elements.
    ///
    /// # Errors
    /// `EulerError::DimensionMismatch` if a stabilization indicator is set
    /// with the wrong length.
    pub fn check_indicator(&self, n_elements: usize) -> Result<()> {
        match &self.discrete_indicator {
            Some(flags) if self.stabilization.is_some() && flags.len() != n_elements => {
                Err(EulerError::dimension_mismatch(n_elements, flags.len()))
            }
            _ => Ok(()),
        }
    }

    /// Volume forms of one element: time mass term, volume flux and
    /// stabilization into `matrix`, previous-time term into `rhs`.
    ///
    /// `rule` must be tabulated for the element's order.
    pub fn element_forms(
        &self,
        previous: &Solution,
        e: ElementIndex,
        rule: &VolumeRule,
        matrix: &mut Mat<f64>,
        rhs: &mut [f64],
    ) {
        let space = previous.space();
        let nb = space.n_basis(e);
        let geometry = space.mesh().geometry(e);
        let det_j = geometry.det_j;
        debug_assert_eq!(matrix.nrows(), N_COMPONENTS * nb);

        // Orthonormal basis and affine map: the mass matrix is det J · I
        for comp in 0..N_COMPONENTS {
            let coeffs = previous.element_coefficients(e, comp);
            for k in 0..nb {
                let row = comp * nb + k;
                matrix[(row, row)] += det_j;
                rhs[row] += det_j * coeffs[k];
            }
        }

        let table = &rule.table;
        let n_points = table.n_points();
        let flagged = self.is_flagged(e);
        if self.fvm_only && !flagged {
            return;
        }

        let mut gx = vec![0.0; nb];
        let mut gy = vec![0.0; nb];
        for q in 0..n_points {
            for a in 0..nb {
                let (dx, dy) = geometry.physical_gradient(table.d_xi[(q, a)], table.d_eta[(q, a)]);
                gx[a] = dx;
                gy[a] = dy;
            }
            let jw = rule.weights[q] * det_j;

            if !self.fvm_only {
                let w = previous.evaluate_tabulated(e, table, q);
                let a1 = self.euler.jacobian_x(&w);
                let a2 = self.euler.jacobian_y(&w);
                let scale = -self.time_step * jw;
                for i in 0..N_COMPONENTS {
                    for j in 0..N_COMPONENTS {
                        if a1[i][j] == 0.0 && a2[i][j] == 0.0 {
                            continue;
                        }
                        for a in 0..nb {
                            let test = scale * (a1[i][j] * gx[a] + a2[i][j] * gy[a]);
                            for b in 0..nb {
                                matrix[(i * nb + a, j * nb + b)] += test * table.values[(q, b)];
                            }
                        }
                    }
                }
            }

            if flagged {
                if let Some(stab) = self.stabilization {
                    let scale = stab.nu_1 * geometry.diameter * jw;
                    for a in 0..nb {
                        for b in 0..nb {
                            let value = scale * (gx[a] * gx[b] + gy[a] * gy[b]);
                            for comp in 0..N_COMPONENTS {
                                matrix[(comp * nb + a, comp * nb + b)] += value;
                            }
                        }
                    }
                }
            }
        }
    }

    /// Interface forms of an interior face.
    ///
    /// The split Jacobians are taken from `cache`, which is refilled when
    /// `face_index` is not its active face.
    pub fn interface_forms(
        &self,
        previous: &Solution,
        face_index: FaceIndex,
        face: &Face,
        cache: &mut FaceJacobianCache,
    ) -> InterfaceBlocks {
        let space = previous.space();
        let left = face.minus;
        let Some(right) = face.plus else {
            return InterfaceBlocks::zeros(0, 0);
        };
        let basis_l = space.basis(left);
        let basis_r = space.basis(right);
        let (nl, nr) = (basis_l.n_modes, basis_r.n_modes);
        let quad = face.gauss_quadrature(basis_l.order.max(basis_r.order) + 2);

        if cache.activate(face_index) {
            for q in 0..quad.len() {
                let (xl, el) = quad.minus_points[q];
                let (xr, er) = quad.plus_points[q];
                let w_l = previous.evaluate(left, xl, el);
                let w_r = previous.evaluate(right, xr, er);
                cache.plus.push(split_jacobians(&self.euler, &w_l, face.normal).0);
                cache.minus.push(split_jacobians(&self.euler, &w_r, face.normal).1);
            }
        }

        let mut blocks = InterfaceBlocks::zeros(N_COMPONENTS * nl, N_COMPONENTS * nr);
        let mut phi_l = vec![0.0; nl];
        let mut phi_r = vec![0.0; nr];
        let stabilization = self
            .stabilization
            .filter(|_| self.is_flagged(left) && self.is_flagged(right));

        for q in 0..quad.len() {
            let (xl, el) = quad.minus_points[q];
            let (xr, er) = quad.plus_points[q];
            basis_l.evaluate(xl, el, &mut phi_l);
            basis_r.evaluate(xr, er, &mut phi_r);
            let scale = self.time_step * quad.weights[q];
            let p_plus = &cache.plus[q];
            let p_minus = &cache.minus[q];

            for i in 0..N_COMPONENTS {
                for j in 0..N_COMPONENTS {
                    let pp = scale * p_plus[i][j];
                    let pm = scale * p_minus[i][j];
                    for a in 0..nl {
                        for b in 0..nl {
                            blocks.minus_minus[(i * nl + a, j * nl + b)] += pp * phi_l[a] * phi_l[b];
                        }
                        for b in 0..nr {
                            blocks.minus_plus[(i * nl + a, j * nr + b)] += pm * phi_l[a] * phi_r[b];
                        }
                    }
                    for a in 0..nr {
                        for b in 0..nl {
                            blocks.plus_minus[(i * nr + a, j * nl + b)] -= pp * phi_r[a] * phi_l[b];
                        }
                        for b in 0..nr {
                            blocks.plus_plus[(i * nr + a, j * nr + b)] -= pm * phi_r[a] * phi_r[b];
                        }
                    }
                }
            }

            if let Some(stab) = stabilization {
                let jump = stab.nu_2 * quad.weights[q];
                for comp in 0..N_COMPONENTS {
                    for a in 0..nl {
                        for b in 0..nl {
                            blocks.minus_minus[(comp * nl + a, comp * nl + b)] += jump * phi_l[a] * phi_l[b];
                        }
                        for b in 0..nr {
                            blocks.minus_plus[(comp * nl + a, comp * nr + b)] -= jump * phi_l[a] * phi_r[b];
                        }
                    }
                    for a in 0..nr {
                        for b in 0..nl {
                            blocks.plus_minus[(comp * nr + a, comp * nl + b)] -= jump * phi_r[a] * phi_l[b];
                        }
                        for b in 0..nr {
                            blocks.plus_plus[(comp * nr + a, comp * nr + b)] += jump * phi_r[a] * phi_r[b];
                        }
                    }
                }
            }
        }
        blocks
    }

    /// Boundary forms of a boundary face: +τ ∫ J u v into `matrix` and
    /// −τ ∫ b v into `rhs`, both in the local numbering of the interior
    /// element.
    ///
    /// # Errors
    /// `EulerError::MissingBoundaryCondition` if the face marker has no
    /// condition, `EulerError::InvalidMesh` for an unmarked boundary face.
    pub fn boundary_forms(
        &self,
        previous: &Solution,
        face_index: FaceIndex,
        face: &Face,
        cache: &mut FaceJacobianCache,
        matrix: &mut Mat<f64>,
        rhs: &mut [f64],
    ) -> Result<()> {
        let marker = face.marker.ok_or_else(|| {
            EulerError::InvalidMesh(format!("boundary face {face_index} has no marker"))
        })?;
        let condition = self.boundary_conditions.get(marker)?;

        let e = face.minus;
        let basis: QuadBasis = previous.space().basis(e);
        let nb = basis.n_modes;
        let quad = face.gauss_quadrature(basis.order + 2);

        if cache.activate(face_index) {
            for q in 0..quad.len() {
                let (xi, eta) = quad.minus_points[q];
                let interior = previous.evaluate(e, xi, eta);
                let ctx = BoundaryContext::new(&self.euler, interior, face.normal, quad.physical[q], self.time);
                cache.boundary.push(condition.linearize(&ctx));
            }
        }

        let mut phi = vec![0.0; nb];
        for q in 0..quad.len() {
            let (xi, eta) = quad.minus_points[q];
            basis.evaluate(xi, eta, &mut phi);
            let scale = self.time_step * quad.weights[q];
            let lin = &cache.boundary[q];
            for i in 0..N_COMPONENTS {
                for a in 0..nb {
                    let test = scale * phi[a];
                    rhs[i * nb + a] -= test * lin.explicit[i];
                    for j in 0..N_COMPONENTS {
                        let value = test * lin.jacobian[i][j];
                        if value == 0.0 {
                            continue;
                        }
                        for b in 0..nb {
                            matrix[(i * nb + a, j * nb + b)] += value * phi[b];
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
