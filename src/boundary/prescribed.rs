//! Inlet and outlet conditions with a prescribed exterior state.
//!
//! The state on the boundary side is obtained by characteristic selection
//! between the interior state and the exterior state (incoming waves from
//! outside, outgoing waves from inside). The flux is then split around the
//! average w̄ of that boundary state and the interior state:
//!
//! H ≈ P⁺(w̄) w^{n+1} + P⁻(w̄) w_B
//!
//! so P⁺(w̄) is the implicit part and P⁻(w̄) w_B the explicit one.

use super::traits::{BoundaryContext, BoundaryLinearization, EulerBoundaryCondition};
use crate::equations::{EulerState, mat_vec};
use crate::flux::{boundary_state, split_jacobians};

/// Exterior data of a prescribed-state boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ExteriorData {
    /// Full exterior state (inflow)
    State(EulerState),
    /// Exterior pressure only; density and velocity are taken from inside
    Pressure(f64),
}

/// Inlet or outlet boundary condition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrescribedState {
    data: ExteriorData,
}

impl PrescribedState {
    /// Inflow with a fully prescribed state.
    pub fn inlet(state: EulerState) -> Self {
        Self {
            data: ExteriorData::State(state),
        }
    }

    /// Subsonic outflow with a prescribed pressure.
    pub fn outlet(pressure: f64) -> Self {
        Self {
            data: ExteriorData::Pressure(pressure),
        }
    }

    /// Exterior data.
    pub fn data(&self) -> ExteriorData {
        self.data
    }

    /// Exterior state seen from a given interior state.
    pub fn exterior_state(&self, ctx: &BoundaryContext) -> EulerState {
        match self.data {
            ExteriorData::State(state) => state,
            ExteriorData::Pressure(p) => {
                let w = ctx.interior;
                EulerState::new(
                    w.rho,
                    w.rho_v_x,
                    w.rho_v_y,
                    ctx.euler.energy(w.rho, w.rho_v_x, w.rho_v_y, p),
                )
            }
        }
    }
}

impl EulerBoundaryCondition for PrescribedState {
    fn linearize(&self, ctx: &BoundaryContext) -> BoundaryLinearization {
        let exterior = self.exterior_state(ctx);
        let w_b = boundary_state(ctx.euler, &ctx.interior, &exterior, ctx.normal);
        let w_avg = (w_b + ctx.interior) * 0.5;
        let (plus, minus) = split_jacobians(ctx.euler, &w_avg, ctx.normal);
        BoundaryLinearization {
            jacobian: plus,
            explicit: mat_vec(&minus, &w_b.to_array()),
        }
    }

    fn name(&self) -> &'static str {
        match self.data {
            ExteriorData::State(_) => "inlet",
            ExteriorData::Pressure(_) => "outlet",
        }
    }
}
