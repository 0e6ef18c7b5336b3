//! Boundary condition interface of the semi-implicit scheme.
//!
//! The boundary flux H(w_L, w_B, n) is linearized around the previous time
//! level as
//!
//! H ≈ J w^{n+1} + b
//!
//! where J multiplies the unknown interior state and b is an explicit part.
//! J enters the matrix and b the right-hand side.

use crate::equations::{EulerEquations, EulerState, Matrix4, mat_vec};

/// Data available to a boundary condition at one quadrature point.
#[derive(Clone, Copy, Debug)]
pub struct BoundaryContext<'a> {
    /// Equations (heat capacity ratio)
    pub euler: &'a EulerEquations,
    /// Interior state at the previous time level
    pub interior: EulerState,
    /// Outward unit normal (nx, ny)
    pub normal: (f64, f64),
    /// Physical position of the point
    pub position: (f64, f64),
    /// Current simulation time
    pub time: f64,
}

impl<'a> BoundaryContext<'a> {
    /// Create a new boundary context.
    pub fn new(
        euler: &'a EulerEquations,
        interior: EulerState,
        normal: (f64, f64),
        position: (f64, f64),
        time: f64,
    ) -> Self {
        Self {
            euler,
            interior,
            normal,
            position,
            time,
        }
    }

    /// Interior normal velocity v·n.
    pub fn interior_normal_velocity(&self) -> f64 {
        let (u, v) = self.interior.velocity();
        u * self.normal.0 + v * self.normal.1
    }
}

/// Linearized boundary flux J w + b.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundaryLinearization {
    /// Part acting on the unknown interior state
    pub jacobian: Matrix4,
    /// Explicit part
    pub explicit: [f64; 4],
}

impl BoundaryLinearization {
    /// Flux produced for a given interior state.
    pub fn flux(&self, w: &EulerState) -> EulerState {
        let jw = mat_vec(&self.jacobian, &w.to_array());
        EulerState::new(
            jw[0] + self.explicit[0],
            jw[1] + self.explicit[1],
            jw[2] + self.explicit[2],
            jw[3] + self.explicit[3],
        )
    }
}

/// Boundary condition for the Euler equations.
pub trait EulerBoundaryCondition: Send + Sync {
    /// Linearize the boundary flux at one quadrature point.
    fn linearize(&self, ctx: &BoundaryContext) -> BoundaryLinearization;

    /// Name of this boundary condition for debugging/logging.
    fn name(&self) -> &'static str;
}
