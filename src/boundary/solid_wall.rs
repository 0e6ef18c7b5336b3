//! Impermeable (slip) wall.
//!
//! With v·n = 0 the normal flux reduces to the pressure term
//! (0, p n_x, p n_y, 0). Since p is homogeneous of degree one in w,
//! p(w^{n+1}) ≈ ∂p/∂w(w^n) · w^{n+1}, which gives a purely implicit
//! linearization with no explicit part.

use super::traits::{BoundaryContext, BoundaryLinearization, EulerBoundaryCondition};

/// Reflecting wall boundary condition.
#[derive(Clone, Copy, Debug, Default)]
pub struct SolidWall;

impl SolidWall {
    /// Create a new wall condition.
    pub fn new() -> Self {
        Self
    }
}

impl EulerBoundaryCondition for SolidWall {
    fn linearize(&self, ctx: &BoundaryContext) -> BoundaryLinearization {
        let dp = ctx.euler.pressure_gradient(&ctx.interior);
        let (nx, ny) = ctx.normal;
        let mut jacobian = [[0.0; 4]; 4];
        for j in 0..4 {
            jacobian[1][j] = dp[j] * nx;
            jacobian[2][j] = dp[j] * ny;
        }
        BoundaryLinearization {
            jacobian,
            explicit: [0.0; 4],
        }
    }

    fn name(&self) -> &'static str {
        "solid_wall"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equations::EulerEquations;
    use approx::assert_relative_eq;

    #[test]
    fn test_wall_flux_is_pressure() {
        let euler = EulerEquations::default();
        let w = euler.from_primitives(1.2, 0.3, -0.5, 0.9);
        let n = (0.6, 0.8);
        let ctx = BoundaryContext::new(&euler, w, n, (0.0, 0.0), 0.0);
        let flux = SolidWall::new().linearize(&ctx).flux(&w);
        assert_relative_eq!(flux.rho, 0.0);
        assert_relative_eq!(flux.rho_v_x, 0.9 * 0.6, epsilon = 1e-14);
        assert_relative_eq!(flux.rho_v_y, 0.9 * 0.8, epsilon = 1e-14);
        assert_relative_eq!(flux.energy, 0.0);
    }
}
