//! Initial states of the flow.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::equations::{EulerEquations, EulerState};
use crate::solution::Solution;
use crate::space::L2Space;

/// A quantity falling linearly from `high` at y = 0 to `low` at y = `size`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearProgress {
    pub high: f64,
    pub low: f64,
    pub size: f64,
}

impl LinearProgress {
    pub fn new(high: f64, low: f64, size: f64) -> Self {
        Self { high, low, size }
    }

    /// Value at height `y`.
    #[inline]
    pub fn value(&self, y: f64) -> f64 {
        self.high - (self.high - self.low) * y / self.size
    }
}

/// Initial condition given in primitive variables.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InitialCondition {
    /// Uniform state
    Constant { rho: f64, v1: f64, v2: f64, p: f64 },
    /// Stratified gas at rest or in uniform motion
    LinearProgress {
        density: LinearProgress,
        pressure: LinearProgress,
        v1: f64,
        v2: f64,
    },
}

impl InitialCondition {
    /// Conserved state at a point.
    pub fn state(&self, euler: &EulerEquations, _x: f64, y: f64) -> EulerState {
        match *self {
            Self::Constant { rho, v1, v2, p } => euler.from_primitives(rho, v1, v2, p),
            Self::LinearProgress {
                density,
                pressure,
                v1,
                v2,
            } => euler.from_primitives(density.value(y), v1, v2, pressure.value(y)),
        }
    }

    /// L2 projection onto `space`.
    pub fn project(&self, euler: &EulerEquations, space: Arc<L2Space>) -> Solution {
        match *self {
            Self::Constant { .. } => Solution::constant(space, self.state(euler, 0.0, 0.0)),
            Self::LinearProgress { .. } => Solution::project_function(space, |x, y| self.state(euler, x, y)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{AdaptiveMesh, BoundaryMarker, Mesh2D};
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_progress() {
        let rho = LinearProgress::new(0.5, 0.3, 3.0);
        assert_relative_eq!(rho.value(0.0), 0.5);
        assert_relative_eq!(rho.value(1.5), 0.4, epsilon = 1e-15);
        assert_relative_eq!(rho.value(3.0), 0.3, epsilon = 1e-15);
    }

    #[test]
    fn test_projected_stratification() {
        let euler = EulerEquations::default();
        let ic = InitialCondition::LinearProgress {
            density: LinearProgress::new(0.5, 0.3, 3.0),
            pressure: LinearProgress::new(1.5, 1.0, 3.0),
            v1: 0.0,
            v2: 0.0,
        };
        let sides = [1, 2, 3, 4].map(BoundaryMarker::new);
        let mesh = Mesh2D::uniform_rectangle_with_sides(0.0, 3.0, 0.0, 3.0, 1, 3, sides).unwrap();
        let solution = ic.project(&euler, Arc::new(L2Space::new(AdaptiveMesh::new(mesh), 1)));

        // Linear data are represented exactly; the middle row averages y = 1.5
        let mesh = solution.space().mesh();
        let e = mesh
            .elements()
            .find(|&e| (mesh.geometry(e).center.1 - 1.5).abs() < 1e-12)
            .unwrap();
        let average = solution.cell_average(e);
        assert_relative_eq!(average.rho, 0.4, epsilon = 1e-12);
        assert_relative_eq!(euler.pressure(&average), 1.25, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_state() {
        let euler = EulerEquations::default();
        let ic = InitialCondition::Constant {
            rho: 1.4,
            v1: 3.0,
            v2: 0.0,
            p: 1.0,
        };
        let w = ic.state(&euler, 0.3, 0.7);
        assert_relative_eq!(w.rho_v_x, 4.2, epsilon = 1e-15);
        assert_relative_eq!(euler.pressure(&w), 1.0, epsilon = 1e-14);
    }
}
