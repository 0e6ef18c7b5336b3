//! CFL-limited time step of the semi-implicit scheme.
//!
//! The semi-implicit scheme is stable well beyond the explicit limit, so the
//! CFL number is typically larger than 1/(2p+1) and may grow during a run.

use tracing::debug;

use crate::equations::EulerEquations;
use crate::error::Result;
use crate::solution::Solution;

/// Time step from the CFL condition on cell averages:
/// τ = cfl · min_K diam_K / (|v_K| + c_K).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CflCalculation {
    cfl: f64,
    euler: EulerEquations,
}

impl CflCalculation {
    pub fn new(cfl: f64, kappa: f64) -> Self {
        Self {
            cfl,
            euler: EulerEquations::new(kappa),
        }
    }

    /// Change the CFL number.
    pub fn set_number(&mut self, cfl: f64) {
        self.cfl = cfl;
    }

    #[inline]
    pub fn number(&self) -> f64 {
        self.cfl
    }

    /// Time step for the next semi-implicit step.
    ///
    /// Returns `f64::INFINITY` when no element carries a wave.
    ///
    /// # Errors
    /// `EulerError::NonPhysicalState` if a cell average has non-positive
    /// density or pressure.
    pub fn calculate_semi_implicit(&self, solution: &Solution) -> Result<f64> {
        let mesh = solution.space().mesh();
        let mut time_step = f64::INFINITY;
        for e in mesh.elements() {
            let w = solution.cell_average(e);
            self.euler.check_physical(&w, e.get())?;
            let speed = self.euler.max_wave_speed(&w);
            if speed > 0.0 {
                time_step = time_step.min(self.cfl * mesh.geometry(e).diameter / speed);
            }
        }
        debug!(cfl = self.cfl, time_step, "CFL time step");
        Ok(time_step)
    }
}
