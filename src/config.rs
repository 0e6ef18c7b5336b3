//! Solver configuration.
//!
//! All settings of a run in one serde-(de)serializable structure. The
//! defaults reproduce the forward-facing step computation: a Mach 3 inflow,
//! hp-adaptivity starting from piecewise constants and Kuzmin shock
//! capturing.
//!
//! # Example
//!
//! ```
//! use dg_euler::config::{ShockCapturing, SolverConfig};
//!
//! let config = SolverConfig::default()
//!     .with_end_time(0.5)
//!     .with_shock_capturing(ShockCapturing::Krivodonova { param: 1.0 });
//! assert!(config.validate().is_ok());
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::adapt::{AdaptStrategy, CandidateList, Selector};
use crate::equations::{EulerEquations, EulerState};
use crate::error::{EulerError, Result};
use crate::limiter::LimiterKind;
use crate::space::MAX_ORDER;

/// Free-stream (exterior) state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Exterior density
    pub rho_ext: f64,
    /// Exterior x-velocity
    pub v1_ext: f64,
    /// Exterior y-velocity
    pub v2_ext: f64,
    /// Exterior pressure
    pub p_ext: f64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            rho_ext: 1.4,
            v1_ext: 3.0,
            v2_ext: 0.0,
            p_ext: 1.0,
        }
    }
}

impl FlowConfig {
    pub fn new(rho_ext: f64, v1_ext: f64, v2_ext: f64, p_ext: f64) -> Self {
        Self {
            rho_ext,
            v1_ext,
            v2_ext,
            p_ext,
        }
    }

    /// Conserved exterior state.
    pub fn exterior_state(&self, euler: &EulerEquations) -> EulerState {
        euler.from_primitives(self.rho_ext, self.v1_ext, self.v2_ext, self.p_ext)
    }
}

/// hp-adaptivity settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptivityConfig {
    /// Unrefine the whole mesh every n-th time step (if refined since)
    pub unref_freq: usize,
    /// Element marking
    pub strategy: AdaptStrategy,
    /// Refinement candidates
    pub candidates: CandidateList,
    /// Highest polynomial order the selector may choose
    pub max_order: usize,
    /// Convergence exponent of the candidate score
    pub conv_exp: f64,
    /// Stop adapting once the relative error (in percent) falls below this
    pub err_stop: f64,
    /// Time after which `err_stop_late` replaces `err_stop`
    pub err_stop_switch_time: Option<f64>,
    pub err_stop_late: f64,
    /// Stop adapting once the coarse space has this many DOFs
    pub ndof_stop: usize,
    /// Keep limiting the projected previous solution while more elements
    /// than this are limited
    pub limit_threshold: usize,
    /// Upper bound on the number of such limiting passes
    pub max_limit_passes: usize,
    /// Safety bound on adaptivity steps per time step
    pub max_adaptivity_steps: usize,
}

impl Default for AdaptivityConfig {
    fn default() -> Self {
        Self {
            unref_freq: 5,
            strategy: AdaptStrategy::RelativeToMax(0.3),
            candidates: CandidateList::HpIso,
            max_order: 1,
            conv_exp: 1.0,
            err_stop: 5.0,
            err_stop_switch_time: Some(0.3),
            err_stop_late: 2.5,
            ndof_stop: 16_000,
            limit_threshold: 10,
            max_limit_passes: 20,
            max_adaptivity_steps: 20,
        }
    }
}

impl AdaptivityConfig {
    /// Error threshold in effect at time `t`.
    pub fn err_stop_at(&self, t: f64) -> f64 {
        match self.err_stop_switch_time {
            Some(switch) if t > switch => self.err_stop_late,
            _ => self.err_stop,
        }
    }

    /// Selector with unit error weights.
    pub fn selector(&self) -> Selector {
        Selector::new(self.candidates, self.conv_exp, self.max_order)
    }
}

/// Shock capturing method.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShockCapturing {
    /// Artificial viscosity on elements flagged by the Feistauer indicator
    Feistauer { nu_1: f64, nu_2: f64 },
    /// Kuzmin vertex-based limiting (first and second order)
    Kuzmin,
    /// Krivodonova detection with minmod limiting
    Krivodonova { param: f64 },
}

impl ShockCapturing {
    /// Limiter used after each solve, `None` for artificial viscosity.
    pub fn limiter_kind(&self) -> Option<LimiterKind> {
        match *self {
            Self::Feistauer { .. } => None,
            Self::Kuzmin => Some(LimiterKind::Kuzmin),
            Self::Krivodonova { param } => Some(LimiterKind::Krivodonova { param }),
        }
    }
}

/// Shock capturing settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShockCapturingConfig {
    pub enabled: bool,
    pub method: ShockCapturing,
}

impl Default for ShockCapturingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            method: ShockCapturing::Kuzmin,
        }
    }
}

impl ShockCapturingConfig {
    /// The active method, `None` when shock capturing is off.
    pub fn active(&self) -> Option<ShockCapturing> {
        self.enabled.then_some(self.method)
    }
}

/// Complete configuration of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Heat capacity ratio κ
    pub kappa: f64,
    /// Initial polynomial order
    pub initial_order: usize,
    /// Number of uniform refinements of the base mesh
    pub initial_refinements: usize,
    /// CFL number at t = 0
    pub cfl: f64,
    /// CFL increase per unit time (CFL(t) = cfl + cfl_growth · t)
    pub cfl_growth: f64,
    /// Time step of the first step
    pub initial_time_step: f64,
    pub end_time: f64,
    /// Stop after this many time steps even if `end_time` is not reached
    pub max_steps: Option<usize>,
    /// Save a checkpoint every n-th step
    pub every_nth_step: usize,
    /// Checkpoint directory; `None` disables checkpoints
    pub checkpoint_dir: Option<PathBuf>,
    /// Resume from the last checkpoint in `checkpoint_dir` if there is one
    pub reuse_solution: bool,
    pub flow: FlowConfig,
    pub adaptivity: AdaptivityConfig,
    pub shock_capturing: ShockCapturingConfig,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            kappa: 1.4,
            initial_order: 0,
            initial_refinements: 1,
            cfl: 0.5,
            cfl_growth: 1.0 / 4.5,
            initial_time_step: 1e-6,
            end_time: 14.5,
            max_steps: None,
            every_nth_step: 1,
            checkpoint_dir: None,
            reuse_solution: false,
            flow: FlowConfig::default(),
            adaptivity: AdaptivityConfig::default(),
            shock_capturing: ShockCapturingConfig::default(),
        }
    }
}

impl SolverConfig {
    /// Load a configuration from a JSON file; missing fields take their
    /// defaults.
    ///
    /// # Errors
    /// I/O and JSON errors, and everything [`SolverConfig::validate`] rejects.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Euler physics with this configuration's κ.
    pub fn euler(&self) -> EulerEquations {
        EulerEquations::new(self.kappa)
    }

    /// CFL number at time `t`.
    pub fn cfl_at(&self, t: f64) -> f64 {
        self.cfl + self.cfl_growth * t
    }

    pub fn with_flow(mut self, flow: FlowConfig) -> Self {
        self.flow = flow;
        self
    }

    pub fn with_initial_order(mut self, order: usize) -> Self {
        self.initial_order = order;
        self
    }

    pub fn with_cfl(mut self, cfl: f64, growth: f64) -> Self {
        self.cfl = cfl;
        self.cfl_growth = growth;
        self
    }

    pub fn with_end_time(mut self, end_time: f64) -> Self {
        self.end_time = end_time;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    pub fn with_shock_capturing(mut self, method: ShockCapturing) -> Self {
        self.shock_capturing = ShockCapturingConfig { enabled: true, method };
        self
    }

    pub fn without_shock_capturing(mut self) -> Self {
        self.shock_capturing.enabled = false;
        self
    }

    /// Enable checkpoints in `dir`.
    pub fn with_checkpoints<P: Into<PathBuf>>(mut self, dir: P, every_nth_step: usize) -> Self {
        self.checkpoint_dir = Some(dir.into());
        self.every_nth_step = every_nth_step;
        self
    }

    /// Check the configuration for values the solver cannot run with.
    ///
    /// # Errors
    /// `EulerError::InvalidConfig` naming the first offending setting.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(EulerError::InvalidConfig(msg));

        if !(self.kappa > 1.0) {
            return invalid(format!("kappa must exceed 1, got {}", self.kappa));
        }
        if self.initial_order > MAX_ORDER {
            return invalid(format!(
                "initial order {} exceeds the maximum {MAX_ORDER}",
                self.initial_order
            ));
        }
        if !(self.cfl > 0.0) || self.cfl_growth < 0.0 {
            return invalid(format!(
                "CFL number must be positive and non-decreasing, got {} + {} t",
                self.cfl, self.cfl_growth
            ));
        }
        if !(self.initial_time_step > 0.0) || !(self.end_time >= 0.0) {
            return invalid(format!(
                "time step {} and end time {} must be positive",
                self.initial_time_step, self.end_time
            ));
        }
        if self.every_nth_step == 0 {
            return invalid("every_nth_step must be at least 1".into());
        }
        if self.reuse_solution && self.checkpoint_dir.is_none() {
            return invalid("reuse_solution requires a checkpoint directory".into());
        }
        if !(self.flow.rho_ext > 0.0 && self.flow.p_ext > 0.0) {
            return invalid(format!(
                "exterior density {} and pressure {} must be positive",
                self.flow.rho_ext, self.flow.p_ext
            ));
        }

        let adaptivity = &self.adaptivity;
        adaptivity.strategy.validate()?;
        if adaptivity.unref_freq == 0 || adaptivity.max_adaptivity_steps == 0 {
            return invalid("unref_freq and max_adaptivity_steps must be at least 1".into());
        }
        if !(adaptivity.err_stop > 0.0 && adaptivity.err_stop_late > 0.0) {
            return invalid("adaptivity error thresholds must be positive".into());
        }
        if !(adaptivity.conv_exp > 0.0) {
            return invalid(format!("conv_exp must be positive, got {}", adaptivity.conv_exp));
        }

        match self.shock_capturing.method {
            ShockCapturing::Feistauer { nu_1, nu_2 } if nu_1 < 0.0 || nu_2 < 0.0 => {
                invalid(format!("stabilization coefficients must be non-negative, got {nu_1}, {nu_2}"))
            }
            ShockCapturing::Krivodonova { param } if !(param > 0.0) => {
                invalid(format!("Krivodonova parameter must be positive, got {param}"))
            }
            _ => Ok(()),
        }
    }
}
