//! Time-stepping drivers.
//!
//! Two drivers tie the weak form, the linear solve, shock capturing and the
//! CFL control together:
//! - [`FixedMeshSolver`] steps on one space (GAMM channel, heating-induced
//!   vortex);
//! - [`AdaptiveSolver`] runs an hp-adaptivity loop in every time step
//!   (forward-facing step).
//!
//! # Example
//! ```no_run
//! use dg_euler::boundary::{BoundaryConditions, PrescribedState, SolidWall};
//! use dg_euler::config::SolverConfig;
//! use dg_euler::mesh::{AdaptiveMesh, BoundaryMarker, Mesh2D};
//! use dg_euler::simulation::{FixedMeshSolver, InitialCondition};
//!
//! let config = SolverConfig::default().with_end_time(0.1).without_shock_capturing();
//! let euler = config.euler();
//! let [inlet, outlet, bottom, top] = [1, 2, 3, 4].map(BoundaryMarker::new);
//! let mesh = Mesh2D::channel_with_bump(1, [inlet, outlet, bottom, top])?;
//! let bcs = BoundaryConditions::new()
//!     .with(inlet, PrescribedState::inlet(config.flow.exterior_state(&euler)))
//!     .with(outlet, PrescribedState::outlet(config.flow.p_ext))
//!     .with(bottom, SolidWall::new())
//!     .with(top, SolidWall::new());
//! let ic = InitialCondition::Constant { rho: 1.4, v1: 3.0, v2: 0.0, p: 1.0 };
//!
//! let mut solver = FixedMeshSolver::new(config, AdaptiveMesh::new(mesh), bcs, &ic)?;
//! let summary = solver.run()?;
//! println!("{} steps, t = {}", summary.steps, summary.final_time);
//! # Ok::<(), dg_euler::error::EulerError>(())
//! ```

mod adaptive;
mod fixed_mesh;
mod initial_condition;

pub use adaptive::AdaptiveSolver;
pub use fixed_mesh::FixedMeshSolver;
pub use initial_condition::{InitialCondition, LinearProgress};

use tracing::debug;

use crate::limiter::{FeistauerIndicator, FluxLimiter, LimiterKind};
use crate::mesh::FaceSet;
use crate::solution::Solution;
use crate::space::L2Space;
use crate::weakform::SemiImplicitWeakForm;

/// Outcome of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationSummary {
    /// Time steps taken in this run
    pub steps: usize,
    pub final_time: f64,
    /// Degrees of freedom of the final solution
    pub ndofs: usize,
    /// Length of every time step taken
    pub time_steps: Vec<f64>,
}

impl SimulationSummary {
    /// Shortest and longest time step, `None` if no step was taken.
    pub fn time_step_range(&self) -> Option<(f64, f64)> {
        if self.time_steps.is_empty() {
            return None;
        }
        Some(self.time_steps.iter().fold((f64::INFINITY, 0.0_f64), |(lo, hi), &dt| {
            (lo.min(dt), hi.max(dt))
        }))
    }
}

/// Flag the elements of `previous` for artificial viscosity.
fn update_discrete_indicator(weak_form: &mut SemiImplicitWeakForm, previous: &Solution) {
    let faces = FaceSet::new(previous.space().mesh());
    let flags = FeistauerIndicator::new().flags(previous, &faces);
    debug!(
        flagged = flags.iter().filter(|&&f| f).count(),
        "Feistauer discontinuity indicator"
    );
    weak_form.set_discrete_indicator(flags);
}

/// Limit a freshly computed solution: the second-order stage (Kuzmin only)
/// and then the first-order stage.
fn limit_solution(kind: LimiterKind, solution: &Solution, mut coarse: Option<&mut L2Space>) -> Solution {
    let mut limiter = FluxLimiter::new(kind, solution);
    let second = limiter.limit_second_orders_according_to_detector(coarse.as_deref_mut());
    let first = limiter.limit_according_to_detector(coarse);
    debug!(first, second, "limited solution");
    limiter.into_solution()
}
