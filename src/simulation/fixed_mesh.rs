//! Semi-implicit time stepping on a fixed space.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::initial_condition::InitialCondition;
use super::{limit_solution, update_discrete_indicator, SimulationSummary};
use crate::assembly::DiscreteProblem;
use crate::boundary::BoundaryConditions;
use crate::config::{ShockCapturing, SolverConfig};
use crate::error::Result;
use crate::io::CalculationContinuity;
use crate::mesh::AdaptiveMesh;
use crate::solution::Solution;
use crate::space::L2Space;
use crate::time::CflCalculation;
use crate::weakform::SemiImplicitWeakForm;

/// Time stepping on one mesh and one set of element orders.
///
/// Every step assembles and solves the linearized system around the
/// previous solution, applies the configured shock capturing and derives
/// the next time step from the CFL condition.
#[derive(Debug)]
pub struct FixedMeshSolver {
    config: SolverConfig,
    weak_form: SemiImplicitWeakForm,
    solution: Solution,
    cfl: CflCalculation,
    continuity: Option<CalculationContinuity>,
    time: f64,
    time_step: f64,
    last_time_step: f64,
    iteration: usize,
}

impl FixedMeshSolver {
    /// Set up the solver.
    ///
    /// The mesh is refined `config.initial_refinements` times and the
    /// initial condition is projected onto a space of order
    /// `config.initial_order`. With `reuse_solution` the last checkpoint
    /// replaces the initial condition.
    ///
    /// # Errors
    /// Invalid configuration, a boundary marker without condition, and
    /// checkpoint errors.
    pub fn new(
        config: SolverConfig,
        mut mesh: AdaptiveMesh,
        boundary_conditions: BoundaryConditions,
        initial: &InitialCondition,
    ) -> Result<Self> {
        config.validate()?;
        boundary_conditions.validate(mesh.base())?;
        for _ in 0..config.initial_refinements {
            mesh.refine_all_elements();
        }

        let euler = config.euler();
        let mut weak_form = SemiImplicitWeakForm::new(euler, boundary_conditions)
            .with_fvm_only(config.initial_order == 0);
        if let Some(ShockCapturing::Feistauer { nu_1, nu_2 }) = config.shock_capturing.active() {
            weak_form.set_stabilization(nu_1, nu_2);
        }

        let continuity = config
            .checkpoint_dir
            .as_ref()
            .map(|dir| CalculationContinuity::new(dir.clone()))
            .transpose()?;

        let mut solver = Self {
            cfl: CflCalculation::new(config.cfl, config.kappa),
            weak_form,
            solution: Solution::zero(Arc::new(L2Space::new(mesh.clone(), config.initial_order))),
            continuity,
            time: 0.0,
            time_step: config.initial_time_step,
            last_time_step: config.initial_time_step,
            iteration: 1,
            config,
        };

        match solver.continuity.as_ref().filter(|c| solver.config.reuse_solution && c.have_record_available()) {
            Some(continuity) => {
                let record = continuity.last_record()?;
                solver.solution = record.load_solution(mesh.base_shared())?;
                solver.time = record.time;
                solver.time_step = record.time_step;
                solver.last_time_step = record.time_step_n_minus_one;
                solver.iteration = record.iteration + 1;
                info!(record = record.number, time = record.time, "resumed from checkpoint");
            }
            None => {
                let space = solver.solution.space_shared();
                solver.solution = initial.project(&euler, space);
            }
        }
        Ok(solver)
    }

    /// Current solution.
    #[inline]
    pub fn solution(&self) -> &Solution {
        &self.solution
    }

    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Length of the next time step.
    #[inline]
    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Number of the next time step, starting at 1.
    #[inline]
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    #[inline]
    pub fn weak_form(&self) -> &SemiImplicitWeakForm {
        &self.weak_form
    }

    /// Advance one time step and return its length.
    ///
    /// # Errors
    /// Linear solver failures and non-physical cell averages.
    pub fn step(&mut self) -> Result<f64> {
        let remaining = self.config.end_time - self.time;
        let time_step = self.time_step.min(remaining).max(0.0);
        info!(iteration = self.iteration, time = self.time, "---- Time step");

        let method = self.config.shock_capturing.active();
        if let Some(ShockCapturing::Feistauer { .. }) = method {
            update_discrete_indicator(&mut self.weak_form, &self.solution);
        }

        self.weak_form.set_current_time_step(time_step);
        self.weak_form.set_current_time(self.time);
        let space = self.solution.space_shared();
        let next = DiscreteProblem::new(&self.weak_form, &space, &self.solution).solve()?;

        self.solution = match method.and_then(|m| m.limiter_kind()) {
            Some(kind) => limit_solution(kind, &next, None),
            None => next,
        };
        self.time = if time_step < remaining { self.time + time_step } else { self.config.end_time };
        self.last_time_step = time_step;

        self.cfl.set_number(self.config.cfl_at(self.time));
        self.time_step = self.cfl.calculate_semi_implicit(&self.solution)?;
        debug!(next_time_step = self.time_step, "updated time step");

        if self.iteration % self.config.every_nth_step == 0 {
            if let Some(continuity) = self.continuity.as_mut() {
                continuity.add_record(
                    self.iteration,
                    self.time,
                    self.time_step,
                    self.last_time_step,
                    &self.solution,
                    None,
                )?;
            }
        }
        self.iteration += 1;
        Ok(time_step)
    }

    /// Step until the end time or the step limit.
    pub fn run(&mut self) -> Result<SimulationSummary> {
        self.run_with_callback(|_, _, _| {})
    }

    /// Step until the end time or the step limit, calling `callback` with
    /// the solution, the time and the step number after every step.
    pub fn run_with_callback<F>(&mut self, mut callback: F) -> Result<SimulationSummary>
    where
        F: FnMut(&Solution, f64, usize),
    {
        let mut time_steps = Vec::new();
        while self.time < self.config.end_time {
            if self.config.max_steps.is_some_and(|max| time_steps.len() >= max) {
                warn!(steps = time_steps.len(), time = self.time, "step limit reached");
                break;
            }
            let iteration = self.iteration;
            time_steps.push(self.step()?);
            callback(&self.solution, self.time, iteration);
        }
        info!(steps = time_steps.len(), time = self.time, "simulation finished");
        Ok(SimulationSummary {
            steps: time_steps.len(),
            final_time: self.time,
            ndofs: self.solution.space().num_dofs(),
            time_steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::SolidWall;
    use crate::equations::EulerEquations;
    use crate::mesh::{BoundaryMarker, Mesh2D};
    use approx::assert_relative_eq;

    fn closed_box(config: SolverConfig, initial: &InitialCondition) -> FixedMeshSolver {
        let wall = BoundaryMarker::new(1);
        let mesh = Mesh2D::uniform_rectangle_with_sides(0.0, 1.0, 0.0, 1.0, 2, 2, [wall; 4]).unwrap();
        let bcs = BoundaryConditions::new().with(wall, SolidWall::new());
        FixedMeshSolver::new(config, AdaptiveMesh::new(mesh), bcs, initial).unwrap()
    }

    fn at_rest() -> InitialCondition {
        InitialCondition::Constant {
            rho: 1.0,
            v1: 0.0,
            v2: 0.0,
            p: 1.0,
        }
    }

    #[test]
    fn test_gas_at_rest_stays_at_rest() {
        let config = SolverConfig::default()
            .with_initial_order(1)
            .with_cfl(1.0, 0.0)
            .with_end_time(1.0)
            .with_max_steps(3)
            .without_shock_capturing();
        let mut solver = closed_box(config, &at_rest());
        let summary = solver.run().unwrap();
        assert_eq!(summary.steps, 3);
        assert!(summary.final_time > 0.0);

        let euler = EulerEquations::default();
        for w in solver.solution().cell_averages() {
            assert_relative_eq!(w.rho, 1.0, epsilon = 1e-10);
            assert_relative_eq!(euler.pressure(&w), 1.0, epsilon = 1e-10);
            assert!(w.rho_v_x.abs() < 1e-10 && w.rho_v_y.abs() < 1e-10);
        }
    }

    #[test]
    fn test_time_steps_follow_cfl() {
        let config = SolverConfig::default()
            .with_initial_order(0)
            .with_cfl(0.5, 0.0)
            .with_end_time(10.0)
            .with_max_steps(2)
            .with_shock_capturing(ShockCapturing::Kuzmin);
        let mut solver = closed_box(config, &at_rest());
        assert!(solver.weak_form().fvm_only());
        let summary = solver.run().unwrap();
        // The first step is the configured one, then τ = 0.5 · diam / c
        assert_relative_eq!(summary.time_steps[0], 1e-6);
        let c = (1.4_f64).sqrt();
        // One initial refinement: 4 × 4 elements of size 0.25
        let diam = (2.0_f64 * 0.25 * 0.25).sqrt();
        assert_relative_eq!(summary.time_steps[1], 0.5 * diam / c, epsilon = 1e-8);
    }

    #[test]
    fn test_last_step_ends_on_end_time() {
        let config = SolverConfig::default()
            .with_cfl(1.0, 0.0)
            .with_end_time(0.3)
            .with_shock_capturing(ShockCapturing::Feistauer { nu_1: 0.1, nu_2: 0.1 });
        let mut solver = closed_box(config, &at_rest());
        let mut seen = Vec::new();
        let summary = solver
            .run_with_callback(|_, t, iteration| seen.push((iteration, t)))
            .unwrap();
        assert_eq!(summary.final_time, 0.3);
        assert_eq!(seen.len(), summary.steps);
        assert_eq!(seen[0].0, 1);
    }
}
