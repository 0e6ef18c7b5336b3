//! Semi-implicit time stepping with an hp-adaptivity loop in every step.
//!
//! Each time step repeats, until the coarse space is good enough:
//!
//! 1. build the reference space (every element split, orders + 1);
//! 2. project the previous time level onto it and limit it;
//! 3. solve the semi-implicit step on the reference space and limit the
//!    result, lowering the coarse orders where limiting happened;
//! 4. project the reference solution onto the coarse space and estimate
//!    the error;
//! 5. stop if the error is below the threshold or the coarse space is too
//!    large, otherwise adapt the coarse space.
//!
//! The reference solution of the last adaptivity step becomes the previous
//! time level of the next time step. Every few steps the coarse mesh is
//! derefined back towards the initial mesh.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::initial_condition::InitialCondition;
use super::{limit_solution, update_discrete_indicator, SimulationSummary};
use crate::adapt::{Adapt, Selector};
use crate::assembly::DiscreteProblem;
use crate::boundary::BoundaryConditions;
use crate::config::{ShockCapturing, SolverConfig};
use crate::error::{EulerError, Result};
use crate::io::CalculationContinuity;
use crate::limiter::{FluxLimiter, LimiterKind};
use crate::mesh::AdaptiveMesh;
use crate::solution::Solution;
use crate::space::L2Space;
use crate::time::CflCalculation;
use crate::weakform::SemiImplicitWeakForm;

/// hp-adaptive time stepping driver.
#[derive(Debug)]
pub struct AdaptiveSolver {
    config: SolverConfig,
    weak_form: SemiImplicitWeakForm,
    /// Coarse space being adapted
    space: L2Space,
    /// Reference solution of the previous time level
    previous: Solution,
    selector: Selector,
    cfl: CflCalculation,
    continuity: Option<CalculationContinuity>,
    time: f64,
    time_step: f64,
    last_time_step: f64,
    iteration: usize,
    refinement_count: usize,
    error_estimate: f64,
}

impl AdaptiveSolver {
    /// Set up the solver.
    ///
    /// The mesh is refined `config.initial_refinements` times and the result
    /// becomes the coarsest mesh that derefinement returns to. The initial
    /// condition is projected onto the first reference space. With
    /// `reuse_solution` the last checkpoint replaces the initial condition.
    ///
    /// # Errors
    /// Invalid configuration, a boundary marker without condition, and
    /// checkpoint errors, including a record without coarse space.
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
        mesh.set_coarsening_floor();
        let base = mesh.base_shared();

        let euler = config.euler();
        let mut weak_form = SemiImplicitWeakForm::new(euler, boundary_conditions);
        if let Some(ShockCapturing::Feistauer { nu_1, nu_2 }) = config.shock_capturing.active() {
            weak_form.set_stabilization(nu_1, nu_2);
        }

        let continuity = config
            .checkpoint_dir
            .as_ref()
            .map(|dir| CalculationContinuity::new(dir.clone()))
            .transpose()?;

        let space = L2Space::new(mesh, config.initial_order);
        let previous = initial.project(&euler, Arc::new(space.reference_space(1)));
        let mut solver = Self {
            cfl: CflCalculation::new(config.cfl, config.kappa),
            selector: config.adaptivity.selector(),
            weak_form,
            space,
            previous,
            continuity,
            time: 0.0,
            time_step: config.initial_time_step,
            last_time_step: config.initial_time_step,
            iteration: 1,
            refinement_count: 0,
            error_estimate: f64::INFINITY,
            config,
        };

        if let Some(continuity) = solver.continuity.as_ref() {
            if solver.config.reuse_solution && continuity.have_record_available() {
                let record = continuity.last_record()?;
                solver.space = record.load_coarse_space(Arc::clone(&base))?.ok_or_else(|| {
                    EulerError::Checkpoint(format!("record {} holds no coarse space", record.number))
                })?;
                solver.previous = record.load_solution(base)?;
                solver.time = record.time;
                solver.time_step = record.time_step;
                solver.last_time_step = record.time_step_n_minus_one;
                solver.iteration = record.iteration + 1;
                info!(record = record.number, time = record.time, "resumed from checkpoint");
            }
        }
        Ok(solver)
    }

    /// Latest reference solution.
    #[inline]
    pub fn solution(&self) -> &Solution {
        &self.previous
    }

    /// The adapted coarse space.
    #[inline]
    pub fn coarse_space(&self) -> &L2Space {
        &self.space
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

    /// Relative error estimate (in percent) of the last adaptivity step.
    #[inline]
    pub fn error_estimate(&self) -> f64 {
        self.error_estimate
    }

    /// Adaptivity steps that refined (or tried to) since the last
    /// derefinement.
    #[inline]
    pub fn refinement_count(&self) -> usize {
        self.refinement_count
    }

    #[inline]
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    fn limiter_kind(&self) -> Option<LimiterKind> {
        self.config.shock_capturing.active().and_then(|m| m.limiter_kind())
    }

    /// Merge refined elements back and lower every order by one, never
    /// below the initial order.
    fn derefine(&mut self) {
        info!("Global mesh derefinement");
        self.refinement_count = 0;
        let mut mesh = self.space.mesh().clone();
        let merged = mesh.unrefine_all();
        let mut space = self.space.sync_with_mesh(mesh);
        space.adjust_element_order(-1, self.config.initial_order);
        debug!(merged, elements = space.n_elements(), "derefined coarse mesh");
        self.space = space;
    }

    /// Limit the projected previous time level until few elements remain
    /// limited.
    fn limit_previous(&self, projected: Solution) -> Solution {
        let Some(kind) = self.limiter_kind() else {
            return projected;
        };
        let adaptivity = &self.config.adaptivity;
        let mut limiter = FluxLimiter::new(kind, &projected).with_oscillation_limiting(true);
        let counts = limiter.limit_repeatedly(adaptivity.limit_threshold, adaptivity.max_limit_passes);
        for (pass, limited) in counts.iter().enumerate() {
            info!("Limited in {}-th step: {}", pass + 1, limited);
        }
        limiter.into_solution()
    }

    /// Advance one time step, adapting the coarse space, and return the
    /// length of the step.
    ///
    /// # Errors
    /// Linear solver failures, non-physical cell averages and checkpoint
    /// I/O errors.
    pub fn step(&mut self) -> Result<f64> {
        let adaptivity = self.config.adaptivity;
        let err_stop = adaptivity.err_stop_at(self.time);
        self.cfl.set_number(self.config.cfl_at(self.time));
        info!(iteration = self.iteration, time = self.time, "---- Time step");

        if self.iteration > 1 && self.iteration % adaptivity.unref_freq == 0 && self.refinement_count > 0 {
            self.derefine();
        }

        let remaining = self.config.end_time - self.time;
        let mut ndofs_prev = 0;
        let mut adapt_step = 1;
        let (fine, time_step) = loop {
            info!(step = adapt_step, "Adaptivity step");
            let ref_space = Arc::new(self.space.reference_space(1));
            let ndof_fine = ref_space.num_dofs();
            if ndofs_prev != 0 {
                if ndof_fine == ndofs_prev {
                    let weight_h = self.selector.error_weight_h();
                    self.selector.set_error_weights(2.0 * weight_h, 1.0);
                } else {
                    self.selector.set_error_weights(1.0, 1.0);
                }
            }
            ndofs_prev = ndof_fine;

            let previous = self.limit_previous(self.previous.project_onto(Arc::clone(&ref_space)));
            info!(ndof_coarse = self.space.num_dofs(), ndof_fine, "ndof_coarse/ndof_fine");

            if let Some(ShockCapturing::Feistauer { .. }) = self.config.shock_capturing.active() {
                update_discrete_indicator(&mut self.weak_form, &previous);
            }
            let time_step = self.time_step.min(remaining).max(0.0);
            self.weak_form.set_current_time_step(time_step);
            self.weak_form.set_current_time(self.time);
            let solved = DiscreteProblem::new(&self.weak_form, &ref_space, &previous).solve()?;
            let fine = match self.limiter_kind() {
                Some(kind) => limit_solution(kind, &solved, Some(&mut self.space)),
                None => solved,
            };

            let coarse = fine.project_onto(Arc::new(self.space.clone()));
            let mut adapt = Adapt::new(&mut self.space);
            let estimate = adapt.calc_err_est(&coarse, &fine)?;
            self.error_estimate = estimate.relative_percent();
            self.time_step = self.cfl.calculate_semi_implicit(&fine)?;
            info!(err_est_rel = self.error_estimate, "err_est_rel (%)");

            let done = if self.error_estimate < err_stop {
                true
            } else if adapt.space().num_dofs() >= adaptivity.ndof_stop {
                info!(ndof = adapt.space().num_dofs(), "Max. number of DOFs exceeded");
                self.refinement_count += 1;
                true
            } else {
                info!("Adapting coarse mesh");
                self.refinement_count += 1;
                adapt.adapt(&self.selector, adaptivity.strategy, &estimate, &fine)?
            };
            if done {
                break (fine, time_step);
            }
            if adapt_step >= adaptivity.max_adaptivity_steps {
                warn!(steps = adapt_step, err_est_rel = self.error_estimate, "adaptivity did not converge");
                break (fine, time_step);
            }
            adapt_step += 1;
        };

        self.time = if time_step < remaining { self.time + time_step } else { self.config.end_time };
        self.last_time_step = time_step;
        if self.iteration % self.config.every_nth_step == 0 {
            if let Some(continuity) = self.continuity.as_mut() {
                continuity.add_record(
                    self.iteration,
                    self.time,
                    self.time_step,
                    self.last_time_step,
                    &fine,
                    Some(&self.space),
                )?;
            }
        }
        self.previous = fine;
        self.iteration += 1;
        Ok(time_step)
    }

    /// Step until the end time or the step limit.
    pub fn run(&mut self) -> Result<SimulationSummary> {
        self.run_with_callback(|_, _, _| {})
    }

    /// Step until the end time or the step limit, calling `callback` with
    /// the reference solution, the time and the step number after every
    /// step.
    ///
    /// The summary reports the degrees of freedom of the coarse space.
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
            callback(&self.previous, self.time, iteration);
        }
        info!(steps = time_steps.len(), time = self.time, "simulation finished");
        Ok(SimulationSummary {
            steps: time_steps.len(),
            final_time: self.time,
            ndofs: self.space.num_dofs(),
            time_steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::SolidWall;
    use crate::mesh::{BoundaryMarker, Mesh2D};
    use crate::simulation::LinearProgress;
    use crate::types::ElementIndex;

    /// Gas at rest with a density gradient and constant pressure: a steady
    /// state that piecewise constants cannot represent.
    fn stratified() -> InitialCondition {
        InitialCondition::LinearProgress {
            density: LinearProgress::new(2.0, 0.5, 1.0),
            pressure: LinearProgress::new(1.0, 1.0, 1.0),
            v1: 0.0,
            v2: 0.0,
        }
    }

    fn solver(config: SolverConfig) -> AdaptiveSolver {
        let wall = BoundaryMarker::new(1);
        let mesh = Mesh2D::uniform_rectangle_with_sides(0.0, 1.0, 0.0, 1.0, 2, 2, [wall; 4]).unwrap();
        let bcs = BoundaryConditions::new().with(wall, SolidWall::new());
        AdaptiveSolver::new(config, AdaptiveMesh::new(mesh), bcs, &stratified()).unwrap()
    }

    fn config() -> SolverConfig {
        let mut config = SolverConfig::default().without_shock_capturing();
        config.adaptivity.err_stop = 1.0;
        config.adaptivity.err_stop_switch_time = None;
        config
    }

    #[test]
    fn test_linear_density_raises_orders() {
        let mut solver = solver(config());
        assert_eq!(solver.coarse_space().n_elements(), 16);
        solver.step().unwrap();

        // Piecewise constants miss about 3.8 % of the field; linears
        // represent it exactly
        assert_eq!(solver.refinement_count(), 1);
        assert_eq!(solver.coarse_space().n_elements(), 16);
        assert!(solver.coarse_space().orders().iter().all(|&p| p == 1));
        assert!(solver.error_estimate() < 1.0);
        assert_eq!(solver.iteration(), 2);
        assert_eq!(solver.solution().space().max_order(), 2);
    }

    #[test]
    fn test_derefinement_resets_orders_down_to_the_initial_mesh() {
        let mut solver = solver(config());
        solver.step().unwrap();
        solver.derefine();
        assert_eq!(solver.refinement_count(), 0);
        // The initial refinement is kept
        assert_eq!(solver.coarse_space().n_elements(), 16);
        assert!(solver.coarse_space().orders().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_derefinement_lowers_mixed_orders_by_one() {
        let mut config = config();
        config.initial_order = 1;
        let mut solver = solver(config);
        solver.space.set_order(ElementIndex::new(0), 3);
        solver.space.set_order(ElementIndex::new(5), 2);
        solver.derefine();
        let orders = solver.coarse_space().orders();
        assert_eq!(orders[0], 2);
        assert_eq!(orders[5], 1);
        assert_eq!(orders.iter().filter(|&&p| p == 1).count(), 15);
    }

    #[test]
    fn test_loose_threshold_keeps_the_space() {
        let mut config = config();
        config.adaptivity.err_stop = 10.0;
        let mut solver = solver(config.with_max_steps(2));
        let summary = solver.run().unwrap();
        assert_eq!(summary.steps, 2);
        assert_eq!(solver.refinement_count(), 0);
        assert_eq!(summary.ndofs, 16 * 4);
        assert!(solver.error_estimate() > 1.0 && solver.error_estimate() < 10.0);
    }
}
