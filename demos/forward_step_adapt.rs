//! Mach 3 flow over a forward-facing step with hp-adaptivity
//!
//! The coarse mesh is adapted in every time step against a reference
//! solution; the Kuzmin limiter captures the shocks. Elements in front of
//! the step are refined once before the computation starts.
//!
//! ## Run
//!
//! ```bash
//! cargo run --release --example forward_step_adapt
//!
//! # With a JSON configuration (missing fields take their defaults)
//! cargo run --release --example forward_step_adapt -- solver.json
//!
//! # More output
//! RUST_LOG=dg_euler=debug cargo run --release --example forward_step_adapt
//! ```

use dg_euler::boundary::{BoundaryConditions, PrescribedState, SolidWall};
use dg_euler::config::SolverConfig;
use dg_euler::error::Result;
use dg_euler::mesh::{AdaptiveMesh, BoundaryMarker, Mesh2D};
use dg_euler::simulation::{AdaptiveSolver, InitialCondition};
use dg_euler::solution::QuantityFilter;
use tracing_subscriber::EnvFilter;

// Boundary markers
const BDY_SOLID_WALL_BOTTOM: u32 = 1;
const BDY_OUTLET: u32 = 2;
const BDY_SOLID_WALL_TOP: u32 = 3;
const BDY_INLET: u32 = 4;

// Refinements of the corner region before the uniform refinement
const INIT_REF_NUM_STEP: usize = 1;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => SolverConfig::from_json_file(path)?,
        None => SolverConfig::default(),
    };
    let euler = config.euler();

    let [bottom, outlet, top, inlet] =
        [BDY_SOLID_WALL_BOTTOM, BDY_OUTLET, BDY_SOLID_WALL_TOP, BDY_INLET].map(BoundaryMarker::new);
    let mut mesh = AdaptiveMesh::new(Mesh2D::forward_facing_step(1, [bottom, outlet, top, inlet])?);
    mesh.refine_by_criterion(
        |_, geometry| {
            let corners = geometry.corners();
            corners[2].1 <= 0.4 && corners[1].0 <= 0.6
        },
        INIT_REF_NUM_STEP,
    );

    let flow = config.flow;
    let boundary_conditions = BoundaryConditions::new()
        .with(bottom, SolidWall::new())
        .with(top, SolidWall::new())
        .with(inlet, PrescribedState::inlet(flow.exterior_state(&euler)))
        .with(outlet, PrescribedState::outlet(flow.p_ext));
    let initial = InitialCondition::Constant {
        rho: flow.rho_ext,
        v1: flow.v1_ext,
        v2: flow.v2_ext,
        p: flow.p_ext,
    };

    println!("=================================================================");
    println!("  Forward-facing step, Mach {:.1}", euler.mach_number(&flow.exterior_state(&euler)));
    println!("=================================================================");

    let mut solver = AdaptiveSolver::new(config, mesh, boundary_conditions, &initial)?;
    let summary = solver.run_with_callback(|solution, t, iteration| {
        let (lo, hi) = QuantityFilter::MachNumber.range(&euler, solution);
        println!(
            "step {iteration:5}  t = {t:8.5}  elements = {:6}  Mach in [{lo:.3}, {hi:.3}]",
            solution.space().n_elements()
        );
    })?;

    println!();
    println!("Steps:       {}", summary.steps);
    println!("Final time:  {:.5}", summary.final_time);
    println!("Coarse DOFs: {}", summary.ndofs);
    if let Some((dt_min, dt_max)) = summary.time_step_range() {
        println!("dt range:    [{dt_min:.3e}, {dt_max:.3e}]");
    }
    Ok(())
}
