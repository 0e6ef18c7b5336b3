//! GAMM channel: subsonic flow over a bump
//!
//! Fixed mesh, linear elements and artificial viscosity on the elements
//! flagged by the Feistauer indicator.
//!
//! ## Run
//!
//! ```bash
//! cargo run --release --example gamm_channel
//! ```

use dg_euler::boundary::{BoundaryConditions, PrescribedState, SolidWall};
use dg_euler::config::{FlowConfig, ShockCapturing, SolverConfig};
use dg_euler::error::Result;
use dg_euler::mesh::{AdaptiveMesh, BoundaryMarker, Mesh2D};
use dg_euler::simulation::{FixedMeshSolver, InitialCondition};
use dg_euler::solution::QuantityFilter;
use tracing_subscriber::EnvFilter;

// Initial polynomial degree
const P_INIT: usize = 1;
// Number of initial uniform mesh refinements
const INIT_REF_NUM: usize = 2;
const CFL_NUMBER: f64 = 1.0;
const TIME_STEP: f64 = 1e-4;
const T_END: f64 = 3.0;

// Stabilization coefficients
const NU_1: f64 = 0.1;
const NU_2: f64 = 0.1;

// Exterior state
const P_EXT: f64 = 2.5;
const RHO_EXT: f64 = 1.0;
const V1_EXT: f64 = 1.25;
const V2_EXT: f64 = 0.0;
const KAPPA: f64 = 1.4;

// Boundary markers
const BDY_INLET: u32 = 1;
const BDY_OUTLET: u32 = 2;
const BDY_SOLID_WALL_BOTTOM: u32 = 3;
const BDY_SOLID_WALL_TOP: u32 = 4;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = SolverConfig::default()
        .with_flow(FlowConfig::new(RHO_EXT, V1_EXT, V2_EXT, P_EXT))
        .with_initial_order(P_INIT)
        .with_cfl(CFL_NUMBER, 0.0)
        .with_end_time(T_END)
        .with_shock_capturing(ShockCapturing::Feistauer { nu_1: NU_1, nu_2: NU_2 });
    config.kappa = KAPPA;
    config.initial_refinements = INIT_REF_NUM;
    config.initial_time_step = TIME_STEP;
    let euler = config.euler();

    let [inlet, outlet, bottom, top] =
        [BDY_INLET, BDY_OUTLET, BDY_SOLID_WALL_BOTTOM, BDY_SOLID_WALL_TOP].map(BoundaryMarker::new);
    let mesh = Mesh2D::channel_with_bump(1, [inlet, outlet, bottom, top])?;
    let boundary_conditions = BoundaryConditions::new()
        .with(inlet, PrescribedState::inlet(config.flow.exterior_state(&euler)))
        .with(outlet, PrescribedState::outlet(P_EXT))
        .with(bottom, SolidWall::new())
        .with(top, SolidWall::new());
    let initial = InitialCondition::Constant {
        rho: RHO_EXT,
        v1: V1_EXT,
        v2: V2_EXT,
        p: P_EXT,
    };

    println!("=================================================================");
    println!("  GAMM channel, P_INIT = {P_INIT}, {INIT_REF_NUM} initial refinements");
    println!("=================================================================");

    let mut solver = FixedMeshSolver::new(config, AdaptiveMesh::new(mesh), boundary_conditions, &initial)?;
    println!("Elements: {}", solver.solution().space().n_elements());
    println!("DOFs:     {}", solver.solution().space().num_dofs());

    let summary = solver.run_with_callback(|solution, t, iteration| {
        if iteration % 10 == 0 {
            let (lo, hi) = QuantityFilter::Pressure.range(&euler, solution);
            println!("step {iteration:5}  t = {t:7.4}  pressure in [{lo:.4}, {hi:.4}]");
        }
    })?;

    println!();
    println!("Steps:      {}", summary.steps);
    println!("Final time: {:.4}", summary.final_time);
    if let Some((dt_min, dt_max)) = summary.time_step_range() {
        println!("dt range:   [{dt_min:.3e}, {dt_max:.3e}]");
    }
    Ok(())
}
