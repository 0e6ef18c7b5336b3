//! Heating-induced vortex
//!
//! Gas at rest in the square [0, 3]² with density and pressure falling
//! linearly with height. Heated gas at higher pressure enters through the
//! top side; the other sides are solid walls. Piecewise constants on a fixed
//! mesh, no shock capturing.
//!
//! ## Run
//!
//! ```bash
//! cargo run --release --example heating_induced_vortex
//! ```

use dg_euler::boundary::{BoundaryConditions, PrescribedState, SolidWall};
use dg_euler::config::{FlowConfig, SolverConfig};
use dg_euler::error::Result;
use dg_euler::mesh::{AdaptiveMesh, BoundaryMarker, Mesh2D};
use dg_euler::simulation::{FixedMeshSolver, InitialCondition, LinearProgress};
use dg_euler::solution::QuantityFilter;
use tracing_subscriber::EnvFilter;

const P_INIT: usize = 0;
const INIT_REF_NUM: usize = 3;
const CFL_NUMBER: f64 = 1.0;
const TIME_STEP: f64 = 1e-4;
const T_END: f64 = 10.0;

// Exterior (inlet) state
const P_EXT: f64 = 2.0;
const RHO_EXT: f64 = 1.0;
const V1_EXT: f64 = 0.0;
const V2_EXT: f64 = 0.0;

// Initial stratification
const P_INITIAL_HIGH: f64 = 1.5;
const P_INITIAL_LOW: f64 = 1.0;
const RHO_INITIAL_HIGH: f64 = 0.5;
const RHO_INITIAL_LOW: f64 = 0.3;
const MESH_SIZE: f64 = 3.0;

// Boundary markers
const BDY_INLET: u32 = 1;
const BDY_SOLID_WALL: u32 = 2;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = SolverConfig::default()
        .with_flow(FlowConfig::new(RHO_EXT, V1_EXT, V2_EXT, P_EXT))
        .with_initial_order(P_INIT)
        .with_cfl(CFL_NUMBER, 0.0)
        .with_end_time(T_END)
        .without_shock_capturing();
    config.initial_refinements = INIT_REF_NUM;
    config.initial_time_step = TIME_STEP;
    let euler = config.euler();

    let inlet = BoundaryMarker::new(BDY_INLET);
    let wall = BoundaryMarker::new(BDY_SOLID_WALL);
    // Sides: south, east, north, west
    let mesh = Mesh2D::uniform_rectangle_with_sides(0.0, MESH_SIZE, 0.0, MESH_SIZE, 1, 1, [wall, wall, inlet, wall])?;
    let boundary_conditions = BoundaryConditions::new()
        .with(inlet, PrescribedState::inlet(config.flow.exterior_state(&euler)))
        .with(wall, SolidWall::new());
    let initial = InitialCondition::LinearProgress {
        density: LinearProgress::new(RHO_INITIAL_HIGH, RHO_INITIAL_LOW, MESH_SIZE),
        pressure: LinearProgress::new(P_INITIAL_HIGH, P_INITIAL_LOW, MESH_SIZE),
        v1: 0.0,
        v2: 0.0,
    };

    let mut solver = FixedMeshSolver::new(config, AdaptiveMesh::new(mesh), boundary_conditions, &initial)?;
    println!("Elements: {}", solver.solution().space().n_elements());

    let summary = solver.run_with_callback(|solution, t, iteration| {
        if iteration % 50 == 0 {
            let (_, mach) = QuantityFilter::MachNumber.range(&euler, solution);
            println!("step {iteration:6}  t = {t:7.4}  max Mach = {mach:.4}");
        }
    })?;

    println!();
    println!("Steps:      {}", summary.steps);
    println!("Final time: {:.4}", summary.final_time);
    Ok(())
}
