//! Physical consistency of the semi-implicit scheme.
//!
//! 1. A uniform supersonic stream through a channel stays uniform, also on a
//!    mesh with hanging nodes
//! 2. Mass and energy are conserved in a closed box with solid walls

use std::sync::Arc;

use approx::assert_relative_eq;
use dg_euler::assembly::DiscreteProblem;
use dg_euler::boundary::{BoundaryConditions, PrescribedState, SolidWall};
use dg_euler::config::SolverConfig;
use dg_euler::equations::{EulerEquations, EulerState};
use dg_euler::mesh::{AdaptiveMesh, BoundaryMarker, Mesh2D};
use dg_euler::simulation::{FixedMeshSolver, InitialCondition, LinearProgress};
use dg_euler::solution::Solution;
use dg_euler::space::L2Space;
use dg_euler::types::ElementIndex;
use dg_euler::weakform::SemiImplicitWeakForm;

fn k(idx: usize) -> ElementIndex {
    ElementIndex::new(idx)
}

const BOTTOM: BoundaryMarker = BoundaryMarker::new(1);
const OUTLET: BoundaryMarker = BoundaryMarker::new(2);
const TOP: BoundaryMarker = BoundaryMarker::new(3);
const INLET: BoundaryMarker = BoundaryMarker::new(4);

fn channel_conditions(euler: &EulerEquations, stream: EulerState) -> BoundaryConditions {
    BoundaryConditions::new()
        .with(BOTTOM, SolidWall::new())
        .with(TOP, SolidWall::new())
        .with(INLET, PrescribedState::inlet(stream))
        .with(OUTLET, PrescribedState::outlet(euler.pressure(&stream)))
}

fn assert_uniform(solution: &Solution, stream: &EulerState, tol: f64) {
    for e in solution.space().mesh().elements() {
        for (xi, eta) in [(-1.0, -1.0), (0.3, -0.2), (1.0, 1.0)] {
            let w = solution.evaluate(e, xi, eta);
            assert_relative_eq!(w.rho, stream.rho, epsilon = tol);
            assert_relative_eq!(w.rho_v_x, stream.rho_v_x, epsilon = tol);
            assert!(w.rho_v_y.abs() < tol);
            assert_relative_eq!(w.energy, stream.energy, epsilon = tol);
        }
    }
}

/// Uniform Mach 3 stream, one large time step on a mesh with hanging nodes.
#[test]
fn test_free_stream_preservation_with_hanging_nodes() {
    let euler = EulerEquations::default();
    let stream = euler.from_primitives(1.4, 3.0, 0.0, 1.0);
    let mesh = Mesh2D::uniform_rectangle_with_sides(0.0, 2.0, 0.0, 1.0, 4, 2, [BOTTOM, OUTLET, TOP, INLET]).unwrap();
    let mut mesh = AdaptiveMesh::new(mesh);
    mesh.refine_elements(&[k(1), k(6)]);
    let space = Arc::new(L2Space::new(mesh, 1));
    let previous = Solution::constant(Arc::clone(&space), stream);

    let mut weak_form = SemiImplicitWeakForm::new(euler, channel_conditions(&euler, stream));
    weak_form.set_current_time_step(0.1);
    let next = DiscreteProblem::new(&weak_form, &space, &previous).solve().unwrap();

    assert_uniform(&next, &stream, 1e-10);
}

/// A subsonic stream keeps its state through several solver steps.
#[test]
fn test_subsonic_stream_through_channel() {
    let config = SolverConfig::default()
        .with_initial_order(1)
        .with_cfl(1.0, 0.0)
        .with_max_steps(4)
        .without_shock_capturing();
    let euler = config.euler();
    let ic = InitialCondition::Constant {
        rho: 1.0,
        v1: 0.5,
        v2: 0.0,
        p: 1.0,
    };
    let stream = ic.state(&euler, 0.0, 0.0);
    let mesh = Mesh2D::uniform_rectangle_with_sides(0.0, 2.0, 0.0, 1.0, 4, 2, [BOTTOM, OUTLET, TOP, INLET]).unwrap();

    let mut solver =
        FixedMeshSolver::new(config, AdaptiveMesh::new(mesh), channel_conditions(&euler, stream), &ic).unwrap();
    let summary = solver.run().unwrap();
    assert_eq!(summary.steps, 4);
    assert_uniform(solver.solution(), &stream, 1e-9);
}

/// Walls carry no mass or energy flux and interior faces are conservative.
#[test]
fn test_closed_box_conserves_mass_and_energy() {
    let wall = BoundaryMarker::new(7);
    let mesh = Mesh2D::uniform_rectangle_with_sides(0.0, 1.0, 0.0, 1.0, 3, 3, [wall; 4]).unwrap();
    let mut mesh = AdaptiveMesh::new(mesh);
    mesh.refine_element(k(4));

    let config = SolverConfig::default()
        .with_initial_order(1)
        .with_cfl(0.5, 0.0)
        .with_max_steps(3)
        .without_shock_capturing();
    let ic = InitialCondition::LinearProgress {
        density: LinearProgress::new(1.0, 0.5, 1.0),
        pressure: LinearProgress::new(1.0, 0.8, 1.0),
        v1: 0.3,
        v2: -0.1,
    };
    let bcs = BoundaryConditions::new().with(wall, SolidWall::new());
    let mut solver = FixedMeshSolver::new(config, mesh, bcs, &ic).unwrap();

    let before = solver.solution().integral();
    solver.run().unwrap();
    let after = solver.solution().integral();

    assert_relative_eq!(after.rho, before.rho, max_relative = 1e-10);
    assert_relative_eq!(after.energy, before.energy, max_relative = 1e-10);
    assert!(solver.time() > 0.0);
}
