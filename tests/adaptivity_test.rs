//! hp-adaptivity against reference solutions.

use std::sync::Arc;

use dg_euler::adapt::{Adapt, AdaptStrategy, CandidateList, Selector};
use dg_euler::boundary::{BoundaryConditions, PrescribedState, SolidWall};
use dg_euler::config::SolverConfig;
use dg_euler::equations::EulerState;
use dg_euler::mesh::{AdaptiveMesh, BoundaryMarker, Mesh2D};
use dg_euler::simulation::{AdaptiveSolver, InitialCondition};
use dg_euler::solution::Solution;
use dg_euler::space::L2Space;

fn step(x: f64, _: f64) -> EulerState {
    let rho = if x < 0.3 { 1.0 } else { 2.0 };
    EulerState::new(rho, 0.0, 0.0, 2.5)
}

/// Repeated adapt cycles on a jump: the error falls and the mesh is only
/// refined near the jump.
#[test]
fn test_adaptivity_loop_reduces_error() {
    let sides = [1, 2, 3, 4].map(BoundaryMarker::new);
    let mesh = Mesh2D::uniform_rectangle_with_sides(0.0, 1.0, 0.0, 1.0, 2, 2, sides).unwrap();
    let mut space = L2Space::new(AdaptiveMesh::new(mesh), 0);
    let selector = Selector::new(CandidateList::HpIso, 1.0, 1);

    let mut errors = Vec::new();
    for _ in 0..4 {
        let fine = Solution::project_function(Arc::new(space.reference_space(1)), step);
        let coarse = fine.project_onto(Arc::new(space.clone()));
        let mut adapt = Adapt::new(&mut space);
        let estimate = adapt.calc_err_est(&coarse, &fine).unwrap();
        errors.push(estimate.relative_percent());
        if adapt
            .adapt(&selector, AdaptStrategy::RelativeToMax(0.3), &estimate, &fine)
            .unwrap()
        {
            break;
        }
    }

    assert!(errors.len() >= 2);
    assert!(errors[errors.len() - 1] < errors[0], "errors {errors:?}");
    // The right half is smooth and never refined
    let mesh = space.mesh();
    let smallest_right = mesh
        .elements()
        .filter(|&e| mesh.geometry(e).center.0 > 0.5)
        .map(|e| mesh.geometry(e).area)
        .fold(f64::INFINITY, f64::min);
    assert_eq!(smallest_right, 0.25);
    assert!(mesh.n_elements() > 4 || space.orders().iter().any(|&p| p > 0));
}

/// The first time step of the forward-facing step keeps the initial mesh:
/// the uniform inflow is represented exactly.
#[test]
fn test_forward_step_first_step() {
    let [bottom, outlet, top, inlet] = [1, 2, 3, 4].map(BoundaryMarker::new);
    let mut mesh = AdaptiveMesh::new(Mesh2D::forward_facing_step(1, [bottom, outlet, top, inlet]).unwrap());
    mesh.refine_by_criterion(
        |_, geometry| {
            let corners = geometry.corners();
            corners[2].1 <= 0.4 && corners[1].0 <= 0.6
        },
        1,
    );
    let refined = mesh.n_elements();
    assert!(refined > 63);

    let config = SolverConfig::default().with_max_steps(1);
    let euler = config.euler();
    let flow = config.flow;
    let bcs = BoundaryConditions::new()
        .with(bottom, SolidWall::new())
        .with(top, SolidWall::new())
        .with(inlet, PrescribedState::inlet(flow.exterior_state(&euler)))
        .with(outlet, PrescribedState::outlet(flow.p_ext));
    let ic = InitialCondition::Constant {
        rho: flow.rho_ext,
        v1: flow.v1_ext,
        v2: flow.v2_ext,
        p: flow.p_ext,
    };

    let mut solver = AdaptiveSolver::new(config, mesh, bcs, &ic).unwrap();
    let summary = solver.run().unwrap();
    assert_eq!(summary.steps, 1);
    assert_eq!(summary.time_steps, vec![1e-6]);
    assert!(solver.error_estimate() < 5.0);
    assert_eq!(solver.coarse_space().n_elements(), 4 * refined);
    assert!(solver.time_step() > 1e-6);
}
