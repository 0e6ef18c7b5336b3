//! # dg-euler
//!
//! A semi-implicit Discontinuous Galerkin solver for the compressible Euler
//! equations on adaptive quadrilateral meshes.
//!
//! This crate provides:
//! - Orthonormal Legendre tensor bases and Gauss quadrature
//! - Adaptive meshes of nested quadrilaterals with hanging nodes
//! - Steger-Warming flux vector splitting
//! - The linearized (semi-implicit) weak form with boundary linearizations
//!   for solid walls, inlets and outlets
//! - Sparse assembly and direct solution with `faer`
//! - Shock capturing: Kuzmin and Krivodonova limiters, Feistauer artificial
//!   viscosity
//! - hp-adaptivity driven by reference solutions
//! - Fixed-mesh and adaptive time-stepping drivers with checkpoints
//!
//! The state is the conserved vector w = (ρ, ρv₁, ρv₂, E).

pub mod adapt;
pub mod assembly;
pub mod basis;
pub mod boundary;
pub mod config;
pub mod equations;
pub mod error;
pub mod flux;
pub mod io;
pub mod limiter;
pub mod mesh;
pub mod polynomial;
pub mod simulation;
pub mod solution;
pub mod space;
pub mod time;
pub mod types;
pub mod weakform;

// Re-export main types for convenience
pub use adapt::{Adapt, AdaptStrategy, CandidateList, ErrorEstimate, Selector};
pub use assembly::{DiscreteProblem, LinearSystem};
pub use boundary::{BoundaryConditions, EulerBoundaryCondition, PrescribedState, SolidWall};
pub use config::{AdaptivityConfig, FlowConfig, ShockCapturing, ShockCapturingConfig, SolverConfig};
pub use equations::{EulerEquations, EulerState};
pub use error::{EulerError, Result};
pub use io::CalculationContinuity;
pub use limiter::{FeistauerIndicator, FluxLimiter, LimiterKind};
pub use mesh::{AdaptiveMesh, BoundaryMarker, CellId, FaceSet, Mesh2D};
pub use simulation::{AdaptiveSolver, FixedMeshSolver, InitialCondition, LinearProgress, SimulationSummary};
pub use solution::{QuantityFilter, Solution};
pub use space::L2Space;
pub use time::CflCalculation;
pub use types::{ElementIndex, FaceIndex};
pub use weakform::SemiImplicitWeakForm;
