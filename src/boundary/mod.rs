//! Boundary conditions for the Euler equations.
//!
//! Boundary conditions linearize the boundary flux around the previous time
//! level so that it can enter the semi-implicit system:
//! - Solid wall: pressure flux, fully implicit
//! - Prescribed state: inlet (full state) or outlet (pressure), split into
//!   an implicit P⁺ part and an explicit P⁻ part
//!
//! Conditions are attached to boundary markers through [`BoundaryConditions`].

mod conditions;
mod prescribed;
mod solid_wall;
mod traits;

pub use conditions::BoundaryConditions;
pub use prescribed::{ExteriorData, PrescribedState};
pub use solid_wall::SolidWall;
pub use traits::{BoundaryContext, BoundaryLinearization, EulerBoundaryCondition};
