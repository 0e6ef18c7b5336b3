//! Mesh representation.
//!
//! Provides the mesh data structures of the DG discretization:
//! - Conforming base mesh of parallelogram elements with boundary markers
//! - Dyadic refinement hierarchy with hanging nodes
//! - Face segments between active elements

mod adaptive;
mod boundary_markers;
mod cell;
mod faces;
mod mesh2d;

pub use adaptive::AdaptiveMesh;
pub use boundary_markers::BoundaryMarker;
pub use cell::{CellId, ElementGeometry, MAX_LEVEL};
pub use faces::{Face, FaceQuadrature, FaceSet};
pub use mesh2d::{Edge, ElementFace, Mesh2D};
