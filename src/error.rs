//! Error types for the Euler DG solver.

use thiserror::Error;

use crate::mesh::BoundaryMarker;

/// Errors that can occur while setting up or advancing a simulation.
#[derive(Debug, Error)]
pub enum EulerError {
    /// Mesh is malformed (orientation, non-affine element, unmarked boundary...).
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    /// Invalid solver configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A boundary edge carries a marker with no condition attached.
    #[error("No boundary condition registered for marker {0}")]
    MissingBoundaryCondition(BoundaryMarker),

    /// Density or pressure dropped below zero.
    #[error("Non-physical state in element {element}: density {density}, pressure {pressure}")]
    NonPhysicalState {
        element: usize,
        density: f64,
        pressure: f64,
    },

    /// Sparse factorization or solve failed.
    #[error("Linear solve failed: {0}")]
    LinearSolve(String),

    /// A solution or space does not match the mesh it is used with.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Checkpoint record is missing or inconsistent.
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EulerError {
    /// Create a dimension mismatch error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EulerError>;
