//! Boundary markers for 2D mesh edges.
//!
//! Every boundary edge carries a marker identifying the boundary part it
//! belongs to (inlet, outlet, bottom wall, ...). The physical meaning of a
//! marker is attached later, when boundary conditions are registered with the
//! weak form.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Marker identifying a group of boundary edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundaryMarker(u32);

impl BoundaryMarker {
    /// Create a marker from its numeric id.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Numeric id of the marker.
    pub const fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for BoundaryMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for BoundaryMarker {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_equality() {
        assert_eq!(BoundaryMarker::new(1), BoundaryMarker::from(1));
        assert_ne!(BoundaryMarker::new(1), BoundaryMarker::new(2));
        assert_eq!(BoundaryMarker::new(7).id(), 7);
    }

    #[test]
    fn test_marker_serde_is_transparent() {
        let json = serde_json::to_string(&BoundaryMarker::new(3)).unwrap();
        assert_eq!(json, "3");
        let back: BoundaryMarker = serde_json::from_str(&json).unwrap();
        assert_eq!(back, BoundaryMarker::new(3));
    }
}
