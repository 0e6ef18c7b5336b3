//! Boundary conditions attached to boundary markers.

use std::collections::BTreeMap;
use std::fmt;

use super::traits::EulerBoundaryCondition;
use crate::error::{EulerError, Result};
use crate::mesh::{BoundaryMarker, Mesh2D};

/// Map from boundary markers to boundary conditions.
///
/// Several markers may carry conditions of the same kind, e.g. two inlets
/// with different inflow states.
#[derive(Default)]
pub struct BoundaryConditions {
    conditions: BTreeMap<BoundaryMarker, Box<dyn EulerBoundaryCondition>>,
}

impl fmt::Debug for BoundaryConditions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.conditions.iter().map(|(m, bc)| (m.id(), bc.name())))
            .finish()
    }
}

impl BoundaryConditions {
    /// Empty set of conditions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a condition to a marker, replacing any previous one.
    pub fn with<B: EulerBoundaryCondition + 'static>(mut self, marker: BoundaryMarker, bc: B) -> Self {
        self.insert(marker, Box::new(bc));
        self
    }

    /// Attach a boxed condition to a marker.
    pub fn insert(&mut self, marker: BoundaryMarker, bc: Box<dyn EulerBoundaryCondition>) {
        self.conditions.insert(marker, bc);
    }

    /// Condition of a marker.
    ///
    /// # Errors
    /// `EulerError::MissingBoundaryCondition` if the marker has none.
    pub fn get(&self, marker: BoundaryMarker) -> Result<&dyn EulerBoundaryCondition> {
        self.conditions
            .get(&marker)
            .map(|bc| bc.as_ref())
            .ok_or(EulerError::MissingBoundaryCondition(marker))
    }

    /// Markers with a condition.
    pub fn markers(&self) -> impl Iterator<Item = BoundaryMarker> + '_ {
        self.conditions.keys().copied()
    }

    /// Check that every boundary marker of a mesh has a condition.
    ///
    /// # Errors
    /// `EulerError::MissingBoundaryCondition` for the first uncovered marker.
    pub fn validate(&self, mesh: &Mesh2D) -> Result<()> {
        for marker in mesh.markers() {
            self.get(marker)?;
        }
        Ok(())
    }
}
