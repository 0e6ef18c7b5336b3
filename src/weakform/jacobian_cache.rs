//! Per-face cache of split flux Jacobians.
//!
//! The split Jacobians P⁺(w_L) and P⁻(w_R) at the quadrature points of a face
//! are shared by every component pair of the interface forms, and the
//! boundary linearizations are shared by the boundary matrix and vector
//! forms. They are computed once when a face becomes active and reused until
//! the next face is activated. The buffers keep their capacity across faces.

use crate::boundary::BoundaryLinearization;
use crate::equations::Matrix4;
use crate::types::FaceIndex;

/// Jacobians of the active face.
#[derive(Clone, Debug, Default)]
pub struct FaceJacobianCache {
    active: Option<FaceIndex>,
    pub(crate) plus: Vec<Matrix4>,
    pub(crate) minus: Vec<Matrix4>,
    pub(crate) boundary: Vec<BoundaryLinearization>,
    fills: usize,
}

impl FaceJacobianCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `face` the active face.
    ///
    /// Returns `true` if the cached data belongs to another face and has been
    /// cleared, so the caller must refill it.
    pub fn activate(&mut self, face: FaceIndex) -> bool {
        if self.active == Some(face) {
            return false;
        }
        self.active = Some(face);
        self.plus.clear();
        self.minus.clear();
        self.boundary.clear();
        self.fills += 1;
        true
    }

    /// Forget the active face, e.g. after the previous solution changed.
    pub fn invalidate(&mut self) {
        self.active = None;
    }

    /// Currently active face.
    #[inline]
    pub fn active(&self) -> Option<FaceIndex> {
        self.active
    }

    /// Number of times the cache has been refilled.
    #[inline]
    pub fn fills(&self) -> usize {
        self.fills
    }

    /// P⁺ at the quadrature points of the active interface.
    #[inline]
    pub fn p_plus(&self) -> &[Matrix4] {
        &self.plus
    }

    /// P⁻ at the quadrature points of the active interface.
    #[inline]
    pub fn p_minus(&self) -> &[Matrix4] {
        &self.minus
    }

    /// Boundary linearizations at the quadrature points of the active face.
    #[inline]
    pub fn boundary(&self) -> &[BoundaryLinearization] {
        &self.boundary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation() {
        let mut cache = FaceJacobianCache::new();
        let f = FaceIndex::new(3);
        assert!(cache.activate(f));
        cache.plus.push([[1.0; 4]; 4]);
        assert!(!cache.activate(f));
        assert_eq!(cache.p_plus().len(), 1);

        assert!(cache.activate(FaceIndex::new(4)));
        assert!(cache.p_plus().is_empty());
        assert_eq!(cache.fills(), 2);

        cache.invalidate();
        assert!(cache.activate(FaceIndex::new(4)));
    }
}
