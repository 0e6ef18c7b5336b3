//! Dyadic cells of the refinement hierarchy and their affine geometry.
//!
//! A cell at level l is the square
//! [ix / 2^l, (ix+1) / 2^l] × [iy / 2^l, (iy+1) / 2^l]
//! of its base element's parameter square. Children are numbered
//! counter-clockwise starting at the bottom-left one.

use serde::{Deserialize, Serialize};

use super::mesh2d::Mesh2D;

/// Deepest supported refinement level.
pub const MAX_LEVEL: u8 = 24;

/// Identifier of a dyadic cell inside a base element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellId {
    /// Base element index
    pub base: u32,
    /// Refinement level (0 = the base element itself)
    pub level: u8,
    /// Column index within the level
    pub ix: u32,
    /// Row index within the level
    pub iy: u32,
}

impl CellId {
    /// The level-0 cell covering a whole base element.
    pub fn root(base: usize) -> Self {
        Self {
            base: base as u32,
            level: 0,
            ix: 0,
            iy: 0,
        }
    }

    /// Parent cell, `None` for a root.
    pub fn parent(self) -> Option<Self> {
        (self.level > 0).then(|| Self {
            base: self.base,
            level: self.level - 1,
            ix: self.ix / 2,
            iy: self.iy / 2,
        })
    }

    /// The four children in counter-clockwise order from bottom-left.
    pub fn children(self) -> [Self; 4] {
        let level = self.level + 1;
        let (x, y) = (2 * self.ix, 2 * self.iy);
        [(x, y), (x + 1, y), (x + 1, y + 1), (x, y + 1)].map(|(ix, iy)| Self {
            base: self.base,
            level,
            ix,
            iy,
        })
    }

    /// Ancestor at a coarser (or equal) level.
    pub fn ancestor_at(self, level: u8) -> Self {
        debug_assert!(level <= self.level);
        let shift = self.level - level;
        Self {
            base: self.base,
            level,
            ix: self.ix >> shift,
            iy: self.iy >> shift,
        }
    }

    /// Whether `self` contains `other` (or equals it).
    pub fn contains(self, other: CellId) -> bool {
        self.base == other.base && other.level >= self.level && other.ancestor_at(self.level) == self
    }

    /// Edge length of the cell in parameter space.
    #[inline]
    pub fn size(self) -> f64 {
        1.0 / (1u64 << self.level) as f64
    }

    /// Parameter coordinates (s, t) of the cell's bottom-left corner.
    #[inline]
    pub fn origin(self) -> (f64, f64) {
        let h = self.size();
        (self.ix as f64 * h, self.iy as f64 * h)
    }

    /// Map reference coordinates (ξ, η) ∈ [-1, 1]² to base parameter
    /// coordinates (s, t).
    #[inline]
    pub fn reference_to_parametric(self, xi: f64, eta: f64) -> (f64, f64) {
        let h = self.size();
        let (s0, t0) = self.origin();
        (s0 + 0.5 * (xi + 1.0) * h, t0 + 0.5 * (eta + 1.0) * h)
    }

    /// Map base parameter coordinates (s, t) to this cell's reference
    /// coordinates.
    #[inline]
    pub fn parametric_to_reference(self, s: f64, t: f64) -> (f64, f64) {
        let scale = (1u64 << self.level) as f64;
        (
            2.0 * (s * scale - self.ix as f64) - 1.0,
            2.0 * (t * scale - self.iy as f64) - 1.0,
        )
    }

    /// Map a point given in reference coordinates of `other` (a cell of the
    /// same base element) to reference coordinates of `self`.
    #[inline]
    pub fn reference_from(self, other: CellId, xi: f64, eta: f64) -> (f64, f64) {
        let (s, t) = other.reference_to_parametric(xi, eta);
        self.parametric_to_reference(s, t)
    }
}

/// Affine geometry of an active element:
/// x = center + J (ξ, η)ᵀ on the reference square.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementGeometry {
    /// Physical image of the reference origin
    pub center: (f64, f64),
    /// Jacobian [[∂x/∂ξ, ∂x/∂η], [∂y/∂ξ, ∂y/∂η]]
    pub jacobian: [[f64; 2]; 2],
    /// Inverse Jacobian [[∂ξ/∂x, ∂ξ/∂y], [∂η/∂x, ∂η/∂y]]
    pub inverse_jacobian: [[f64; 2]; 2],
    /// det J (positive)
    pub det_j: f64,
    /// Element area = 4 det J
    pub area: f64,
    /// Element diameter (longer diagonal)
    pub diameter: f64,
}

impl ElementGeometry {
    /// Geometry of a cell of the given base mesh.
    pub fn of_cell(base: &Mesh2D, cell: CellId) -> Self {
        let (origin, e1, e2) = base.element_frame(cell.base as usize);
        let h = cell.size();
        let (s_mid, t_mid) = cell.reference_to_parametric(0.0, 0.0);

        let center = (
            origin.0 + s_mid * e1.0 + t_mid * e2.0,
            origin.1 + s_mid * e1.1 + t_mid * e2.1,
        );
        let jacobian = [
            [0.5 * h * e1.0, 0.5 * h * e2.0],
            [0.5 * h * e1.1, 0.5 * h * e2.1],
        ];
        let det_j = jacobian[0][0] * jacobian[1][1] - jacobian[0][1] * jacobian[1][0];
        let inv_det = 1.0 / det_j;
        let inverse_jacobian = [
            [jacobian[1][1] * inv_det, -jacobian[0][1] * inv_det],
            [-jacobian[1][0] * inv_det, jacobian[0][0] * inv_det],
        ];

        let d1 = ((e1.0 + e2.0).powi(2) + (e1.1 + e2.1).powi(2)).sqrt();
        let d2 = ((e1.0 - e2.0).powi(2) + (e1.1 - e2.1).powi(2)).sqrt();

        Self {
            center,
            jacobian,
            inverse_jacobian,
            det_j,
            area: 4.0 * det_j,
            diameter: h * d1.max(d2),
        }
    }

    /// Map reference coordinates to physical coordinates.
    #[inline]
    pub fn to_physical(&self, xi: f64, eta: f64) -> (f64, f64) {
        let j = &self.jacobian;
        (
            self.center.0 + j[0][0] * xi + j[0][1] * eta,
            self.center.1 + j[1][0] * xi + j[1][1] * eta,
        )
    }

    /// Map physical coordinates to reference coordinates.
    #[inline]
    pub fn to_reference(&self, x: f64, y: f64) -> (f64, f64) {
        let inv = &self.inverse_jacobian;
        let (dx, dy) = (x - self.center.0, y - self.center.1);
        (inv[0][0] * dx + inv[0][1] * dy, inv[1][0] * dx + inv[1][1] * dy)
    }

    /// Transform a reference gradient (∂/∂ξ, ∂/∂η) to a physical one.
    #[inline]
    pub fn physical_gradient(&self, d_xi: f64, d_eta: f64) -> (f64, f64) {
        let inv = &self.inverse_jacobian;
        (
            inv[0][0] * d_xi + inv[1][0] * d_eta,
            inv[0][1] * d_xi + inv[1][1] * d_eta,
        )
    }

    /// Physical corner coordinates in counter-clockwise order.
    pub fn corners(&self) -> [(f64, f64); 4] {
        [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)].map(|(xi, eta)| self.to_physical(xi, eta))
    }

    /// Whether a physical point lies in the closed element, up to `tol` in
    /// reference coordinates.
    pub fn contains_point(&self, x: f64, y: f64, tol: f64) -> bool {
        let (xi, eta) = self.to_reference(x, y);
        xi.abs() <= 1.0 + tol && eta.abs() <= 1.0 + tol
    }
}
