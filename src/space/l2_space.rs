//! Discontinuous L2 space over an adaptive mesh.
//!
//! All four Euler components share one polynomial order per element. The
//! degrees of freedom of element e with n_b = (p_e+1)² basis functions are
//! stored component-major:
//!
//! ```text
//! dof(e, comp, k) = offset[e] + comp * n_b + k
//! ```

use std::ops::Range;

use crate::basis::QuadBasis;
use crate::error::{EulerError, Result};
use crate::mesh::AdaptiveMesh;
use crate::types::ElementIndex;

/// Highest supported polynomial order.
pub const MAX_ORDER: usize = 10;

/// Number of solution components (ρ, ρv₁, ρv₂, E).
pub const N_COMPONENTS: usize = 4;

/// Piecewise polynomial space without inter-element continuity.
#[derive(Clone, Debug)]
pub struct L2Space {
    mesh: AdaptiveMesh,
    orders: Vec<usize>,
    offsets: Vec<usize>,
    n_dofs: usize,
}

impl L2Space {
    /// Space with the same order on every element.
    pub fn new(mesh: AdaptiveMesh, order: usize) -> Self {
        let orders = vec![order.min(MAX_ORDER); mesh.n_elements()];
        let mut space = Self {
            mesh,
            orders,
            offsets: Vec::new(),
            n_dofs: 0,
        };
        space.assign_dofs();
        space
    }

    /// Space with per-element orders.
    ///
    /// # Errors
    /// `EulerError::DimensionMismatch` if there is not one order per element,
    /// `EulerError::InvalidConfig` for orders above [`MAX_ORDER`].
    pub fn with_orders(mesh: AdaptiveMesh, orders: Vec<usize>) -> Result<Self> {
        if orders.len() != mesh.n_elements() {
            return Err(EulerError::dimension_mismatch(mesh.n_elements(), orders.len()));
        }
        if let Some(&p) = orders.iter().find(|&&p| p > MAX_ORDER) {
            return Err(EulerError::InvalidConfig(format!(
                "polynomial order {p} exceeds the maximum {MAX_ORDER}"
            )));
        }
        let mut space = Self {
            mesh,
            orders,
            offsets: Vec::new(),
            n_dofs: 0,
        };
        space.assign_dofs();
        Ok(space)
    }

    /// The underlying mesh.
    #[inline]
    pub fn mesh(&self) -> &AdaptiveMesh {
        &self.mesh
    }

    /// Number of elements.
    #[inline]
    pub fn n_elements(&self) -> usize {
        self.orders.len()
    }

    /// Polynomial order of an element.
    #[inline]
    pub fn order(&self, e: ElementIndex) -> usize {
        self.orders[e.get()]
    }

    /// All element orders.
    #[inline]
    pub fn orders(&self) -> &[usize] {
        &self.orders
    }

    /// Highest element order.
    pub fn max_order(&self) -> usize {
        self.orders.iter().copied().max().unwrap_or(0)
    }

    /// Basis of an element.
    #[inline]
    pub fn basis(&self, e: ElementIndex) -> QuadBasis {
        QuadBasis::new(self.order(e))
    }

    /// Number of basis functions per component on an element.
    #[inline]
    pub fn n_basis(&self, e: ElementIndex) -> usize {
        QuadBasis::modes_for_order(self.order(e))
    }

    /// Change the order of one element and renumber.
    pub fn set_order(&mut self, e: ElementIndex, order: usize) {
        self.orders[e.get()] = order.min(MAX_ORDER);
        self.assign_dofs();
    }

    /// Shift the order of every element by `change`, clamped to
    /// `min_order..=MAX_ORDER`, and renumber.
    pub fn adjust_element_order(&mut self, change: isize, min_order: usize) {
        let min_order = min_order.min(MAX_ORDER);
        for p in self.orders.iter_mut() {
            *p = p.saturating_add_signed(change).clamp(min_order, MAX_ORDER);
        }
        self.assign_dofs();
    }

    /// Total number of degrees of freedom.
    #[inline]
    pub fn num_dofs(&self) -> usize {
        self.n_dofs
    }

    /// All DOFs of an element, components included.
    #[inline]
    pub fn element_dofs(&self, e: ElementIndex) -> Range<usize> {
        let start = self.offsets[e.get()];
        start..start + N_COMPONENTS * self.n_basis(e)
    }

    /// DOFs of one component on an element.
    #[inline]
    pub fn component_dofs(&self, e: ElementIndex, component: usize) -> Range<usize> {
        let nb = self.n_basis(e);
        let start = self.offsets[e.get()] + component * nb;
        start..start + nb
    }

    /// Global index of basis function k of a component on an element.
    #[inline]
    pub fn dof(&self, e: ElementIndex, component: usize, k: usize) -> usize {
        self.offsets[e.get()] + component * self.n_basis(e) + k
    }

    /// Space on the reference mesh (every element split once) with orders
    /// raised by `order_increase`.
    pub fn reference_space(&self, order_increase: usize) -> Self {
        let fine_mesh = self.mesh.reference_mesh();
        let orders = fine_mesh
            .leaves()
            .iter()
            .map(|&cell| {
                let parent = cell.parent().and_then(|p| self.mesh.element_of(p));
                let p = parent.map_or(0, |e| self.order(e));
                (p + order_increase).min(MAX_ORDER)
            })
            .collect();
        let mut space = Self {
            mesh: fine_mesh,
            orders,
            offsets: Vec::new(),
            n_dofs: 0,
        };
        space.assign_dofs();
        space
    }

    /// Space on a new mesh of the same base, carrying the orders over:
    /// unchanged elements keep their order, children inherit their parent's
    /// order and merged elements take the highest order of their children.
    pub fn sync_with_mesh(&self, mesh: AdaptiveMesh) -> Self {
        let orders = mesh
            .leaves()
            .iter()
            .map(|&cell| match self.mesh.leaf_containing(cell) {
                Some(e) => self.order(e),
                None => self
                    .mesh
                    .leaves_within(cell)
                    .into_iter()
                    .map(|e| self.order(e))
                    .max()
                    .unwrap_or(0),
            })
            .collect();
        let mut space = Self {
            mesh,
            orders,
            offsets: Vec::new(),
            n_dofs: 0,
        };
        space.assign_dofs();
        space
    }

    fn assign_dofs(&mut self) {
        self.offsets.clear();
        self.offsets.reserve(self.orders.len());
        let mut next = 0;
        for &p in &self.orders {
            self.offsets.push(next);
            next += N_COMPONENTS * QuadBasis::modes_for_order(p);
        }
        self.n_dofs = next;
    }
}
