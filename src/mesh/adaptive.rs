//! Dyadic refinement hierarchy over a base mesh.
//!
//! Active elements are the leaves of one quadtree per base element. Leaves
//! are kept sorted by [`CellId`], and an element's index is its position in
//! that order, so two meshes with the same leaves number their elements the
//! same way. Hanging nodes of arbitrary depth are allowed.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::cell::{CellId, ElementGeometry, MAX_LEVEL};
use super::mesh2d::Mesh2D;
use crate::error::{EulerError, Result};
use crate::types::ElementIndex;

/// Active elements of a refined base mesh.
#[derive(Clone, Debug)]
pub struct AdaptiveMesh {
    base: Arc<Mesh2D>,
    leaves: Vec<CellId>,
    index: HashMap<CellId, usize>,
    floor: HashSet<CellId>,
    max_level: u8,
}

impl AdaptiveMesh {
    /// Mesh whose active elements are the base elements.
    pub fn new(base: Mesh2D) -> Self {
        Self::from_shared(Arc::new(base))
    }

    /// Like [`AdaptiveMesh::new`] for a base mesh shared with other meshes.
    pub fn from_shared(base: Arc<Mesh2D>) -> Self {
        let leaves = (0..base.n_elements).map(CellId::root).collect();
        let mut mesh = Self {
            base,
            leaves,
            index: HashMap::new(),
            floor: HashSet::new(),
            max_level: 0,
        };
        mesh.rebuild();
        mesh
    }

    /// Mesh with the given active cells.
    ///
    /// # Errors
    /// `EulerError::InvalidMesh` if the cells do not tile every base element
    /// exactly once.
    pub fn from_leaves(base: Arc<Mesh2D>, leaves: Vec<CellId>) -> Result<Self> {
        let set: HashSet<CellId> = leaves.iter().copied().collect();
        if set.len() != leaves.len() {
            return Err(EulerError::InvalidMesh("duplicate active cells".into()));
        }

        let mut covered = vec![0u64; base.n_elements];
        let full = 1u64 << (2 * MAX_LEVEL as u32);
        for cell in &leaves {
            if cell.base as usize >= base.n_elements || cell.level > MAX_LEVEL {
                return Err(EulerError::InvalidMesh(format!("invalid cell {cell:?}")));
            }
            let n = 1u32 << cell.level;
            if cell.ix >= n || cell.iy >= n {
                return Err(EulerError::InvalidMesh(format!("invalid cell {cell:?}")));
            }
            let mut ancestor = cell.parent();
            while let Some(a) = ancestor {
                if set.contains(&a) {
                    return Err(EulerError::InvalidMesh(format!(
                        "cell {cell:?} overlaps active cell {a:?}"
                    )));
                }
                ancestor = a.parent();
            }
            covered[cell.base as usize] += full >> (2 * cell.level as u32);
        }
        if let Some(k) = covered.iter().position(|&c| c != full) {
            return Err(EulerError::InvalidMesh(format!(
                "active cells do not cover base element {k}"
            )));
        }

        let mut mesh = Self {
            base,
            leaves,
            index: HashMap::new(),
            floor: HashSet::new(),
            max_level: 0,
        };
        mesh.rebuild();
        Ok(mesh)
    }

    /// The base mesh.
    #[inline]
    pub fn base(&self) -> &Mesh2D {
        &self.base
    }

    /// Shared handle to the base mesh.
    pub fn base_shared(&self) -> Arc<Mesh2D> {
        Arc::clone(&self.base)
    }

    /// Number of active elements.
    #[inline]
    pub fn n_elements(&self) -> usize {
        self.leaves.len()
    }

    /// Iterator over all active element indices.
    pub fn elements(&self) -> impl Iterator<Item = ElementIndex> {
        ElementIndex::iter(self.leaves.len())
    }

    /// Active cells in element order.
    #[inline]
    pub fn leaves(&self) -> &[CellId] {
        &self.leaves
    }

    /// Cell of an active element.
    #[inline]
    pub fn cell(&self, e: ElementIndex) -> CellId {
        self.leaves[e.get()]
    }

    /// Element index of an active cell.
    #[inline]
    pub fn element_of(&self, cell: CellId) -> Option<ElementIndex> {
        self.index.get(&cell).map(|&i| ElementIndex::new(i))
    }

    /// Deepest refinement level among the active elements.
    #[inline]
    pub fn max_level(&self) -> u8 {
        self.max_level
    }

    /// Affine geometry of an active element.
    pub fn geometry(&self, e: ElementIndex) -> ElementGeometry {
        ElementGeometry::of_cell(&self.base, self.cell(e))
    }

    /// Active element containing (or equal to) a cell, if the cell is not
    /// itself refined.
    pub fn leaf_containing(&self, cell: CellId) -> Option<ElementIndex> {
        let mut current = Some(cell);
        while let Some(c) = current {
            if let Some(e) = self.element_of(c) {
                return Some(e);
            }
            current = c.parent();
        }
        None
    }

    /// Active elements contained in a cell.
    pub fn leaves_within(&self, cell: CellId) -> Vec<ElementIndex> {
        let mut found = Vec::new();
        let mut stack = vec![cell];
        while let Some(c) = stack.pop() {
            if let Some(e) = self.element_of(c) {
                found.push(e);
            } else if c.level < self.max_level {
                stack.extend(c.children());
            }
        }
        found.sort_unstable();
        found
    }

    /// Active element containing the parameter point (s, t) of a base element.
    pub fn locate(&self, base: usize, s: f64, t: f64) -> Option<ElementIndex> {
        if base >= self.base.n_elements {
            return None;
        }
        let n = 1u32 << self.max_level;
        let to_index = |v: f64| ((v * n as f64).floor().max(0.0) as u32).min(n - 1);
        let finest = CellId {
            base: base as u32,
            level: self.max_level,
            ix: to_index(s),
            iy: to_index(t),
        };
        self.leaf_containing(finest)
    }

    /// Split the given elements isotropically into four children each.
    pub fn refine_elements(&mut self, elements: &[ElementIndex]) {
        if elements.is_empty() {
            return;
        }
        let refine: HashSet<usize> = elements
            .iter()
            .map(|e| e.get())
            .filter(|&i| self.leaves[i].level < MAX_LEVEL)
            .collect();
        let mut leaves = Vec::with_capacity(self.leaves.len() + 3 * refine.len());
        for (i, &cell) in self.leaves.iter().enumerate() {
            if refine.contains(&i) {
                leaves.extend(cell.children());
            } else {
                leaves.push(cell);
            }
        }
        self.leaves = leaves;
        self.rebuild();
    }

    /// Split a single element.
    pub fn refine_element(&mut self, e: ElementIndex) {
        self.refine_elements(&[e]);
    }

    /// Split every active element.
    pub fn refine_all_elements(&mut self) {
        let all: Vec<_> = self.elements().collect();
        self.refine_elements(&all);
    }

    /// Refine the elements selected by `criterion`, `depth` times in a row.
    ///
    /// The criterion sees the cell and its geometry; children created in one
    /// pass are tested again in the next one.
    pub fn refine_by_criterion<F>(&mut self, mut criterion: F, depth: usize)
    where
        F: FnMut(CellId, &ElementGeometry) -> bool,
    {
        for _ in 0..depth {
            let selected: Vec<_> = self
                .elements()
                .filter(|&e| criterion(self.cell(e), &self.geometry(e)))
                .collect();
            if selected.is_empty() {
                break;
            }
            self.refine_elements(&selected);
        }
    }

    /// Record the current active cells as the coarsest state that
    /// [`AdaptiveMesh::unrefine_all`] may return to.
    pub fn set_coarsening_floor(&mut self) {
        self.floor = self.leaves.iter().copied().collect();
    }

    /// Cells of the coarsening floor in ascending order.
    pub fn coarsening_floor(&self) -> Vec<CellId> {
        let mut cells: Vec<CellId> = self.floor.iter().copied().collect();
        cells.sort_unstable();
        cells
    }

    /// Replace the coarsening floor, e.g. when restoring a saved mesh.
    pub fn restore_coarsening_floor<I>(&mut self, cells: I)
    where
        I: IntoIterator<Item = CellId>,
    {
        self.floor = cells.into_iter().collect();
    }

    /// Merge every complete group of four sibling leaves into their parent.
    ///
    /// Returns the number of merged groups.
    pub fn unrefine_all(&mut self) -> usize {
        let mut sibling_count: HashMap<CellId, usize> = HashMap::new();
        for &cell in &self.leaves {
            if let Some(parent) = cell.parent() {
                *sibling_count.entry(parent).or_default() += 1;
            }
        }
        let merge: HashSet<CellId> = sibling_count
            .into_iter()
            .filter(|&(parent, count)| {
                count == 4 && parent.children().iter().all(|c| !self.floor.contains(c))
            })
            .map(|(parent, _)| parent)
            .collect();
        if merge.is_empty() {
            return 0;
        }

        let mut leaves: Vec<CellId> = self
            .leaves
            .iter()
            .copied()
            .filter(|c| c.parent().map_or(true, |p| !merge.contains(&p)))
            .collect();
        leaves.extend(merge.iter().copied());
        self.leaves = leaves;
        self.rebuild();
        merge.len()
    }

    /// Copy of this mesh with every element split once.
    pub fn reference_mesh(&self) -> Self {
        let mut fine = self.clone();
        fine.refine_all_elements();
        fine
    }

    fn rebuild(&mut self) {
        self.leaves.sort_unstable();
        self.index = self
            .leaves
            .iter()
            .enumerate()
            .map(|(i, &cell)| (cell, i))
            .collect();
        self.max_level = self.leaves.iter().map(|c| c.level).max().unwrap_or(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::BoundaryMarker;

    fn unit_square(n: usize) -> AdaptiveMesh {
        let sides = [1, 2, 3, 4].map(BoundaryMarker::new);
        AdaptiveMesh::new(Mesh2D::uniform_rectangle_with_sides(0.0, 1.0, 0.0, 1.0, n, n, sides).unwrap())
    }

    fn total_area(mesh: &AdaptiveMesh) -> f64 {
        mesh.elements().map(|e| mesh.geometry(e).area).sum()
    }

    #[test]
    fn test_refine_and_unrefine() {
        let mut mesh = unit_square(2);
        assert_eq!(mesh.n_elements(), 4);

        mesh.refine_element(ElementIndex::new(0));
        assert_eq!(mesh.n_elements(), 7);
        assert_eq!(mesh.max_level(), 1);
        assert!((total_area(&mesh) - 1.0).abs() < 1e-14);

        assert_eq!(mesh.unrefine_all(), 1);
        assert_eq!(mesh.n_elements(), 4);
        assert_eq!(mesh.max_level(), 0);
        assert_eq!(mesh.unrefine_all(), 0);
    }

    #[test]
    fn test_coarsening_floor() {
        let mut mesh = unit_square(1);
        mesh.refine_all_elements();
        mesh.set_coarsening_floor();
        mesh.refine_element(ElementIndex::new(2));
        assert_eq!(mesh.n_elements(), 7);

        assert_eq!(mesh.unrefine_all(), 1);
        assert_eq!(mesh.n_elements(), 4);
        // The floor keeps the initial refinement
        assert_eq!(mesh.unrefine_all(), 0);
    }

    #[test]
    fn test_reference_mesh() {
        let mut mesh = unit_square(2);
        mesh.refine_element(ElementIndex::new(3));
        let fine = mesh.reference_mesh();
        assert_eq!(fine.n_elements(), 4 * mesh.n_elements());
        for e in mesh.elements() {
            let within = fine.leaves_within(mesh.cell(e));
            assert_eq!(within.len(), 4);
            for f in within {
                assert_eq!(mesh.leaf_containing(fine.cell(f)), Some(e));
            }
        }
    }

    #[test]
    fn test_locate() {
        let mut mesh = unit_square(1);
        mesh.refine_all_elements();
        mesh.refine_element(ElementIndex::new(0));
        let e = mesh.locate(0, 0.1, 0.1).unwrap();
        assert_eq!(mesh.cell(e).level, 2);
        let e = mesh.locate(0, 0.9, 0.9).unwrap();
        assert_eq!(mesh.cell(e).level, 1);
        assert!(mesh.geometry(e).contains_point(0.9, 0.9, 1e-12));
        assert!(mesh.locate(0, 1.0, 1.0).is_some());
        assert!(mesh.locate(5, 0.5, 0.5).is_none());
    }

    #[test]
    fn test_refine_by_criterion() {
        let mut mesh = unit_square(2);
        mesh.refine_by_criterion(|_, geom| geom.center.0 < 0.5 && geom.center.1 < 0.5, 2);
        // first pass splits the bottom-left element, second pass all four of its children
        assert_eq!(mesh.n_elements(), 3 + 16);
        assert_eq!(mesh.max_level(), 2);
    }

    #[test]
    fn test_from_leaves_validates_tiling() {
        let mesh = unit_square(1);
        let root = CellId::root(0);
        let children = root.children();

        let ok = AdaptiveMesh::from_leaves(mesh.base_shared(), children.to_vec()).unwrap();
        assert_eq!(ok.n_elements(), 4);

        let missing = AdaptiveMesh::from_leaves(mesh.base_shared(), children[..3].to_vec());
        assert!(missing.is_err());
        let overlapping = AdaptiveMesh::from_leaves(mesh.base_shared(), vec![root, children[0]]);
        assert!(overlapping.is_err());
    }
}
