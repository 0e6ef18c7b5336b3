//! Assembly of the semi-implicit system over an L2 space.

use faer::Mat;
use tracing::debug;

use super::linear_system::LinearSystem;
use crate::basis::BasisCache;
use crate::error::{EulerError, Result};
use crate::mesh::FaceSet;
use crate::solution::Solution;
use crate::space::{L2Space, N_COMPONENTS};
use crate::types::{ElementIndex, FaceIndex};
use crate::weakform::{FaceJacobianCache, SemiImplicitWeakForm};

/// Local element contribution: dense block and right-hand side.
struct ElementBlock {
    offset: usize,
    matrix: Mat<f64>,
    rhs: Vec<f64>,
}

/// One semi-implicit step over a space: weak form, space and the previous
/// solution it linearizes around.
pub struct DiscreteProblem<'a> {
    weak_form: &'a SemiImplicitWeakForm,
    space: &'a L2Space,
    previous: &'a Solution,
    faces: FaceSet,
}

impl<'a> DiscreteProblem<'a> {
    /// Set up the problem; faces of the space's mesh are computed here.
    pub fn new(weak_form: &'a SemiImplicitWeakForm, space: &'a L2Space, previous: &'a Solution) -> Self {
        Self {
            weak_form,
            space,
            previous,
            faces: FaceSet::new(space.mesh()),
        }
    }

    /// Faces of the mesh.
    #[inline]
    pub fn faces(&self) -> &FaceSet {
        &self.faces
    }

    /// Number of unknowns.
    #[inline]
    pub fn num_dofs(&self) -> usize {
        self.space.num_dofs()
    }

    /// Assemble the matrix and right-hand side.
    ///
    /// # Errors
    /// `EulerError::DimensionMismatch` if the previous solution does not live
    /// on the space or the stabilization indicator has the wrong length;
    /// boundary errors from the weak form.
    pub fn assemble(&self) -> Result<LinearSystem> {
        let prev_space = self.previous.space();
        if prev_space.num_dofs() != self.space.num_dofs() || prev_space.n_elements() != self.space.n_elements() {
            return Err(EulerError::dimension_mismatch(
                self.space.num_dofs(),
                prev_space.num_dofs(),
            ));
        }
        self.weak_form.check_indicator(self.space.n_elements())?;

        let n = self.space.num_dofs();
        let mut system = LinearSystem::new(n);

        for block in self.element_blocks() {
            system.add_block(block.offset, block.offset, &block.matrix);
            system.add_rhs(block.offset, &block.rhs);
        }

        let mut cache = FaceJacobianCache::new();
        for (f, face) in self.faces.faces().iter().enumerate() {
            let f = FaceIndex::new(f);
            let left = face.minus;
            let offset_l = self.space.element_dofs(left).start;
            match face.plus {
                None => {
                    let n_local = N_COMPONENTS * self.space.n_basis(left);
                    let mut matrix = Mat::zeros(n_local, n_local);
                    let mut rhs = vec![0.0; n_local];
                    self.weak_form
                        .boundary_forms(self.previous, f, face, &mut cache, &mut matrix, &mut rhs)?;
                    system.add_block(offset_l, offset_l, &matrix);
                    system.add_rhs(offset_l, &rhs);
                }
                Some(right) => {
                    let offset_r = self.space.element_dofs(right).start;
                    let blocks = self.weak_form.interface_forms(self.previous, f, face, &mut cache);
                    system.add_block(offset_l, offset_l, &blocks.minus_minus);
                    system.add_block(offset_l, offset_r, &blocks.minus_plus);
                    system.add_block(offset_r, offset_l, &blocks.plus_minus);
                    system.add_block(offset_r, offset_r, &blocks.plus_plus);
                }
            }
        }

        system.merge_duplicates();
        debug!(
            ndof = n,
            nnz = system.nnz(),
            faces = self.faces.n_faces(),
            "assembled semi-implicit system"
        );
        Ok(system)
    }

    /// Assemble and solve, returning the new solution on the same space.
    ///
    /// # Errors
    /// Assembly errors and `EulerError::LinearSolve`.
    pub fn solve(&self) -> Result<Solution> {
        let coefficients = self.assemble()?.solve()?;
        Solution::from_vector(self.previous.space_shared(), coefficients)
    }

    fn element_block(&self, e: ElementIndex, cache: &mut BasisCache) -> ElementBlock {
        let n_local = N_COMPONENTS * self.space.n_basis(e);
        let rule = cache.for_order(self.space.order(e));
        let mut block = ElementBlock {
            offset: self.space.element_dofs(e).start,
            matrix: Mat::zeros(n_local, n_local),
            rhs: vec![0.0; n_local],
        };
        self.weak_form
            .element_forms(self.previous, e, &rule, &mut block.matrix, &mut block.rhs);
        block
    }

    #[cfg(not(feature = "parallel"))]
    fn element_blocks(&self) -> Vec<ElementBlock> {
        let mut cache = BasisCache::new();
        self.space
            .mesh()
            .elements()
            .map(|e| self.element_block(e, &mut cache))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn element_blocks(&self) -> Vec<ElementBlock> {
        use rayon::prelude::*;

        (0..self.space.n_elements())
            .into_par_iter()
            .map_init(BasisCache::new, |cache, e| self.element_block(ElementIndex::new(e), cache))
            .collect()
    }
}
