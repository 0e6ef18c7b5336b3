//! Sparse linear system assembled from triplets.

use faer::prelude::*;
use faer::sparse::{SparseColMat, Triplet};
use faer::{Col, Mat};

use crate::error::{EulerError, Result};

/// Square sparse system A x = b in triplet form.
#[derive(Clone, Debug)]
pub struct LinearSystem {
    n: usize,
    triplets: Vec<Triplet<usize, usize, f64>>,
    rhs: Vec<f64>,
    merged: bool,
}

impl LinearSystem {
    /// Empty system of size n.
    pub fn new(n: usize) -> Self {
        Self {
            n,
            triplets: Vec::new(),
            rhs: vec![0.0; n],
            merged: true,
        }
    }

    /// Number of unknowns.
    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    /// Number of stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.triplets.len()
    }

    /// Right-hand side.
    #[inline]
    pub fn rhs(&self) -> &[f64] {
        &self.rhs
    }

    /// Stored entries.
    #[inline]
    pub fn triplets(&self) -> &[Triplet<usize, usize, f64>] {
        &self.triplets
    }

    /// Add a value to entry (row, col).
    #[inline]
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        debug_assert!(row < self.n && col < self.n);
        if value != 0.0 {
            self.triplets.push(Triplet::new(row, col, value));
            self.merged = false;
        }
    }

    /// Add a dense block at (row_offset, col_offset).
    pub fn add_block(&mut self, row_offset: usize, col_offset: usize, block: &Mat<f64>) {
        for j in 0..block.ncols() {
            for i in 0..block.nrows() {
                self.add(row_offset + i, col_offset + j, block[(i, j)]);
            }
        }
    }

    /// Add a local vector at `offset`.
    pub fn add_rhs(&mut self, offset: usize, values: &[f64]) {
        for (r, v) in self.rhs[offset..offset + values.len()].iter_mut().zip(values) {
            *r += v;
        }
    }

    /// Sum entries with the same position, ordered column by column.
    pub fn merge_duplicates(&mut self) {
        if self.merged {
            return;
        }
        self.triplets.sort_unstable_by_key(|t| (t.col, t.row));
        let mut merged: Vec<Triplet<usize, usize, f64>> = Vec::with_capacity(self.triplets.len());
        for t in self.triplets.drain(..) {
            match merged.last_mut() {
                Some(last) if last.row == t.row && last.col == t.col => last.val += t.val,
                _ => merged.push(t),
            }
        }
        self.triplets = merged;
        self.merged = true;
    }

    /// Product A x.
    pub fn apply(&self, x: &[f64]) -> Vec<f64> {
        let mut y = vec![0.0; self.n];
        for t in &self.triplets {
            y[t.row] += t.val * x[t.col];
        }
        y
    }

    /// Sparse matrix in compressed column form.
    ///
    /// # Errors
    /// `EulerError::LinearSolve` if the matrix cannot be built.
    pub fn matrix(&self) -> Result<SparseColMat<usize, f64>> {
        SparseColMat::try_new_from_triplets(self.n, self.n, &self.triplets)
            .map_err(|e| EulerError::LinearSolve(format!("failed to build sparse matrix: {e:?}")))
    }

    /// Solve with a sparse LU factorization.
    ///
    /// # Errors
    /// `EulerError::LinearSolve` if the factorization fails or the solution
    /// is not finite.
    pub fn solve(&self) -> Result<Vec<f64>> {
        if self.n == 0 {
            return Ok(Vec::new());
        }
        let matrix = if self.merged {
            self.matrix()?
        } else {
            let mut merged = self.clone();
            merged.merge_duplicates();
            merged.matrix()?
        };
        let lu = matrix
            .sp_lu()
            .map_err(|e| EulerError::LinearSolve(format!("sparse LU failed: {e:?}")))?;
        let b = Col::<f64>::from_fn(self.n, |i| self.rhs[i]);
        let x = lu.solve(&b);
        let solution: Vec<f64> = (0..self.n).map(|i| x[i]).collect();
        if solution.iter().any(|v| !v.is_finite()) {
            return Err(EulerError::LinearSolve("solution is not finite".to_string()));
        }
        Ok(solution)
    }
}
