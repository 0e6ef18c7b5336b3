//! Saving and resuming a computation ("calculation continuity").
//!
//! Every record is a JSON file `record-<n>.json` in one directory holding
//! the time, the time step lengths, the active cells of the mesh, the
//! element orders and the solution coefficients. A run can be resumed from
//! the last record with the same base mesh.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EulerError, Result};
use crate::mesh::{AdaptiveMesh, CellId, Mesh2D};
use crate::solution::Solution;
use crate::space::L2Space;

const RECORD_PREFIX: &str = "record-";
const RECORD_SUFFIX: &str = ".json";

/// Active cells and element orders of a saved space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpaceRecord {
    pub leaves: Vec<CellId>,
    pub coarsening_floor: Vec<CellId>,
    pub orders: Vec<usize>,
}

impl SpaceRecord {
    fn of(space: &L2Space) -> Self {
        let mesh = space.mesh();
        Self {
            leaves: mesh.leaves().to_vec(),
            coarsening_floor: mesh.coarsening_floor(),
            orders: space.orders().to_vec(),
        }
    }

    fn load(&self, base: Arc<Mesh2D>) -> Result<L2Space> {
        let mut mesh = AdaptiveMesh::from_leaves(base, self.leaves.clone())?;
        mesh.restore_coarsening_floor(self.coarsening_floor.iter().copied());
        L2Space::with_orders(mesh, self.orders.clone())
    }
}

/// One saved state of a computation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Sequence number of the record
    pub number: usize,
    /// Time step counter when the record was made
    pub iteration: usize,
    pub time: f64,
    /// Length of the next time step
    pub time_step: f64,
    /// Length of the last time step
    pub time_step_n_minus_one: f64,
    /// Number of base elements, checked on load
    pub n_base_elements: usize,
    /// Space of the solution
    pub space: SpaceRecord,
    /// Coarse space of an adaptive computation
    pub coarse_space: Option<SpaceRecord>,
    pub coefficients: Vec<f64>,
}

impl Record {
    fn check_base(&self, base: &Mesh2D) -> Result<()> {
        if base.n_elements != self.n_base_elements {
            return Err(EulerError::Checkpoint(format!(
                "record {} was saved on a base mesh of {} elements, got {}",
                self.number, self.n_base_elements, base.n_elements
            )));
        }
        Ok(())
    }

    /// Restore the mesh of the saved solution on `base`.
    ///
    /// # Errors
    /// `EulerError::Checkpoint` if the base mesh does not match, and
    /// `EulerError::InvalidMesh` if the saved cells do not tile it.
    pub fn load_mesh(&self, base: Arc<Mesh2D>) -> Result<AdaptiveMesh> {
        Ok(self.load_space(base)?.mesh().clone())
    }

    /// Restore the space of the saved solution.
    pub fn load_space(&self, base: Arc<Mesh2D>) -> Result<L2Space> {
        self.check_base(&base)?;
        self.space.load(base)
    }

    /// Restore the coarse space, if one was saved.
    pub fn load_coarse_space(&self, base: Arc<Mesh2D>) -> Result<Option<L2Space>> {
        self.check_base(&base)?;
        self.coarse_space.as_ref().map(|s| s.load(base)).transpose()
    }

    /// Restore the saved solution together with its space.
    pub fn load_solution(&self, base: Arc<Mesh2D>) -> Result<Solution> {
        let space = Arc::new(self.load_space(base)?);
        Solution::from_vector(space, self.coefficients.clone())
    }
}

/// Directory of numbered records.
#[derive(Clone, Debug)]
pub struct CalculationContinuity {
    dir: PathBuf,
    count: usize,
}

impl CalculationContinuity {
    /// Open (and create if needed) a record directory.
    ///
    /// Existing records are counted so that new ones continue the sequence.
    pub fn new<P: Into<PathBuf>>(dir: P) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let count = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| record_number(&entry.path()))
            .map(|n| n + 1)
            .max()
            .unwrap_or(0);
        debug!(dir = %dir.display(), records = count, "opened checkpoint directory");
        Ok(Self { dir, count })
    }

    /// The record directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of records written so far.
    #[inline]
    pub fn num(&self) -> usize {
        self.count
    }

    pub fn have_record_available(&self) -> bool {
        self.count > 0
    }

    /// Save the current state, returning the path of the new record.
    ///
    /// Adaptive computations pass their coarse space as well.
    pub fn add_record(
        &mut self,
        iteration: usize,
        time: f64,
        time_step: f64,
        time_step_n_minus_one: f64,
        solution: &Solution,
        coarse: Option<&L2Space>,
    ) -> Result<PathBuf> {
        let space = solution.space();
        let record = Record {
            number: self.count,
            iteration,
            time,
            time_step,
            time_step_n_minus_one,
            n_base_elements: space.mesh().base().n_elements,
            space: SpaceRecord::of(space),
            coarse_space: coarse.map(SpaceRecord::of),
            coefficients: solution.coefficients().to_vec(),
        };

        let path = self.record_path(self.count);
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer(&mut writer, &record)?;
        writer.flush()?;

        info!(record = self.count, time, path = %path.display(), "saved checkpoint");
        self.count += 1;
        Ok(path)
    }

    /// Read record `number`.
    ///
    /// # Errors
    /// `EulerError::Checkpoint` if it does not exist.
    pub fn record(&self, number: usize) -> Result<Record> {
        let path = self.record_path(number);
        if !path.exists() {
            return Err(EulerError::Checkpoint(format!("no record {number} in {}", self.dir.display())));
        }
        let reader = BufReader::new(File::open(&path)?);
        let record: Record = serde_json::from_reader(reader)?;
        if record.number != number {
            return Err(EulerError::Checkpoint(format!(
                "{} holds record {} instead of {number}",
                path.display(),
                record.number
            )));
        }
        Ok(record)
    }

    /// Read the most recent record.
    ///
    /// # Errors
    /// `EulerError::Checkpoint` if no record was written yet.
    pub fn last_record(&self) -> Result<Record> {
        match self.count {
            0 => Err(EulerError::Checkpoint(format!("no records in {}", self.dir.display()))),
            n => self.record(n - 1),
        }
    }

    fn record_path(&self, number: usize) -> PathBuf {
        self.dir.join(format!("{RECORD_PREFIX}{number}{RECORD_SUFFIX}"))
    }
}

fn record_number(path: &Path) -> Option<usize> {
    path.file_name()?
        .to_str()?
        .strip_prefix(RECORD_PREFIX)?
        .strip_suffix(RECORD_SUFFIX)?
        .parse()
        .ok()
}
