//! Saving and restoring computations.
//!
//! Records are JSON files written with `serde_json`; see
//! [`CalculationContinuity`].

mod checkpoint;

pub use checkpoint::{CalculationContinuity, Record, SpaceRecord};
