//! Time step control.

mod cfl;

pub use cfl::CflCalculation;
