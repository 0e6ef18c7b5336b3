//! Shock capturing: discontinuity detection and limiting.
//!
//! Detectors flag elements whose solution is not smooth. The
//! [`FluxLimiter`] then reduces the higher modes of the flagged elements
//! while keeping their cell averages, and can lower the polynomial order of
//! the corresponding coarse elements.

mod feistauer;
mod flux_limiter;
mod krivodonova;
mod kuzmin;

pub use feistauer::FeistauerIndicator;
pub use flux_limiter::{FluxLimiter, LimiterKind};
pub use krivodonova::KrivodonovaDetector;
pub use kuzmin::{KuzminDetector, KuzminFactors};

use crate::mesh::FaceSet;
use crate::solution::Solution;
use crate::types::ElementIndex;

/// Flags elements containing a discontinuity.
pub trait DiscontinuityDetector: Send + Sync {
    /// Discontinuous elements in ascending order.
    fn detect(&self, solution: &Solution, faces: &FaceSet) -> Vec<ElementIndex>;

    /// Short identifier used in logs.
    fn name(&self) -> &'static str;
}
