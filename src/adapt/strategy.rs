//! Element marking strategies.

use serde::{Deserialize, Serialize};

use crate::error::{EulerError, Result};
use crate::types::ElementIndex;

/// Rule deciding which elements get refined, given their errors.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptStrategy {
    /// Refine the largest errors until their squared sum reaches the given
    /// fraction of the total squared error
    Cumulative(f64),
    /// Refine elements whose error exceeds the given fraction of the
    /// largest element error
    RelativeToMax(f64),
    /// Refine elements whose error exceeds the given value
    Absolute(f64),
}

impl Default for AdaptStrategy {
    fn default() -> Self {
        Self::RelativeToMax(0.3)
    }
}

impl AdaptStrategy {
    /// Check the threshold.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Cumulative(t) | Self::RelativeToMax(t) if !(t > 0.0 && t <= 1.0) => Err(
                EulerError::InvalidConfig(format!("adapt threshold must lie in (0, 1], got {t}")),
            ),
            Self::Absolute(t) if !(t > 0.0) => Err(EulerError::InvalidConfig(format!(
                "absolute adapt threshold must be positive, got {t}"
            ))),
            _ => Ok(()),
        }
    }

    /// Elements to refine, in order of decreasing error.
    ///
    /// `errors_squared` holds one squared error per element; elements with
    /// zero error are never marked.
    pub fn mark(&self, errors_squared: &[f64]) -> Vec<ElementIndex> {
        let mut order: Vec<usize> = (0..errors_squared.len())
            .filter(|&i| errors_squared[i] > 0.0)
            .collect();
        order.sort_by(|&a, &b| errors_squared[b].total_cmp(&errors_squared[a]));

        let marked: Vec<usize> = match *self {
            Self::Cumulative(fraction) => {
                let total: f64 = errors_squared.iter().sum();
                let mut processed = 0.0;
                let mut marked = Vec::new();
                for i in order {
                    if processed >= fraction * total {
                        break;
                    }
                    processed += errors_squared[i];
                    marked.push(i);
                }
                marked
            }
            Self::RelativeToMax(fraction) => {
                let max = order.first().map_or(0.0, |&i| errors_squared[i].sqrt());
                order
                    .into_iter()
                    .take_while(|&i| errors_squared[i].sqrt() > fraction * max)
                    .collect()
            }
            Self::Absolute(threshold) => order
                .into_iter()
                .take_while(|&i| errors_squared[i].sqrt() > threshold)
                .collect(),
        };
        marked.into_iter().map(ElementIndex::new).collect()
    }
}
