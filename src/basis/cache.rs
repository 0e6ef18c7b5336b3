//! Lazily built volume rules, one per (order, number of points).

use std::collections::HashMap;
use std::sync::Arc;

use super::tensor::VolumeRule;

/// Cache of tabulated volume rules.
///
/// Assembly and projection visit many elements of the same order; the basis
/// tabulation at the Gauss points is computed once per order and shared.
#[derive(Clone, Debug, Default)]
pub struct BasisCache {
    rules: HashMap<(usize, usize), Arc<VolumeRule>>,
}

impl BasisCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rule with `n_points` points per direction tabulating the order-`order` basis.
    pub fn volume_rule(&mut self, order: usize, n_points: usize) -> Arc<VolumeRule> {
        Arc::clone(
            self.rules
                .entry((order, n_points))
                .or_insert_with(|| Arc::new(VolumeRule::with_points(order, n_points))),
        )
    }

    /// Default rule of an order (p+2 points per direction).
    pub fn for_order(&mut self, order: usize) -> Arc<VolumeRule> {
        self.volume_rule(order, order + 2)
    }

    /// Number of cached rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
