//! Derived scalar quantities of a solution.
//!
//! Filters turn the conserved state into pressure, Mach number or an entropy
//! estimate, pointwise or as element means.

use serde::{Deserialize, Serialize};

use super::discrete::Solution;
use crate::basis::BasisCache;
use crate::equations::{EulerEquations, EulerState};
use crate::types::ElementIndex;

/// Scalar quantity derived from the conserved state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuantityFilter {
    /// Density ρ
    Density,
    /// Pressure p
    Pressure,
    /// Local Mach number |v|/c
    MachNumber,
    /// ln((p/p_ref) / (ρ/ρ_ref)^κ)
    Entropy { rho_ref: f64, p_ref: f64 },
}

impl QuantityFilter {
    /// Value of the quantity for one state.
    pub fn evaluate(&self, euler: &EulerEquations, w: &EulerState) -> f64 {
        match *self {
            Self::Density => w.rho,
            Self::Pressure => euler.pressure(w),
            Self::MachNumber => euler.mach_number(w),
            Self::Entropy { rho_ref, p_ref } => euler.entropy_estimate(w, rho_ref, p_ref),
        }
    }

    /// Value at reference coordinates of an element.
    pub fn at_point(&self, euler: &EulerEquations, solution: &Solution, e: ElementIndex, xi: f64, eta: f64) -> f64 {
        self.evaluate(euler, &solution.evaluate(e, xi, eta))
    }

    /// Mean of the quantity over every element.
    pub fn element_means(&self, euler: &EulerEquations, solution: &Solution) -> Vec<f64> {
        let space = solution.space();
        let mut cache = BasisCache::new();
        space
            .mesh()
            .elements()
            .map(|e| {
                let rule = cache.for_order(space.order(e));
                let total: f64 = rule
                    .weights
                    .iter()
                    .enumerate()
                    .map(|(q, &w)| w * self.evaluate(euler, &solution.evaluate_tabulated(e, &rule.table, q)))
                    .sum();
                // Reference weights sum to 4
                0.25 * total
            })
            .collect()
    }

    /// (min, max) of the element means.
    pub fn range(&self, euler: &EulerEquations, solution: &Solution) -> (f64, f64) {
        self.element_means(euler, solution)
            .into_iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{AdaptiveMesh, BoundaryMarker, Mesh2D};
    use crate::space::L2Space;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn constant_solution(state: EulerState) -> Solution {
        let sides = [1, 2, 3, 4].map(BoundaryMarker::new);
        let mesh = Mesh2D::uniform_rectangle_with_sides(0.0, 1.0, 0.0, 1.0, 2, 2, sides).unwrap();
        Solution::constant(Arc::new(L2Space::new(AdaptiveMesh::new(mesh), 1)), state)
    }

    #[test]
    fn test_filters_on_constant_flow() {
        let euler = EulerEquations::default();
        let state = euler.from_primitives(1.4, 3.0, 0.0, 1.0);
        let solution = constant_solution(state);

        let mach = QuantityFilter::MachNumber.element_means(&euler, &solution);
        assert!(mach.iter().all(|&m| (m - 3.0).abs() < 1e-12));

        let (lo, hi) = QuantityFilter::Pressure.range(&euler, &solution);
        assert_relative_eq!(lo, 1.0, epsilon = 1e-12);
        assert_relative_eq!(hi, 1.0, epsilon = 1e-12);

        let entropy = QuantityFilter::Entropy { rho_ref: 1.4, p_ref: 1.0 };
        let value = entropy.at_point(&euler, &solution, ElementIndex::new(2), 0.3, 0.1);
        assert_relative_eq!(value, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_filter_serde() {
        let filter = QuantityFilter::Entropy { rho_ref: 0.5, p_ref: 1.5 };
        let json = serde_json::to_string(&filter).unwrap();
        let back: QuantityFilter = serde_json::from_str(&json).unwrap();
        assert_eq!(back, filter);
    }
}
