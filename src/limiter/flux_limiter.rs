//! Flux limiting according to a discontinuity detector.
//!
//! The limiter owns a copy of the solution and modifies its modal
//! coefficients in place. Cell averages are never changed. When a coarse
//! space is passed, every coarse element containing a limited element has
//! its order reduced so that the next adaptivity step does not reintroduce
//! the oscillation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::DiscontinuityDetector;
use super::krivodonova::KrivodonovaDetector;
use super::kuzmin::{KuzminDetector, truncated};
use crate::mesh::FaceSet;
use crate::solution::Solution;
use crate::space::{L2Space, N_COMPONENTS};
use crate::types::ElementIndex;

/// Value of the first Legendre mode in one direction times the constant
/// mode in the other: φ_(1,0) = (√3 / 2) ξ.
const LINEAR_MODE_SCALE: f64 = 0.866_025_403_784_438_6;

/// Limiting method.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LimiterKind {
    /// Vertex-based hierarchical limiting
    Kuzmin,
    /// Inflow-jump detection with minmod limiting of the first moments
    Krivodonova { param: f64 },
}

/// Limits a solution according to a discontinuity detector.
#[derive(Clone, Debug)]
pub struct FluxLimiter {
    kind: LimiterKind,
    solution: Solution,
    faces: FaceSet,
    limit_oscillations: bool,
}

impl FluxLimiter {
    /// Limiter for a copy of `solution`.
    pub fn new(kind: LimiterKind, solution: &Solution) -> Self {
        Self {
            kind,
            faces: FaceSet::new(solution.space().mesh()),
            solution: solution.clone(),
            limit_oscillations: false,
        }
    }

    /// Enable repeated limiting in [`FluxLimiter::limit_repeatedly`].
    pub fn with_oscillation_limiting(mut self, enabled: bool) -> Self {
        self.limit_oscillations = enabled;
        self
    }

    /// The limiting method.
    #[inline]
    pub fn kind(&self) -> LimiterKind {
        self.kind
    }

    /// Current (limited) solution.
    #[inline]
    pub fn limited_solution(&self) -> &Solution {
        &self.solution
    }

    /// Consume the limiter, returning the limited solution.
    pub fn into_solution(self) -> Solution {
        self.solution
    }

    /// Elements flagged by the detector of this limiter.
    pub fn detect(&self) -> Vec<ElementIndex> {
        match self.kind {
            LimiterKind::Kuzmin => KuzminDetector::new().detect(&self.solution, &self.faces),
            LimiterKind::Krivodonova { param } => {
                KrivodonovaDetector::new(param).detect(&self.solution, &self.faces)
            }
        }
    }

    /// Limit the first-order part of every discontinuous element.
    ///
    /// Returns the number of limited elements. Coarse elements containing a
    /// limited element are reset to order 0.
    pub fn limit_according_to_detector(&mut self, coarse: Option<&mut L2Space>) -> usize {
        let limited = match self.kind {
            LimiterKind::Kuzmin => self.limit_kuzmin_first_order(),
            LimiterKind::Krivodonova { param } => self.limit_krivodonova(param),
        };
        if let Some(coarse) = coarse {
            self.reset_coarse_orders(coarse, &limited, 0);
        }
        debug!(limiter = ?self.kind, limited = limited.len(), "first-order limiting");
        limited.len()
    }

    /// Limit the second-order part of elements of order 2 and higher.
    ///
    /// Only the Kuzmin limiter has a second-order stage; for other kinds
    /// this does nothing and returns 0. Coarse elements containing a limited
    /// element have their order capped at 1.
    pub fn limit_second_orders_according_to_detector(&mut self, coarse: Option<&mut L2Space>) -> usize {
        if self.kind != LimiterKind::Kuzmin {
            return 0;
        }
        let factors = KuzminDetector::new().factors(&self.solution, &self.faces);
        let mut limited = Vec::new();
        for (e, f) in factors.iter().enumerate() {
            if !f.second_order_active() {
                continue;
            }
            let e = ElementIndex::new(e);
            let basis = self.solution.space().basis(e);
            for comp in 0..N_COMPONENTS {
                let alpha_2 = f.second[comp];
                let alpha_1 = f.first[comp].max(alpha_2);
                let coeffs = self.solution.element_coefficients_mut(e, comp);
                for (k, c) in coeffs.iter_mut().enumerate() {
                    let (i, j) = basis.mode_degrees(k);
                    match i.max(j) {
                        0 => {}
                        1 => *c *= alpha_1,
                        _ => *c *= alpha_2,
                    }
                }
            }
            limited.push(e);
        }
        if let Some(coarse) = coarse {
            self.reset_coarse_orders(coarse, &limited, 1);
        }
        debug!(limited = limited.len(), "second-order limiting");
        limited.len()
    }

    /// Limit repeatedly while more than `threshold` elements are limited.
    ///
    /// Without oscillation limiting a single pass is made. Returns the
    /// number of limited elements of each pass.
    pub fn limit_repeatedly(&mut self, threshold: usize, max_passes: usize) -> Vec<usize> {
        let mut counts = Vec::new();
        loop {
            let limited = self.limit_according_to_detector(None);
            counts.push(limited);
            if !self.limit_oscillations || limited <= threshold || counts.len() >= max_passes {
                return counts;
            }
        }
    }

    fn limit_kuzmin_first_order(&mut self) -> Vec<ElementIndex> {
        let factors = KuzminDetector::new().factors(&self.solution, &self.faces);
        let mut limited = Vec::new();
        for (e, f) in factors.iter().enumerate() {
            if !f.first_order_active() {
                continue;
            }
            let e = ElementIndex::new(e);
            for comp in 0..N_COMPONENTS {
                let alpha = f.first[comp];
                for c in self.solution.element_coefficients_mut(e, comp).iter_mut().skip(1) {
                    *c *= alpha;
                }
            }
            limited.push(e);
        }
        limited
    }

    fn limit_krivodonova(&mut self, param: f64) -> Vec<ElementIndex> {
        let flagged = KrivodonovaDetector::new(param).detect(&self.solution, &self.faces);
        if flagged.is_empty() {
            return flagged;
        }
        let averages = self.solution.cell_averages();
        let space = self.solution.space_shared();
        let mesh = space.mesh();

        for &e in &flagged {
            let basis = space.basis(e);
            if basis.order == 0 {
                continue;
            }
            let geometry = mesh.geometry(e);
            let neighbors: Vec<(ElementIndex, (f64, f64))> = self
                .faces
                .neighbors(e)
                .into_iter()
                .map(|nb| {
                    let c = mesh.geometry(nb).center;
                    (nb, geometry.to_reference(c.0, c.1))
                })
                .collect();

            for comp in 0..N_COMPONENTS {
                let avg = averages[e.get()].component(comp);
                // Slopes per unit reference length
                let (_, gx, gy) = truncated(&self.solution, e, comp, 1, 0.0, 0.0);
                let j = &geometry.jacobian;
                let slope_xi = gx * j[0][0] + gy * j[1][0];
                let slope_eta = gx * j[0][1] + gy * j[1][1];

                let directional = |select: fn((f64, f64)) -> f64, forward: bool| -> Option<f64> {
                    let slopes: Vec<f64> = neighbors
                        .iter()
                        .filter(|(_, r)| {
                            let d = select(*r);
                            if forward { d > 1.0 } else { d < -1.0 }
                        })
                        .map(|(nb, r)| (averages[nb.get()].component(comp) - avg) / select(*r))
                        .collect();
                    (!slopes.is_empty()).then(|| slopes.iter().sum::<f64>() / slopes.len() as f64)
                };

                let limited_xi = limit_slope(
                    slope_xi,
                    directional(|r| r.0, true),
                    directional(|r| r.0, false),
                );
                let limited_eta = limit_slope(
                    slope_eta,
                    directional(|r| r.1, true),
                    directional(|r| r.1, false),
                );

                let coeffs = self.solution.element_coefficients_mut(e, comp);
                for (k, c) in coeffs.iter_mut().enumerate() {
                    match basis.mode_degrees(k) {
                        (0, 0) => {}
                        (1, 0) => *c = limited_xi / LINEAR_MODE_SCALE,
                        (0, 1) => *c = limited_eta / LINEAR_MODE_SCALE,
                        _ => *c = 0.0,
                    }
                }
            }
        }
        flagged
    }

    fn reset_coarse_orders(&self, coarse: &mut L2Space, limited: &[ElementIndex], max_order: usize) {
        let fine_mesh = self.solution.space().mesh();
        let mut orders = coarse.orders().to_vec();
        let mut changed = false;
        for &e in limited {
            let cell = fine_mesh.cell(e);
            let targets = match coarse.mesh().leaf_containing(cell) {
                Some(c) => vec![c],
                None => coarse.mesh().leaves_within(cell),
            };
            for c in targets {
                if orders[c.get()] > max_order {
                    orders[c.get()] = max_order;
                    changed = true;
                }
            }
        }
        if changed {
            for (e, p) in orders.into_iter().enumerate() {
                let e = ElementIndex::new(e);
                if coarse.order(e) != p {
                    coarse.set_order(e, p);
                }
            }
        }
    }
}

/// minmod of the own slope and the one-sided neighbour slopes; a missing
/// side does not restrict the slope.
fn limit_slope(own: f64, forward: Option<f64>, backward: Option<f64>) -> f64 {
    let forward = forward.unwrap_or(own);
    let backward = backward.unwrap_or(own);
    minmod(own, forward, backward)
}

fn minmod(a: f64, b: f64, c: f64) -> f64 {
    if a > 0.0 && b > 0.0 && c > 0.0 {
        a.min(b).min(c)
    } else if a < 0.0 && b < 0.0 && c < 0.0 {
        a.max(b).max(c)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equations::EulerEquations;
    use crate::mesh::{AdaptiveMesh, BoundaryMarker, Mesh2D};
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn space(order: usize) -> Arc<L2Space> {
        let sides = [1, 2, 3, 4].map(BoundaryMarker::new);
        let mesh = Mesh2D::uniform_rectangle_with_sides(0.0, 1.0, 0.0, 1.0, 4, 4, sides).unwrap();
        Arc::new(L2Space::new(AdaptiveMesh::new(mesh), order))
    }

    fn step(order: usize) -> Solution {
        let euler = EulerEquations::default();
        Solution::project_function(space(order), move |x, _| {
            let rho = if x < 0.6 { 1.0 } else { 0.1 };
            euler.from_primitives(rho, 1.0, 0.0, 1.0)
        })
    }

    #[test]
    fn test_kuzmin_preserves_averages_and_removes_overshoot() {
        let solution = step(1);
        let mut limiter = FluxLimiter::new(LimiterKind::Kuzmin, &solution);
        let limited = limiter.limit_according_to_detector(None);
        assert!(limited > 0);

        let result = limiter.limited_solution();
        for e in result.space().mesh().elements() {
            let a = solution.cell_average(e);
            let b = result.cell_average(e);
            for i in 0..4 {
                assert_relative_eq!(a.component(i), b.component(i), epsilon = 1e-13);
            }
        }
        assert!(limiter.detect().is_empty());
    }

    #[test]
    fn test_coarse_orders_are_reset() {
        let coarse_space = space(1);
        let fine_space = Arc::new(coarse_space.reference_space(0));
        let euler = EulerEquations::default();
        let fine = Solution::project_function(fine_space, |x, _| {
            let rho = if x < 0.6 { 1.0 } else { 0.1 };
            euler.from_primitives(rho, 1.0, 0.0, 1.0)
        });
        let mut coarse = coarse_space.as_ref().clone();
        let mut limiter = FluxLimiter::new(LimiterKind::Kuzmin, &fine);
        let limited = limiter.limit_according_to_detector(Some(&mut coarse));
        assert!(limited > 0);
        let reset = coarse.orders().iter().filter(|&&p| p == 0).count();
        assert!(reset > 0 && reset < coarse.n_elements());
    }

    #[test]
    fn test_krivodonova_keeps_only_linear_modes() {
        let euler = EulerEquations::default();
        let solution = Solution::project_function(space(2), |x, _| {
            let rho = if x < 0.55 { 2.0 } else { 1.0 };
            euler.from_primitives(rho, 1.0, 0.0, 1.0)
        });
        let mut limiter = FluxLimiter::new(LimiterKind::Krivodonova { param: 1.0 }, &solution);
        let flagged = limiter.detect();
        assert!(!flagged.is_empty());
        assert_eq!(limiter.limit_according_to_detector(None), flagged.len());

        let result = limiter.limited_solution();
        for e in result.space().mesh().elements() {
            assert_relative_eq!(solution.cell_average(e).rho, result.cell_average(e).rho, epsilon = 1e-13);
        }
        let basis = result.space().basis(flagged[0]);
        for (k, &c) in result.element_coefficients(flagged[0], 0).iter().enumerate() {
            let (i, j) = basis.mode_degrees(k);
            if i + j > 1 {
                assert_eq!(c, 0.0);
            }
        }
    }

    #[test]
    fn test_second_order_stage_is_kuzmin_only() {
        let solution = step(2);
        let mut limiter = FluxLimiter::new(LimiterKind::Krivodonova { param: 1.0 }, &solution);
        assert_eq!(limiter.limit_second_orders_according_to_detector(None), 0);

        let mut limiter = FluxLimiter::new(LimiterKind::Kuzmin, &solution);
        let mut coarse = solution.space().clone();
        limiter.limit_second_orders_according_to_detector(Some(&mut coarse));
        assert!(coarse.orders().iter().all(|&p| p <= 2));
        assert!(coarse.orders().iter().any(|&p| p == 1));
    }

    #[test]
    fn test_repeated_limiting_stops() {
        let solution = step(1);
        let mut limiter = FluxLimiter::new(LimiterKind::Kuzmin, &solution).with_oscillation_limiting(true);
        let counts = limiter.limit_repeatedly(0, 5);
        assert!(counts.len() <= 5);
        assert_eq!(*counts.last().unwrap(), 0);
    }

    #[test]
    fn test_minmod() {
        assert_eq!(minmod(1.0, 2.0, 0.5), 0.5);
        assert_eq!(minmod(-1.0, -2.0, -0.5), -0.5);
        assert_eq!(minmod(1.0, -2.0, 0.5), 0.0);
        assert_eq!(limit_slope(1.0, None, Some(0.3)), 0.3);
    }
}
