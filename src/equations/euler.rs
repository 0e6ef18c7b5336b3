//! 2D compressible Euler equations.
//!
//! ∂w/∂t + ∂f₁(w)/∂x + ∂f₂(w)/∂y = 0
//!
//! with conserved variables w = (ρ, ρv₁, ρv₂, E) and the ideal gas law
//! p = (κ - 1)(E - ρ|v|²/2).
//!
//! # Flux formulation
//!
//! f₁(w) = [ρv₁, ρv₁² + p, ρv₁v₂, (E + p)v₁]ᵀ
//! f₂(w) = [ρv₂, ρv₁v₂, ρv₂² + p, (E + p)v₂]ᵀ
//!
//! Both fluxes are homogeneous of degree one, so f_i(w) = A_i(w) w with the
//! flux Jacobians A_i = ∂f_i/∂w. The semi-implicit scheme linearizes the
//! fluxes around the previous time level through exactly this identity.

use std::ops::{Add, AddAssign, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::error::{EulerError, Result};

/// Dense 4×4 matrix acting on Euler states, row-major.
pub type Matrix4 = [[f64; 4]; 4];

/// Matrix-vector product.
#[inline]
pub fn mat_vec(m: &Matrix4, v: &[f64; 4]) -> [f64; 4] {
    let mut out = [0.0; 4];
    for (row, o) in m.iter().zip(out.iter_mut()) {
        *o = row[0] * v[0] + row[1] * v[1] + row[2] * v[2] + row[3] * v[3];
    }
    out
}

/// Matrix-matrix product.
#[inline]
pub fn mat_mul(a: &Matrix4, b: &Matrix4) -> Matrix4 {
    let mut out = [[0.0; 4]; 4];
    for i in 0..4 {
        for j in 0..4 {
            out[i][j] = (0..4).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

/// Conserved state (ρ, ρv₁, ρv₂, E).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EulerState {
    /// Density ρ
    pub rho: f64,
    /// x-momentum ρv₁
    pub rho_v_x: f64,
    /// y-momentum ρv₂
    pub rho_v_y: f64,
    /// Total energy per unit volume E
    pub energy: f64,
}

impl EulerState {
    /// Number of conserved variables.
    pub const N_VARS: usize = 4;

    /// Create a new state from conserved variables.
    #[inline(always)]
    pub fn new(rho: f64, rho_v_x: f64, rho_v_y: f64, energy: f64) -> Self {
        Self {
            rho,
            rho_v_x,
            rho_v_y,
            energy,
        }
    }

    /// Create a zero state.
    #[inline(always)]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Velocity (v₁, v₂).
    #[inline(always)]
    pub fn velocity(&self) -> (f64, f64) {
        let inv = 1.0 / self.rho;
        (self.rho_v_x * inv, self.rho_v_y * inv)
    }

    /// Convert to array representation [ρ, ρv₁, ρv₂, E].
    #[inline(always)]
    pub fn to_array(&self) -> [f64; 4] {
        [self.rho, self.rho_v_x, self.rho_v_y, self.energy]
    }

    /// Create from array representation [ρ, ρv₁, ρv₂, E].
    #[inline(always)]
    pub fn from_array(arr: [f64; 4]) -> Self {
        Self::new(arr[0], arr[1], arr[2], arr[3])
    }

    /// Component by index (0 = ρ, 1 = ρv₁, 2 = ρv₂, 3 = E).
    #[inline(always)]
    pub fn component(&self, i: usize) -> f64 {
        self.to_array()[i]
    }

    /// Sum of the squared components.
    #[inline]
    pub fn norm_squared(&self) -> f64 {
        self.rho * self.rho + self.rho_v_x * self.rho_v_x + self.rho_v_y * self.rho_v_y + self.energy * self.energy
    }
}

impl Add for EulerState {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            rho: self.rho + other.rho,
            rho_v_x: self.rho_v_x + other.rho_v_x,
            rho_v_y: self.rho_v_y + other.rho_v_y,
            energy: self.energy + other.energy,
        }
    }
}

impl AddAssign for EulerState {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for EulerState {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            rho: self.rho - other.rho,
            rho_v_x: self.rho_v_x - other.rho_v_x,
            rho_v_y: self.rho_v_y - other.rho_v_y,
            energy: self.energy - other.energy,
        }
    }
}

impl Mul<f64> for EulerState {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self {
        Self {
            rho: self.rho * scalar,
            rho_v_x: self.rho_v_x * scalar,
            rho_v_y: self.rho_v_y * scalar,
            energy: self.energy * scalar,
        }
    }
}

impl Mul<EulerState> for f64 {
    type Output = EulerState;

    fn mul(self, state: EulerState) -> EulerState {
        state * self
    }
}

/// Compressible Euler equations of an ideal gas.
///
/// # Example
///
/// ```
/// use dg_euler::equations::EulerEquations;
///
/// let euler = EulerEquations::new(1.4);
/// let w = euler.from_primitives(1.4, 3.0, 0.0, 1.0);
/// assert!((euler.pressure(&w) - 1.0).abs() < 1e-12);
/// assert!((euler.sound_speed(&w) - 1.0).abs() < 1e-12);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EulerEquations {
    /// Heat capacity ratio κ
    pub kappa: f64,
}

impl Default for EulerEquations {
    fn default() -> Self {
        Self::new(1.4)
    }
}

impl EulerEquations {
    /// Create the equations for a given heat capacity ratio.
    pub fn new(kappa: f64) -> Self {
        Self { kappa }
    }

    /// Conserved state from density, velocity and pressure.
    pub fn from_primitives(&self, rho: f64, v_x: f64, v_y: f64, pressure: f64) -> EulerState {
        EulerState::new(
            rho,
            rho * v_x,
            rho * v_y,
            self.energy(rho, rho * v_x, rho * v_y, pressure),
        )
    }

    /// Total energy E = p/(κ-1) + |ρv|²/(2ρ).
    #[inline]
    pub fn energy(&self, rho: f64, rho_v_x: f64, rho_v_y: f64, pressure: f64) -> f64 {
        pressure / (self.kappa - 1.0) + (rho_v_x * rho_v_x + rho_v_y * rho_v_y) / (2.0 * rho)
    }

    /// Pressure p = (κ-1)(E - |ρv|²/(2ρ)).
    #[inline]
    pub fn pressure(&self, w: &EulerState) -> f64 {
        (self.kappa - 1.0) * (w.energy - (w.rho_v_x * w.rho_v_x + w.rho_v_y * w.rho_v_y) / (2.0 * w.rho))
    }

    /// Speed of sound c = sqrt(κ p / ρ).
    #[inline]
    pub fn sound_speed(&self, w: &EulerState) -> f64 {
        (self.kappa * self.pressure(w) / w.rho).max(0.0).sqrt()
    }

    /// Local Mach number |v| / c.
    pub fn mach_number(&self, w: &EulerState) -> f64 {
        let (u, v) = w.velocity();
        (u * u + v * v).sqrt() / self.sound_speed(w)
    }

    /// Total specific enthalpy H = (E + p) / ρ.
    #[inline]
    pub fn enthalpy(&self, w: &EulerState) -> f64 {
        (w.energy + self.pressure(w)) / w.rho
    }

    /// Entropy estimate ln((p / p_ref) / (ρ / ρ_ref)^κ).
    pub fn entropy_estimate(&self, w: &EulerState, rho_ref: f64, p_ref: f64) -> f64 {
        ((self.pressure(w) / p_ref) / (w.rho / rho_ref).powf(self.kappa)).ln()
    }

    /// Maximum characteristic speed |v| + c.
    pub fn max_wave_speed(&self, w: &EulerState) -> f64 {
        let (u, v) = w.velocity();
        (u * u + v * v).sqrt() + self.sound_speed(w)
    }

    /// Whether density and pressure are positive and finite.
    pub fn is_physical(&self, w: &EulerState) -> bool {
        let p = self.pressure(w);
        w.rho > 0.0 && p > 0.0 && w.rho.is_finite() && p.is_finite()
    }

    /// Like [`EulerEquations::is_physical`], reporting the offending element.
    ///
    /// # Errors
    /// `EulerError::NonPhysicalState` for non-positive density or pressure.
    pub fn check_physical(&self, w: &EulerState, element: usize) -> Result<()> {
        if self.is_physical(w) {
            Ok(())
        } else {
            Err(EulerError::NonPhysicalState {
                element,
                density: w.rho,
                pressure: self.pressure(w),
            })
        }
    }

    /// Flux in the x-direction f₁(w).
    pub fn flux_x(&self, w: &EulerState) -> EulerState {
        let p = self.pressure(w);
        let u = w.rho_v_x / w.rho;
        EulerState::new(w.rho_v_x, w.rho_v_x * u + p, w.rho_v_y * u, (w.energy + p) * u)
    }

    /// Flux in the y-direction f₂(w).
    pub fn flux_y(&self, w: &EulerState) -> EulerState {
        let p = self.pressure(w);
        let v = w.rho_v_y / w.rho;
        EulerState::new(w.rho_v_y, w.rho_v_x * v, w.rho_v_y * v + p, (w.energy + p) * v)
    }

    /// Normal flux f₁ n_x + f₂ n_y.
    pub fn normal_flux(&self, w: &EulerState, normal: (f64, f64)) -> EulerState {
        self.flux_x(w) * normal.0 + self.flux_y(w) * normal.1
    }

    /// Flux Jacobian A₁ = ∂f₁/∂w.
    pub fn jacobian_x(&self, w: &EulerState) -> Matrix4 {
        let g = self.kappa;
        let (u, v) = w.velocity();
        let q2 = u * u + v * v;
        let e = w.energy / w.rho;
        [
            [0.0, 1.0, 0.0, 0.0],
            [0.5 * (g - 1.0) * q2 - u * u, (3.0 - g) * u, -(g - 1.0) * v, g - 1.0],
            [-u * v, v, u, 0.0],
            [
                u * ((g - 1.0) * q2 - g * e),
                g * e - 0.5 * (g - 1.0) * (q2 + 2.0 * u * u),
                -(g - 1.0) * u * v,
                g * u,
            ],
        ]
    }

    /// Flux Jacobian A₂ = ∂f₂/∂w.
    pub fn jacobian_y(&self, w: &EulerState) -> Matrix4 {
        let g = self.kappa;
        let (u, v) = w.velocity();
        let q2 = u * u + v * v;
        let e = w.energy / w.rho;
        [
            [0.0, 0.0, 1.0, 0.0],
            [-u * v, v, u, 0.0],
            [0.5 * (g - 1.0) * q2 - v * v, -(g - 1.0) * u, (3.0 - g) * v, g - 1.0],
            [
                v * ((g - 1.0) * q2 - g * e),
                -(g - 1.0) * u * v,
                g * e - 0.5 * (g - 1.0) * (q2 + 2.0 * v * v),
                g * v,
            ],
        ]
    }

    /// Normal flux Jacobian A₁ n_x + A₂ n_y.
    pub fn normal_jacobian(&self, w: &EulerState, normal: (f64, f64)) -> Matrix4 {
        let a1 = self.jacobian_x(w);
        let a2 = self.jacobian_y(w);
        let mut out = [[0.0; 4]; 4];
        for i in 0..4 {
            for j in 0..4 {
                out[i][j] = a1[i][j] * normal.0 + a2[i][j] * normal.1;
            }
        }
        out
    }

    /// Gradient of the pressure with respect to the conserved variables,
    /// ∂p/∂w = (κ-1)(|v|²/2, -v₁, -v₂, 1).
    pub fn pressure_gradient(&self, w: &EulerState) -> [f64; 4] {
        let (u, v) = w.velocity();
        let k = self.kappa - 1.0;
        [k * 0.5 * (u * u + v * v), -k * u, -k * v, k]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_state(euler: &EulerEquations) -> EulerState {
        euler.from_primitives(1.2, 0.7, -0.4, 0.9)
    }

    #[test]
    fn test_primitive_roundtrip() {
        let euler = EulerEquations::default();
        let w = sample_state(&euler);
        let (u, v) = w.velocity();
        assert_relative_eq!(u, 0.7, epsilon = 1e-14);
        assert_relative_eq!(v, -0.4, epsilon = 1e-14);
        assert_relative_eq!(euler.pressure(&w), 0.9, epsilon = 1e-14);
    }

    #[test]
    fn test_jacobians_are_homogeneous() {
        let euler = EulerEquations::default();
        let w = sample_state(&euler);
        let a1w = mat_vec(&euler.jacobian_x(&w), &w.to_array());
        let a2w = mat_vec(&euler.jacobian_y(&w), &w.to_array());
        let f1 = euler.flux_x(&w).to_array();
        let f2 = euler.flux_y(&w).to_array();
        for i in 0..4 {
            assert_relative_eq!(a1w[i], f1[i], epsilon = 1e-13);
            assert_relative_eq!(a2w[i], f2[i], epsilon = 1e-13);
        }
    }

    #[test]
    fn test_jacobian_matches_finite_difference() {
        let euler = EulerEquations::default();
        let w = sample_state(&euler);
        let a1 = euler.jacobian_x(&w);
        let h = 1e-6;
        for j in 0..4 {
            let mut plus = w.to_array();
            let mut minus = w.to_array();
            plus[j] += h;
            minus[j] -= h;
            let fp = euler.flux_x(&EulerState::from_array(plus)).to_array();
            let fm = euler.flux_x(&EulerState::from_array(minus)).to_array();
            for i in 0..4 {
                assert_relative_eq!(a1[i][j], (fp[i] - fm[i]) / (2.0 * h), epsilon = 1e-7);
            }
        }
    }

    #[test]
    fn test_pressure_gradient() {
        let euler = EulerEquations::default();
        let w = sample_state(&euler);
        let grad = euler.pressure_gradient(&w);
        // p is homogeneous of degree one in w
        let p: f64 = grad.iter().zip(w.to_array()).map(|(g, x)| g * x).sum();
        assert_relative_eq!(p, euler.pressure(&w), epsilon = 1e-14);
    }

    #[test]
    fn test_quantities() {
        let euler = EulerEquations::default();
        let w = euler.from_primitives(1.0, 0.0, 0.0, 1.0 / 1.4);
        assert_relative_eq!(euler.sound_speed(&w), 1.0, epsilon = 1e-14);
        assert_relative_eq!(euler.mach_number(&w), 0.0);
        assert_relative_eq!(euler.entropy_estimate(&w, 1.0, 1.0 / 1.4), 0.0, epsilon = 1e-14);
        assert!(euler.is_physical(&w));

        let bad = EulerState::new(1.0, 0.0, 0.0, -1.0);
        assert!(!euler.is_physical(&bad));
        assert!(matches!(
            euler.check_physical(&bad, 7),
            Err(EulerError::NonPhysicalState { element: 7, .. })
        ));
    }

    #[test]
    fn test_state_arithmetic() {
        let a = EulerState::new(1.0, 2.0, 3.0, 4.0);
        let b = EulerState::new(0.5, 0.5, 0.5, 0.5);
        assert_eq!(a + b, EulerState::new(1.5, 2.5, 3.5, 4.5));
        assert_eq!(a - b, EulerState::new(0.5, 1.5, 2.5, 3.5));
        assert_eq!(2.0 * b, EulerState::new(1.0, 1.0, 1.0, 1.0));
        assert_eq!(a.component(3), 4.0);
    }
}
