//! Steger-Warming flux vector splitting for the Euler equations.
//!
//! The normal flux Jacobian is diagonalized in a frame rotated to the face
//! normal:
//!
//! A_n(w) = Q⁻¹ T Λ T⁻¹ Q
//!
//! where Q rotates momentum into (normal, tangential) components, Λ holds
//! the eigenvalues (u-c, u, u, u+c) of the rotated x-Jacobian and T, T⁻¹ are
//! its right and left eigenvectors. Splitting Λ = Λ⁺ + Λ⁻ into non-negative
//! and non-positive parts gives
//!
//! P⁺ = Q⁻¹ T Λ⁺ T⁻¹ Q,    P⁻ = Q⁻¹ T Λ⁻ T⁻¹ Q
//!
//! and the numerical flux H(w_L, w_R, n) = P⁺(w_L) w_L + P⁻(w_R) w_R.
//!
//! Reference: Steger & Warming, "Flux vector splitting of the inviscid
//! gasdynamic equations with application to finite-difference methods",
//! J. Comput. Phys. 40 (1981).

use crate::equations::{EulerEquations, EulerState, Matrix4, mat_mul, mat_vec};

/// Rotation Q(n) of a state into the (normal, tangential) frame.
#[inline]
pub fn rotation(normal: (f64, f64)) -> Matrix4 {
    let (nx, ny) = normal;
    [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, nx, ny, 0.0],
        [0.0, -ny, nx, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Inverse rotation Q(n)⁻¹ = Q(n)ᵀ.
#[inline]
pub fn inverse_rotation(normal: (f64, f64)) -> Matrix4 {
    let (nx, ny) = normal;
    [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, nx, -ny, 0.0],
        [0.0, ny, nx, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Eigen-decomposition of the normal flux Jacobian at one state.
#[derive(Clone, Copy, Debug)]
pub struct CharacteristicDecomposition {
    /// Rotation into the face frame
    pub rotation: Matrix4,
    /// Eigenvalues (u-c, u, u, u+c) of the rotated Jacobian
    pub eigenvalues: [f64; 4],
    /// Right eigenvectors T as columns
    pub right: Matrix4,
    /// Left eigenvectors T⁻¹ as rows
    pub left: Matrix4,
}

impl CharacteristicDecomposition {
    /// Decompose A_n(w) for the unit normal `normal`.
    pub fn new(euler: &EulerEquations, w: &EulerState, normal: (f64, f64)) -> Self {
        let rotation = rotation(normal);
        let q = EulerState::from_array(mat_vec(&rotation, &w.to_array()));

        let (u, v) = q.velocity();
        let q2 = u * u + v * v;
        let c = euler.sound_speed(&q);
        let h = euler.enthalpy(&q);

        let right = [
            [1.0, 1.0, 0.0, 1.0],
            [u - c, u, 0.0, u + c],
            [v, v, 1.0, v],
            [h - u * c, 0.5 * q2, v, h + u * c],
        ];

        let b1 = (euler.kappa - 1.0) / (c * c);
        let b2 = 0.5 * b1 * q2;
        let left = [
            [
                0.5 * (b2 + u / c),
                -0.5 * (b1 * u + 1.0 / c),
                -0.5 * b1 * v,
                0.5 * b1,
            ],
            [1.0 - b2, b1 * u, b1 * v, -b1],
            [-v, 0.0, 1.0, 0.0],
            [
                0.5 * (b2 - u / c),
                -0.5 * (b1 * u - 1.0 / c),
                -0.5 * b1 * v,
                0.5 * b1,
            ],
        ];

        Self {
            rotation,
            eigenvalues: [u - c, u, u, u + c],
            right,
            left,
        }
    }

    /// Characteristic variables T⁻¹ Q w of a state.
    pub fn characteristic(&self, w: &EulerState) -> [f64; 4] {
        mat_vec(&self.left, &mat_vec(&self.rotation, &w.to_array()))
    }

    /// Q⁻¹ T f(Λ) T⁻¹ Q for a function applied to the eigenvalues.
    pub fn assemble<F>(&self, f: F) -> Matrix4
    where
        F: Fn(f64) -> f64,
    {
        let mut scaled = self.right;
        for row in scaled.iter_mut() {
            for (s, entry) in row.iter_mut().enumerate() {
                *entry *= f(self.eigenvalues[s]);
            }
        }
        let inverse = transpose(&self.rotation);
        mat_mul(&inverse, &mat_mul(&mat_mul(&scaled, &self.left), &self.rotation))
    }
}

fn transpose(m: &Matrix4) -> Matrix4 {
    let mut t = [[0.0; 4]; 4];
    for i in 0..4 {
        for j in 0..4 {
            t[i][j] = m[j][i];
        }
    }
    t
}

/// Positive part P⁺(w, n) of the normal flux Jacobian.
pub fn p_plus(euler: &EulerEquations, w: &EulerState, normal: (f64, f64)) -> Matrix4 {
    CharacteristicDecomposition::new(euler, w, normal).assemble(|l| l.max(0.0))
}

/// Negative part P⁻(w, n) of the normal flux Jacobian.
pub fn p_minus(euler: &EulerEquations, w: &EulerState, normal: (f64, f64)) -> Matrix4 {
    CharacteristicDecomposition::new(euler, w, normal).assemble(|l| l.min(0.0))
}

/// Both parts (P⁺, P⁻) from a single decomposition.
pub fn split_jacobians(euler: &EulerEquations, w: &EulerState, normal: (f64, f64)) -> (Matrix4, Matrix4) {
    let decomposition = CharacteristicDecomposition::new(euler, w, normal);
    (
        decomposition.assemble(|l| l.max(0.0)),
        decomposition.assemble(|l| l.min(0.0)),
    )
}

/// Steger-Warming numerical flux P⁺(w_L) w_L + P⁻(w_R) w_R.
pub fn numerical_flux(
    euler: &EulerEquations,
    w_l: &EulerState,
    w_r: &EulerState,
    normal: (f64, f64),
) -> EulerState {
    let plus = mat_vec(&p_plus(euler, w_l, normal), &w_l.to_array());
    let minus = mat_vec(&p_minus(euler, w_r, normal), &w_r.to_array());
    EulerState::from_array(plus) + EulerState::from_array(minus)
}

/// State on the boundary side of a face from characteristic selection.
///
/// Both states are expressed in the characteristic variables of the
/// interior state. Incoming characteristics (λ < 0) take the prescribed
/// value, outgoing ones keep the interior value.
pub fn boundary_state(
    euler: &EulerEquations,
    w_interior: &EulerState,
    w_prescribed: &EulerState,
    normal: (f64, f64),
) -> EulerState {
    let decomposition = CharacteristicDecomposition::new(euler, w_interior, normal);
    let alpha = decomposition.characteristic(w_interior);
    let beta = decomposition.characteristic(w_prescribed);

    let mut rotated = [0.0; 4];
    for s in 0..4 {
        let amplitude = if decomposition.eigenvalues[s] < 0.0 { beta[s] } else { alpha[s] };
        for (i, r) in rotated.iter_mut().enumerate() {
            *r += amplitude * decomposition.right[i][s];
        }
    }
    EulerState::from_array(mat_vec(&inverse_rotation(normal), &rotated))
}
