//! Conservation law definitions.
//!
//! Provides the compressible Euler equations of an ideal gas:
//!
//! ∂w/∂t + ∂f₁(w)/∂x + ∂f₂(w)/∂y = 0
//!
//! together with the derived quantities (pressure, speed of sound, Mach
//! number, entropy) and the flux Jacobians used by the semi-implicit scheme.

mod euler;

pub use euler::{EulerEquations, EulerState, Matrix4, mat_mul, mat_vec};
