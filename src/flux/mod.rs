//! Numerical flux functions.
//!
//! Provides the Steger-Warming flux vector splitting of the Euler
//! equations: split Jacobians P⁺ and P⁻, the upwind numerical flux built
//! from them and the characteristic boundary state used at inlets and
//! outlets.

mod steger_warming;

pub use steger_warming::{
    CharacteristicDecomposition, boundary_state, inverse_rotation, numerical_flux, p_minus, p_plus,
    rotation, split_jacobians,
};
