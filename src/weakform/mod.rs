//! Semi-implicit weak form of the Euler equations.

mod jacobian_cache;
mod semi_implicit;

pub use jacobian_cache::FaceJacobianCache;
pub use semi_implicit::{InterfaceBlocks, SemiImplicitWeakForm, Stabilization};
