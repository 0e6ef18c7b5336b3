//! Assembly and solution of the semi-implicit linear system.
//!
//! [`DiscreteProblem`] walks the elements and faces of a space, collects the
//! local blocks of the weak form into a [`LinearSystem`] and solves it with
//! the sparse LU factorization of `faer`.

mod discrete_problem;
mod linear_system;

pub use discrete_problem::DiscreteProblem;
pub use linear_system::LinearSystem;
