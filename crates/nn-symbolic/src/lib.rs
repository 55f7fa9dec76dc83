//! nn-symbolic: the ODE system implied by a rate graph.
//!
//! Provides:
//! - expr (exact-coefficient monomial sums, never simplified)
//! - compose (per-nuclide dY/dt terms and the Jacobian with null flags)
//! - print (C++ rendering of expressions)
//! - numeric (direct floating-point evaluation with optional screening)
//! - fd (finite difference Jacobians for cross-checks)

pub mod compose;
pub mod error;
pub mod expr;
pub mod fd;
pub mod numeric;
pub mod print;

pub use compose::{
    JacobianCell, NuclideRhs, PairTerms, SymbolicJacobian, SymbolicSystem, compose_jacobian,
    compose_rhs, rate_monomial, ydot_term,
};
pub use error::{SymbolicError, SymbolicResult};
pub use expr::{Expr, Ratio, Symbol, Term};
pub use fd::central_difference_jacobian;
pub use numeric::{NetworkEvaluator, RateValue, ThermoState};
pub use print::{CxxPrinter, SymbolNames};
