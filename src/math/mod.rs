//! Numerical core: summary statistics, a dense linear solver, and OLS.

pub mod ols;
pub mod solve;
pub mod stats;

pub use ols::*;
pub use solve::*;
pub use stats::*;
