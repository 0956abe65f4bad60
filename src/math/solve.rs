//! Dense linear system solver.
//!
//! Solves `A·x = b` for small square systems (the normal equations of the
//! demand regressions are 5×5) by Gaussian elimination with partial pivoting.
//!
//! Numerical notes:
//! - One elimination pass, no iterative refinement.
//! - A pivot whose magnitude is below `epsilon` after the row swap is replaced
//!   by a floor value instead of failing. This keeps near-singular systems
//!   solvable at the cost of bias in the affected direction. Every replacement
//!   is reported in `SolveDiagnostics` and logged at `warn` level.
//! - Singularity that does not show up as a small pivot is not detected.

use nalgebra::{DMatrix, DVector};
use tracing::warn;

use crate::domain::{ModelConfig, PivotFloor};
use crate::error::ModelError;

/// Solver settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveOptions {
    pub pivot_floor: PivotFloor,
    pub epsilon: f64,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            pivot_floor: PivotFloor::Unsigned,
            epsilon: 1e-10,
        }
    }
}

impl From<&ModelConfig> for SolveOptions {
    fn from(config: &ModelConfig) -> Self {
        Self {
            pivot_floor: config.pivot_floor,
            epsilon: config.pivot_epsilon,
        }
    }
}

/// Non-fatal findings from a solve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolveDiagnostics {
    /// Pivot columns whose value was replaced by the floor.
    pub floored_pivots: Vec<usize>,
}

impl SolveDiagnostics {
    /// True if any pivot had to be floored (the system is singular or nearly so).
    pub fn near_singular(&self) -> bool {
        !self.floored_pivots.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub x: DVector<f64>,
    pub diagnostics: SolveDiagnostics,
}

/// Solve `a · x = b`.
///
/// `a` and `b` are copied into an augmented matrix; the caller's data is left
/// untouched.
pub fn solve_linear_system(
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    opts: &SolveOptions,
) -> Result<Solution, ModelError> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(ModelError::shape("solve: matrix must be square", n, a.ncols()));
    }
    if b.len() != n {
        return Err(ModelError::shape("solve: right-hand side length", n, b.len()));
    }
    if n == 0 {
        return Err(ModelError::InvalidInput("cannot solve an empty system".into()));
    }
    if !(opts.epsilon.is_finite() && opts.epsilon > 0.0) {
        return Err(ModelError::InvalidInput(format!(
            "pivot epsilon must be finite and > 0, got {}",
            opts.epsilon
        )));
    }
    if a.iter().chain(b.iter()).any(|v| !v.is_finite()) {
        return Err(ModelError::InvalidInput("linear system contains NaN or infinite values".into()));
    }

    // [A | b]
    let mut aug = DMatrix::from_fn(n, n + 1, |r, c| if c < n { a[(r, c)] } else { b[r] });
    let mut diagnostics = SolveDiagnostics::default();

    for i in 0..n {
        // Ties keep the earliest row.
        let mut max_row = i;
        for k in (i + 1)..n {
            if aug[(k, i)].abs() > aug[(max_row, i)].abs() {
                max_row = k;
            }
        }
        if max_row != i {
            aug.swap_rows(i, max_row);
        }

        let pivot = aug[(i, i)];
        if pivot.abs() < opts.epsilon {
            let floored = opts.pivot_floor.floor(pivot, opts.epsilon);
            warn!(column = i, pivot, floored, "near-singular pivot replaced by floor");
            aug[(i, i)] = floored;
            diagnostics.floored_pivots.push(i);
        }

        for k in (i + 1)..n {
            let factor = aug[(k, i)] / aug[(i, i)];
            for j in i..=n {
                let upper = aug[(i, j)];
                aug[(k, j)] -= factor * upper;
            }
        }
    }

    let mut x = DVector::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = aug[(i, n)];
        for j in (i + 1)..n {
            sum -= aug[(i, j)] * x[j];
        }
        x[i] = sum / aug[(i, i)];
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::NonFinite(format!(
            "solution of {n}x{n} system is not finite"
        )));
    }

    Ok(Solution { x, diagnostics })
}
