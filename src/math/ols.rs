//! Ordinary least squares via the normal equations.
//!
//! For a sample matrix `X` (n×p) and target `y` we fit
//!
//! ```text
//! y_i = β0 + Σ_j β_j x_ij + ε_i
//! ```
//!
//! by prepending an intercept column and solving `(XᵗX) β = Xᵗy` with the
//! Gaussian elimination solver in `math::solve`.
//!
//! Implementation choices:
//! - `XᵗX` and `Xᵗy` are accumulated row by row in plain `f64` (no compensated
//!   summation). Cost is `O(n·(p+1)²)`; with p = 4 it is dominated by n.
//! - Accumulation order is fixed, so identical inputs give bit-identical
//!   coefficients.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

use crate::domain::FitQuality;
use crate::error::ModelError;
use crate::math::solve::{SolveDiagnostics, SolveOptions, solve_linear_system};
use crate::math::stats::mean;

/// A fitted OLS model.
#[derive(Debug, Clone, PartialEq)]
pub struct OlsFit {
    /// `[β0, β1, ..., βp]`, intercept first.
    pub coefficients: Vec<f64>,
    pub quality: FitQuality,
    pub diagnostics: SolveDiagnostics,
}

/// Build the `n×(p+1)` design matrix with a leading column of ones.
pub fn design_matrix(x: &[Vec<f64>]) -> Result<DMatrix<f64>, ModelError> {
    let Some(first) = x.first() else {
        return Err(ModelError::InvalidInput("sample matrix has no rows".into()));
    };
    let p = first.len();
    if let Some((row, bad)) = x.iter().enumerate().find(|(_, r)| r.len() != p) {
        return Err(ModelError::shape(format!("sample matrix row {row}"), p, bad.len()));
    }
    if x.iter().flatten().any(|v| !v.is_finite()) {
        return Err(ModelError::InvalidInput("sample matrix contains NaN or infinite values".into()));
    }

    Ok(DMatrix::from_fn(x.len(), p + 1, |r, c| if c == 0 { 1.0 } else { x[r][c - 1] }))
}

/// Compute `XᵗX` and `Xᵗy` for a design matrix.
pub fn normal_equations(design: &DMatrix<f64>, y: &DVector<f64>) -> (DMatrix<f64>, DVector<f64>) {
    let (n, m) = design.shape();
    let mut xtx = DMatrix::<f64>::zeros(m, m);
    let mut xty = DVector::<f64>::zeros(m);

    for i in 0..m {
        for j in 0..m {
            let mut s = 0.0;
            for k in 0..n {
                s += design[(k, i)] * design[(k, j)];
            }
            xtx[(i, j)] = s;
        }
        let mut s = 0.0;
        for k in 0..n {
            s += design[(k, i)] * y[k];
        }
        xty[i] = s;
    }

    (xtx, xty)
}

/// Fit `y` on `x` (with intercept) by ordinary least squares.
pub fn fit_ols(x: &[Vec<f64>], y: &[f64], opts: &SolveOptions) -> Result<OlsFit, ModelError> {
    if x.len() != y.len() {
        return Err(ModelError::shape("ols: target length vs sample rows", x.len(), y.len()));
    }
    if y.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::InvalidInput("target vector contains NaN or infinite values".into()));
    }

    let design = design_matrix(x)?;
    let (n, m) = design.shape();
    if n < m {
        warn!(rows = n, params = m, "underdetermined regression; relying on pivot floor");
    }

    let target = DVector::from_column_slice(y);
    let (xtx, xty) = normal_equations(&design, &target);
    let solution = solve_linear_system(&xtx, &xty, opts)?;

    let quality = fit_quality(&design, &target, &solution.x);
    debug!(rows = n, params = m, sse = quality.sse, r2 = quality.r2, "ols fit");

    Ok(OlsFit {
        coefficients: solution.x.iter().copied().collect(),
        quality,
        diagnostics: solution.diagnostics,
    })
}

fn fit_quality(design: &DMatrix<f64>, y: &DVector<f64>, beta: &DVector<f64>) -> FitQuality {
    let n = y.len();
    let fitted = design * beta;
    let sse: f64 = y.iter().zip(fitted.iter()).map(|(a, b)| (a - b) * (a - b)).sum();

    let y_mean = mean(y.as_slice());
    let sst: f64 = y.iter().map(|v| (v - y_mean) * (v - y_mean)).sum();
    let r2 = if sst > f64::EPSILON {
        1.0 - sse / sst
    } else if sse <= f64::EPSILON {
        1.0
    } else {
        0.0
    };

    FitQuality {
        n,
        sse,
        rmse: (sse / n as f64).sqrt(),
        r2,
    }
}
