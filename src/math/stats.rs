//! Summary statistics over plain `f64` slices.

/// Arithmetic mean. Returns `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population covariance `(1/n) Σ (x_i - x̄)(y_i - ȳ)`.
///
/// Returns `0.0` if the slices differ in length or are empty.
pub fn covariance(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.is_empty() {
        return 0.0;
    }
    let mx = mean(x);
    let my = mean(y);
    let s: f64 = x.iter().zip(y).map(|(xi, yi)| (xi - mx) * (yi - my)).sum();
    s / x.len() as f64
}

/// Univariate least-squares slope `cov(x, y) / var(x)`.
///
/// `None` when `x` has no spread.
pub fn simple_slope(x: &[f64], y: &[f64]) -> Option<f64> {
    let var_x = covariance(x, x);
    if var_x.abs() < f64::EPSILON {
        return None;
    }
    Some(covariance(x, y) / var_x)
}
