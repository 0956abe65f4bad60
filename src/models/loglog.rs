//! Log-log demand curves.
//!
//! Each product's demand is modeled as
//!
//! ```text
//! ln(demand_p) = β0 + Σ_j β_j ln(price_j)
//! ```
//!
//! over the prices of all tracked products, so `β_j` reads as the elasticity of
//! product `p` with respect to the price of product `j`.
//!
//! Training fits one OLS model per product on a shared log-price matrix.
//! Prediction evaluates every model at one price vector and maps back with `exp`.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::{
    Coefficients, DemandTable, FitQuality, LogPolicy, ModelConfig, ModelRegistry, Prediction, Product,
};
use crate::error::ModelError;
use crate::math::{SolveDiagnostics, SolveOptions, fit_ols, simple_slope};

/// Per-product training diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFit {
    pub product: Product,
    /// Quality in log space.
    pub quality: FitQuality,
    pub diagnostics: SolveDiagnostics,
    /// Slope of ln(demand) on the product's own ln(price) alone, ignoring
    /// cross-price effects.
    pub own_price_slope: Option<f64>,
}

/// Output of a training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModels {
    pub registry: ModelRegistry,
    /// In `Product::ALL` order.
    pub fits: Vec<ProductFit>,
}

/// Apply `policy` to every value.
pub fn log_transform(values: &[f64], policy: LogPolicy) -> Vec<f64> {
    values.iter().map(|&v| policy.apply(v)).collect()
}

/// Log-price feature rows, one per observation, features in `Product::ALL` order.
pub fn log_price_rows(table: &DemandTable, policy: LogPolicy) -> Vec<Vec<f64>> {
    table
        .observations
        .iter()
        .map(|o| log_transform(&o.prices, policy))
        .collect()
}

/// Fit one log-log model per product.
///
/// Products are fitted in parallel. Each fit is independent and accumulates
/// sequentially, so the coefficients do not depend on scheduling.
pub fn train_demand_models(table: &DemandTable, config: &ModelConfig) -> Result<TrainedModels, ModelError> {
    config.validate()?;
    if table.is_empty() {
        return Err(ModelError::InvalidInput("no observations to train on".into()));
    }

    let opts = SolveOptions::from(config);
    let policy = config.train_log_policy;
    let log_prices = log_price_rows(table, policy);

    let fitted: Vec<(Product, Vec<f64>, ProductFit)> = Product::ALL
        .as_slice()
        .par_iter()
        .map(|&product| -> Result<(Product, Vec<f64>, ProductFit), ModelError> {
            let log_demand = log_transform(&table.demand_column(product), policy);
            let fit = fit_ols(&log_prices, &log_demand, &opts)?;

            let own: Vec<f64> = log_prices.iter().map(|row| row[product.index()]).collect();
            let summary = ProductFit {
                product,
                quality: fit.quality,
                diagnostics: fit.diagnostics,
                own_price_slope: simple_slope(&own, &log_demand),
            };
            Ok((product, fit.coefficients, summary))
        })
        .collect::<Result<_, ModelError>>()?;

    let mut models = BTreeMap::new();
    let mut fits = Vec::with_capacity(fitted.len());
    for (product, coefficients, summary) in fitted {
        if summary.diagnostics.near_singular() {
            warn!(
                %product,
                pivots = ?summary.diagnostics.floored_pivots,
                "normal equations were near-singular"
            );
        }
        debug!(%product, coefficients = ?coefficients, "trained");
        models.insert(product, Coefficients::new(coefficients));
        fits.push(summary);
    }

    let registry = ModelRegistry::new(Product::COUNT, models)?;
    info!(rows = table.len(), products = Product::COUNT, "trained demand models");

    Ok(TrainedModels { registry, fits })
}

/// Predict demand for every product at one price vector.
///
/// Prices are given in `Product::ALL` order. All coefficient vectors are
/// checked before any product is evaluated, so a bad registry never yields a
/// partial prediction.
pub fn predict_demand(
    prices: &[f64],
    registry: &ModelRegistry,
    config: &ModelConfig,
) -> Result<Prediction, ModelError> {
    config.validate()?;
    let k = registry.feature_count();
    if prices.len() != k {
        let names: Vec<&str> = Product::ALL.iter().map(|p| p.name()).collect();
        return Err(ModelError::InvalidInput(format!(
            "expected {k} prices [{}], got {}",
            names.join(", "),
            prices.len()
        )));
    }
    if let Some(i) = prices.iter().position(|p| !p.is_finite()) {
        return Err(ModelError::InvalidInput(format!("price at position {i} is not a finite number")));
    }
    for (product, coefficients) in registry.iter() {
        if coefficients.len() != prices.len() + 1 {
            return Err(ModelError::shape(
                format!("coefficients for {product}"),
                prices.len() + 1,
                coefficients.len(),
            ));
        }
    }

    let log_prices = log_transform(prices, config.predict_log_policy);

    let mut out = BTreeMap::new();
    for (product, coefficients) in registry.iter() {
        let log_demand = coefficients.intercept()
            + coefficients
                .slopes()
                .iter()
                .zip(&log_prices)
                .map(|(b, lp)| b * lp)
                .sum::<f64>();
        let demand = round_to(log_demand.exp(), config.round_decimals);
        if !demand.is_finite() {
            return Err(ModelError::NonFinite(format!("predicted demand for {product}")));
        }
        out.insert(product, demand);
    }

    Ok(Prediction::new(out))
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}
