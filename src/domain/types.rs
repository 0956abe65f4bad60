//! Shared domain types.
//!
//! These types are kept small and serializable so they can be:
//!
//! - used in-memory during training and prediction
//! - exported to JSON (model registry, prediction responses)
//! - reloaded later for prediction without retraining

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A tracked product.
///
/// The set is closed: registries, predictions and CSV schemas are all keyed by
/// this enum, so a misspelled product name cannot reach the model.
///
/// Declaration order is the feature order used by every regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Product {
    Milk,
    Chocolate,
    Soup,
    Ramen,
}

impl Product {
    pub const ALL: [Product; 4] = [Product::Milk, Product::Chocolate, Product::Soup, Product::Ramen];
    pub const COUNT: usize = Self::ALL.len();

    pub fn name(self) -> &'static str {
        match self {
            Product::Milk => "Milk",
            Product::Chocolate => "Chocolate",
            Product::Soup => "Soup",
            Product::Ramen => "Ramen",
        }
    }

    /// Position of this product in the feature vector.
    pub fn index(self) -> usize {
        match self {
            Product::Milk => 0,
            Product::Chocolate => 1,
            Product::Soup => 2,
            Product::Ramen => 3,
        }
    }

    pub fn price_column(self) -> String {
        format!("Price_{}", self.name())
    }

    pub fn demand_column(self) -> String {
        format!("Demand_{}", self.name())
    }

    pub fn from_name(name: &str) -> Option<Product> {
        Product::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How `ln(v)` treats non-positive (or tiny) inputs.
///
/// Training and prediction use different defaults (`ZeroFallback` vs
/// `FloorAt(0.01)`), matching the behavior the models were first built with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "epsilon", rename_all = "snake_case")]
pub enum LogPolicy {
    /// `ln(v)` for `v > 0`, otherwise `0.0`.
    ZeroFallback,
    /// `ln(max(v, ε))`.
    FloorAt(f64),
}

impl LogPolicy {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            LogPolicy::ZeroFallback => {
                if value > 0.0 {
                    value.ln()
                } else {
                    0.0
                }
            }
            LogPolicy::FloorAt(eps) => value.max(eps).ln(),
        }
    }
}

impl fmt::Display for LogPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogPolicy::ZeroFallback => f.write_str("zero"),
            LogPolicy::FloorAt(eps) => write!(f, "floor:{eps}"),
        }
    }
}

/// Parses `zero` or `floor:<ε>` (ε must be finite and positive).
impl FromStr for LogPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s == "zero" {
            return Ok(LogPolicy::ZeroFallback);
        }
        let Some(raw) = s.strip_prefix("floor:") else {
            return Err(format!("unknown log policy '{s}' (expected 'zero' or 'floor:<eps>')"));
        };
        let eps: f64 = raw
            .parse()
            .map_err(|_| format!("invalid floor value '{raw}'"))?;
        if !(eps.is_finite() && eps > 0.0) {
            return Err(format!("floor value must be positive, got {eps}"));
        }
        Ok(LogPolicy::FloorAt(eps))
    }
}

/// What the solver does with a pivot whose magnitude falls below epsilon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PivotFloor {
    /// Replace the pivot with `+ε`, whatever its sign was.
    Unsigned,
    /// Replace the pivot with `ε` carrying the original pivot's sign.
    SignPreserving,
}

impl PivotFloor {
    pub fn floor(self, pivot: f64, epsilon: f64) -> f64 {
        match self {
            PivotFloor::Unsigned => epsilon,
            PivotFloor::SignPreserving => {
                if pivot < 0.0 {
                    -epsilon
                } else {
                    epsilon
                }
            }
        }
    }
}

/// Knobs for training and prediction.
///
/// `Default` reproduces the historical behavior of the demand models.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub train_log_policy: LogPolicy,
    pub predict_log_policy: LogPolicy,
    pub pivot_floor: PivotFloor,
    pub pivot_epsilon: f64,
    /// Decimal places kept in predicted demand.
    pub round_decimals: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            train_log_policy: LogPolicy::ZeroFallback,
            predict_log_policy: LogPolicy::FloorAt(0.01),
            pivot_floor: PivotFloor::Unsigned,
            pivot_epsilon: 1e-10,
            round_decimals: 2,
        }
    }
}

impl ModelConfig {
    /// Largest `round_decimals` accepted; finer rounding is below f64 resolution
    /// for realistic demand values.
    pub const MAX_ROUND_DECIMALS: u32 = 15;

    /// Reject settings that would silently disable the pivot floor or turn
    /// rounding into NaN.
    pub fn validate(&self) -> Result<(), ModelError> {
        if !(self.pivot_epsilon.is_finite() && self.pivot_epsilon > 0.0) {
            return Err(ModelError::InvalidInput(format!(
                "pivot epsilon must be finite and > 0, got {}",
                self.pivot_epsilon
            )));
        }
        if self.round_decimals > Self::MAX_ROUND_DECIMALS {
            return Err(ModelError::InvalidInput(format!(
                "round decimals must be <= {}, got {}",
                Self::MAX_ROUND_DECIMALS,
                self.round_decimals
            )));
        }
        Ok(())
    }
}

/// One historical observation: a price and a demand per product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub prices: [f64; Product::COUNT],
    pub demands: [f64; Product::COUNT],
}

/// Historical price/demand data.
///
/// Stored row-wise so every column has the same length by construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DemandTable {
    pub observations: Vec<Observation>,
}

impl DemandTable {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn price_column(&self, product: Product) -> Vec<f64> {
        self.observations.iter().map(|o| o.prices[product.index()]).collect()
    }

    pub fn demand_column(&self, product: Product) -> Vec<f64> {
        self.observations.iter().map(|o| o.demands[product.index()]).collect()
    }
}

/// Regression coefficients: intercept first, then one per feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coefficients(Vec<f64>);

impl Coefficients {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn intercept(&self) -> f64 {
        self.0.first().copied().unwrap_or(0.0)
    }

    /// Feature coefficients (everything after the intercept).
    pub fn slopes(&self) -> &[f64] {
        self.0.get(1..).unwrap_or(&[])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Trained models for every product.
///
/// Built once per training run and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRegistry {
    feature_count: usize,
    models: BTreeMap<Product, Coefficients>,
}

impl ModelRegistry {
    /// Build a registry, requiring a model for every product.
    ///
    /// Coefficient lengths are not checked here; prediction validates them
    /// against the price vector it is given.
    pub fn new(feature_count: usize, models: BTreeMap<Product, Coefficients>) -> Result<Self, ModelError> {
        if feature_count == 0 {
            return Err(ModelError::InvalidInput("registry feature count must be > 0".into()));
        }
        let missing: Vec<&str> = Product::ALL
            .iter()
            .filter(|p| !models.contains_key(p))
            .map(|p| p.name())
            .collect();
        if !missing.is_empty() {
            return Err(ModelError::InvalidInput(format!(
                "registry is missing models for: {}",
                missing.join(", ")
            )));
        }
        Ok(Self { feature_count, models })
    }

    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    pub fn get(&self, product: Product) -> Option<&Coefficients> {
        self.models.get(&product)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Product, &Coefficients)> {
        self.models.iter().map(|(p, c)| (*p, c))
    }

    pub fn models(&self) -> &BTreeMap<Product, Coefficients> {
        &self.models
    }
}

/// Predicted demand per product, in original units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Prediction(BTreeMap<Product, f64>);

impl Prediction {
    pub fn new(values: BTreeMap<Product, f64>) -> Self {
        Self(values)
    }

    pub fn get(&self, product: Product) -> Option<f64> {
        self.0.get(&product).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Product, f64)> + '_ {
        self.0.iter().map(|(p, v)| (*p, *v))
    }
}

/// Fit quality diagnostics, measured on the data the model was fitted to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitQuality {
    pub n: usize,
    pub sse: f64,
    pub rmse: f64,
    pub r2: f64,
}
