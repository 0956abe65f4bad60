//! Synthetic demand data from a known log-log model.
//!
//! Each product's demand follows
//!
//! ```text
//! demand_i = base_i · Π_j (price_j / ref_j)^e_ij · exp(σ·z − σ²/2)
//! ```
//!
//! with prices drawn uniformly from per-product ranges, `ref_j` the midpoint of
//! range `j`, and `z ~ N(0, 1)`. The `−σ²/2` term keeps the expected noise
//! factor at 1. With `σ = 0` the data is exactly log-linear, which makes the
//! generator usable as ground truth for training tests.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{DemandTable, Observation, Product};
use crate::error::AppError;

const N: usize = Product::COUNT;

#[derive(Debug, Clone, PartialEq)]
pub struct SampleConfig {
    pub rows: usize,
    pub seed: u64,
    /// Log-space noise standard deviation.
    pub noise: f64,
    /// `(low, high)` price range per product.
    pub price_ranges: [(f64, f64); N],
    /// Demand at the reference (midpoint) prices.
    pub base_demand: [f64; N],
    /// `elasticities[i][j]`: response of product `i` demand to product `j` price.
    pub elasticities: [[f64; N]; N],
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            rows: 200,
            seed: 42,
            noise: 0.05,
            price_ranges: [(3.0, 4.0), (3.5, 4.5), (4.0, 5.0), (2.0, 3.0)],
            base_demand: [900.0, 150.0, 180.0, 200.0],
            elasticities: [
                [-1.2, 0.10, 0.05, 0.20],
                [0.15, -1.8, 0.00, 0.10],
                [0.05, 0.00, -0.9, 0.30],
                [0.10, 0.05, 0.25, -1.4],
            ],
        }
    }
}

impl SampleConfig {
    /// Reference price per product (range midpoint).
    pub fn reference_prices(&self) -> [f64; N] {
        self.price_ranges.map(|(lo, hi)| 0.5 * (lo + hi))
    }

    /// Coefficients `[β0, β1..βN]` of the generating model for `product`,
    /// in the layout the log-log regression produces.
    pub fn true_coefficients(&self, product: Product) -> Vec<f64> {
        let i = product.index();
        let refs = self.reference_prices();
        let e = &self.elasticities[i];
        let intercept = self.base_demand[i].ln() - (0..N).map(|j| e[j] * refs[j].ln()).sum::<f64>();
        std::iter::once(intercept).chain(e.iter().copied()).collect()
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.rows == 0 {
            return Err(AppError::new(2, "Sample row count must be > 0."));
        }
        if !(self.noise.is_finite() && self.noise >= 0.0) {
            return Err(AppError::new(2, "Sample noise must be a finite, non-negative number."));
        }
        for (product, (lo, hi)) in Product::ALL.iter().zip(self.price_ranges) {
            if !(lo.is_finite() && hi.is_finite() && lo > 0.0 && hi > lo) {
                return Err(AppError::new(
                    2,
                    format!("Invalid price range for {product}: [{lo}, {hi}]."),
                ));
            }
        }
        if self.base_demand.iter().any(|d| !(d.is_finite() && *d > 0.0)) {
            return Err(AppError::new(2, "Base demand must be positive."));
        }
        if self.elasticities.iter().flatten().any(|e| !e.is_finite()) {
            return Err(AppError::new(2, "Elasticities must be finite."));
        }
        Ok(())
    }
}

/// Generate a reproducible sample: the same config always yields the same table.
pub fn generate_sample(config: &SampleConfig) -> Result<DemandTable, AppError> {
    config.validate()?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0).map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let refs = config.reference_prices();
    let sigma = config.noise;
    let mut observations = Vec::with_capacity(config.rows);

    for _ in 0..config.rows {
        let mut prices = [0.0; N];
        for (p, &(lo, hi)) in prices.iter_mut().zip(config.price_ranges.iter()) {
            *p = rng.gen_range(lo..=hi);
        }

        let mut demands = [0.0; N];
        for (i, d) in demands.iter_mut().enumerate() {
            let e = &config.elasticities[i];
            let mut log_demand = config.base_demand[i].ln();
            for j in 0..N {
                log_demand += e[j] * (prices[j] / refs[j]).ln();
            }
            if sigma > 0.0 {
                let z = normal.sample(&mut rng);
                log_demand += sigma * z - 0.5 * sigma * sigma;
            }
            *d = log_demand.exp();
        }

        observations.push(Observation { prices, demands });
    }

    Ok(DemandTable::new(observations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelConfig;
    use crate::models::train_demand_models;

    #[test]
    fn same_seed_same_sample() {
        let config = SampleConfig { rows: 25, ..SampleConfig::default() };
        let a = generate_sample(&config).unwrap();
        let b = generate_sample(&config).unwrap();
        assert_eq!(a, b);

        let c = generate_sample(&SampleConfig { seed: 7, ..config }).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn prices_stay_in_range() {
        let config = SampleConfig::default();
        let table = generate_sample(&config).unwrap();
        assert_eq!(table.len(), config.rows);
        for product in Product::ALL {
            let (lo, hi) = config.price_ranges[product.index()];
            assert!(table.price_column(product).iter().all(|&p| p >= lo && p <= hi));
            assert!(table.demand_column(product).iter().all(|&d| d > 0.0));
        }
    }

    #[test]
    fn noise_free_sample_is_recovered_by_training() {
        let config = SampleConfig {
            rows: 60,
            noise: 0.0,
            ..SampleConfig::default()
        };
        let table = generate_sample(&config).unwrap();
        let trained = train_demand_models(&table, &ModelConfig::default()).unwrap();

        for product in Product::ALL {
            let fitted = trained.registry.get(product).unwrap().as_slice();
            let truth = config.true_coefficients(product);
            for (b, t) in fitted.iter().zip(&truth) {
                assert!((b - t).abs() < 1e-6, "{product}: {b} vs {t}");
            }
        }
    }

    #[test]
    fn base_demand_holds_at_reference_prices() {
        let config = SampleConfig::default();
        let refs = config.reference_prices();
        for product in Product::ALL {
            let beta = config.true_coefficients(product);
            let ln = beta[0] + (0..N).map(|j| beta[j + 1] * refs[j].ln()).sum::<f64>();
            let expected = config.base_demand[product.index()];
            assert!((ln.exp() - expected).abs() < 1e-9 * expected);
        }
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let bad_rows = SampleConfig { rows: 0, ..SampleConfig::default() };
        assert_eq!(generate_sample(&bad_rows).unwrap_err().exit_code(), 2);

        let mut bad_range = SampleConfig::default();
        bad_range.price_ranges[2] = (5.0, 4.0);
        let err = generate_sample(&bad_range).unwrap_err();
        assert!(err.message().contains("Soup"));

        let bad_noise = SampleConfig { noise: -0.1, ..SampleConfig::default() };
        assert!(generate_sample(&bad_noise).is_err());
    }
}
