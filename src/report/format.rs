//! Formatted terminal output for training runs and predictions.
//!
//! Formatting lives here so the math and model code stay free of
//! presentation concerns.

use crate::domain::{ModelConfig, Prediction, Product};
use crate::io::ingest::IngestedData;
use crate::models::TrainedModels;

use super::rank_elasticities;

/// Row errors listed in full before the summary truncates them.
const MAX_ROW_ERRORS: usize = 5;

/// Format the training summary: data, per-product fits and elasticities.
pub fn format_training_summary(ingest: &IngestedData, trained: &TrainedModels, config: &ModelConfig) -> String {
    let mut out = String::new();

    out.push_str("=== demand - Log-Log Demand Models ===\n");
    out.push_str(&format!(
        "Rows: read={} used={} skipped={}\n",
        ingest.rows_read,
        ingest.rows_used,
        ingest.row_errors.len()
    ));
    for err in ingest.row_errors.iter().take(MAX_ROW_ERRORS) {
        out.push_str(&format!("  line {}: {}\n", err.line, err.message));
    }
    if ingest.row_errors.len() > MAX_ROW_ERRORS {
        out.push_str(&format!("  ... {} more\n", ingest.row_errors.len() - MAX_ROW_ERRORS));
    }
    out.push_str(&format!(
        "Log policy: train={} predict={} | pivot floor: {:?} ({:e})\n",
        config.train_log_policy, config.predict_log_policy, config.pivot_floor, config.pivot_epsilon
    ));

    out.push_str("\nModels (log space):\n");
    out.push_str(&format!("{:<10} {:>10} {:>8} {:>6}  coefficients\n", "product", "RMSE", "R2", "n"));
    out.push_str(&format!("{:-<10} {:->10} {:->8} {:->6}  {:-<12}\n", "", "", "", "", ""));
    for fit in &trained.fits {
        let coefficients = trained
            .registry
            .get(fit.product)
            .map(|c| fmt_vec(c.as_slice()))
            .unwrap_or_default();
        out.push_str(&format!(
            "{:<10} {:>10.4} {:>8.4} {:>6}  {coefficients}\n",
            fit.product.name(),
            fit.quality.rmse,
            fit.quality.r2,
            fit.quality.n,
        ));
    }

    out.push_str("\nOwn-price elasticity (most elastic first):\n");
    for e in rank_elasticities(trained) {
        let univariate = e.univariate.map(|s| format!("{s:.4}")).unwrap_or_else(|| "n/a".to_string());
        out.push_str(&format!(
            "- {:<10} model={:>8.4} univariate={:>8}\n",
            e.product.name(),
            e.own_price,
            univariate
        ));
    }

    let floored: Vec<_> = trained.fits.iter().filter(|f| f.diagnostics.near_singular()).collect();
    if !floored.is_empty() {
        out.push_str("\nWarnings:\n");
        for fit in floored {
            out.push_str(&format!(
                "- {}: near-singular normal equations, floored pivots at columns {:?}\n",
                fit.product.name(),
                fit.diagnostics.floored_pivots
            ));
        }
    }

    out
}

/// Format one prediction as a price/demand table.
pub fn format_prediction(prices: &[f64], prediction: &Prediction) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<10} {:>10} {:>12}\n", "product", "price", "demand"));
    out.push_str(&format!("{:-<10} {:->10} {:->12}\n", "", "", ""));
    for product in Product::ALL {
        let price = prices.get(product.index()).copied().unwrap_or(f64::NAN);
        let demand = prediction
            .get(product)
            .map(|d| format!("{d:.2}"))
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!("{:<10} {:>10.2} {:>12}\n", product.name(), price, demand));
    }
    out
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.4}")).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SampleConfig, generate_sample};
    use crate::io::ingest::RowError;
    use crate::models::{predict_demand, train_demand_models};

    fn ingest(rows: usize) -> IngestedData {
        let table = generate_sample(&SampleConfig {
            rows,
            ..SampleConfig::default()
        })
        .unwrap();
        IngestedData {
            rows_read: rows + 1,
            rows_used: rows,
            row_errors: vec![RowError {
                line: 3,
                message: "non-numeric Price_Milk".to_string(),
            }],
            table,
        }
    }

    #[test]
    fn training_summary_lists_every_product() {
        let data = ingest(30);
        let config = ModelConfig::default();
        let trained = train_demand_models(&data.table, &config).unwrap();
        let text = format_training_summary(&data, &trained, &config);

        assert!(text.contains("Rows: read=31 used=30 skipped=1"));
        assert!(text.contains("line 3: non-numeric Price_Milk"));
        for product in Product::ALL {
            assert!(text.contains(product.name()), "missing {product}");
        }
        assert!(!text.contains("Warnings:"));
    }

    #[test]
    fn prediction_table_has_one_row_per_product() {
        let data = ingest(30);
        let config = ModelConfig::default();
        let trained = train_demand_models(&data.table, &config).unwrap();
        let prices = [3.5, 4.0, 4.5, 2.5];
        let prediction = predict_demand(&prices, &trained.registry, &config).unwrap();

        let text = format_prediction(&prices, &prediction);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2 + Product::COUNT);
        assert!(lines[2].starts_with("Milk"));
        assert!(lines[2].contains("3.50"));
    }

    #[test]
    fn fmt_vec_basic() {
        assert_eq!(fmt_vec(&[1.0, -0.5]), "[1.0000, -0.5000]");
    }
}
