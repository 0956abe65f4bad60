//! Read/write model registry JSON files.
//!
//! The registry file is the portable form of a training run:
//! - coefficient vectors per product (`models`, a plain name → float-array map)
//! - the feature count and feature order used in training
//! - run metadata and per-product fit quality
//!
//! Only `feature_count` and `models` are required when reading, so hand-written
//! registries load too.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{Coefficients, FitQuality, LogPolicy, ModelConfig, ModelRegistry, Product};
use crate::error::AppError;
use crate::models::TrainedModels;

/// On-disk registry schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryFile {
    #[serde(default)]
    pub tool: String,
    #[serde(default)]
    pub trained_at: Option<DateTime<Utc>>,
    pub feature_count: usize,
    /// Price columns in feature order.
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub train_log_policy: Option<LogPolicy>,
    pub models: BTreeMap<Product, Coefficients>,
    #[serde(default)]
    pub quality: BTreeMap<Product, FitQuality>,
}

impl RegistryFile {
    pub fn from_trained(trained: &TrainedModels, config: &ModelConfig) -> Self {
        Self {
            tool: "demand".to_string(),
            trained_at: Some(Utc::now()),
            feature_count: trained.registry.feature_count(),
            features: Product::ALL.iter().map(|p| p.price_column()).collect(),
            train_log_policy: Some(config.train_log_policy),
            models: trained.registry.models().clone(),
            quality: trained
                .fits
                .iter()
                .map(|f| (f.product, f.quality.clone()))
                .collect(),
        }
    }

    pub fn into_registry(self) -> Result<ModelRegistry, AppError> {
        ModelRegistry::new(self.feature_count, self.models).map_err(AppError::from)
    }
}

/// Write a registry JSON file.
pub fn write_registry_json(path: &Path, trained: &TrainedModels, config: &ModelConfig) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create registry JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, &RegistryFile::from_trained(trained, config))
        .map_err(|e| AppError::new(2, format!("Failed to write registry JSON: {e}")))?;

    info!(path = %path.display(), "wrote model registry");
    Ok(())
}

/// Read a registry JSON file.
pub fn read_registry_json(path: &Path) -> Result<ModelRegistry, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open registry JSON '{}': {e}", path.display())))?;
    let parsed: RegistryFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid registry JSON: {e}")))?;
    let registry = parsed.into_registry()?;
    info!(path = %path.display(), features = registry.feature_count(), "loaded model registry");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DemandTable, Observation};
    use crate::models::train_demand_models;

    fn trained() -> TrainedModels {
        let observations = (0..8)
            .map(|i| {
                let t = i as f64;
                Observation {
                    prices: [3.0 + 0.1 * t, 2.0 + 0.3 * (t * 1.7).sin(), 1.5 + 0.2 * (t * 0.9).cos(), 1.0 + 0.05 * t * t],
                    demands: [1000.0 - 20.0 * t, 500.0 + 5.0 * t, 300.0, 700.0 - t],
                }
            })
            .collect();
        train_demand_models(&DemandTable::new(observations), &ModelConfig::default()).unwrap()
    }

    #[test]
    fn registry_json_round_trip() {
        let trained = trained();
        let file = RegistryFile::from_trained(&trained, &ModelConfig::default());
        let json = serde_json::to_string(&file).unwrap();
        assert!(json.contains("\"Milk\""));
        assert!(json.contains("\"Price_Ramen\""));

        let parsed: RegistryFile = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, file);
        assert_eq!(parsed.into_registry().unwrap(), trained.registry);
    }

    #[test]
    fn minimal_registry_loads() {
        let json = r#"{
            "feature_count": 4,
            "models": {
                "Milk": [6.9, -1.0, 0.0, 0.0, 0.0],
                "Chocolate": [6.2, 0.0, -1.0, 0.0, 0.0],
                "Soup": [5.7, 0.0, 0.0, -1.0, 0.0],
                "Ramen": [6.5, 0.0, 0.0, 0.0, -1.0]
            }
        }"#;
        let parsed: RegistryFile = serde_json::from_str(json).unwrap();
        assert!(parsed.trained_at.is_none());
        let registry = parsed.into_registry().unwrap();
        assert_eq!(registry.get(Product::Soup).unwrap().intercept(), 5.7);
    }

    #[test]
    fn unknown_or_missing_products_are_rejected() {
        let typo = r#"{"feature_count": 4, "models": {"Mlik": [1, 2, 3, 4, 5]}}"#;
        assert!(serde_json::from_str::<RegistryFile>(typo).is_err());

        let partial = r#"{"feature_count": 4, "models": {"Milk": [1, 2, 3, 4, 5]}}"#;
        let parsed: RegistryFile = serde_json::from_str(partial).unwrap();
        let err = parsed.into_registry().unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
