//! Shared training/loading logic used by every command.
//!
//! CSV ingest -> per-product training, or a saved registry. The commands in
//! `app` only decide where models come from and how to print them.

use std::path::PathBuf;

use tracing::info;

use crate::config::EnvConfig;
use crate::domain::{ModelConfig, ModelRegistry};
use crate::error::AppError;
use crate::io::ingest::{IngestedData, load_demand_table};
use crate::io::registry::read_registry_json;
use crate::models::{TrainedModels, train_demand_models};

/// All computed outputs of one training run.
#[derive(Debug, Clone)]
pub struct TrainRun {
    pub ingest: IngestedData,
    pub trained: TrainedModels,
}

/// Where a command gets its models from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// Train from a demand CSV.
    Csv(PathBuf),
    /// Load a saved registry JSON.
    Registry(PathBuf),
}

impl ModelSource {
    /// Explicit flags win over the environment; a saved registry wins over
    /// training when both come from the environment.
    pub fn resolve(csv: Option<PathBuf>, models: Option<PathBuf>, env: &EnvConfig) -> Self {
        match (models, csv) {
            (Some(path), _) => ModelSource::Registry(path),
            (None, Some(path)) => ModelSource::Csv(path),
            (None, None) => match &env.models_path {
                Some(path) => ModelSource::Registry(path.clone()),
                None => ModelSource::Csv(env.data_path.clone()),
            },
        }
    }
}

/// Ingest a CSV and train every product model.
pub fn train_from_csv(path: &std::path::Path, config: &ModelConfig) -> Result<TrainRun, AppError> {
    let ingest = load_demand_table(path)?;
    let trained = train_demand_models(&ingest.table, config)?;
    Ok(TrainRun { ingest, trained })
}

/// Produce a registry from `source`, training if needed.
pub fn load_registry(source: &ModelSource, config: &ModelConfig) -> Result<ModelRegistry, AppError> {
    match source {
        ModelSource::Registry(path) => read_registry_json(path),
        ModelSource::Csv(path) => {
            info!(path = %path.display(), "training models for request");
            Ok(train_from_csv(path, config)?.trained.registry)
        }
    }
}
