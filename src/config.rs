//! Environment configuration.
//!
//! Values come from the process environment, with a `.env` file loaded first
//! if one exists. CLI flags override anything set here.
//!
//! - `DEMAND_DATA_PATH`: historical demand CSV (default `data/demand_data.csv`)
//! - `DEMAND_MODELS_PATH`: optional registry JSON to serve instead of training

use std::path::PathBuf;

pub const DEFAULT_DATA_PATH: &str = "data/demand_data.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    pub data_path: PathBuf,
    pub models_path: Option<PathBuf>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            data_path: get("DEMAND_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH)),
            models_path: get("DEMAND_MODELS_PATH").map(PathBuf::from),
        }
    }
}
