//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the closed product set (`Product`) and CSV column naming
//! - transform/solver policies (`LogPolicy`, `PivotFloor`) and `ModelConfig`
//! - historical data (`DemandTable`) and model outputs (`ModelRegistry`, `Prediction`)

pub mod types;

pub use types::*;
