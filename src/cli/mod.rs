//! Command-line parsing for the demand model tool.
//!
//! Argument parsing and command dispatch stay separate from the modeling code;
//! `app` turns these structs into a `ModelConfig` and runs the pipeline.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{LogPolicy, PivotFloor, Product};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "demand", version, about = "Log-log demand models for a small product catalog")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Train one model per product from a CSV and print a summary.
    Train(TrainArgs),
    /// Predict demand for every product at one price vector.
    Predict(PredictArgs),
    /// Run a JSON request event through the prediction handler.
    Handle(HandleArgs),
    /// Write a synthetic demand CSV.
    Sample(SampleArgs),
}

/// Numerical options shared by every command that trains or predicts.
#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// ln() policy for training data: `zero` or `floor:<eps>`.
    #[arg(long, default_value = "zero")]
    pub train_log_policy: LogPolicy,

    /// ln() policy for request prices: `zero` or `floor:<eps>`.
    #[arg(long, default_value = "floor:0.01")]
    pub predict_log_policy: LogPolicy,

    /// Replacement rule for pivots below the pivot epsilon.
    #[arg(long, value_enum, default_value_t = PivotFloor::Unsigned)]
    pub pivot_floor: PivotFloor,

    /// Pivots below this magnitude are floored; must be finite and > 0.
    #[arg(long, default_value_t = 1e-10, allow_negative_numbers = true)]
    pub pivot_epsilon: f64,

    /// Decimal places in predicted demand.
    #[arg(long, default_value_t = 2)]
    pub round: u32,
}

#[derive(Debug, Args, Clone)]
pub struct TrainArgs {
    /// Historical demand CSV (defaults to `DEMAND_DATA_PATH`).
    #[arg(long, value_name = "CSV")]
    pub csv: Option<PathBuf>,

    /// Write the trained registry to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    #[command(flatten)]
    pub model: ModelArgs,
}

#[derive(Debug, Args, Clone)]
pub struct PredictArgs {
    /// Prices in catalog order: Milk Chocolate Soup Ramen.
    #[arg(long, num_args = Product::COUNT, value_name = "PRICE", allow_negative_numbers = true, required = true)]
    pub prices: Vec<f64>,

    /// Train from this CSV before predicting.
    #[arg(long, value_name = "CSV", conflicts_with = "models")]
    pub csv: Option<PathBuf>,

    /// Use a saved registry instead of training.
    #[arg(long, value_name = "JSON")]
    pub models: Option<PathBuf>,

    /// Print the prediction as JSON.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub model: ModelArgs,
}

#[derive(Debug, Args, Clone)]
pub struct HandleArgs {
    /// Event JSON file, or `-` for stdin.
    #[arg(long, value_name = "PATH", default_value = "-")]
    pub event: String,

    /// Train from this CSV when a request needs models.
    #[arg(long, value_name = "CSV", conflicts_with = "models")]
    pub csv: Option<PathBuf>,

    /// Use a saved registry instead of training.
    #[arg(long, value_name = "JSON")]
    pub models: Option<PathBuf>,

    #[command(flatten)]
    pub model: ModelArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Output CSV path.
    #[arg(long, value_name = "CSV")]
    pub out: PathBuf,

    #[arg(short = 'n', long, default_value_t = 200)]
    pub rows: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Log-space noise standard deviation.
    #[arg(long, default_value_t = 0.05)]
    pub noise: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_predict_with_defaults() {
        let cli = Cli::try_parse_from(["demand", "predict", "--prices", "3.5", "4.0", "4.5", "2.5"]).unwrap();
        let Command::Predict(args) = cli.command else {
            panic!("expected predict");
        };
        assert_eq!(args.prices, vec![3.5, 4.0, 4.5, 2.5]);
        assert_eq!(args.model.train_log_policy, LogPolicy::ZeroFallback);
        assert_eq!(args.model.predict_log_policy, LogPolicy::FloorAt(0.01));
        assert_eq!(args.model.pivot_floor, PivotFloor::Unsigned);
        assert!(!args.json);
    }

    #[test]
    fn predict_requires_four_prices() {
        assert!(Cli::try_parse_from(["demand", "predict", "--prices", "3.5", "4.0"]).is_err());
    }

    #[test]
    fn parses_train_options() {
        let cli = Cli::try_parse_from([
            "demand",
            "train",
            "--csv",
            "data.csv",
            "--train-log-policy",
            "floor:0.001",
            "--pivot-floor",
            "sign-preserving",
        ])
        .unwrap();
        let Command::Train(args) = cli.command else {
            panic!("expected train");
        };
        assert_eq!(args.csv, Some(PathBuf::from("data.csv")));
        assert_eq!(args.model.train_log_policy, LogPolicy::FloorAt(0.001));
        assert_eq!(args.model.pivot_floor, PivotFloor::SignPreserving);
    }

    #[test]
    fn csv_and_models_conflict() {
        let res = Cli::try_parse_from([
            "demand", "predict", "--prices", "1", "1", "1", "1", "--csv", "a.csv", "--models", "m.json",
        ]);
        assert!(res.is_err());
    }
}
