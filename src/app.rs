//! Top-level application orchestration.
//!
//! `src/main.rs` only sets up logging; this module is the "real main" that:
//! - parses CLI arguments and environment configuration
//! - trains or loads models
//! - prints reports and predictions
//! - writes optional exports

use std::io::Read;

use clap::Parser;
use serde_json::{Value, json};
use tracing::info;

use crate::cli::{Command, HandleArgs, ModelArgs, PredictArgs, SampleArgs, TrainArgs};
use crate::config::EnvConfig;
use crate::data::{SampleConfig, generate_sample};
use crate::domain::ModelConfig;
use crate::error::AppError;

pub mod pipeline;

use pipeline::ModelSource;

/// Entry point for the `demand` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    let env = EnvConfig::from_env();

    match cli.command {
        Command::Train(args) => handle_train(args, &env),
        Command::Predict(args) => handle_predict(args, &env),
        Command::Handle(args) => handle_event(args, &env),
        Command::Sample(args) => handle_sample(args),
    }
}

fn handle_train(args: TrainArgs, env: &EnvConfig) -> Result<(), AppError> {
    let config = model_config_from_args(&args.model)?;
    let path = args.csv.unwrap_or_else(|| env.data_path.clone());
    let run = pipeline::train_from_csv(&path, &config)?;

    println!(
        "{}",
        crate::report::format_training_summary(&run.ingest, &run.trained, &config)
    );

    if let Some(path) = &args.export {
        crate::io::registry::write_registry_json(path, &run.trained, &config)?;
    }
    Ok(())
}

fn handle_predict(args: PredictArgs, env: &EnvConfig) -> Result<(), AppError> {
    let config = model_config_from_args(&args.model)?;
    let source = ModelSource::resolve(args.csv, args.models, env);
    let registry = pipeline::load_registry(&source, &config)?;
    let prediction = crate::models::predict_demand(&args.prices, &registry, &config)?;

    if args.json {
        let body = json!({ "predictions": prediction, "input_prices": args.prices });
        println!("{body}");
    } else {
        println!("{}", crate::report::format_prediction(&args.prices, &prediction));
    }
    Ok(())
}

fn handle_event(args: HandleArgs, env: &EnvConfig) -> Result<(), AppError> {
    let config = model_config_from_args(&args.model)?;
    let source = ModelSource::resolve(args.csv, args.models, env);

    let raw = read_event(&args.event)?;
    // Unparseable input is passed through as a string so the handler answers 400.
    let event = serde_json::from_str(&raw).unwrap_or(Value::String(raw));

    let response = crate::io::event::handle_event(&event, &config, || pipeline::load_registry(&source, &config));
    info!(status = response.status_code, "handled event");

    let text = serde_json::to_string_pretty(&response)
        .map_err(|e| AppError::new(4, format!("Failed to encode response: {e}")))?;
    println!("{text}");
    Ok(())
}

fn read_event(source: &str) -> Result<String, AppError> {
    if source == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .map_err(|e| AppError::new(2, format!("Failed to read event from stdin: {e}")))?;
        return Ok(raw);
    }
    std::fs::read_to_string(source).map_err(|e| AppError::new(2, format!("Failed to read event '{source}': {e}")))
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = SampleConfig {
        rows: args.rows,
        seed: args.seed,
        noise: args.noise,
        ..SampleConfig::default()
    };
    let table = generate_sample(&config)?;
    crate::io::export::write_demand_csv(&args.out, &table)?;
    info!(path = %args.out.display(), rows = table.len(), seed = config.seed, "wrote sample");
    Ok(())
}

pub fn model_config_from_args(args: &ModelArgs) -> Result<ModelConfig, AppError> {
    let config = ModelConfig {
        train_log_policy: args.train_log_policy,
        predict_log_policy: args.predict_log_policy,
        pivot_floor: args.pivot_floor,
        pivot_epsilon: args.pivot_epsilon,
        round_decimals: args.round,
    };
    config.validate()?;
    Ok(config)
}
