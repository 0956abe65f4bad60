//! `demand-curves` library crate.
//!
//! The binary (`demand`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the solver, OLS fitter and demand models are reusable on their own

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
