//! Data sources that do not come from a CSV: synthetic samples.

pub mod sample;

pub use sample::*;
