//! Demand models.
//!
//! Training and prediction are free functions over plain domain types so the
//! app layer, the request handler and tests can all drive them directly.

pub mod loglog;

pub use loglog::*;
