//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - CSV export of demand tables (`export`)
//! - model registry JSON read/write (`registry`)
//! - request/response events for the prediction handler (`event`)

pub mod event;
pub mod export;
pub mod ingest;
pub mod registry;

pub use event::*;
pub use export::*;
pub use ingest::*;
pub use registry::*;
