//! Error types.
//!
//! Two layers:
//!
//! - `ModelError` is returned by the numerical core (solver, OLS, log-log model).
//! - `AppError` is what the binary reports: a message plus a process exit code.
//!
//! Exit codes: `2` input/config/IO, `3` data shape problems, `4` numerical failures.

use thiserror::Error;

/// Errors raised by the regression core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// Row/column counts disagree (X vs y, system size, or registry vs prices).
    #[error("shape mismatch in {context}: expected {expected}, got {got}")]
    ShapeMismatch {
        context: String,
        expected: usize,
        got: usize,
    },

    /// Inputs that violate a precondition (empty data, NaN, wrong price count).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Arithmetic produced NaN/Inf despite finite inputs.
    #[error("non-finite result: {0}")]
    NonFinite(String),
}

impl ModelError {
    pub fn shape(context: impl Into<String>, expected: usize, got: usize) -> Self {
        ModelError::ShapeMismatch {
            context: context.into(),
            expected,
            got,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            ModelError::InvalidInput(_) => 2,
            ModelError::ShapeMismatch { .. } => 3,
            ModelError::NonFinite(_) => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
