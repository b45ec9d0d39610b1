//! Error types for the price core

use thiserror::Error;

use crate::encoder::CategoricalField;
use crate::serde_canon::CanonicalError;

/// Errors that can occur while encoding inputs or evaluating models
#[derive(Error, Debug)]
pub enum CoreError {
    /// Categorical value outside the encoder's fitted classes
    #[error("y contains previously unseen label for {field}: {value:?}")]
    UnknownCategory {
        field: CategoricalField,
        value: String,
    },

    /// Market has no loaded artifacts
    #[error("Unknown market: {0}")]
    UnknownMarket(String),

    /// Feature schema and model disagree
    #[error("Feature schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Model or encoder validation failed
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Canonical serialization error
    #[error("Canonical serialization error: {0}")]
    Canonical(#[from] CanonicalError),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
