//! Service error types

use agriprice_core::CoreError;
use agriprice_trainer::TrainerError;
use thiserror::Error;

/// Shown under every failed prediction
pub const FAILURE_HINT: &str = "Check that the inputs match what your model was trained with.";

/// Service errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Retraining failed: {0}")]
    Trainer(#[from] TrainerError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// The single user-facing rendering of any failure
    pub fn user_message(&self) -> String {
        format!("Prediction failed: {self}")
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
