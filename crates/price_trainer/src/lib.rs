//! Agriprice trainer - deterministic regression forests
//!
//! Fits the per-market price models consumed by the dashboard, both offline
//! through the `agriprice-train` CLI and on demand when a user opts into
//! retraining.

pub mod cart;
pub mod dataset;
pub mod deterministic;
pub mod errors;
pub mod forest;
pub mod training_log;

use agriprice_core::{EncoderSet, FeatureSchema, ForestModel};

pub use cart::{CartBuilder, TreeConfig};
pub use dataset::Dataset;
pub use deterministic::{LcgRng, SplitTieBreaker};
pub use errors::TrainerError;
pub use forest::{ForestConfig, ForestTrainer};
pub use training_log::{build_dataset, fit_encoders, TrainingLog, TrainingRow};

/// Train a market model from every row in its training log.
pub fn train_from_log(
    log: &TrainingLog,
    encoders: &EncoderSet,
    schema: FeatureSchema,
    market: &str,
    config: ForestConfig,
) -> Result<(ForestModel, usize), TrainerError> {
    let rows = log.read_all()?;
    let dataset = build_dataset(&rows, encoders, &schema)?;
    let model = ForestTrainer::new(config).train(&dataset, schema, market)?;
    Ok((model, rows.len()))
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
