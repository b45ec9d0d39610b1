//! On-demand retraining
//!
//! The predicted price is appended to the market's training log as a new
//! label, the whole log is re-encoded with the market's existing encoders and
//! a fresh forest replaces the live model on disk and in memory.

use agriprice_core::{CropScenario, EncoderStore, ModelStore};
use agriprice_trainer::{train_from_log, ForestConfig, TrainingLog, TrainingRow};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::PathsConfig;
use crate::errors::Result;

/// Outcome of a successful retrain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrainSummary {
    pub training_rows: usize,
    pub model_hash: String,
}

#[derive(Debug, Clone)]
pub struct Retrainer {
    paths: PathsConfig,
    config: ForestConfig,
}

impl Retrainer {
    pub fn new(paths: PathsConfig, config: ForestConfig) -> Self {
        Self { paths, config }
    }

    pub fn training_log(&self, market: &str) -> TrainingLog {
        TrainingLog::new(self.paths.training_log_path(market))
    }

    #[instrument(skip_all, fields(market = %scenario.market))]
    pub fn retrain(
        &self,
        scenario: &CropScenario,
        price: f64,
        encoders: &EncoderStore,
        models: &mut ModelStore,
    ) -> Result<RetrainSummary> {
        let market = scenario.market.as_str();
        let market_encoders = encoders.get(market)?;
        let schema = models.get(market)?.schema.clone();

        let log = self.training_log(market);
        log.append(&TrainingRow::from_scenario(scenario, price))?;

        let (model, training_rows) =
            train_from_log(&log, market_encoders, schema, market, self.config.clone())?;
        let model_hash = models.replace(market, model)?;

        info!(
            "Retrained {} on {} rows from {}",
            market,
            training_rows,
            log.path().display()
        );
        Ok(RetrainSummary {
            training_rows,
            model_hash,
        })
    }
}
