//! Prediction pipeline
//!
//! One user action runs: assemble features → predict → compare with the
//! historical trend → record planned supply and assess oversupply →
//! optionally retrain. Any failing step fails the whole action.

use agriprice_core::{
    assemble, ArtifactLayout, CategoricalField, CropScenario, EncoderStore, FeatureVector,
    ModelStore,
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, instrument};

use crate::config::ServiceConfig;
use crate::errors::{Result, ServiceError};
use crate::ledger::{LedgerEntry, SupplyLedger};
use crate::retrain::{RetrainSummary, Retrainer};
use crate::trends::{
    assess_oversupply, OversupplyAssessment, PriceComparison, PriceTrends, ProductionBaseline,
};

/// A scenario plus the optional follow-up actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(flatten)]
    pub scenario: CropScenario,
    /// Planned production; recorded in the supply ledger when present
    #[serde(default)]
    pub production_kg: Option<f64>,
    #[serde(default)]
    pub retrain: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionReport {
    pub market: String,
    pub vegetable: String,
    pub variety: String,
    pub date: NaiveDate,
    /// Rounded to cents
    pub price: f64,
    pub features: FeatureVector,
    pub comparison: Option<PriceComparison>,
    pub ledger_entry: Option<LedgerEntry>,
    pub oversupply: Option<OversupplyAssessment>,
    pub retrain: Option<RetrainSummary>,
}

/// Selectable classes for a market's form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOptions {
    pub market: String,
    pub vegetables: Vec<String>,
    pub varieties: Vec<String>,
    pub provinces: Vec<String>,
    pub default_temperature: f64,
    pub default_rainfall: f64,
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub struct PricePredictor {
    encoders: EncoderStore,
    models: ModelStore,
    ledger: SupplyLedger,
    trends_path: PathBuf,
    production_path: PathBuf,
    retrainer: Retrainer,
    max_alternatives: usize,
}

impl PricePredictor {
    pub fn new(
        config: &ServiceConfig,
        encoders: EncoderStore,
        models: ModelStore,
    ) -> Self {
        Self {
            encoders,
            models,
            ledger: SupplyLedger::new(config.paths.ledger_path()),
            trends_path: config.paths.trends_path(),
            production_path: config.paths.production_path(),
            retrainer: Retrainer::new(config.paths.clone(), config.retrain.clone()),
            max_alternatives: config.report.max_alternatives,
        }
    }

    /// Load every configured market's artifacts; any missing file is fatal
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let layout = ArtifactLayout::new(&config.paths.model_dir);
        let markets = config.market_names();
        let encoders = EncoderStore::load(&layout, &markets)?;
        let models = ModelStore::load(layout, &markets)?;
        Ok(Self::new(config, encoders, models))
    }

    pub fn ledger(&self) -> &SupplyLedger {
        &self.ledger
    }

    pub fn models(&self) -> &ModelStore {
        &self.models
    }

    pub fn market_options(&self, config: &ServiceConfig, market: &str) -> Result<MarketOptions> {
        let encoders = self.encoders.get(market)?;
        let (default_temperature, default_rainfall) = config
            .market(market)
            .map(|m| (m.default_temperature, m.default_rainfall))
            .unwrap_or_default();
        let classes = |field| encoders.get(field).classes().to_vec();
        Ok(MarketOptions {
            market: market.to_string(),
            vegetables: classes(CategoricalField::Vegetable),
            varieties: classes(CategoricalField::Variety),
            provinces: classes(CategoricalField::Province),
            default_temperature,
            default_rainfall,
        })
    }

    #[instrument(skip_all, fields(market = %request.scenario.market, vegetable = %request.scenario.vegetable))]
    pub fn predict(&mut self, request: &PredictionRequest) -> Result<PredictionReport> {
        let scenario = &request.scenario;
        let market = scenario.market.as_str();
        if let Some(kg) = request.production_kg {
            if !kg.is_finite() {
                return Err(ServiceError::InvalidInput(format!(
                    "production_kg must be a finite number, got {kg}"
                )));
            }
        }

        let features = assemble(scenario, self.encoders.get(market)?)?;
        let price = self.models.get(market)?.predict(&features)?;
        info!("Predicted {:.2} for {} {}", price, scenario.vegetable, scenario.variety);

        let trends = PriceTrends::load(&self.trends_path)?;
        let comparison = trends
            .average_price(&scenario.vegetable, &scenario.variety)
            .map(|historical| PriceComparison {
                predicted: price,
                historical,
            });

        let mut ledger_entry = None;
        let mut oversupply = None;
        if let Some(kg) = request.production_kg {
            let entry = LedgerEntry {
                vegetable: scenario.vegetable.clone(),
                market: market.to_string(),
                year: scenario.date.year(),
                kg,
            };
            self.ledger.append(&entry)?;

            let total_kg = self
                .ledger
                .total_kg(&entry.vegetable, &entry.market, entry.year)?;
            let baseline = ProductionBaseline::load(&self.production_path)?
                .average_kg(&scenario.vegetable, market);
            oversupply = assess_oversupply(
                entry.year,
                total_kg,
                baseline,
                &trends,
                &scenario.vegetable,
                self.max_alternatives,
            );
            ledger_entry = Some(entry);
        }

        let retrain = if request.retrain {
            Some(
                self.retrainer
                    .retrain(scenario, price, &self.encoders, &mut self.models)?,
            )
        } else {
            None
        };

        Ok(PredictionReport {
            market: market.to_string(),
            vegetable: scenario.vegetable.clone(),
            variety: scenario.variety.clone(),
            date: scenario.date,
            price: round_cents(price),
            features,
            comparison,
            ledger_entry,
            oversupply,
            retrain,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cents_rounding() {
        assert_eq!(round_cents(182.456), 182.46);
        assert_eq!(round_cents(182.454), 182.45);
        assert_eq!(round_cents(210.0), 210.0);
    }

    #[test]
    fn request_json_is_flat() {
        let request: PredictionRequest = serde_json::from_str(
            r#"{
                "market": "Welimada",
                "vegetable": "Potato",
                "variety": "Granola",
                "province": "Uva Province",
                "temperature": 25.0,
                "rainfall": 5.0,
                "date": "2024-03-15"
            }"#,
        )
        .unwrap();
        assert_eq!(request.scenario.market, "Welimada");
        assert_eq!(request.production_kg, None);
        assert!(!request.retrain);
    }
}
