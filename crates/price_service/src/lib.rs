//! Agriprice dashboard service
//!
//! Serves the price prediction dashboard: a form per selling market, the
//! prediction pipeline behind it and a small JSON API.
//!
//! - `config`: TOML + environment configuration
//! - `predictor`: the per-action pipeline
//! - `ledger`: planned-supply ledger
//! - `trends`: historical prices, production baselines and oversupply checks
//! - `retrain`: on-demand model refits
//! - `page` / `server`: HTML rendering and the axum router

pub mod config;
pub mod errors;
pub mod ledger;
pub mod page;
pub mod predictor;
pub mod retrain;
pub mod server;
pub mod trends;

pub use config::{MarketConfig, PathsConfig, ServiceConfig};
pub use errors::{Result, ServiceError, FAILURE_HINT};
pub use ledger::{LedgerEntry, SupplyLedger};
pub use predictor::{MarketOptions, PredictionReport, PredictionRequest, PricePredictor};
pub use retrain::{RetrainSummary, Retrainer};
pub use server::{build_router, start_server, AppState};
pub use trends::{OversupplyAssessment, PriceComparison, PriceTrends, ProductionBaseline, TrendRecord};

/// Service version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
