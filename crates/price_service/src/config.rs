//! Dashboard configuration
//!
//! Sources, lowest precedence first: built-in defaults, a TOML file
//! (`--config`, else `config/agriprice.toml` when present), then
//! `AGRIPRICE_*` environment variables. Command-line flags are applied by the
//! binary on top of the result.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use agriprice_core::market_slug;
use agriprice_trainer::ForestConfig;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ServiceError};

/// Config file picked up when no `--config` is given
pub const DEFAULT_CONFIG_PATH: &str = "config/agriprice.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub paths: PathsConfig,
    pub markets: Vec<MarketConfig>,
    pub retrain: ForestConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub model_dir: PathBuf,
    pub data_dir: PathBuf,
}

/// A selling market and the weather defaults pre-filled in its form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConfig {
    pub name: String,
    pub default_temperature: f64,
    pub default_rainfall: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Upper bound on suggested alternative crops
    pub max_alternatives: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            paths: PathsConfig::default(),
            markets: vec![
                MarketConfig::new("Welimada", 25.0, 5.0),
                MarketConfig::new("Bandarawela", 22.0, 8.0),
                MarketConfig::new("Nuwara Eliya", 20.0, 10.0),
            ],
            retrain: ForestConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            data_dir: PathBuf::from("data"),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { max_alternatives: 3 }
    }
}

impl MarketConfig {
    pub fn new(name: &str, default_temperature: f64, default_rainfall: f64) -> Self {
        Self {
            name: name.to_string(),
            default_temperature,
            default_rainfall,
        }
    }
}

impl PathsConfig {
    /// Append-only record of reported production
    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join("farmer_entries.csv")
    }

    pub fn trends_path(&self) -> PathBuf {
        self.data_dir.join("crop_price_trends.csv")
    }

    pub fn production_path(&self) -> PathBuf {
        self.data_dir.join("historical_production.csv")
    }

    pub fn training_log_path(&self, market: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}_training_data.csv", market_slug(market)))
    }
}

impl ServiceConfig {
    /// Resolve the effective configuration from file and environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ServiceError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ServiceError::Config(format!("Failed to parse config file: {e}")))
    }

    /// Apply `AGRIPRICE_*` overrides read through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("AGRIPRICE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("AGRIPRICE_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ServiceError::Config(format!("AGRIPRICE_PORT is not a port: {port}")))?;
        }
        if let Some(dir) = lookup("AGRIPRICE_MODEL_DIR") {
            self.paths.model_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("AGRIPRICE_DATA_DIR") {
            self.paths.data_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.markets.is_empty() {
            return Err(ServiceError::Config("no markets configured".into()));
        }
        let mut seen = BTreeSet::new();
        for market in &self.markets {
            if market.name.trim().is_empty() {
                return Err(ServiceError::Config("market name is empty".into()));
            }
            if !seen.insert(market_slug(&market.name)) {
                return Err(ServiceError::Config(format!(
                    "market {} is configured twice",
                    market.name
                )));
            }
        }
        if self.retrain.num_trees == 0 {
            return Err(ServiceError::Config("retrain.num_trees must be positive".into()));
        }
        Ok(())
    }

    pub fn market(&self, name: &str) -> Option<&MarketConfig> {
        self.markets.iter().find(|m| m.name == name)
    }

    pub fn market_names(&self) -> Vec<String> {
        self.markets.iter().map(|m| m.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_cover_three_markets() {
        let config = ServiceConfig::default();
        config.validate().unwrap();
        assert_eq!(
            config.market_names(),
            vec!["Welimada", "Bandarawela", "Nuwara Eliya"]
        );
        let nuwara = config.market("Nuwara Eliya").unwrap();
        assert_eq!(nuwara.default_temperature, 20.0);
        assert_eq!(nuwara.default_rainfall, 10.0);
        assert_eq!(config.report.max_alternatives, 3);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ServiceConfig::from_toml_str(
            r#"
            [server]
            port = 9000

            [retrain]
            num_trees = 25
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.retrain.num_trees, 25);
        assert_eq!(config.retrain.seed, 42);
        assert_eq!(config.markets.len(), 3);
    }

    #[test]
    fn markets_from_toml_replace_defaults() {
        let config = ServiceConfig::from_toml_str(
            r#"
            [[markets]]
            name = "Dambulla"
            default_temperature = 30.0
            default_rainfall = 2.5
            "#,
        )
        .unwrap();
        assert_eq!(config.market_names(), vec!["Dambulla"]);
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = [
            ("AGRIPRICE_HOST", "0.0.0.0"),
            ("AGRIPRICE_PORT", "8080"),
            ("AGRIPRICE_DATA_DIR", "/srv/agri/data"),
        ]
        .into_iter()
        .collect();

        let mut config = ServiceConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.paths.data_dir, PathBuf::from("/srv/agri/data"));
        assert_eq!(config.paths.model_dir, PathBuf::from("models"));
    }

    #[test]
    fn bad_port_override_rejected() {
        let mut config = ServiceConfig::default();
        let err = config
            .apply_overrides(|key| (key == "AGRIPRICE_PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Config(_)));
    }

    #[test]
    fn validation_rejects_bad_market_lists() {
        let mut config = ServiceConfig::default();
        config.markets.clear();
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.markets.push(MarketConfig::new("Nuwara  Eliya", 1.0, 1.0));
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.retrain.num_trees = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn data_paths() {
        let paths = PathsConfig::default();
        assert_eq!(paths.ledger_path(), PathBuf::from("data/farmer_entries.csv"));
        assert_eq!(
            paths.training_log_path("Nuwara Eliya"),
            PathBuf::from("data/nuwaraeliya_training_data.csv")
        );
    }
}
