//! Per-market encoder and model stores
//!
//! Artifacts are loaded once at startup from a single directory:
//! `<slug>_model.json` and `<slug>_<field>_encoder.json`, where the slug is
//! the market name lower-cased with whitespace removed. The model store is
//! the only mutable piece: retraining replaces a market's model on disk and
//! in memory.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::encoder::{CategoricalField, EncoderSet, LabelEncoder};
use crate::errors::{CoreError, Result};
use crate::forest::ForestModel;

/// File-name stem for a market ("Nuwara Eliya" -> "nuwaraeliya")
pub fn market_slug(market: &str) -> String {
    market
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Where a market's artifacts live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    root: PathBuf,
}

impl ArtifactLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn model_path(&self, market: &str) -> PathBuf {
        self.root.join(format!("{}_model.json", market_slug(market)))
    }

    pub fn encoder_path(&self, market: &str, field: CategoricalField) -> PathBuf {
        self.root
            .join(format!("{}_{}_encoder.json", market_slug(market), field))
    }

    pub fn load_encoders(&self, market: &str) -> Result<EncoderSet> {
        let load = |field| {
            let path = self.encoder_path(market, field);
            debug!("Loading {} encoder from {}", field, path.display());
            let encoder = LabelEncoder::load_json(&path)?;
            if encoder.field != field {
                return Err(CoreError::ValidationFailed(format!(
                    "{} holds a {} encoder, expected {}",
                    path.display(),
                    encoder.field,
                    field
                )));
            }
            Ok(encoder)
        };

        Ok(EncoderSet {
            vegetable: load(CategoricalField::Vegetable)?,
            variety: load(CategoricalField::Variety)?,
            province: load(CategoricalField::Province)?,
            market: load(CategoricalField::Market)?,
        })
    }

    pub fn save_encoders(&self, market: &str, encoders: &EncoderSet) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        for field in CategoricalField::ALL {
            encoders
                .get(field)
                .save_json(self.encoder_path(market, field))?;
        }
        Ok(())
    }

    /// Write a model through a temp file in the same directory and rename it
    /// over the previous one
    pub fn write_model(&self, market: &str, model: &ForestModel) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.root)?;
        let path = self.model_path(market);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        tmp.write_all(model.to_canonical_json()?.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| CoreError::Io(e.error))?;
        Ok(path)
    }
}

/// Market name -> fitted encoders
#[derive(Debug, Clone, Default)]
pub struct EncoderStore {
    sets: BTreeMap<String, EncoderSet>,
}

impl EncoderStore {
    #[instrument(skip(layout, markets))]
    pub fn load<S: AsRef<str>>(layout: &ArtifactLayout, markets: &[S]) -> Result<Self> {
        let mut store = Self::default();
        for market in markets {
            let market = market.as_ref();
            store.insert(market, layout.load_encoders(market)?);
        }
        info!("Loaded encoders for {} markets", store.sets.len());
        Ok(store)
    }

    pub fn insert(&mut self, market: &str, encoders: EncoderSet) {
        self.sets.insert(market.to_string(), encoders);
    }

    pub fn get(&self, market: &str) -> Result<&EncoderSet> {
        self.sets
            .get(market)
            .ok_or_else(|| CoreError::UnknownMarket(market.to_string()))
    }

    pub fn markets(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }
}

/// Market name -> fitted model
#[derive(Debug, Clone)]
pub struct ModelStore {
    layout: ArtifactLayout,
    models: BTreeMap<String, ForestModel>,
}

impl ModelStore {
    pub fn new(layout: ArtifactLayout) -> Self {
        Self {
            layout,
            models: BTreeMap::new(),
        }
    }

    #[instrument(skip(layout, markets), fields(root = %layout.root().display()))]
    pub fn load<S: AsRef<str>>(layout: ArtifactLayout, markets: &[S]) -> Result<Self> {
        let mut store = Self::new(layout);
        for market in markets {
            let market = market.as_ref();
            let path = store.layout.model_path(market);
            let model = ForestModel::load_json(&path)?;
            info!(
                "Model for {} loaded from {} ({} trees)",
                market,
                path.display(),
                model.num_trees()
            );
            store.models.insert(market.to_string(), model);
        }
        Ok(store)
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    pub fn get(&self, market: &str) -> Result<&ForestModel> {
        self.models
            .get(market)
            .ok_or_else(|| CoreError::UnknownMarket(market.to_string()))
    }

    /// Install a model in memory only
    pub fn insert(&mut self, market: &str, model: ForestModel) {
        self.models.insert(market.to_string(), model);
    }

    /// Persist a model and swap it in; last write wins, no history is kept
    #[instrument(skip(self, model), fields(market = %market))]
    pub fn replace(&mut self, market: &str, model: ForestModel) -> Result<String> {
        model.validate()?;
        let hash = model.hash_hex()?;
        let path = self.layout.write_model(market, &model)?;
        self.models.insert(market.to_string(), model);
        info!("Replaced model for {} at {} (hash {})", market, path.display(), hash);
        Ok(hash)
    }
}
