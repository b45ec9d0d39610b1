//! Regression forest with deterministic inference
//!
//! The forest prediction is the integer mean of its trees' leaf values.
//! Every model declares the feature schema it was fitted on; rows are built
//! from that schema and checked against it before evaluation.

use super::tree::Tree;
use crate::errors::{CoreError, Result};
use crate::features::{from_fixed, FeatureSchema, FeatureVector};
use crate::serde_canon::{hash_canonical_hex, to_canonical_json};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Fixed-point scale for thresholds, leaves and targets (1e6)
pub const SCALE: i64 = 1_000_000;

const FORMAT_VERSION: u32 = 1;

/// Provenance recorded by the trainer
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelMetadata {
    pub market: String,
    /// Unix seconds
    pub trained_at: i64,
    pub training_rows: usize,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForestModel {
    pub version: u32,
    pub scale: i64,
    pub schema: FeatureSchema,
    pub trees: Vec<Tree>,
    pub metadata: ModelMetadata,
}

/// Hashed portion of a model; metadata is excluded so retraining on the same
/// rows yields the same hash
#[derive(Serialize)]
struct HashedBody<'a> {
    version: u32,
    scale: i64,
    schema: &'a FeatureSchema,
    trees: &'a [Tree],
}

impl ForestModel {
    pub fn new(schema: FeatureSchema, trees: Vec<Tree>, metadata: ModelMetadata) -> Self {
        Self {
            version: FORMAT_VERSION,
            scale: SCALE,
            schema,
            trees,
            metadata,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != FORMAT_VERSION {
            return Err(CoreError::ValidationFailed(format!(
                "unsupported model version: {}",
                self.version
            )));
        }
        if self.scale != SCALE {
            return Err(CoreError::ValidationFailed(format!(
                "unsupported scale: {} (expected {SCALE})",
                self.scale
            )));
        }
        if self.trees.is_empty() {
            return Err(CoreError::ValidationFailed("forest has no trees".into()));
        }
        self.schema.validate()?;

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate()
                .map_err(|e| CoreError::ValidationFailed(format!("tree {i}: {e}")))?;
            if let Some(max) = tree.max_feature() {
                if max >= self.schema.len() {
                    return Err(CoreError::SchemaMismatch(format!(
                        "tree {i} splits on feature {max} but the schema has {} features",
                        self.schema.len()
                    )));
                }
            }
        }

        Ok(())
    }

    /// Mean leaf value over all trees for a fixed-point row
    pub fn score(&self, row: &[i64]) -> i64 {
        if self.trees.is_empty() {
            return 0;
        }
        let sum: i128 = self
            .trees
            .iter()
            .map(|tree| tree.evaluate(row) as i128)
            .sum();
        (sum / self.trees.len() as i128) as i64
    }

    /// Score a positional row after checking its width against the schema
    pub fn predict_row(&self, row: &[i64]) -> Result<i64> {
        if row.len() != self.schema.len() {
            return Err(CoreError::SchemaMismatch(format!(
                "model expects {} features, got {}",
                self.schema.len(),
                row.len()
            )));
        }
        Ok(self.score(row))
    }

    /// Predicted price for an encoded scenario
    pub fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let row = features.to_row(&self.schema);
        self.predict_row(&row).map(from_fixed)
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn to_canonical_json(&self) -> Result<String> {
        Ok(to_canonical_json(self)?)
    }

    /// BLAKE3 hash over version, scale, schema and trees
    pub fn hash_hex(&self) -> Result<String> {
        let body = HashedBody {
            version: self.version,
            scale: self.scale,
            schema: &self.schema,
            trees: &self.trees,
        };
        Ok(hash_canonical_hex(&body)?)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_canonical_json()?)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let model: ForestModel = serde_json::from_str(&json)?;
        model.validate()?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::Node;

    fn forest() -> ForestModel {
        // Tree 1 splits on temperature (index 2), tree 2 on month (index 6)
        let t1 = Tree::new(vec![
            Node::split(2, 22 * SCALE, 1, 2),
            Node::leaf(100 * SCALE),
            Node::leaf(140 * SCALE),
        ]);
        let t2 = Tree::new(vec![
            Node::split(6, 6 * SCALE, 1, 2),
            Node::leaf(120 * SCALE),
            Node::leaf(80 * SCALE),
        ]);
        ForestModel::new(FeatureSchema::dated(), vec![t1, t2], ModelMetadata::default())
    }

    fn vector(temperature: f64, month: u32) -> FeatureVector {
        FeatureVector {
            vegetable: 0,
            variety: 0,
            temperature,
            rainfall: 5.0,
            province: 0,
            selling_market: 0,
            month,
            day_of_year: 75,
        }
    }

    #[test]
    fn prediction_is_tree_mean() {
        let model = forest();
        assert!(model.validate().is_ok());
        assert_eq!(model.predict(&vector(25.0, 3)).unwrap(), 130.0);
        assert_eq!(model.predict(&vector(20.0, 9)).unwrap(), 90.0);
    }

    #[test]
    fn prediction_is_deterministic() {
        let model = forest();
        let first = model.predict(&vector(23.5, 4)).unwrap();
        for _ in 0..50 {
            assert_eq!(model.predict(&vector(23.5, 4)).unwrap(), first);
        }
    }

    #[test]
    fn row_width_is_checked() {
        let model = forest();
        let err = model.predict_row(&[0; 6]).unwrap_err();
        assert!(matches!(err, CoreError::SchemaMismatch(_)));
    }

    #[test]
    fn split_outside_schema_fails_validation() {
        let mut model = forest();
        model.schema = FeatureSchema::undated();
        assert!(matches!(model.validate(), Err(CoreError::SchemaMismatch(_))));
    }

    #[test]
    fn hash_ignores_metadata() {
        let a = forest();
        let mut b = forest();
        b.metadata.trained_at = 1_700_000_000;
        b.metadata.training_rows = 12;
        assert_eq!(a.hash_hex().unwrap(), b.hash_hex().unwrap());

        b.trees.pop();
        assert_ne!(a.hash_hex().unwrap(), b.hash_hex().unwrap());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("welimada_model.json");
        let model = forest();
        model.save_json(&path).unwrap();

        let loaded = ForestModel::load_json(&path).unwrap();
        assert_eq!(loaded, model);
        assert_eq!(
            loaded.predict(&vector(25.0, 3)).unwrap(),
            model.predict(&vector(25.0, 3)).unwrap()
        );
    }
}
