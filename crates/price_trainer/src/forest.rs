//! Bootstrap-aggregated regression forest trainer
//!
//! Each tree is grown with [`CartBuilder`] on a bootstrap sample drawn with a
//! per-tree seed. The resulting model predicts the mean of its trees.

use agriprice_core::{FeatureSchema, ForestModel, ModelMetadata};
use serde::{Deserialize, Serialize};

use crate::cart::{CartBuilder, TreeConfig};
use crate::dataset::Dataset;
use crate::deterministic::{tree_seed, LcgRng};
use crate::errors::TrainerError;

/// Forest training configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub num_trees: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            num_trees: 100,
            max_depth: 12,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

pub struct ForestTrainer {
    config: ForestConfig,
}

impl ForestTrainer {
    pub fn new(config: ForestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Fit a forest for `market` on rows laid out in `schema` order
    pub fn train(
        &self,
        dataset: &Dataset,
        schema: FeatureSchema,
        market: &str,
    ) -> Result<ForestModel, TrainerError> {
        if dataset.is_empty() {
            return Err(TrainerError::Dataset("dataset is empty".into()));
        }
        if dataset.feature_count != schema.len() {
            return Err(TrainerError::Dataset(format!(
                "dataset has {} features but the schema lists {}",
                dataset.feature_count,
                schema.len()
            )));
        }
        if self.config.num_trees == 0 {
            return Err(TrainerError::Training("num_trees must be positive".into()));
        }

        let tree_config = TreeConfig {
            max_depth: self.config.max_depth,
            min_samples_leaf: self.config.min_samples_leaf,
        };
        let builder = CartBuilder::new(dataset, tree_config);

        let mut trees = Vec::with_capacity(self.config.num_trees);
        for tree_idx in 0..self.config.num_trees {
            let mut rng = LcgRng::new(tree_seed(self.config.seed, tree_idx));
            let sample = dataset.bootstrap(&mut rng);
            let tree = builder.build(&sample);
            tracing::debug!(
                "Tree {}/{} grown with {} nodes",
                tree_idx + 1,
                self.config.num_trees,
                tree.nodes.len()
            );
            trees.push(tree);
        }

        let metadata = ModelMetadata {
            market: market.to_string(),
            trained_at: chrono::Utc::now().timestamp(),
            training_rows: dataset.len(),
            seed: self.config.seed,
        };

        let model = ForestModel::new(schema, trees, metadata);
        model.validate()?;
        Ok(model)
    }
}
