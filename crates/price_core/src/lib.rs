//! Price prediction core
//!
//! Everything needed to turn a crop scenario into a price with a pre-fitted
//! per-market model:
//!
//! - `encoder`: closed-set label encoders for the categorical inputs
//! - `features`: named feature vectors and schema-ordered rows
//! - `forest`: integer-only regression forest inference
//! - `store`: per-market encoder and model stores on disk
//! - `serde_canon`: canonical JSON for hashable model files

pub mod encoder;
pub mod errors;
pub mod features;
pub mod forest;
pub mod serde_canon;
pub mod store;

pub use encoder::{CategoricalField, EncoderSet, LabelEncoder};
pub use errors::{CoreError, Result};
pub use features::{
    assemble, calendar_features, ensure_finite, from_fixed, to_fixed, CropScenario, FeatureName,
    FeatureSchema, FeatureVector,
};
pub use forest::{ForestModel, ModelMetadata, Node, Tree, SCALE};
pub use store::{market_slug, ArtifactLayout, EncoderStore, ModelStore};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
