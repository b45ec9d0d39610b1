//! Deterministic regression forest inference
//!
//! Per-market price models are bootstrap-aggregated regression trees stored
//! with integer-only values:
//!
//! - thresholds, leaves and inputs are fixed-point integers at [`SCALE`]
//! - traversal goes left when `feature <= threshold`
//! - the forest output is the integer mean of its trees
//! - files are canonical JSON (sorted keys) so the BLAKE3 hash is stable
//!
//! ```json
//! {
//!   "metadata": {"market":"Welimada","seed":42,"trained_at":1710460800,"training_rows":120},
//!   "scale": 1000000,
//!   "schema": ["vegetable","variety","temperature","rainfall","province","selling_market","month","day_of_year"],
//!   "trees": [
//!     {"nodes":[
//!       {"feature":2,"leaf":null,"left":1,"right":2,"threshold":22000000},
//!       {"feature":-1,"leaf":100000000,"left":-1,"right":-1,"threshold":0},
//!       {"feature":-1,"leaf":140000000,"left":-1,"right":-1,"threshold":0}
//!     ]}
//!   ],
//!   "version": 1
//! }
//! ```

pub mod model;
pub mod tree;

pub use model::{ForestModel, ModelMetadata, SCALE};
pub use tree::{Node, Tree};
