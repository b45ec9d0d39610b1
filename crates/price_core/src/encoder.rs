//! Categorical label encoders
//!
//! A `LabelEncoder` maps a closed, sorted set of class labels to integer codes
//! (the class index). Values outside the fitted set are rejected; there is no
//! fallback code.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::errors::{CoreError, Result};

/// The four categorical inputs every market encodes independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalField {
    Vegetable,
    Variety,
    Province,
    Market,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 4] = [
        CategoricalField::Vegetable,
        CategoricalField::Variety,
        CategoricalField::Province,
        CategoricalField::Market,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoricalField::Vegetable => "vegetable",
            CategoricalField::Variety => "variety",
            CategoricalField::Province => "province",
            CategoricalField::Market => "market",
        }
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fitted categorical ↔ integer mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    pub field: CategoricalField,
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit an encoder on the given labels; classes are de-duplicated and sorted
    pub fn fit<I, S>(field: CategoricalField, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let classes: BTreeSet<String> = labels.into_iter().map(Into::into).collect();
        Self {
            field,
            classes: classes.into_iter().collect(),
        }
    }

    /// Ordered set of recognized classes
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn contains(&self, label: &str) -> bool {
        self.classes.binary_search_by(|c| c.as_str().cmp(label)).is_ok()
    }

    /// Integer code for a known label
    pub fn transform(&self, label: &str) -> Result<i64> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .map(|idx| idx as i64)
            .map_err(|_| CoreError::UnknownCategory {
                field: self.field,
                value: label.to_string(),
            })
    }

    /// Label for a code, if the code is in range
    pub fn inverse_transform(&self, code: i64) -> Option<&str> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| self.classes.get(idx))
            .map(String::as_str)
    }

    /// Classes must be strictly increasing so binary search stays valid
    pub fn validate(&self) -> Result<()> {
        if self.classes.is_empty() {
            return Err(CoreError::ValidationFailed(format!(
                "{} encoder has no classes",
                self.field
            )));
        }
        if self.classes.windows(2).any(|w| w[0] >= w[1]) {
            return Err(CoreError::ValidationFailed(format!(
                "{} encoder classes are not sorted and unique",
                self.field
            )));
        }
        Ok(())
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let encoder: LabelEncoder = serde_json::from_str(&json)?;
        encoder.validate()?;
        Ok(encoder)
    }
}

/// The encoders fitted for one market
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderSet {
    pub vegetable: LabelEncoder,
    pub variety: LabelEncoder,
    pub province: LabelEncoder,
    pub market: LabelEncoder,
}

impl EncoderSet {
    pub fn get(&self, field: CategoricalField) -> &LabelEncoder {
        match field {
            CategoricalField::Vegetable => &self.vegetable,
            CategoricalField::Variety => &self.variety,
            CategoricalField::Province => &self.province,
            CategoricalField::Market => &self.market,
        }
    }

    pub fn encode(&self, field: CategoricalField, label: &str) -> Result<i64> {
        self.get(field).transform(label)
    }
}
