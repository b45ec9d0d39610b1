//! Feature assembly for price models
//!
//! A `FeatureVector` carries every input by name. Positional rows are only
//! produced through [`FeatureVector::to_row`], which follows the schema the
//! consuming model declares, so column order can never drift silently.
//! Row values are fixed-point integers at [`SCALE`].

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::encoder::{CategoricalField, EncoderSet};
use crate::errors::{CoreError, Result};
use crate::forest::SCALE;

/// Named model input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureName {
    Vegetable,
    Variety,
    Temperature,
    Rainfall,
    Province,
    SellingMarket,
    Month,
    DayOfYear,
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FeatureName::Vegetable => "vegetable",
            FeatureName::Variety => "variety",
            FeatureName::Temperature => "temperature",
            FeatureName::Rainfall => "rainfall",
            FeatureName::Province => "province",
            FeatureName::SellingMarket => "selling_market",
            FeatureName::Month => "month",
            FeatureName::DayOfYear => "day_of_year",
        };
        f.write_str(name)
    }
}

/// Ordered list of features a model was fitted on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSchema(Vec<FeatureName>);

impl FeatureSchema {
    pub fn new(names: Vec<FeatureName>) -> Result<Self> {
        let schema = Self(names);
        schema.validate()?;
        Ok(schema)
    }

    /// `[vegetable, variety, temperature, rainfall, province, selling_market, month, day_of_year]`
    pub fn dated() -> Self {
        Self(vec![
            FeatureName::Vegetable,
            FeatureName::Variety,
            FeatureName::Temperature,
            FeatureName::Rainfall,
            FeatureName::Province,
            FeatureName::SellingMarket,
            FeatureName::Month,
            FeatureName::DayOfYear,
        ])
    }

    /// Earlier layout without the calendar columns
    pub fn undated() -> Self {
        Self(vec![
            FeatureName::Vegetable,
            FeatureName::Variety,
            FeatureName::Temperature,
            FeatureName::Rainfall,
            FeatureName::Province,
            FeatureName::SellingMarket,
        ])
    }

    pub fn names(&self) -> &[FeatureName] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(CoreError::SchemaMismatch("schema has no features".into()));
        }
        for (i, name) in self.0.iter().enumerate() {
            if self.0[..i].contains(name) {
                return Err(CoreError::SchemaMismatch(format!(
                    "feature {name} appears more than once"
                )));
            }
        }
        Ok(())
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::dated()
    }
}

/// Raw prediction scenario as entered by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropScenario {
    pub market: String,
    pub vegetable: String,
    pub variety: String,
    pub province: String,
    pub temperature: f64,
    pub rainfall: f64,
    pub date: NaiveDate,
}

/// Encoded inputs, addressable by name
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub vegetable: i64,
    pub variety: i64,
    pub temperature: f64,
    pub rainfall: f64,
    pub province: i64,
    pub selling_market: i64,
    pub month: u32,
    pub day_of_year: u32,
}

impl FeatureVector {
    /// Unscaled value of one feature
    pub fn value(&self, name: FeatureName) -> f64 {
        match name {
            FeatureName::Vegetable => self.vegetable as f64,
            FeatureName::Variety => self.variety as f64,
            FeatureName::Temperature => self.temperature,
            FeatureName::Rainfall => self.rainfall,
            FeatureName::Province => self.province as f64,
            FeatureName::SellingMarket => self.selling_market as f64,
            FeatureName::Month => f64::from(self.month),
            FeatureName::DayOfYear => f64::from(self.day_of_year),
        }
    }

    /// Unscaled values in schema order
    pub fn values(&self, schema: &FeatureSchema) -> Vec<f64> {
        schema.names().iter().map(|&name| self.value(name)).collect()
    }

    /// Fixed-point row in schema order
    pub fn to_row(&self, schema: &FeatureSchema) -> Vec<i64> {
        schema
            .names()
            .iter()
            .map(|&name| to_fixed(self.value(name)))
            .collect()
    }
}

/// Month (1-12) and 1-based day of year
pub fn calendar_features(date: NaiveDate) -> (u32, u32) {
    (date.month(), date.ordinal())
}

/// NaN and infinities have no fixed-point form
pub fn ensure_finite(name: FeatureName, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CoreError::ValidationFailed(format!(
            "{name} must be a finite number, got {value}"
        )))
    }
}

/// Encode a scenario with the market's encoders
pub fn assemble(scenario: &CropScenario, encoders: &EncoderSet) -> Result<FeatureVector> {
    let (month, day_of_year) = calendar_features(scenario.date);

    Ok(FeatureVector {
        vegetable: encoders.encode(CategoricalField::Vegetable, &scenario.vegetable)?,
        variety: encoders.encode(CategoricalField::Variety, &scenario.variety)?,
        temperature: ensure_finite(FeatureName::Temperature, scenario.temperature)?,
        rainfall: ensure_finite(FeatureName::Rainfall, scenario.rainfall)?,
        province: encoders.encode(CategoricalField::Province, &scenario.province)?,
        selling_market: encoders.encode(CategoricalField::Market, &scenario.market)?,
        month,
        day_of_year,
    })
}

/// Scale a float to fixed point
pub fn to_fixed(value: f64) -> i64 {
    (value * SCALE as f64).round() as i64
}

/// Convert a fixed-point value back to a float
pub fn from_fixed(value: i64) -> f64 {
    value as f64 / SCALE as f64
}
