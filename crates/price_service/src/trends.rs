//! Historical reference data and the reports built from it
//!
//! `crop_price_trends.csv` supplies average prices per (vegetable, variety);
//! `historical_production.csv` supplies the average yearly kilograms per
//! (vegetable, market). Columns beyond those read here are ignored, and a
//! missing file reads as empty.

use std::cmp::Ordering;
use std::path::Path;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::warn;

use crate::errors::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendRecord {
    pub vegetable: String,
    pub variety: String,
    pub avg_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRecord {
    pub vegetable: String,
    pub market: String,
    pub average_kg: f64,
}

fn read_reference<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        warn!("Reference file {} not found; treating it as empty", path.display());
        return Ok(Vec::new());
    }
    let mut reader = csv::Reader::from_path(path)?;
    let records = reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, csv::Error>>()?;
    Ok(records)
}

#[derive(Debug, Clone, Default)]
pub struct PriceTrends {
    records: Vec<TrendRecord>,
}

impl PriceTrends {
    pub fn new(records: Vec<TrendRecord>) -> Self {
        Self { records }
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(read_reference(path)?))
    }

    pub fn records(&self) -> &[TrendRecord] {
        &self.records
    }

    /// First recorded average for the pair
    pub fn average_price(&self, vegetable: &str, variety: &str) -> Option<f64> {
        self.records
            .iter()
            .find(|r| r.vegetable == vegetable && r.variety == variety)
            .map(|r| r.avg_price)
    }

    /// Best-priced rows for other vegetables, highest average first
    pub fn alternatives(&self, current_vegetable: &str, limit: usize) -> Vec<TrendRecord> {
        let mut candidates: Vec<&TrendRecord> = self
            .records
            .iter()
            .filter(|r| r.vegetable != current_vegetable)
            .collect();
        candidates.sort_by(|a, b| {
            b.avg_price
                .partial_cmp(&a.avg_price)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.vegetable.cmp(&b.vegetable))
                .then_with(|| a.variety.cmp(&b.variety))
        });
        candidates.into_iter().take(limit).cloned().collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductionBaseline {
    records: Vec<ProductionRecord>,
}

impl ProductionBaseline {
    pub fn new(records: Vec<ProductionRecord>) -> Self {
        Self { records }
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(read_reference(path)?))
    }

    pub fn average_kg(&self, vegetable: &str, market: &str) -> Option<f64> {
        self.records
            .iter()
            .find(|r| r.vegetable == vegetable && r.market == market)
            .map(|r| r.average_kg)
    }
}

/// Predicted price next to the historical average
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceComparison {
    pub predicted: f64,
    pub historical: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OversupplyAssessment {
    pub year: i32,
    pub total_kg: f64,
    pub average_kg: f64,
    pub oversupplied: bool,
    /// Empty unless oversupplied
    pub alternatives: Vec<TrendRecord>,
}

/// Compare the year's reported supply with the baseline; `None` without one
pub fn assess_oversupply(
    year: i32,
    total_kg: f64,
    baseline: Option<f64>,
    trends: &PriceTrends,
    current_vegetable: &str,
    max_alternatives: usize,
) -> Option<OversupplyAssessment> {
    let average_kg = baseline?;
    let oversupplied = total_kg >= average_kg;
    let alternatives = if oversupplied {
        trends.alternatives(current_vegetable, max_alternatives)
    } else {
        Vec::new()
    };
    Some(OversupplyAssessment {
        year,
        total_kg,
        average_kg,
        oversupplied,
        alternatives,
    })
}
