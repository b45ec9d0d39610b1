//! Supply ledger
//!
//! Append-only CSV of planned production submitted with predictions
//! (`vegetable,market,year,kg`). Resubmissions are kept as separate rows.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{Result, ServiceError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub vegetable: String,
    pub market: String,
    pub year: i32,
    pub kg: f64,
}

impl LedgerEntry {
    fn matches(&self, vegetable: &str, market: &str, year: i32) -> bool {
        self.year == year && self.vegetable == vegetable && self.market == market
    }
}

#[derive(Debug, Clone)]
pub struct SupplyLedger {
    path: PathBuf,
}

impl SupplyLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Non-finite quantities are refused
    pub fn append(&self, entry: &LedgerEntry) -> Result<()> {
        if !entry.kg.is_finite() {
            return Err(ServiceError::InvalidInput(format!(
                "kg must be a finite number, got {}",
                entry.kg
            )));
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(entry)?;
        writer.flush()?;
        debug!(
            "Ledger += {} kg {} at {} ({})",
            entry.kg, entry.vegetable, entry.market, entry.year
        );
        Ok(())
    }

    /// All rows in submission order
    pub fn entries(&self) -> Result<Vec<LedgerEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let entries = reader
            .deserialize()
            .collect::<std::result::Result<Vec<LedgerEntry>, csv::Error>>()?;
        Ok(entries)
    }

    /// Sum of every submission for (vegetable, market, year)
    pub fn total_kg(&self, vegetable: &str, market: &str, year: i32) -> Result<f64> {
        Ok(self
            .entries()?
            .iter()
            .filter(|e| e.matches(vegetable, market, year))
            .map(|e| e.kg)
            .sum())
    }
}
