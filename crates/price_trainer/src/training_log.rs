//! Per-market training CSV
//!
//! Columns: `vegetable, variety, temperature, rainfall, province,
//! selling_market, Month, DayOfYear, price`. The file is append-only; rows are
//! never de-duplicated.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use agriprice_core::{
    calendar_features, ensure_finite, to_fixed, CategoricalField, CoreError, CropScenario,
    EncoderSet, FeatureName, FeatureSchema, FeatureVector, LabelEncoder,
};
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::errors::TrainerError;

/// One training sample with raw labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRow {
    pub vegetable: String,
    pub variety: String,
    pub temperature: f64,
    pub rainfall: f64,
    pub province: String,
    pub selling_market: String,
    #[serde(rename = "Month")]
    pub month: u32,
    #[serde(rename = "DayOfYear")]
    pub day_of_year: u32,
    pub price: f64,
}

impl TrainingRow {
    /// Row for a scenario labelled with `price`
    pub fn from_scenario(scenario: &CropScenario, price: f64) -> Self {
        let (month, day_of_year) = calendar_features(scenario.date);
        Self {
            vegetable: scenario.vegetable.clone(),
            variety: scenario.variety.clone(),
            temperature: scenario.temperature,
            rainfall: scenario.rainfall,
            province: scenario.province.clone(),
            selling_market: scenario.market.clone(),
            month,
            day_of_year,
            price,
        }
    }

    pub fn encode(&self, encoders: &EncoderSet) -> agriprice_core::Result<FeatureVector> {
        Ok(FeatureVector {
            vegetable: encoders.encode(CategoricalField::Vegetable, &self.vegetable)?,
            variety: encoders.encode(CategoricalField::Variety, &self.variety)?,
            temperature: ensure_finite(FeatureName::Temperature, self.temperature)?,
            rainfall: ensure_finite(FeatureName::Rainfall, self.rainfall)?,
            province: encoders.encode(CategoricalField::Province, &self.province)?,
            selling_market: encoders.encode(CategoricalField::Market, &self.selling_market)?,
            month: self.month,
            day_of_year: self.day_of_year,
        })
    }
}

#[derive(Debug, Clone)]
pub struct TrainingLog {
    path: PathBuf,
}

impl TrainingLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row, writing the header when the file is new or empty
    pub fn append(&self, row: &TrainingRow) -> Result<(), TrainerError> {
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
        writer.serialize(row)?;
        writer.flush()?;
        Ok(())
    }

    /// Every row in file order; a missing file has no rows
    pub fn read_all(&self) -> Result<Vec<TrainingRow>, TrainerError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let rows = reader
            .deserialize()
            .collect::<Result<Vec<TrainingRow>, csv::Error>>()?;
        Ok(rows)
    }
}

/// Encode rows into a dataset laid out in `schema` order
pub fn build_dataset(
    rows: &[TrainingRow],
    encoders: &EncoderSet,
    schema: &FeatureSchema,
) -> Result<Dataset, TrainerError> {
    let mut dataset = Dataset::new(schema.len());
    for (line, row) in rows.iter().enumerate() {
        let vector = row
            .encode(encoders)
            .and_then(|vector| {
                if row.price.is_finite() {
                    Ok(vector)
                } else {
                    Err(CoreError::ValidationFailed(format!(
                        "price must be a finite number, got {}",
                        row.price
                    )))
                }
            })
            .map_err(|e| TrainerError::Dataset(format!("training row {}: {e}", line + 1)))?;
        dataset.push(vector.to_row(schema), to_fixed(row.price))?;
    }
    Ok(dataset)
}

/// Fit a fresh encoder set on the labels present in `rows`
pub fn fit_encoders(rows: &[TrainingRow]) -> EncoderSet {
    EncoderSet {
        vegetable: LabelEncoder::fit(
            CategoricalField::Vegetable,
            rows.iter().map(|r| r.vegetable.clone()),
        ),
        variety: LabelEncoder::fit(
            CategoricalField::Variety,
            rows.iter().map(|r| r.variety.clone()),
        ),
        province: LabelEncoder::fit(
            CategoricalField::Province,
            rows.iter().map(|r| r.province.clone()),
        ),
        market: LabelEncoder::fit(
            CategoricalField::Market,
            rows.iter().map(|r| r.selling_market.clone()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agriprice_core::SCALE;
    use chrono::NaiveDate;

    fn scenario(vegetable: &str) -> CropScenario {
        CropScenario {
            market: "Welimada".into(),
            vegetable: vegetable.into(),
            variety: "Granola".into(),
            province: "Uva Province".into(),
            temperature: 25.0,
            rainfall: 5.0,
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        }
    }

    #[test]
    fn row_from_scenario_carries_calendar_fields() {
        let row = TrainingRow::from_scenario(&scenario("Potato"), 182.5);
        assert_eq!(row.month, 3);
        assert_eq!(row.day_of_year, 75);
        assert_eq!(row.selling_market, "Welimada");
        assert_eq!(row.price, 182.5);
    }

    #[test]
    fn append_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let log = TrainingLog::new(dir.path().join("welimada_training_data.csv"));
        let row = TrainingRow::from_scenario(&scenario("Potato"), 180.0);

        log.append(&row).unwrap();
        log.append(&row).unwrap();

        let text = std::fs::read_to_string(log.path()).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("vegetable,variety,temperature,rainfall,province,selling_market,Month,DayOfYear,price")
        );
        assert_eq!(lines.count(), 2);
        assert_eq!(log.read_all().unwrap(), vec![row.clone(), row]);
    }

    #[test]
    fn missing_log_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = TrainingLog::new(dir.path().join("absent.csv"));
        assert!(log.read_all().unwrap().is_empty());
    }

    #[test]
    fn dataset_uses_schema_and_encoders() {
        let rows = vec![
            TrainingRow::from_scenario(&scenario("Potato"), 180.0),
            TrainingRow::from_scenario(&scenario("Carrot"), 120.0),
        ];
        let encoders = fit_encoders(&rows);
        let dataset = build_dataset(&rows, &encoders, &FeatureSchema::dated()).unwrap();

        assert_eq!(dataset.feature_count, 8);
        assert_eq!(dataset.features[0][0], SCALE); // Potato after Carrot
        assert_eq!(dataset.features[1][0], 0);
        assert_eq!(dataset.features[0][7], 75 * SCALE);
        assert_eq!(dataset.targets, vec![180 * SCALE, 120 * SCALE]);
    }

    #[test]
    fn non_finite_values_fail_dataset_build() {
        let mut hot = TrainingRow::from_scenario(&scenario("Potato"), 180.0);
        hot.temperature = f64::INFINITY;
        let unpriced = TrainingRow::from_scenario(&scenario("Potato"), f64::NAN);
        let encoders = fit_encoders(&[hot.clone()]);

        let err = build_dataset(&[hot], &encoders, &FeatureSchema::dated()).unwrap_err();
        assert!(err.to_string().contains("temperature"));

        let err = build_dataset(&[unpriced], &encoders, &FeatureSchema::dated()).unwrap_err();
        assert!(err.to_string().contains("price"));
    }

    #[test]
    fn nan_read_back_from_csv_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("welimada_training_data.csv");
        std::fs::write(
            &path,
            "vegetable,variety,temperature,rainfall,province,selling_market,Month,DayOfYear,price\n\
             Potato,Granola,NaN,5.0,Uva Province,Welimada,3,75,180.0\n",
        )
        .unwrap();
        let rows = TrainingLog::new(&path).read_all().unwrap();
        let encoders = fit_encoders(&rows);
        assert!(build_dataset(&rows, &encoders, &FeatureSchema::dated()).is_err());
    }

    #[test]
    fn unseen_label_fails_dataset_build() {
        let known = vec![TrainingRow::from_scenario(&scenario("Potato"), 180.0)];
        let encoders = fit_encoders(&known);
        let rows = vec![TrainingRow::from_scenario(&scenario("Turnip"), 90.0)];
        let err = build_dataset(&rows, &encoders, &FeatureSchema::dated()).unwrap_err();
        assert!(err.to_string().contains("Turnip"));
    }
}
