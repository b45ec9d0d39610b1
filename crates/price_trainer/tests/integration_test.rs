//! Integration tests for the forest trainer
//!
//! Exercises the CSV -> dataset -> forest -> artifact path used by the CLI and
//! by on-demand retraining.

use agriprice_core::{ArtifactLayout, FeatureSchema, ForestModel};
use agriprice_trainer::{fit_encoders, train_from_log, ForestConfig, TrainingLog, TrainingRow};
use anyhow::Result;

fn row(vegetable: &str, temperature: f64, month: u32, day_of_year: u32, price: f64) -> TrainingRow {
    TrainingRow {
        vegetable: vegetable.into(),
        variety: "Granola".into(),
        temperature,
        rainfall: 5.0,
        province: "Uva Province".into(),
        selling_market: "Welimada".into(),
        month,
        day_of_year,
        price,
    }
}

fn seeded_log(dir: &std::path::Path) -> Result<TrainingLog> {
    let log = TrainingLog::new(dir.join("welimada_training_data.csv"));
    for r in [
        row("Potato", 18.0, 1, 10, 220.0),
        row("Potato", 20.0, 2, 40, 205.0),
        row("Potato", 24.0, 3, 75, 170.0),
        row("Potato", 27.0, 4, 100, 150.0),
        row("Carrot", 19.0, 1, 12, 140.0),
        row("Carrot", 26.0, 4, 98, 110.0),
    ] {
        log.append(&r)?;
    }
    Ok(log)
}

fn config() -> ForestConfig {
    ForestConfig {
        num_trees: 16,
        max_depth: 6,
        min_samples_leaf: 1,
        seed: 42,
    }
}

#[test]
fn deterministic_training_from_log() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let log = seeded_log(dir.path())?;
    let encoders = fit_encoders(&log.read_all()?);

    let (a, rows_a) = train_from_log(&log, &encoders, FeatureSchema::dated(), "Welimada", config())?;
    let (b, rows_b) = train_from_log(&log, &encoders, FeatureSchema::dated(), "Welimada", config())?;

    assert_eq!(rows_a, 6);
    assert_eq!(rows_b, 6);
    assert_eq!(a.hash_hex()?, b.hash_hex()?, "same rows and seed must give the same forest");
    Ok(())
}

#[test]
fn trained_model_survives_artifact_roundtrip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let log = seeded_log(dir.path())?;
    let rows = log.read_all()?;
    let encoders = fit_encoders(&rows);
    let (model, _) = train_from_log(&log, &encoders, FeatureSchema::dated(), "Welimada", config())?;

    let layout = ArtifactLayout::new(dir.path().join("models"));
    layout.save_encoders("Welimada", &encoders)?;
    layout.write_model("Welimada", &model)?;

    let loaded = ForestModel::load_json(layout.model_path("Welimada"))?;
    let reloaded_encoders = layout.load_encoders("Welimada")?;
    assert_eq!(reloaded_encoders, encoders);

    for r in &rows {
        let vector = r.encode(&reloaded_encoders)?;
        assert_eq!(loaded.predict(&vector)?, model.predict(&vector)?);
    }
    Ok(())
}

#[test]
fn duplicated_rows_are_kept() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let log = seeded_log(dir.path())?;
    let extra = row("Potato", 25.0, 3, 75, 165.0);
    log.append(&extra)?;
    log.append(&extra)?;

    let rows = log.read_all()?;
    assert_eq!(rows.len(), 8);
    assert_eq!(rows[6], rows[7]);
    Ok(())
}
