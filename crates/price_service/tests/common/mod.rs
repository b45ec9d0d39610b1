//! Shared fixture: one market (Welimada) with hand-built artifacts

#![allow(dead_code)]

use agriprice_core::{
    ArtifactLayout, CategoricalField, CropScenario, EncoderSet, FeatureSchema, ForestModel,
    LabelEncoder, ModelMetadata, Node, Tree, SCALE,
};
use agriprice_service::{MarketConfig, PredictionRequest, PricePredictor, ServiceConfig};
use agriprice_trainer::ForestConfig;
use chrono::NaiveDate;
use tempfile::TempDir;

pub struct Fixture {
    pub dir: TempDir,
    pub config: ServiceConfig,
}

/// Day of year <= 60 -> 180, later -> 210
pub fn seasonal_model() -> ForestModel {
    ForestModel::new(
        FeatureSchema::dated(),
        vec![Tree::new(vec![
            Node::split(7, 60 * SCALE, 1, 2),
            Node::leaf(180 * SCALE),
            Node::leaf(210 * SCALE),
        ])],
        ModelMetadata::default(),
    )
}

pub fn encoders() -> EncoderSet {
    EncoderSet {
        vegetable: LabelEncoder::fit(CategoricalField::Vegetable, ["Potato", "Carrot"]),
        variety: LabelEncoder::fit(CategoricalField::Variety, ["Granola"]),
        province: LabelEncoder::fit(CategoricalField::Province, ["Uva Province"]),
        market: LabelEncoder::fit(CategoricalField::Market, ["Welimada"]),
    }
}

pub fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();

    let mut config = ServiceConfig::default();
    config.paths.model_dir = dir.path().join("models");
    config.paths.data_dir = dir.path().join("data");
    config.markets = vec![MarketConfig::new("Welimada", 25.0, 5.0)];
    config.retrain = ForestConfig {
        num_trees: 4,
        max_depth: 4,
        min_samples_leaf: 1,
        seed: 42,
    };

    let layout = ArtifactLayout::new(&config.paths.model_dir);
    layout.save_encoders("Welimada", &encoders()).unwrap();
    layout.write_model("Welimada", &seasonal_model()).unwrap();

    std::fs::create_dir_all(&config.paths.data_dir).unwrap();
    std::fs::write(
        config.paths.trends_path(),
        "vegetable,variety,avg_price\n\
         Potato,Granola,200.0\n\
         Carrot,New Kuroda,150.0\n\
         Leeks,Local,260.0\n\
         Beans,Kentucky,150.0\n\
         Cabbage,Green Coronet,90.0\n",
    )
    .unwrap();
    std::fs::write(
        config.paths.production_path(),
        "vegetable,market,average_kg\nPotato,Welimada,1000.0\n",
    )
    .unwrap();

    Fixture { dir, config }
}

impl Fixture {
    pub fn predictor(&self) -> PricePredictor {
        PricePredictor::from_config(&self.config).unwrap()
    }
}

pub fn request(vegetable: &str, production_kg: Option<f64>, retrain: bool) -> PredictionRequest {
    PredictionRequest {
        scenario: CropScenario {
            market: "Welimada".into(),
            vegetable: vegetable.into(),
            variety: "Granola".into(),
            province: "Uva Province".into(),
            temperature: 25.0,
            rainfall: 5.0,
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        },
        production_kg,
        retrain,
    }
}
