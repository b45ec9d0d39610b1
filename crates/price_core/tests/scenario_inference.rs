//! End-to-end inference over artifacts loaded from disk

use agriprice_core::{
    assemble, ArtifactLayout, CategoricalField, CoreError, CropScenario, EncoderSet,
    EncoderStore, FeatureSchema, ForestModel, LabelEncoder, ModelMetadata, ModelStore, Node,
    Tree, SCALE,
};
use chrono::NaiveDate;

fn write_artifacts(layout: &ArtifactLayout) {
    let encoders = EncoderSet {
        vegetable: LabelEncoder::fit(CategoricalField::Vegetable, ["Potato", "Carrot"]),
        variety: LabelEncoder::fit(CategoricalField::Variety, ["Granola", "Desiree"]),
        province: LabelEncoder::fit(CategoricalField::Province, ["Uva Province"]),
        market: LabelEncoder::fit(CategoricalField::Market, ["Welimada", "Bandarawela"]),
    };
    layout.save_encoders("Welimada", &encoders).unwrap();

    // Price rises after day 60 of the year (day_of_year is index 7)
    let tree = Tree::new(vec![
        Node::split(7, 60 * SCALE, 1, 2),
        Node::leaf(180 * SCALE),
        Node::leaf(210 * SCALE),
    ]);
    let model = ForestModel::new(
        FeatureSchema::dated(),
        vec![tree],
        ModelMetadata {
            market: "Welimada".into(),
            ..Default::default()
        },
    );
    layout.write_model("Welimada", &model).unwrap();
}

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
fn known_scenario_predicts_from_loaded_model() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ArtifactLayout::new(dir.path());
    write_artifacts(&layout);

    let encoders = EncoderStore::load(&layout, &["Welimada"]).unwrap();
    let models = ModelStore::load(layout, &["Welimada"]).unwrap();

    let set = encoders.get("Welimada").unwrap();
    let vector = assemble(&scenario("Potato"), set).unwrap();
    assert_eq!(
        vector.values(&FeatureSchema::dated()),
        vec![1.0, 1.0, 25.0, 5.0, 0.0, 1.0, 3.0, 75.0]
    );

    let price = models.get("Welimada").unwrap().predict(&vector).unwrap();
    assert_eq!(price, 210.0);
}

#[test]
fn unknown_vegetable_never_reaches_the_model() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ArtifactLayout::new(dir.path());
    write_artifacts(&layout);

    let encoders = EncoderStore::load(&layout, &["Welimada"]).unwrap();
    let err = assemble(&scenario("Turnip"), encoders.get("Welimada").unwrap()).unwrap_err();
    assert!(matches!(err, CoreError::UnknownCategory { .. }));
    assert!(err.to_string().contains("Turnip"));
}
