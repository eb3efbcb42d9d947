//! Integration test: Training pipeline end-to-end

mod common;

use house_price::dataset::PropertyRecord;
use house_price::inference::PredictionService;
use house_price::model::TrainedModel;
use house_price::training::{ModelType, ModelVariant, Trainer, TrainingConfig};
use house_price::utils::DataLoader;
use house_price::PricingError;

#[test]
fn test_generic_training_from_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_listing_csv(dir.path(), 100);

    let model = Trainer::new(TrainingConfig::new("price")).fit_csv(&path).unwrap();
    assert_eq!(model.model_type(), ModelType::RandomForest);
    assert_eq!(model.n_test_samples(), 20);
    assert_eq!(model.n_train_samples(), 80);
    assert_eq!(model.schema().len(), 8);
    assert!(model.metrics().r2.is_finite());
    assert!((model.metrics().r2_percentage - model.metrics().r2 * 100.0).abs() < 1e-9);
}

#[test]
fn test_training_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_listing_csv(dir.path(), 80);
    let config = TrainingConfig::for_variant(ModelVariant::Listing, "price").with_n_estimators(20);

    let first = Trainer::new(config.clone()).fit_csv(&path).unwrap();
    let second = Trainer::new(config).fit_csv(&path).unwrap();

    assert_eq!(first.metrics(), second.metrics());
    assert_eq!(first.model_type(), second.model_type());
    for (a, b) in first.candidates().iter().zip(second.candidates()) {
        assert_eq!(a.model_type, b.model_type);
        assert_eq!(a.metrics, b.metrics);
    }
    assert_ne!(first.id(), second.id());
}

#[test]
fn test_listing_variant_selects_best_candidate() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_listing_csv(dir.path(), 120);

    let model = Trainer::new(TrainingConfig::listing("price")).fit_csv(&path).unwrap();
    assert_eq!(model.schema().len(), 7);
    assert!(model.schema().position("property_id").is_none());
    assert_eq!(model.candidates().len(), 3);

    let best = model
        .candidates()
        .iter()
        .find(|c| c.model_type == model.model_type())
        .unwrap();
    for candidate in model.candidates() {
        assert!(candidate.metrics.r2 <= best.metrics.r2);
    }
    assert_eq!(model.metrics(), &best.metrics);
}

#[test]
fn test_listing_rejects_text_baths_column() {
    let dir = tempfile::tempdir().unwrap();

    // One "3+" turns the whole baths column into text
    let csv: Vec<String> = common::listing_csv(60)
        .lines()
        .enumerate()
        .map(|(i, line)| {
            if i != 5 {
                return line.to_string();
            }
            let mut fields: Vec<&str> = line.split(',').collect();
            fields[4] = "3+";
            fields.join(",")
        })
        .collect();
    let path = dir.path().join("House_dataset.csv");
    std::fs::write(&path, csv.join("\n")).unwrap();

    let err = Trainer::new(TrainingConfig::listing("price")).fit_csv(&path).unwrap_err();
    assert!(matches!(err, PricingError::SchemaError(_)), "got {}", err);
    assert!(err.to_string().contains("'baths' is categorical, expected numeric"));

    // Without an expected schema the same file still trains
    let generic = TrainingConfig::default().with_n_estimators(5);
    assert!(Trainer::new(generic).fit_csv(&path).is_ok());
}

#[test]
fn test_seed_changes_split() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = DataLoader::new().load_csv(common::write_listing_csv(dir.path(), 60)).unwrap();

    let a = Trainer::new(TrainingConfig::default().with_n_estimators(5).with_random_seed(1))
        .fit(&dataset)
        .unwrap();
    let b = Trainer::new(TrainingConfig::default().with_n_estimators(5).with_random_seed(2))
        .fit(&dataset)
        .unwrap();
    assert_ne!(a.metrics().mae, b.metrics().mae);
}

#[test]
fn test_missing_dataset() {
    let err = Trainer::new(TrainingConfig::default())
        .fit_csv("does/not/exist.csv")
        .unwrap_err();
    assert!(matches!(err, PricingError::DatasetNotFound(_)));
}

#[test]
fn test_unknown_feature_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_listing_csv(dir.path(), 30);

    let config = TrainingConfig::default().with_feature_columns(vec!["garden".to_string()]);
    assert!(Trainer::new(config).fit_csv(&path).is_err());
}

#[test]
fn test_missing_target_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_listing_csv(dir.path(), 30);
    assert!(Trainer::new(TrainingConfig::new("rent")).fit_csv(&path).is_err());
}

#[test]
fn test_save_load_preserves_predictions() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_listing_csv(dir.path(), 60);
    let model = Trainer::new(TrainingConfig::default().with_n_estimators(10)).fit_csv(&path).unwrap();

    let model_path = dir.path().join("models").join("model.bin");
    model.save(&model_path).unwrap();
    let loaded = TrainedModel::load(&model_path).unwrap();

    let record = PropertyRecord::from_json_object(common::example_listing().as_object().unwrap()).unwrap();
    let service = PredictionService::default();
    assert_eq!(
        service.predict(&model, &record).unwrap(),
        service.predict(&loaded, &record).unwrap()
    );
    assert_eq!(loaded.id(), model.id());
}
