//! End-to-end training and persistence tests: CSV on disk through
//! training, artifact save/load and prediction agreement.

use agrisense_learning::{
    ArtifactStore, CROP_ENCODER_FILE, FERTILIZER_ENCODER_FILE, MODEL_FILE, SOIL_ENCODER_FILE,
    TrainerConfig, load_dataset, train,
};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::path::PathBuf;

/// Write a small but learnable training CSV: three fertilizer regimes
/// with separated nutrient clusters, twelve rows each.
fn write_training_csv(dir: &std::path::Path) -> PathBuf {
    let path = dir.join("data_core.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        "Temparature,Humidity,Moisture,Soil Type,Crop Type,Nitrogen,Potassium,Phosphorous,Fertilizer Name"
    )
    .unwrap();

    let regimes = [
        // (nitrogen, potassium, phosphorous, soil, crop, label)
        (35.0, 0.0, 5.0, "Sandy", "Maize", "Urea"),
        (12.0, 0.0, 36.0, "Loamy", "Sugarcane", "DAP"),
        (22.0, 20.0, 20.0, "Black", "Cotton", "28-28"),
    ];
    for (n, k, p, soil, crop, label) in regimes {
        for i in 0..12 {
            let jitter = (i % 4) as f64;
            writeln!(
                file,
                "{},{},{},{},{},{},{},{},{}",
                26.0 + jitter,
                52.0 + jitter,
                38.0 + jitter,
                soil,
                crop,
                n + jitter,
                k + jitter,
                p + jitter,
                label
            )
            .unwrap();
        }
    }
    path
}

fn small_config() -> TrainerConfig {
    TrainerConfig::builder()
        .n_trees(20)
        .max_depth(6)
        .min_samples_split(2)
        .min_samples_leaf(1)
        .build()
        .unwrap()
}

#[test]
fn test_train_from_csv_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_training_csv(dir.path());

    let df = load_dataset(&csv).unwrap();
    let (bundle, report) = train(&df, &small_config()).unwrap();

    assert!(report.accuracy > 0.5, "accuracy was {}", report.accuracy);
    assert_eq!(report.train_rows + report.test_rows, 36);
    assert_eq!(
        bundle.fertilizer_encoder().classes(),
        &["28-28", "DAP", "Urea"]
    );

    let store = ArtifactStore::new(dir.path().join("artifacts"));
    store.save(&bundle).unwrap();
    let loaded = store.load().unwrap();

    // Persisted and in-memory models agree on a training-regime sample.
    let sample = [35.0, 5.0, 0.0, 26.0, 52.0, 38.0, 2.0, 1.0];
    assert_eq!(
        loaded.model().predict(&sample).unwrap(),
        bundle.model().predict(&sample).unwrap()
    );
    assert_eq!(
        loaded.soil_encoder().classes(),
        bundle.soil_encoder().classes()
    );
}

#[test]
fn test_training_is_deterministic_for_a_seed() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_training_csv(dir.path());
    let df = load_dataset(&csv).unwrap();

    let (_, first) = train(&df, &small_config()).unwrap();
    let (_, second) = train(&df, &small_config()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_partial_artifact_set_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_training_csv(dir.path());
    let df = load_dataset(&csv).unwrap();
    let (bundle, _) = train(&df, &small_config()).unwrap();

    let artifact_dir = dir.path().join("artifacts");
    let store = ArtifactStore::new(&artifact_dir);

    for file in [
        MODEL_FILE,
        SOIL_ENCODER_FILE,
        CROP_ENCODER_FILE,
        FERTILIZER_ENCODER_FILE,
    ] {
        store.save(&bundle).unwrap();
        std::fs::remove_file(artifact_dir.join(file)).unwrap();

        let err = store.load().unwrap_err();
        assert_eq!(err.error_code(), "ARTIFACT_MISSING");
        assert!(err.is_retrainable());
    }
}

#[test]
fn test_feature_importances_cover_all_columns() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_training_csv(dir.path());
    let df = load_dataset(&csv).unwrap();
    let (_, report) = train(&df, &small_config()).unwrap();

    assert_eq!(report.feature_importance.len(), 8);
    let total: f64 = report.feature_importance.iter().map(|(_, v)| v).sum();
    assert!((total - 1.0).abs() < 1e-9, "importances summed to {total}");
}
