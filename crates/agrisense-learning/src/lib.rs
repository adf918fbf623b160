//! Fertilizer Classifier Training Library
//!
//! Trains a random forest classifier that maps soil nutrient readings to a
//! recommended fertilizer, and persists the trained model together with the
//! category encoders it depends on.
//!
//! # Overview
//!
//! - **Dataset loading**: CSV ingestion with schema validation ([`dataset`])
//! - **Category encoding**: deterministic string-to-code mappings for soil
//!   type, crop type and fertilizer name ([`encoder`])
//! - **Training**: seeded stratified split, balanced class weights and a
//!   Gini-impurity random forest ([`trainer`], [`forest`])
//! - **Evaluation**: held-out accuracy and per-class reports ([`metrics`])
//! - **Persistence**: versioned artifact bundles on disk ([`artifacts`])
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use agrisense_learning::{ArtifactStore, TrainerConfig, load_dataset, train};
//!
//! let df = load_dataset("data_core.csv")?;
//! let config = TrainerConfig::builder().seed(42).build()?;
//! let (bundle, report) = train(&df, &config)?;
//!
//! println!("held-out accuracy: {:.3}", report.accuracy);
//! ArtifactStore::new("artifacts").save(&bundle)?;
//! ```

pub mod artifacts;
pub mod dataset;
pub mod encoder;
pub mod error;
pub mod forest;
pub mod metrics;
pub mod trainer;

pub use artifacts::{
    ARTIFACT_FORMAT_VERSION, ArtifactStore, Bundle, CROP_ENCODER_FILE, FERTILIZER_ENCODER_FILE,
    MODEL_FILE, SOIL_ENCODER_FILE,
};
pub use dataset::{
    CROP_TYPE_COLUMN, FEATURE_COLUMNS, LABEL_COLUMN, NUMERIC_COLUMNS, REQUIRED_COLUMNS,
    SOIL_TYPE_COLUMN, load_dataset,
};
pub use encoder::{CategoryEncoder, Encoded, FALLBACK_CODE};
pub use error::{LearningError, Result};
pub use forest::{ForestParams, RandomForestClassifier};
pub use metrics::{ClassReport, accuracy, classification_report};
pub use trainer::{TrainerConfig, TrainerConfigBuilder, TrainingReport, train};
