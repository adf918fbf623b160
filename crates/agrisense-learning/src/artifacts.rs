//! Trained artifact persistence.
//!
//! The classifier and its three encoders form one versioned bundle and are
//! only ever loaded together: the feature column order baked into the
//! classifier is meaningless without the exact encoders it was trained
//! with, so a partial set on disk is treated as no bundle at all and the
//! caller falls back to retraining from the raw dataset.

use crate::dataset::FEATURE_COLUMNS;
use crate::encoder::CategoryEncoder;
use crate::error::{LearningError, Result};
use crate::forest::RandomForestClassifier;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Bump when the on-disk classifier layout changes; a mismatch at load
/// time forces a retrain instead of deserializing stale structure.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Classifier artifact file name.
pub const MODEL_FILE: &str = "fertilizer_rf_model.bin";
/// Soil-type encoder artifact file name.
pub const SOIL_ENCODER_FILE: &str = "soil_encoder.json";
/// Crop-type encoder artifact file name.
pub const CROP_ENCODER_FILE: &str = "crop_encoder.json";
/// Fertilizer-name encoder artifact file name.
pub const FERTILIZER_ENCODER_FILE: &str = "fertilizer_encoder.json";

/// The atomic set of one trained classifier plus its three encoders.
///
/// Immutable after construction; at serve time a loaded bundle is shared
/// read-only across all concurrent prediction requests.
#[derive(Debug, Clone)]
pub struct Bundle {
    model: RandomForestClassifier,
    soil_encoder: CategoryEncoder,
    crop_encoder: CategoryEncoder,
    fertilizer_encoder: CategoryEncoder,
}

impl Bundle {
    /// Assemble a bundle, verifying the artifacts agree with each other.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::BundleMismatch`] when the classifier's
    /// class count differs from the fertilizer encoder's domain or its
    /// feature width differs from [`FEATURE_COLUMNS`].
    pub fn new(
        model: RandomForestClassifier,
        soil_encoder: CategoryEncoder,
        crop_encoder: CategoryEncoder,
        fertilizer_encoder: CategoryEncoder,
    ) -> Result<Self> {
        if model.n_classes() != fertilizer_encoder.len() {
            return Err(LearningError::BundleMismatch(format!(
                "classifier predicts over {} classes but the fertilizer encoder has {}",
                model.n_classes(),
                fertilizer_encoder.len()
            )));
        }
        if model.n_features() != FEATURE_COLUMNS.len() {
            return Err(LearningError::BundleMismatch(format!(
                "classifier expects {} features but the feature order defines {}",
                model.n_features(),
                FEATURE_COLUMNS.len()
            )));
        }
        Ok(Self {
            model,
            soil_encoder,
            crop_encoder,
            fertilizer_encoder,
        })
    }

    /// The trained classifier.
    pub fn model(&self) -> &RandomForestClassifier {
        &self.model
    }

    /// Encoder for the soil type column.
    pub fn soil_encoder(&self) -> &CategoryEncoder {
        &self.soil_encoder
    }

    /// Encoder for the crop type column.
    pub fn crop_encoder(&self) -> &CategoryEncoder {
        &self.crop_encoder
    }

    /// Encoder for the fertilizer label column.
    pub fn fertilizer_encoder(&self) -> &CategoryEncoder {
        &self.fertilizer_encoder
    }
}

/// On-disk wrapper for the classifier artifact.
#[derive(Debug, Serialize, Deserialize)]
struct ModelArtifact {
    format_version: u32,
    /// Feature column order the classifier was trained with; checked
    /// against [`FEATURE_COLUMNS`] at load time.
    feature_columns: Vec<String>,
    model: RandomForestClassifier,
}

/// Reads and writes artifact bundles under a single directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at `dir`. The directory is created on save,
    /// not here.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory the artifacts live in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Persist a bundle as its four artifact files.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::Io`] / serialization errors on failure.
    pub fn save(&self, bundle: &Bundle) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let artifact = ModelArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            feature_columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            model: bundle.model.clone(),
        };
        fs::write(self.path(MODEL_FILE), bincode::serialize(&artifact)?)?;
        fs::write(
            self.path(SOIL_ENCODER_FILE),
            serde_json::to_vec_pretty(&bundle.soil_encoder)?,
        )?;
        fs::write(
            self.path(CROP_ENCODER_FILE),
            serde_json::to_vec_pretty(&bundle.crop_encoder)?,
        )?;
        fs::write(
            self.path(FERTILIZER_ENCODER_FILE),
            serde_json::to_vec_pretty(&bundle.fertilizer_encoder)?,
        )?;

        info!("saved model and encoders to {}", self.dir.display());
        Ok(())
    }

    /// Load the bundle, refusing partial or inconsistent artifact sets.
    ///
    /// # Errors
    ///
    /// - [`LearningError::ArtifactMissing`] if any of the four files is
    ///   absent (names every missing file)
    /// - [`LearningError::BundleMismatch`] if the artifact format version,
    ///   feature order or class counts disagree
    pub fn load(&self) -> Result<Bundle> {
        let missing: Vec<&str> = [
            MODEL_FILE,
            SOIL_ENCODER_FILE,
            CROP_ENCODER_FILE,
            FERTILIZER_ENCODER_FILE,
        ]
        .into_iter()
        .filter(|file| !self.path(file).exists())
        .collect();
        if !missing.is_empty() {
            return Err(LearningError::ArtifactMissing(missing.join(", ")));
        }

        let artifact: ModelArtifact = bincode::deserialize(&fs::read(self.path(MODEL_FILE))?)?;
        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(LearningError::BundleMismatch(format!(
                "artifact format version {} is not the expected {}",
                artifact.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }
        if artifact.feature_columns != FEATURE_COLUMNS {
            return Err(LearningError::BundleMismatch(format!(
                "persisted feature order {:?} does not match {:?}",
                artifact.feature_columns, FEATURE_COLUMNS
            )));
        }

        let soil_encoder = self.load_encoder(SOIL_ENCODER_FILE)?;
        let crop_encoder = self.load_encoder(CROP_ENCODER_FILE)?;
        let fertilizer_encoder = self.load_encoder(FERTILIZER_ENCODER_FILE)?;

        let bundle = Bundle::new(artifact.model, soil_encoder, crop_encoder, fertilizer_encoder)?;
        info!("loaded model and encoders from {}", self.dir.display());
        Ok(bundle)
    }

    fn load_encoder(&self, file: &str) -> Result<CategoryEncoder> {
        let mut encoder: CategoryEncoder = serde_json::from_slice(&fs::read(self.path(file))?)?;
        encoder.rebuild_index();
        Ok(encoder)
    }
}
