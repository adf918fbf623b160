//! Custom error types for the training pipeline.
//!
//! This module provides the error hierarchy for dataset loading, encoding,
//! training and artifact persistence, using `thiserror` for context-rich
//! messages.
//!
//! Errors are serializable as `{code, message}` pairs so transports can
//! forward them to callers without string matching.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the training pipeline.
#[derive(Error, Debug)]
pub enum LearningError {
    /// Training dataset file does not exist.
    #[error("Training dataset not found: {0}")]
    DatasetMissing(String),

    /// A required column is absent from the training table.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// A cell could not be read as the type the pipeline requires.
    #[error("Invalid value in column '{column}' at row {row}: {reason}")]
    InvalidValue {
        column: String,
        row: usize,
        reason: String,
    },

    /// Invalid trainer configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Training could not produce a usable classifier.
    #[error("Training failed: {0}")]
    TrainingFailed(String),

    /// A category code has no known label (inverse lookup out of range).
    #[error("Category code {code} is out of range for encoder '{encoder}' ({len} classes)")]
    UnknownCode {
        encoder: String,
        code: usize,
        len: usize,
    },

    /// One or more persisted artifact files are absent.
    ///
    /// Partial bundles are never accepted; callers should fall back to
    /// retraining from the raw dataset.
    #[error("Artifact missing: {0}")]
    ArtifactMissing(String),

    /// The persisted artifacts disagree with each other.
    #[error("Bundle mismatch: {0}")]
    BundleMismatch(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary model serialization error.
    #[error("Model serialization error: {0}")]
    Bincode(#[from] bincode::Error),
}

impl LearningError {
    /// Get error code for transport-level handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DatasetMissing(_) => "DATASET_MISSING",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidValue { .. } => "INVALID_VALUE",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::TrainingFailed(_) => "TRAINING_FAILED",
            Self::UnknownCode { .. } => "UNKNOWN_CODE",
            Self::ArtifactMissing(_) => "ARTIFACT_MISSING",
            Self::BundleMismatch(_) => "BUNDLE_MISMATCH",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Bincode(_) => "MODEL_SERIALIZATION_ERROR",
        }
    }

    /// Whether the caller can recover by retraining from the raw dataset.
    pub fn is_retrainable(&self) -> bool {
        matches!(
            self,
            Self::ArtifactMissing(_) | Self::BundleMismatch(_) | Self::Bincode(_)
        )
    }
}

/// Serialize implementation producing `{code, message}` for IPC/transport use.
impl Serialize for LearningError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("LearningError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for training pipeline operations.
pub type Result<T> = std::result::Result<T, LearningError>;
