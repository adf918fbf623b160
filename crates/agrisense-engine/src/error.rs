//! Custom error types for the recommendation engine.
//!
//! Errors are serializable as `{code, message}` pairs so transports can
//! forward them to callers without string matching.

use agrisense_learning::LearningError;
use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the recommendation engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The model has not finished loading or training yet.
    ///
    /// Service-level and retryable: the same request succeeds once
    /// initialization completes.
    #[error("Model is not ready yet; retry shortly")]
    ModelNotReady,

    /// Initialization could not produce a usable model, neither by
    /// loading persisted artifacts nor by retraining from the dataset.
    #[error("Model initialization failed: {0}")]
    InitializationFailed(#[source] LearningError),

    /// The underlying classifier rejected the prediction request.
    #[error("Prediction failed: {0}")]
    Prediction(#[from] LearningError),
}

impl EngineError {
    /// Get error code for transport-level handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ModelNotReady => "MODEL_NOT_READY",
            Self::InitializationFailed(_) => "INITIALIZATION_FAILED",
            Self::Prediction(_) => "PREDICTION_FAILED",
        }
    }

    /// Whether the caller should retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ModelNotReady)
    }
}

/// Serialize implementation producing `{code, message}` for transport use.
impl Serialize for EngineError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("EngineError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(EngineError::ModelNotReady.error_code(), "MODEL_NOT_READY");
        assert_eq!(
            EngineError::Prediction(LearningError::TrainingFailed("x".to_string())).error_code(),
            "PREDICTION_FAILED"
        );
    }

    #[test]
    fn test_model_not_ready_is_retryable() {
        assert!(EngineError::ModelNotReady.is_retryable());
        assert!(
            !EngineError::InitializationFailed(LearningError::DatasetMissing(
                "data.csv".to_string()
            ))
            .is_retryable()
        );
    }

    #[test]
    fn test_error_serialization() {
        let json = serde_json::to_string(&EngineError::ModelNotReady).unwrap();
        assert!(json.contains("MODEL_NOT_READY"));
        assert!(json.contains("retry"));
    }
}
