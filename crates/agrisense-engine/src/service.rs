//! Shared model state for concurrent serving.
//!
//! All mutable state lives behind a `parking_lot::RwLock`. Initialization
//! writes the bundle once; every request afterwards takes read access
//! only, so predictions run fully in parallel.

use crate::engine;
use crate::error::{EngineError, Result};
use crate::types::{ModelInfo, Recommendation, SoilReading};
use agrisense_learning::artifacts::{ArtifactStore, Bundle};
use agrisense_learning::trainer::TrainerConfig;
use agrisense_learning::{load_dataset, train};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Holds the loaded model bundle and answers recommendation requests.
///
/// Construct once, share by reference (or inside an `Arc`) across request
/// handlers. Until [`ModelService::initialize`] completes, every request
/// fails with the retryable [`EngineError::ModelNotReady`].
#[derive(Debug, Default)]
pub struct ModelService {
    bundle: RwLock<Option<Arc<Bundle>>>,
}

static_assertions::assert_impl_all!(ModelService: Send, Sync);

impl ModelService {
    /// Create an uninitialized service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the persisted bundle, retraining from the raw dataset when the
    /// artifacts are absent or unusable.
    ///
    /// Idempotent: concurrent and repeated calls initialize at most once.
    /// Callers that lose the race return `Ok` as soon as the winner's
    /// bundle is in place.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InitializationFailed`] when neither loading
    /// nor retraining produced a usable bundle; the service stays
    /// uninitialized and requests keep failing with `ModelNotReady`.
    pub fn initialize(
        &self,
        store: &ArtifactStore,
        dataset_path: impl AsRef<Path>,
        config: &TrainerConfig,
    ) -> Result<()> {
        if self.bundle.read().is_some() {
            return Ok(());
        }

        // Double-checked under the write lock: losers of the race see the
        // winner's bundle here and never train a second model.
        let mut slot = self.bundle.write();
        if slot.is_some() {
            return Ok(());
        }

        let bundle = match store.load() {
            Ok(bundle) => bundle,
            Err(e) => {
                warn!(
                    error = %e,
                    "could not load persisted model, retraining from dataset"
                );
                let df = load_dataset(dataset_path).map_err(EngineError::InitializationFailed)?;
                let (bundle, report) =
                    train(&df, config).map_err(EngineError::InitializationFailed)?;
                info!(accuracy = report.accuracy, "retrained model from dataset");
                if let Err(e) = store.save(&bundle) {
                    // Serving works from memory; only persistence for the
                    // next start is lost.
                    warn!(error = %e, "failed to persist retrained model");
                }
                bundle
            }
        };

        *slot = Some(Arc::new(bundle));
        info!("model service initialized");
        Ok(())
    }

    /// Whether a bundle is loaded and requests can be served.
    pub fn is_ready(&self) -> bool {
        self.bundle.read().is_some()
    }

    /// Produce a recommendation for one reading.
    ///
    /// # Errors
    ///
    /// [`EngineError::ModelNotReady`] before initialization completes,
    /// otherwise whatever [`engine::recommend`] returns.
    pub fn recommend(&self, reading: &SoilReading) -> Result<Recommendation> {
        let bundle = self.current_bundle()?;
        engine::recommend(&bundle, reading)
    }

    /// Describe the loaded model.
    ///
    /// # Errors
    ///
    /// [`EngineError::ModelNotReady`] before initialization completes.
    pub fn model_info(&self) -> Result<ModelInfo> {
        let bundle = self.current_bundle()?;
        Ok(engine::model_info(&bundle))
    }

    fn current_bundle(&self) -> Result<Arc<Bundle>> {
        self.bundle
            .read()
            .as_ref()
            .cloned()
            .ok_or(EngineError::ModelNotReady)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading() -> SoilReading {
        SoilReading {
            nitrogen: 12.0,
            phosphorus: 36.0,
            potassium: 0.0,
            temperature: 29.0,
            humidity: 52.0,
            moisture: 45.0,
            soil_type: "Loamy".to_string(),
            crop_type: "Maize".to_string(),
        }
    }

    #[test]
    fn test_uninitialized_service_is_not_ready() {
        let service = ModelService::new();
        assert!(!service.is_ready());

        let err = service.recommend(&reading()).unwrap_err();
        assert_eq!(err.error_code(), "MODEL_NOT_READY");
        assert!(err.is_retryable());

        let err = service.model_info().unwrap_err();
        assert_eq!(err.error_code(), "MODEL_NOT_READY");
    }

    #[test]
    fn test_initialize_fails_without_artifacts_or_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let service = ModelService::new();
        let store = ArtifactStore::new(dir.path().join("artifacts"));

        let err = service
            .initialize(
                &store,
                dir.path().join("missing.csv"),
                &TrainerConfig::default(),
            )
            .unwrap_err();
        assert_eq!(err.error_code(), "INITIALIZATION_FAILED");
        assert!(!service.is_ready());
    }
}
