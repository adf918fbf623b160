//! Fertilizer Recommendation Engine
//!
//! The serving core of the fertilizer recommendation system: it turns a
//! single soil reading into a fertilizer prediction with confidence,
//! threshold-based agronomic advisories and model diagnostics. Transports
//! (HTTP, IPC) serialize the types in [`types`] and call into
//! [`ModelService`]; no transport lives in this crate.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use agrisense_engine::{ModelService, SoilReading};
//! use agrisense_learning::{ArtifactStore, TrainerConfig};
//!
//! let service = ModelService::new();
//! service.initialize(
//!     &ArtifactStore::new("artifacts"),
//!     "data_core.csv",
//!     &TrainerConfig::default(),
//! )?;
//!
//! let reading: SoilReading = serde_json::from_str(request_body)?;
//! let recommendation = service.recommend(&reading)?;
//! println!("{} ({:.1}%)", recommendation.predicted_fertilizer,
//!          recommendation.confidence * 100.0);
//! ```

pub mod advisor;
pub mod engine;
pub mod error;
pub mod service;
pub mod types;

pub use advisor::{MAX_ADVISORIES, advisories};
pub use engine::{model_info, recommend};
pub use error::{EngineError, Result};
pub use service::ModelService;
pub use types::{ModelInfo, Recommendation, SoilReading};
