//! Wire types for the recommendation engine.
//!
//! These structs are the request/response contract a transport serializes;
//! the engine itself never touches HTTP. Field names and defaults match
//! the payloads the original service accepted and produced.

use serde::{Deserialize, Serialize};

fn default_soil_type() -> String {
    "Loamy".to_string()
}

fn default_crop_type() -> String {
    "Maize".to_string()
}

/// A single field measurement submitted for a recommendation.
///
/// All nutrient and climate readings are required; the two categorical
/// descriptors default to the most common values in the training data
/// when the caller omits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilReading {
    /// Nitrogen content (mg/kg).
    pub nitrogen: f64,
    /// Phosphorus content (mg/kg).
    pub phosphorus: f64,
    /// Potassium content (mg/kg).
    pub potassium: f64,
    /// Ambient temperature (°C).
    pub temperature: f64,
    /// Relative humidity (%).
    pub humidity: f64,
    /// Soil moisture (%).
    pub moisture: f64,
    /// Soil texture category (default: "Loamy").
    #[serde(default = "default_soil_type")]
    pub soil_type: String,
    /// Crop being grown (default: "Maize").
    #[serde(default = "default_crop_type")]
    pub crop_type: String,
}

/// The engine's answer to a [`SoilReading`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Fertilizer name the classifier predicts.
    pub predicted_fertilizer: String,
    /// Highest class probability, rounded to three decimals.
    pub confidence: f64,
    /// Integer code of the predicted fertilizer.
    pub fertilizer_code: usize,
    /// Human-readable advisories, at most five, always ending with the
    /// application advisory for the predicted fertilizer.
    pub recommendations: Vec<String>,
    /// ISO-8601 timestamp of when the recommendation was produced.
    pub timestamp: String,
    /// Input fields that were unseen at training time and were replaced
    /// by the fallback category. Empty (and omitted from the wire) for
    /// fully recognized inputs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded_inputs: Vec<String>,
}

/// Diagnostic description of the loaded model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Classifier family.
    pub model_type: String,
    /// Artifact format version the model was persisted with.
    pub version: u32,
    /// Feature column order the classifier consumes.
    pub feature_columns: Vec<String>,
    /// Name of the predicted column.
    pub target: String,
    /// Soil types seen at training time.
    pub soil_types: Vec<String>,
    /// Crop types seen at training time.
    pub crop_types: Vec<String>,
    /// Fertilizer names the classifier can predict.
    pub fertilizers: Vec<String>,
}
