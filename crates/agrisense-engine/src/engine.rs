//! Core recommendation logic: one [`SoilReading`] in, one
//! [`Recommendation`] out.
//!
//! Predictions are stateless; all state lives in the immutable [`Bundle`]
//! passed in, so concurrent callers share one bundle freely.

use crate::advisor::advisories;
use crate::error::Result;
use crate::types::{ModelInfo, Recommendation, SoilReading};
use agrisense_learning::artifacts::{ARTIFACT_FORMAT_VERSION, Bundle};
use agrisense_learning::dataset::{FEATURE_COLUMNS, LABEL_COLUMN};
use tracing::{debug, warn};

/// Produce a fertilizer recommendation for a single reading.
///
/// Unseen soil or crop categories never fail the request: they encode to
/// the fallback category and the affected field names are reported in
/// `degraded_inputs`.
///
/// # Errors
///
/// Returns [`crate::EngineError::Prediction`] when the classifier rejects
/// the feature vector; with a validated bundle this indicates artifact
/// corruption, not bad input.
pub fn recommend(bundle: &Bundle, reading: &SoilReading) -> Result<Recommendation> {
    let mut degraded_inputs = Vec::new();

    let soil = bundle.soil_encoder().encode(&reading.soil_type);
    if soil.fallback {
        warn!(
            soil_type = %reading.soil_type,
            "unseen soil type, substituting fallback category"
        );
        degraded_inputs.push("soil_type".to_string());
    }
    let crop = bundle.crop_encoder().encode(&reading.crop_type);
    if crop.fallback {
        warn!(
            crop_type = %reading.crop_type,
            "unseen crop type, substituting fallback category"
        );
        degraded_inputs.push("crop_type".to_string());
    }

    // Same order as FEATURE_COLUMNS: six numerics, then the two codes.
    let features = [
        reading.nitrogen,
        reading.phosphorus,
        reading.potassium,
        reading.temperature,
        reading.humidity,
        reading.moisture,
        soil.code as f64,
        crop.code as f64,
    ];

    let proba = bundle.model().predict_proba(&features)?;
    // Ties break toward the lower code, matching the classifier's argmax.
    let (fertilizer_code, max_proba) = proba
        .iter()
        .enumerate()
        .fold((0, f64::MIN), |(best_i, best_p), (i, &p)| {
            if p > best_p { (i, p) } else { (best_i, best_p) }
        });
    let confidence = (max_proba * 1000.0).round() / 1000.0;

    let predicted_fertilizer = bundle.fertilizer_encoder().decode(fertilizer_code)?.to_string();
    debug!(
        fertilizer = %predicted_fertilizer,
        confidence,
        "prediction complete"
    );

    Ok(Recommendation {
        recommendations: advisories(reading, &predicted_fertilizer),
        predicted_fertilizer,
        confidence,
        fertilizer_code,
        timestamp: chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        degraded_inputs,
    })
}

/// Diagnostic description of a loaded bundle.
pub fn model_info(bundle: &Bundle) -> ModelInfo {
    ModelInfo {
        model_type: "RandomForestClassifier".to_string(),
        version: ARTIFACT_FORMAT_VERSION,
        feature_columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        target: LABEL_COLUMN.to_string(),
        soil_types: bundle.soil_encoder().classes().to_vec(),
        crop_types: bundle.crop_encoder().classes().to_vec(),
        fertilizers: bundle.fertilizer_encoder().classes().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agrisense_learning::encoder::CategoryEncoder;
    use agrisense_learning::forest::{ForestParams, RandomForestClassifier};
    use pretty_assertions::assert_eq;

    fn test_bundle() -> Bundle {
        // Class 0 ("DAP") is the low-nutrient regime, class 1 ("Urea")
        // the high-nutrient one, with clearly separated clusters.
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..10 {
            let jitter = i as f64;
            x.push(vec![
                10.0 + jitter,
                10.0,
                10.0,
                25.0,
                50.0,
                30.0,
                0.0,
                (i % 2) as f64,
            ]);
            y.push(0);
            x.push(vec![
                40.0 + jitter,
                30.0,
                40.0,
                30.0,
                60.0,
                60.0,
                1.0,
                (i % 2) as f64,
            ]);
            y.push(1);
        }
        let params = ForestParams {
            n_trees: 15,
            max_depth: 5,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        };
        let model = RandomForestClassifier::fit(&x, &y, 2, &[1.0, 1.0], params).unwrap();
        Bundle::new(
            model,
            CategoryEncoder::fit("Soil Type", &["Loamy", "Sandy"]),
            CategoryEncoder::fit("Crop Type", &["Maize", "Paddy"]),
            CategoryEncoder::fit("Fertilizer Name", &["DAP", "Urea"]),
        )
        .unwrap()
    }

    fn low_nutrient_reading() -> SoilReading {
        SoilReading {
            nitrogen: 12.0,
            phosphorus: 10.0,
            potassium: 10.0,
            temperature: 25.0,
            humidity: 50.0,
            moisture: 30.0,
            soil_type: "Loamy".to_string(),
            crop_type: "Maize".to_string(),
        }
    }

    #[test]
    fn test_recommend_known_categories() {
        let bundle = test_bundle();
        let rec = recommend(&bundle, &low_nutrient_reading()).unwrap();

        assert_eq!(rec.predicted_fertilizer, "DAP");
        assert_eq!(rec.fertilizer_code, 0);
        assert!(rec.confidence > 0.0 && rec.confidence <= 1.0);
        assert!(rec.degraded_inputs.is_empty());
        assert_eq!(
            rec.recommendations.last().unwrap(),
            "Apply DAP as recommended for Maize"
        );
    }

    #[test]
    fn test_unseen_categories_degrade_not_fail() {
        let bundle = test_bundle();
        let mut reading = low_nutrient_reading();
        reading.soil_type = "Volcanic".to_string();
        reading.crop_type = "Quinoa".to_string();

        let rec = recommend(&bundle, &reading).unwrap();
        assert_eq!(rec.degraded_inputs, vec!["soil_type", "crop_type"]);
        assert!(rec.confidence > 0.0 && rec.confidence <= 1.0);
    }

    #[test]
    fn test_confidence_rounded_to_three_decimals() {
        let bundle = test_bundle();
        let rec = recommend(&bundle, &low_nutrient_reading()).unwrap();
        let scaled = rec.confidence * 1000.0;
        assert!((scaled - scaled.round()).abs() < 1e-9);
    }

    #[test]
    fn test_recommend_is_deterministic() {
        let bundle = test_bundle();
        let reading = low_nutrient_reading();
        let a = recommend(&bundle, &reading).unwrap();
        let b = recommend(&bundle, &reading).unwrap();
        assert_eq!(a.predicted_fertilizer, b.predicted_fertilizer);
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.recommendations, b.recommendations);
    }

    #[test]
    fn test_model_info_exposes_domains() {
        let bundle = test_bundle();
        let info = model_info(&bundle);
        assert_eq!(info.model_type, "RandomForestClassifier");
        assert_eq!(info.feature_columns.len(), 8);
        assert_eq!(info.target, "Fertilizer Name");
        assert_eq!(info.soil_types, vec!["Loamy", "Sandy"]);
        assert_eq!(info.fertilizers, vec!["DAP", "Urea"]);
    }
}
