//! Threshold-based agronomic advisories.
//!
//! Advisories accompany every prediction and are derived from the raw
//! reading, not from the classifier. Rules are evaluated in a fixed order
//! (nitrogen, phosphorus, potassium, moisture, temperature) and the
//! application advisory for the predicted fertilizer is always present as
//! the final entry.

use crate::types::SoilReading;

/// Maximum number of advisories returned per recommendation.
pub const MAX_ADVISORIES: usize = 5;

/// Build the advisory list for a reading and its predicted fertilizer.
///
/// At most [`MAX_ADVISORIES`] entries; when every threshold fires, the
/// threshold advisories are truncated so the closing application advisory
/// still fits.
pub fn advisories(reading: &SoilReading, fertilizer: &str) -> Vec<String> {
    let mut out = Vec::new();

    if reading.nitrogen < 20.0 {
        out.push("Nitrogen levels are low - apply nitrogen-rich fertilizer".to_string());
    } else if reading.nitrogen > 40.0 {
        out.push("Nitrogen levels are high - reduce nitrogen application".to_string());
    }

    if reading.phosphorus < 15.0 {
        out.push("Phosphorus levels are low - consider phosphorus supplement".to_string());
    } else if reading.phosphorus > 35.0 {
        out.push("Phosphorus levels are high - reduce phosphorus application".to_string());
    }

    if reading.potassium < 20.0 {
        out.push("Potassium levels are low - apply potassium fertilizer".to_string());
    } else if reading.potassium > 45.0 {
        out.push("Potassium levels are high - reduce potassium application".to_string());
    }

    if reading.moisture < 30.0 {
        out.push("Soil moisture is low - increase irrigation".to_string());
    } else if reading.moisture > 70.0 {
        out.push("Soil moisture is high - ensure proper drainage".to_string());
    }

    if reading.temperature > 35.0 {
        out.push("Temperature is high - consider shade or cooling".to_string());
    } else if reading.temperature < 20.0 {
        out.push("Temperature is low - ensure adequate warmth".to_string());
    }

    // The application advisory is guaranteed, so threshold advisories
    // yield when all five rules fire.
    out.truncate(MAX_ADVISORIES - 1);
    out.push(format!(
        "Apply {} as recommended for {}",
        fertilizer, reading.crop_type
    ));
    out
}
