//! Categorical value encoding.
//!
//! Each categorical field (soil type, crop type, fertilizer name) gets its
//! own [`CategoryEncoder`], fitted once from training data and immutable
//! thereafter. Codes are dense integers in `[0, n_classes)` assigned by
//! sorted order of the distinct values, so a refit on the same data always
//! yields the same mapping.
//!
//! Encoding never fails: a value the encoder has never seen maps to the
//! fallback code 0, and the outcome records that explicitly so callers can
//! log it or penalize confidence instead of relying on a silent default.

use crate::error::{LearningError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fallback code substituted for values unseen at fit time.
pub const FALLBACK_CODE: usize = 0;

/// Outcome of encoding a single categorical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encoded {
    /// The dense integer code for the value.
    pub code: usize,
    /// True when the value was never seen at fit time and the fallback
    /// code was substituted.
    pub fallback: bool,
}

/// Bidirectional mapping between category strings and dense integer codes.
///
/// Fitted once per categorical field during training, persisted alongside
/// the classifier, and loaded read-only at serve time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEncoder {
    /// Field the encoder was fitted for, used in error messages.
    name: String,
    /// Class labels in code order: `classes[code]` is the label for `code`.
    classes: Vec<String>,
    /// Reverse lookup from label to code.
    #[serde(skip)]
    codes: HashMap<String, usize>,
}

impl CategoryEncoder {
    /// Fit an encoder over the distinct values of a categorical column.
    ///
    /// Codes are assigned by sorted order of the distinct values, matching
    /// the encoding the original artifacts were produced with.
    pub fn fit<S: AsRef<str>>(name: impl Into<String>, values: &[S]) -> Self {
        let mut classes: Vec<String> = values.iter().map(|v| v.as_ref().to_string()).collect();
        classes.sort();
        classes.dedup();

        let codes = build_codes(&classes);
        Self {
            name: name.into(),
            classes,
            codes,
        }
    }

    /// Encode a value to its integer code.
    ///
    /// Unseen values resolve to [`FALLBACK_CODE`] with the `fallback` flag
    /// set; this never fails.
    pub fn encode(&self, value: &str) -> Encoded {
        match self.codes.get(value) {
            Some(&code) => Encoded {
                code,
                fallback: false,
            },
            None => Encoded {
                code: FALLBACK_CODE,
                fallback: true,
            },
        }
    }

    /// Decode an integer code back to its label.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::UnknownCode`] if the code is out of range.
    pub fn decode(&self, code: usize) -> Result<&str> {
        self.classes
            .get(code)
            .map(String::as_str)
            .ok_or(LearningError::UnknownCode {
                encoder: self.name.clone(),
                code,
                len: self.classes.len(),
            })
    }

    /// The fitted class labels, in code order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of distinct classes seen at fit time.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// True when the encoder was fitted on no values.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Field name the encoder was fitted for.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rebuild the reverse lookup after deserialization.
    ///
    /// The `codes` map is derived state and is skipped by serde; artifact
    /// loading must call this before the encoder is used.
    pub(crate) fn rebuild_index(&mut self) {
        self.codes = build_codes(&self.classes);
    }
}

fn build_codes(classes: &[String]) -> HashMap<String, usize> {
    classes
        .iter()
        .enumerate()
        .map(|(code, label)| (label.clone(), code))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn soil_encoder() -> CategoryEncoder {
        CategoryEncoder::fit(
            "Soil Type",
            &["Sandy", "Loamy", "Black", "Red", "Clayey", "Loamy", "Sandy"],
        )
    }

    #[test]
    fn test_codes_are_sorted_and_dense() {
        let enc = soil_encoder();
        assert_eq!(enc.classes(), &["Black", "Clayey", "Loamy", "Red", "Sandy"]);
        assert_eq!(enc.encode("Black").code, 0);
        assert_eq!(enc.encode("Sandy").code, 4);
    }

    #[test]
    fn test_round_trip_every_fitted_value() {
        let enc = soil_encoder();
        for label in enc.classes().to_vec() {
            let encoded = enc.encode(&label);
            assert!(!encoded.fallback);
            assert_eq!(enc.decode(encoded.code).unwrap(), label);
        }
    }

    #[test]
    fn test_unseen_value_falls_back_to_zero() {
        let enc = soil_encoder();
        let encoded = enc.encode("Volcanic");
        assert_eq!(encoded.code, FALLBACK_CODE);
        assert!(encoded.fallback);
    }

    #[test]
    fn test_decode_out_of_range() {
        let enc = soil_encoder();
        let err = enc.decode(99).unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_CODE");
        assert!(err.to_string().contains("Soil Type"));
    }

    #[test]
    fn test_refit_is_deterministic() {
        let a = CategoryEncoder::fit("Crop Type", &["Maize", "Paddy", "Cotton"]);
        let b = CategoryEncoder::fit("Crop Type", &["Cotton", "Maize", "Paddy"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_serde_round_trip_rebuilds_index() {
        let enc = soil_encoder();
        let json = serde_json::to_string(&enc).unwrap();
        let mut restored: CategoryEncoder = serde_json::from_str(&json).unwrap();
        restored.rebuild_index();
        assert_eq!(restored.encode("Loamy"), enc.encode("Loamy"));
    }
}
