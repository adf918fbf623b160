//! Classifier training and evaluation.
//!
//! Fits the three category encoders from the training table, builds the
//! fixed-order feature matrix, splits it with a seeded stratified split,
//! fits the random forest and evaluates it on the held-out partition.
//!
//! # Example
//!
//! ```rust,ignore
//! use agrisense_learning::{load_dataset, train, TrainerConfig};
//!
//! let df = load_dataset("data_core.csv")?;
//! let config = TrainerConfig::builder().n_trees(100).seed(42).build()?;
//! let (bundle, report) = train(&df, &config)?;
//! println!("held-out accuracy: {:.3}", report.accuracy);
//! ```

use crate::artifacts::Bundle;
use crate::dataset::{
    CROP_TYPE_COLUMN, FEATURE_COLUMNS, LABEL_COLUMN, NUMERIC_COLUMNS, SOIL_TYPE_COLUMN,
    numeric_column, string_column,
};
use crate::encoder::CategoryEncoder;
use crate::error::{LearningError, Result};
use crate::forest::{ForestParams, RandomForestClassifier};
use crate::metrics::{ClassReport, accuracy, classification_report};
use polars::prelude::DataFrame;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Configuration for a training run.
///
/// Use [`TrainerConfig::builder()`] to construct one; the builder validates
/// all constraints on `build()`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerConfig {
    /// Number of trees in the forest (default: 100).
    pub n_trees: usize,
    /// Maximum tree depth (default: 10).
    pub max_depth: usize,
    /// Minimum samples required to attempt a split (default: 4).
    pub min_samples_split: usize,
    /// Minimum samples each side of a split must retain (default: 2).
    pub min_samples_leaf: usize,
    /// Held-out fraction for evaluation, in (0.0, 1.0) (default: 0.2).
    pub test_size: f64,
    /// Random seed for the split and bootstrap draws (default: 42).
    pub seed: u64,
    /// Weight classes inversely to their frequency (default: true).
    pub balance_classes: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 4,
            min_samples_leaf: 2,
            test_size: 0.2,
            seed: 42,
            balance_classes: true,
        }
    }
}

impl TrainerConfig {
    /// Create a new builder with default settings.
    #[must_use]
    pub fn builder() -> TrainerConfigBuilder {
        TrainerConfigBuilder::default()
    }
}

/// Builder for [`TrainerConfig`]. All setters return `self` for chaining.
#[derive(Debug, Clone, Default)]
pub struct TrainerConfigBuilder {
    config: TrainerConfig,
}

impl TrainerConfigBuilder {
    /// Set the number of trees (default: 100).
    #[must_use]
    pub fn n_trees(mut self, n: usize) -> Self {
        self.config.n_trees = n;
        self
    }

    /// Set the maximum tree depth (default: 10).
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    /// Set the minimum samples required to split (default: 4).
    #[must_use]
    pub fn min_samples_split(mut self, n: usize) -> Self {
        self.config.min_samples_split = n;
        self
    }

    /// Set the minimum samples per leaf (default: 2).
    #[must_use]
    pub fn min_samples_leaf(mut self, n: usize) -> Self {
        self.config.min_samples_leaf = n;
        self
    }

    /// Set the held-out test fraction (default: 0.2).
    #[must_use]
    pub fn test_size(mut self, size: f64) -> Self {
        self.config.test_size = size;
        self
    }

    /// Set the random seed (default: 42).
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Enable or disable balanced class weights (default: true).
    #[must_use]
    pub fn balance_classes(mut self, balance: bool) -> Self {
        self.config.balance_classes = balance;
        self
    }

    /// Build the configuration, validating all settings.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidConfig`] if:
    /// - `n_trees` is zero
    /// - `max_depth` is zero
    /// - `min_samples_split` is less than 2
    /// - `min_samples_leaf` is zero
    /// - `test_size` is not in (0.0, 1.0)
    pub fn build(self) -> Result<TrainerConfig> {
        if self.config.n_trees == 0 {
            return Err(LearningError::InvalidConfig(
                "n_trees must be at least 1".to_string(),
            ));
        }
        if self.config.max_depth == 0 {
            return Err(LearningError::InvalidConfig(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if self.config.min_samples_split < 2 {
            return Err(LearningError::InvalidConfig(
                "min_samples_split must be at least 2".to_string(),
            ));
        }
        if self.config.min_samples_leaf == 0 {
            return Err(LearningError::InvalidConfig(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        if self.config.test_size <= 0.0 || self.config.test_size >= 1.0 {
            return Err(LearningError::InvalidConfig(
                "test_size must be between 0.0 and 1.0 (exclusive)".to_string(),
            ));
        }
        Ok(self.config)
    }
}

/// Diagnostics from a training run.
///
/// Not required for serving, but reproducible for validation given the
/// same dataset and seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Accuracy on the held-out partition.
    pub accuracy: f64,
    /// Per-class precision/recall/F1 on the held-out partition.
    pub class_reports: Vec<ClassReport>,
    /// Feature importance per column, in feature order.
    pub feature_importance: Vec<(String, f64)>,
    /// Number of training rows.
    pub train_rows: usize,
    /// Number of held-out rows.
    pub test_rows: usize,
    /// Label distribution over the full dataset.
    pub label_distribution: Vec<(String, usize)>,
    /// Per-class sample weights the forest was fitted with, derived from
    /// the training partition only.
    pub class_weights: Vec<(String, f64)>,
}

/// Train a fertilizer classifier from the loaded training table.
///
/// Fits the soil/crop/fertilizer encoders, builds the feature matrix in
/// [`FEATURE_COLUMNS`] order, performs a seeded stratified split and
/// evaluates the fitted forest on the held-out partition.
///
/// # Errors
///
/// Returns [`LearningError::ColumnNotFound`] / [`LearningError::InvalidValue`]
/// for a malformed table and [`LearningError::TrainingFailed`] when the data
/// cannot support a split.
pub fn train(df: &DataFrame, config: &TrainerConfig) -> Result<(Bundle, TrainingReport)> {
    let soil_values = string_column(df, SOIL_TYPE_COLUMN)?;
    let crop_values = string_column(df, CROP_TYPE_COLUMN)?;
    let labels = string_column(df, LABEL_COLUMN)?;

    let soil_encoder = CategoryEncoder::fit(SOIL_TYPE_COLUMN, &soil_values);
    let crop_encoder = CategoryEncoder::fit(CROP_TYPE_COLUMN, &crop_values);
    let fertilizer_encoder = CategoryEncoder::fit(LABEL_COLUMN, &labels);

    let numeric: Vec<Vec<f64>> = NUMERIC_COLUMNS
        .iter()
        .map(|name| numeric_column(df, name))
        .collect::<Result<_>>()?;

    let n_rows = labels.len();
    let mut x = Vec::with_capacity(n_rows);
    let mut y = Vec::with_capacity(n_rows);
    for row in 0..n_rows {
        let mut features = Vec::with_capacity(FEATURE_COLUMNS.len());
        for column in &numeric {
            features.push(column[row]);
        }
        features.push(soil_encoder.encode(&soil_values[row]).code as f64);
        features.push(crop_encoder.encode(&crop_values[row]).code as f64);
        x.push(features);
        y.push(fertilizer_encoder.encode(&labels[row]).code);
    }

    let n_classes = fertilizer_encoder.len();
    let label_distribution = count_labels(&y, &fertilizer_encoder);
    debug!(rows = n_rows, classes = n_classes, "label distribution: {label_distribution:?}");

    let (train_idx, test_idx) = stratified_split(&y, n_classes, config.test_size, config.seed)?;
    info!(
        train_rows = train_idx.len(),
        test_rows = test_idx.len(),
        "training random forest ({} trees, depth {})",
        config.n_trees,
        config.max_depth
    );

    let train_x: Vec<Vec<f64>> = train_idx.iter().map(|&i| x[i].clone()).collect();
    let train_y: Vec<usize> = train_idx.iter().map(|&i| y[i]).collect();

    // Weights come from the training partition, not the full dataset;
    // held-out rows must not influence the fit.
    let class_weights = if config.balance_classes {
        balanced_weights(&train_y, n_classes)
    } else {
        vec![1.0; n_classes]
    };

    let params = ForestParams {
        n_trees: config.n_trees,
        max_depth: config.max_depth,
        min_samples_split: config.min_samples_split,
        min_samples_leaf: config.min_samples_leaf,
        seed: config.seed,
    };
    let model = RandomForestClassifier::fit(&train_x, &train_y, n_classes, &class_weights, params)?;

    let test_truth: Vec<usize> = test_idx.iter().map(|&i| y[i]).collect();
    let test_predicted: Vec<usize> = test_idx
        .iter()
        .map(|&i| model.predict(&x[i]))
        .collect::<Result<_>>()?;

    let report = TrainingReport {
        accuracy: accuracy(&test_truth, &test_predicted),
        class_reports: classification_report(
            &test_truth,
            &test_predicted,
            fertilizer_encoder.classes(),
        ),
        feature_importance: FEATURE_COLUMNS
            .iter()
            .map(|name| name.to_string())
            .zip(model.feature_importances().iter().copied())
            .collect(),
        train_rows: train_idx.len(),
        test_rows: test_idx.len(),
        label_distribution,
        class_weights: fertilizer_encoder
            .classes()
            .iter()
            .cloned()
            .zip(class_weights.iter().copied())
            .collect(),
    };
    info!(accuracy = report.accuracy, "training complete");

    let bundle = Bundle::new(model, soil_encoder, crop_encoder, fertilizer_encoder)?;
    Ok((bundle, report))
}

/// Seeded stratified train/test split over class codes.
///
/// Each class contributes `test_size` of its rows to the held-out set
/// (at least one when the class has two or more rows), so held-out metrics
/// are measured on a distribution-matched sample.
fn stratified_split(
    y: &[usize],
    n_classes: usize,
    test_size: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if y.is_empty() {
        return Err(LearningError::TrainingFailed(
            "cannot split an empty dataset".to_string(),
        ));
    }

    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
    for (idx, &class) in y.iter().enumerate() {
        by_class[class].push(idx);
    }

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for group in &mut by_class {
        group.shuffle(&mut rng);
        let n_test = if group.len() < 2 {
            // A singleton class stays in training; there is nothing to
            // hold out without losing the class entirely.
            0
        } else {
            ((group.len() as f64 * test_size).round() as usize).clamp(1, group.len() - 1)
        };
        test.extend_from_slice(&group[..n_test]);
        train.extend_from_slice(&group[n_test..]);
    }

    if train.is_empty() || test.is_empty() {
        return Err(LearningError::TrainingFailed(
            "dataset too small for a stratified split".to_string(),
        ));
    }
    Ok((train, test))
}

/// Balanced class weights: `n_samples / (n_classes * count_c)`.
fn balanced_weights(y: &[usize], n_classes: usize) -> Vec<f64> {
    let mut counts = vec![0usize; n_classes];
    for &class in y {
        counts[class] += 1;
    }
    let n = y.len() as f64;
    counts
        .iter()
        .map(|&c| {
            if c == 0 {
                0.0
            } else {
                n / (n_classes as f64 * c as f64)
            }
        })
        .collect()
}

fn count_labels(y: &[usize], encoder: &CategoryEncoder) -> Vec<(String, usize)> {
    let mut counts = vec![0usize; encoder.len()];
    for &class in y {
        counts[class] += 1;
    }
    encoder
        .classes()
        .iter()
        .cloned()
        .zip(counts)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = TrainerConfig::default();
        assert_eq!(config.n_trees, 100);
        assert_eq!(config.max_depth, 10);
        assert_eq!(config.min_samples_split, 4);
        assert_eq!(config.min_samples_leaf, 2);
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.seed, 42);
        assert!(config.balance_classes);
    }

    #[test]
    fn test_builder_chaining() {
        let config = TrainerConfig::builder()
            .n_trees(50)
            .max_depth(6)
            .min_samples_split(2)
            .min_samples_leaf(1)
            .test_size(0.3)
            .seed(7)
            .balance_classes(false)
            .build()
            .unwrap();
        assert_eq!(config.n_trees, 50);
        assert_eq!(config.seed, 7);
        assert!(!config.balance_classes);
    }

    #[test]
    fn test_invalid_test_size() {
        assert!(TrainerConfig::builder().test_size(0.0).build().is_err());
        assert!(TrainerConfig::builder().test_size(1.0).build().is_err());
        assert!(TrainerConfig::builder().test_size(-0.1).build().is_err());
    }

    #[test]
    fn test_invalid_tree_settings() {
        assert!(TrainerConfig::builder().n_trees(0).build().is_err());
        assert!(TrainerConfig::builder().max_depth(0).build().is_err());
        assert!(TrainerConfig::builder().min_samples_split(1).build().is_err());
        assert!(TrainerConfig::builder().min_samples_leaf(0).build().is_err());
    }

    #[test]
    fn test_stratified_split_proportions() {
        // 40 rows of class 0 and 20 of class 1.
        let mut y = vec![0usize; 40];
        y.extend(vec![1usize; 20]);

        let (train, test) = stratified_split(&y, 2, 0.2, 42).unwrap();
        assert_eq!(train.len() + test.len(), 60);

        let test_class1 = test.iter().filter(|&&i| y[i] == 1).count();
        assert_eq!(test_class1, 4); // 20% of 20
        assert_eq!(test.len(), 12); // 20% of 60
    }

    #[test]
    fn test_stratified_split_deterministic() {
        let y = vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2];
        let a = stratified_split(&y, 3, 0.25, 9).unwrap();
        let b = stratified_split(&y, 3, 0.25, 9).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_singleton_class_stays_in_training() {
        let y = vec![0, 0, 0, 0, 0, 0, 1];
        let (train, test) = stratified_split(&y, 2, 0.2, 42).unwrap();
        assert!(train.iter().any(|&i| y[i] == 1));
        assert!(test.iter().all(|&i| y[i] == 0));
    }

    #[test]
    fn test_class_weights_come_from_training_partition() {
        // 10 "Urea" rows and 3 "DAP" rows. The stratified split holds out
        // 2 and 1 rows respectively, so the training partition is 8/2 and
        // the balanced weights differ from full-dataset ones
        // (10/(2*8)=0.625 and 10/(2*2)=2.5 versus 0.65 and ~2.167).
        let n = 13;
        let nitrogen: Vec<f64> = (0..n)
            .map(|i| if i < 10 { 35.0 + i as f64 } else { 10.0 + i as f64 })
            .collect();
        let labels: Vec<&str> = (0..n).map(|i| if i < 10 { "Urea" } else { "DAP" }).collect();
        let df = polars::df!(
            "Nitrogen" => nitrogen,
            "Phosphorous" => vec![10.0; n],
            "Potassium" => vec![5.0; n],
            "Temparature" => vec![26.0; n],
            "Humidity" => vec![52.0; n],
            "Moisture" => vec![38.0; n],
            "Soil Type" => vec!["Sandy"; n],
            "Crop Type" => vec!["Maize"; n],
            "Fertilizer Name" => labels,
        )
        .unwrap();

        let config = TrainerConfig::builder()
            .n_trees(5)
            .min_samples_split(2)
            .min_samples_leaf(1)
            .build()
            .unwrap();
        let (_, report) = train(&df, &config).unwrap();

        assert_eq!(report.train_rows, 10);
        assert_eq!(report.class_weights.len(), 2);
        let (dap_label, dap_weight) = &report.class_weights[0];
        let (urea_label, urea_weight) = &report.class_weights[1];
        assert_eq!(dap_label, "DAP");
        assert_eq!(urea_label, "Urea");
        assert!((dap_weight - 2.5).abs() < 1e-12);
        assert!((urea_weight - 0.625).abs() < 1e-12);
    }

    #[test]
    fn test_balanced_weights() {
        let y = vec![0, 0, 0, 1];
        let weights = balanced_weights(&y, 2);
        // 4 / (2 * 3) and 4 / (2 * 1)
        assert!((weights[0] - 4.0 / 6.0).abs() < 1e-12);
        assert!((weights[1] - 2.0).abs() < 1e-12);
    }
}
