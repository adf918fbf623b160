//! Random forest classifier.
//!
//! CART decision trees built with Gini impurity, trained on bootstrap
//! samples of the encoded feature matrix. Class imbalance is handled with
//! per-class sample weights folded into the impurity computation, so
//! minority fertilizer labels still shape the splits.
//!
//! The fitted forest exposes both an argmax prediction and a full
//! probability distribution (the fraction of trees voting for each class),
//! which the recommendation engine turns into a confidence score.

use crate::error::{LearningError, Result};
use rand::SeedableRng;
use rand::distributions::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

/// A node in a fitted decision tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf with a class prediction.
    Leaf {
        /// Predicted class code for samples reaching this leaf.
        class: usize,
        /// Number of training samples that reached this leaf.
        n_samples: usize,
    },
    /// Internal split on `feature <= threshold`.
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    /// Walk the tree and return the predicted class for one sample.
    fn predict(&self, sample: &[f64]) -> usize {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { class, .. } => return *class,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if sample[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

/// Hyperparameters for forest fitting. All explicit, no hidden defaults;
/// the trainer's config builder is the single place defaults live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees in the ensemble.
    pub n_trees: usize,
    /// Maximum tree depth (root is depth 0).
    pub max_depth: usize,
    /// Minimum samples required to attempt a split.
    pub min_samples_split: usize,
    /// Minimum samples each side of a split must retain.
    pub min_samples_leaf: usize,
    /// Seed for bootstrap sampling; tree `i` draws with `seed + i`.
    pub seed: u64,
}

/// Tree-ensemble classifier over encoded soil/crop feature vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    trees: Vec<TreeNode>,
    n_classes: usize,
    n_features: usize,
    params: ForestParams,
    /// Normalized mean impurity decrease per feature column.
    feature_importances: Vec<f64>,
}

impl RandomForestClassifier {
    /// Fit a forest on an encoded feature matrix.
    ///
    /// `class_weights` must have one entry per class; pass uniform weights
    /// to disable balancing.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::TrainingFailed`] on empty or ragged input.
    pub fn fit(
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
        class_weights: &[f64],
        params: ForestParams,
    ) -> Result<Self> {
        if x.is_empty() || y.is_empty() {
            return Err(LearningError::TrainingFailed(
                "cannot fit on an empty dataset".to_string(),
            ));
        }
        if x.len() != y.len() {
            return Err(LearningError::TrainingFailed(format!(
                "feature matrix has {} rows but {} labels were given",
                x.len(),
                y.len()
            )));
        }
        if class_weights.len() != n_classes {
            return Err(LearningError::TrainingFailed(format!(
                "{} class weights given for {n_classes} classes",
                class_weights.len()
            )));
        }
        let n_features = x[0].len();
        if x.iter().any(|row| row.len() != n_features) {
            return Err(LearningError::TrainingFailed(
                "ragged feature matrix".to_string(),
            ));
        }

        let n_samples = x.len();
        let mut trees = Vec::with_capacity(params.n_trees);
        let mut importances = vec![0.0; n_features];

        for tree_idx in 0..params.n_trees {
            let indices = bootstrap_sample(n_samples, params.seed.wrapping_add(tree_idx as u64));
            let tree = build_tree(
                x,
                y,
                class_weights,
                &indices,
                0,
                &params,
                &mut importances,
            );
            trees.push(tree);
        }

        // Normalize importances across the whole ensemble.
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }

        Ok(Self {
            trees,
            n_classes,
            n_features,
            params,
            feature_importances: importances,
        })
    }

    /// Predicted class code for one feature vector (argmax of the vote
    /// distribution; ties break toward the lower code).
    pub fn predict(&self, sample: &[f64]) -> Result<usize> {
        let proba = self.predict_proba(sample)?;
        let (class, _) = proba
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |(best_i, best_p), (i, &p)| {
                if p > best_p { (i, p) } else { (best_i, best_p) }
            });
        Ok(class)
    }

    /// Per-class probability distribution for one feature vector.
    ///
    /// Probabilities are tree-vote fractions and always sum to 1.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::TrainingFailed`] if the sample width does
    /// not match the fitted feature count.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<Vec<f64>> {
        if sample.len() != self.n_features {
            return Err(LearningError::TrainingFailed(format!(
                "feature vector has {} values but the model was trained on {}",
                sample.len(),
                self.n_features
            )));
        }

        let mut votes = vec![0usize; self.n_classes];
        for tree in &self.trees {
            votes[tree.predict(sample)] += 1;
        }
        let n_trees = self.trees.len() as f64;
        Ok(votes.into_iter().map(|v| v as f64 / n_trees).collect())
    }

    /// Normalized impurity-decrease importance per feature column.
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    /// Number of classes the forest predicts over.
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Width of the feature vectors the forest was trained on.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// The hyperparameters the forest was fitted with.
    pub fn params(&self) -> &ForestParams {
        &self.params
    }
}

/// Draw a bootstrap sample (with replacement) of row indices.
fn bootstrap_sample(n_samples: usize, seed: u64) -> Vec<usize> {
    let dist = Uniform::from(0..n_samples);
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..n_samples).map(|_| dist.sample(&mut rng)).collect()
}

/// Weighted class counts for the rows in `indices`.
fn weighted_counts(y: &[usize], class_weights: &[f64], indices: &[usize]) -> Vec<f64> {
    let mut counts = vec![0.0; class_weights.len()];
    for &idx in indices {
        counts[y[idx]] += class_weights[y[idx]];
    }
    counts
}

/// Gini impurity over weighted class counts: `1 - Σ(p_c²)`.
fn gini_impurity(counts: &[f64]) -> f64 {
    let total: f64 = counts.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c / total;
            p * p
        })
        .sum::<f64>()
}

/// Class with the largest weighted count; ties break toward the lower code.
fn majority_class(counts: &[f64]) -> usize {
    counts
        .iter()
        .enumerate()
        .fold((0, f64::MIN), |(best_i, best_c), (i, &c)| {
            if c > best_c { (i, c) } else { (best_i, best_c) }
        })
        .0
}

/// Best `(feature, threshold, gain)` over all features, or `None` when no
/// split improves on the parent impurity.
fn find_best_split(
    x: &[Vec<f64>],
    y: &[usize],
    class_weights: &[f64],
    indices: &[usize],
    min_samples_leaf: usize,
) -> Option<(usize, f64, f64)> {
    let parent_counts = weighted_counts(y, class_weights, indices);
    let parent_weight: f64 = parent_counts.iter().sum();
    let parent_impurity = gini_impurity(&parent_counts);
    let n_features = x[indices[0]].len();

    let mut best: Option<(usize, f64, f64)> = None;

    for feature in 0..n_features {
        let mut values: Vec<f64> = indices.iter().map(|&i| x[i][feature]).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        values.dedup_by(|a, b| (*a - *b).abs() < 1e-12);
        if values.len() < 2 {
            continue;
        }

        for pair in values.windows(2) {
            let threshold = (pair[0] + pair[1]) / 2.0;

            let mut left_counts = vec![0.0; class_weights.len()];
            let mut right_counts = vec![0.0; class_weights.len()];
            let mut n_left = 0usize;
            for &idx in indices {
                if x[idx][feature] <= threshold {
                    left_counts[y[idx]] += class_weights[y[idx]];
                    n_left += 1;
                } else {
                    right_counts[y[idx]] += class_weights[y[idx]];
                }
            }
            let n_right = indices.len() - n_left;
            if n_left < min_samples_leaf || n_right < min_samples_leaf {
                continue;
            }

            let left_weight: f64 = left_counts.iter().sum();
            let right_weight: f64 = right_counts.iter().sum();
            let split_impurity = (left_weight / parent_weight) * gini_impurity(&left_counts)
                + (right_weight / parent_weight) * gini_impurity(&right_counts);
            let gain = parent_impurity - split_impurity;

            if gain > 0.0 && best.map_or(true, |(_, _, g)| gain > g) {
                best = Some((feature, threshold, gain));
            }
        }
    }

    best
}

/// Build a tree recursively over the rows in `indices`, accumulating
/// weighted impurity decrease into `importances`.
fn build_tree(
    x: &[Vec<f64>],
    y: &[usize],
    class_weights: &[f64],
    indices: &[usize],
    depth: usize,
    params: &ForestParams,
    importances: &mut [f64],
) -> TreeNode {
    let counts = weighted_counts(y, class_weights, indices);
    let leaf = |counts: &[f64]| TreeNode::Leaf {
        class: majority_class(counts),
        n_samples: indices.len(),
    };

    // Stopping criteria: pure node, depth limit, or too few samples.
    let n_present = counts.iter().filter(|&&c| c > 0.0).count();
    if n_present <= 1 || depth >= params.max_depth || indices.len() < params.min_samples_split {
        return leaf(&counts);
    }

    let Some((feature, threshold, gain)) =
        find_best_split(x, y, class_weights, indices, params.min_samples_leaf)
    else {
        return leaf(&counts);
    };

    let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&idx| x[idx][feature] <= threshold);
    if left_indices.is_empty() || right_indices.is_empty() {
        return leaf(&counts);
    }

    let parent_weight: f64 = counts.iter().sum();
    importances[feature] += parent_weight * gain;

    let left = build_tree(
        x,
        y,
        class_weights,
        &left_indices,
        depth + 1,
        params,
        importances,
    );
    let right = build_tree(
        x,
        y,
        class_weights,
        &right_indices,
        depth + 1,
        params,
        importances,
    );

    TreeNode::Split {
        feature,
        threshold,
        left: Box::new(left),
        right: Box::new(right),
    }
}
