//! Gradient-boosted decision trees for multiclass risk classification.
//!
//! Softmax objective with one shallow regression tree per class per
//! round, Newton-step leaf values. Small and deterministic; the
//! feature set is 8 wide and training sets are thousands of rows, so
//! exact greedy splits are affordable.

use serde::{Deserialize, Serialize};

use super::error::ModelError;
use crate::features::RiskLevel;

const NUM_CLASSES: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbtConfig {
    pub rounds: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_leaf_samples: usize,
}

impl Default for GbtConfig {
    fn default() -> Self {
        GbtConfig {
            rounds: 60,
            learning_rate: 0.1,
            max_depth: 4,
            min_leaf_samples: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn eval(&self, features: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Trained multiclass classifier: `rounds × NUM_CLASSES` trees plus the
/// base (prior) score per class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbtClassifier {
    config: GbtConfig,
    n_features: usize,
    base_scores: [f64; NUM_CLASSES],
    /// trees[round][class]
    trees: Vec<Vec<Tree>>,
}

impl GbtClassifier {
    /// Fit on feature vectors and their labels. All rows must share the
    /// same width.
    pub fn fit(
        features: &[Vec<f64>],
        labels: &[RiskLevel],
        config: GbtConfig,
    ) -> Result<GbtClassifier, ModelError> {
        debug_assert_eq!(features.len(), labels.len());
        let n = features.len();
        if n == 0 {
            return Err(ModelError::InsufficientTrainingData { got: 0, need: 1 });
        }
        let n_features = features[0].len();

        // Log-prior base scores keep early rounds from chasing class
        // imbalance.
        let mut counts = [0usize; NUM_CLASSES];
        for label in labels {
            counts[label.class_index()] += 1;
        }
        let mut base_scores = [0.0; NUM_CLASSES];
        for k in 0..NUM_CLASSES {
            let p = (counts[k].max(1)) as f64 / n as f64;
            base_scores[k] = p.ln();
        }

        let mut raw = vec![base_scores; n];
        let mut trees: Vec<Vec<Tree>> = Vec::with_capacity(config.rounds);

        for _ in 0..config.rounds {
            let mut round_trees = Vec::with_capacity(NUM_CLASSES);
            let probs: Vec<[f64; NUM_CLASSES]> = raw.iter().map(|r| softmax(r)).collect();

            for k in 0..NUM_CLASSES {
                // Gradient residuals and Hessian weights for class k
                let residuals: Vec<f64> = labels
                    .iter()
                    .zip(&probs)
                    .map(|(y, p)| (if y.class_index() == k { 1.0 } else { 0.0 }) - p[k])
                    .collect();
                let hessians: Vec<f64> = probs.iter().map(|p| p[k] * (1.0 - p[k])).collect();

                let indices: Vec<usize> = (0..n).collect();
                let mut nodes = Vec::new();
                build_node(
                    features,
                    &residuals,
                    &hessians,
                    &indices,
                    config.max_depth,
                    config.min_leaf_samples,
                    config.learning_rate,
                    &mut nodes,
                );
                let tree = Tree { nodes };

                for (i, row) in features.iter().enumerate() {
                    raw[i][k] += tree.eval(row);
                }
                round_trees.push(tree);
            }
            trees.push(round_trees);
        }

        Ok(GbtClassifier {
            config,
            n_features,
            base_scores,
            trees,
        })
    }

    /// Class probabilities for a single feature vector.
    pub fn predict_proba(&self, features: &[f64]) -> Result<[f64; NUM_CLASSES], ModelError> {
        if features.len() != self.n_features {
            return Err(ModelError::FeatureWidth {
                got: features.len(),
                expected: self.n_features,
            });
        }
        let mut raw = self.base_scores;
        for round in &self.trees {
            for (k, tree) in round.iter().enumerate() {
                raw[k] += tree.eval(features);
            }
        }
        Ok(softmax(&raw))
    }

    /// Most probable risk class.
    pub fn predict(&self, features: &[f64]) -> Result<RiskLevel, ModelError> {
        let proba = self.predict_proba(features)?;
        let mut best = 0;
        for k in 1..NUM_CLASSES {
            if proba[k] > proba[best] {
                best = k;
            }
        }
        Ok(RiskLevel::from_class_index(best))
    }
}

fn softmax(raw: &[f64; NUM_CLASSES]) -> [f64; NUM_CLASSES] {
    let max = raw.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mut exp = [0.0; NUM_CLASSES];
    let mut sum = 0.0;
    for k in 0..NUM_CLASSES {
        exp[k] = (raw[k] - max).exp();
        sum += exp[k];
    }
    for value in &mut exp {
        *value /= sum;
    }
    exp
}

/// Newton leaf value: (K-1)/K · Σr / (Σh + ε), damped by the learning
/// rate.
fn leaf_value(
    residuals: &[f64],
    hessians: &[f64],
    indices: &[usize],
    learning_rate: f64,
) -> f64 {
    let sum_r: f64 = indices.iter().map(|&i| residuals[i]).sum();
    let sum_h: f64 = indices.iter().map(|&i| hessians[i]).sum();
    let k = NUM_CLASSES as f64;
    learning_rate * (k - 1.0) / k * sum_r / (sum_h + 1e-9)
}

/// Recursively grow a node; returns its index in `nodes`.
#[allow(clippy::too_many_arguments)]
fn build_node(
    features: &[Vec<f64>],
    residuals: &[f64],
    hessians: &[f64],
    indices: &[usize],
    depth_left: usize,
    min_leaf: usize,
    learning_rate: f64,
    nodes: &mut Vec<Node>,
) -> usize {
    if depth_left == 0 || indices.len() < 2 * min_leaf {
        let idx = nodes.len();
        nodes.push(Node::Leaf {
            value: leaf_value(residuals, hessians, indices, learning_rate),
        });
        return idx;
    }

    match best_split(features, residuals, indices, min_leaf) {
        Some((feature, threshold)) => {
            let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .copied()
                .partition(|&i| features[i][feature] <= threshold);

            let idx = nodes.len();
            nodes.push(Node::Leaf { value: 0.0 }); // placeholder, patched below
            let left = build_node(
                features, residuals, hessians, &left_idx, depth_left - 1, min_leaf,
                learning_rate, nodes,
            );
            let right = build_node(
                features, residuals, hessians, &right_idx, depth_left - 1, min_leaf,
                learning_rate, nodes,
            );
            nodes[idx] = Node::Split {
                feature,
                threshold,
                left,
                right,
            };
            idx
        }
        None => {
            let idx = nodes.len();
            nodes.push(Node::Leaf {
                value: leaf_value(residuals, hessians, indices, learning_rate),
            });
            idx
        }
    }
}

/// Exact greedy split search: for each feature, scan sorted values and
/// maximize the squared-error reduction of the residuals via prefix
/// sums. Returns `None` when no split improves on the parent.
fn best_split(
    features: &[Vec<f64>],
    residuals: &[f64],
    indices: &[usize],
    min_leaf: usize,
) -> Option<(usize, f64)> {
    let n = indices.len();
    let n_features = features[indices[0]].len();

    let total: f64 = indices.iter().map(|&i| residuals[i]).sum();
    let mut best: Option<(usize, f64, f64)> = None; // (feature, threshold, gain)

    for feature in 0..n_features {
        let mut order: Vec<usize> = indices.to_vec();
        order.sort_by(|&a, &b| {
            features[a][feature]
                .partial_cmp(&features[b][feature])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut left_sum = 0.0;
        for pos in 0..n - 1 {
            left_sum += residuals[order[pos]];
            let left_count = pos + 1;
            let right_count = n - left_count;
            if left_count < min_leaf || right_count < min_leaf {
                continue;
            }

            let here = features[order[pos]][feature];
            let next = features[order[pos + 1]][feature];
            if next <= here {
                continue; // tied values cannot be separated
            }

            let right_sum = total - left_sum;
            let gain = left_sum * left_sum / left_count as f64
                + right_sum * right_sum / right_count as f64
                - total * total / n as f64;

            if best.map_or(gain > 1e-12, |(_, _, g)| gain > g) {
                best = Some((feature, (here + next) / 2.0, gain));
            }
        }
    }

    best.map(|(feature, threshold, _)| (feature, threshold))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Synthetic but separable data: class determined by the first
    /// feature with a margin.
    fn toy_dataset() -> (Vec<Vec<f64>>, Vec<RiskLevel>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..30 {
            let jitter = (i % 5) as f64 * 0.1;
            features.push(vec![1.0 + jitter, 0.5]);
            labels.push(RiskLevel::Low);
            features.push(vec![5.0 + jitter, 0.5]);
            labels.push(RiskLevel::Medium);
            features.push(vec![9.0 + jitter, 0.5]);
            labels.push(RiskLevel::High);
        }
        (features, labels)
    }

    #[test]
    fn learns_separable_classes() {
        let (features, labels) = toy_dataset();
        let model = GbtClassifier::fit(&features, &labels, GbtConfig::default()).unwrap();

        assert_eq!(model.predict(&[1.2, 0.5]).unwrap(), RiskLevel::Low);
        assert_eq!(model.predict(&[5.1, 0.5]).unwrap(), RiskLevel::Medium);
        assert_eq!(model.predict(&[9.3, 0.5]).unwrap(), RiskLevel::High);
    }

    #[test]
    fn probabilities_sum_to_one() {
        let (features, labels) = toy_dataset();
        let model = GbtClassifier::fit(&features, &labels, GbtConfig::default()).unwrap();
        let proba = model.predict_proba(&[5.0, 0.5]).unwrap();
        let sum: f64 = proba.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(proba.iter().all(|&p| p >= 0.0));
    }

    #[test]
    fn training_is_deterministic() {
        let (features, labels) = toy_dataset();
        let a = GbtClassifier::fit(&features, &labels, GbtConfig::default()).unwrap();
        let b = GbtClassifier::fit(&features, &labels, GbtConfig::default()).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn wrong_feature_width_rejected() {
        let (features, labels) = toy_dataset();
        let model = GbtClassifier::fit(&features, &labels, GbtConfig::default()).unwrap();
        assert!(matches!(
            model.predict(&[1.0]),
            Err(ModelError::FeatureWidth { got: 1, expected: 2 })
        ));
    }

    #[test]
    fn survives_single_class_input() {
        let features: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64, 1.0]).collect();
        let labels = vec![RiskLevel::Low; 20];
        let model = GbtClassifier::fit(&features, &labels, GbtConfig::default()).unwrap();
        assert_eq!(model.predict(&[3.0, 1.0]).unwrap(), RiskLevel::Low);
    }
}
