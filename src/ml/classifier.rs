use crate::error::{AppError, Result};
use crate::ml::vectorizer::SparseVector;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Loss improvement below this ends training early.
const CONVERGENCE_TOLERANCE: f64 = 1e-4;

/// Model evaluation metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Accuracy
    pub accuracy: f64,

    /// Macro-averaged precision
    pub precision: f64,

    /// Macro-averaged recall
    pub recall: f64,

    /// Macro-averaged F1 score
    pub f1_score: f64,

    /// Per-class metrics
    pub per_class_metrics: HashMap<String, ClassMetrics>,
}

/// Per-class evaluation metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

impl ModelMetrics {
    pub fn new() -> Self {
        Self {
            accuracy: 0.0,
            precision: 0.0,
            recall: 0.0,
            f1_score: 0.0,
            per_class_metrics: HashMap::new(),
        }
    }
}

impl Default for ModelMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-hidden-layer perceptron over TF-IDF features.
///
/// Full-batch gradient descent with a tanh hidden layer and a softmax
/// output. All weights are initialized from a fixed seed, so training
/// twice on the same inputs yields an identical model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpClassifier {
    hidden_size: usize,
    max_epochs: usize,
    learning_rate: f64,
    seed: u64,

    /// Input -> hidden weights (n_features x hidden_size)
    w1: Array2<f64>,
    b1: Array1<f64>,

    /// Hidden -> output weights (hidden_size x n_classes)
    w2: Array2<f64>,
    b2: Array1<f64>,

    n_features: usize,
    n_classes: usize,
    trained: bool,
}

impl MlpClassifier {
    pub fn new(hidden_size: usize, max_epochs: usize, learning_rate: f64, seed: u64) -> Self {
        Self {
            hidden_size,
            max_epochs,
            learning_rate,
            seed,
            w1: Array2::zeros((0, 0)),
            b1: Array1::zeros(0),
            w2: Array2::zeros((0, 0)),
            b2: Array1::zeros(0),
            n_features: 0,
            n_classes: 0,
            trained: false,
        }
    }

    /// Train on a feature matrix and encoded labels.
    ///
    /// Requires at least two distinct classes. Exhausting the epoch budget
    /// without converging is logged, not treated as a failure.
    pub fn fit(&mut self, features: &Array2<f64>, labels: &[usize]) -> Result<()> {
        let n_samples = features.nrows();
        if n_samples == 0 || n_samples != labels.len() {
            return Err(AppError::Training(format!(
                "feature rows ({}) and labels ({}) do not line up",
                n_samples,
                labels.len()
            )));
        }

        let n_classes = labels.iter().max().map(|&m| m + 1).unwrap_or(0);
        let distinct = {
            let mut seen = vec![false; n_classes];
            for &label in labels {
                seen[label] = true;
            }
            seen.iter().filter(|&&s| s).count()
        };
        if distinct < 2 {
            return Err(AppError::Training(
                "training requires at least two distinct classes".to_string(),
            ));
        }

        self.n_features = features.ncols();
        self.n_classes = n_classes;
        self.init_weights();

        // One-hot target matrix
        let mut targets = Array2::zeros((n_samples, n_classes));
        for (i, &label) in labels.iter().enumerate() {
            targets[[i, label]] = 1.0;
        }

        let mut previous_loss = f64::INFINITY;
        let mut converged = false;

        for epoch in 0..self.max_epochs {
            let hidden = self.hidden_activations(features);
            let probabilities = Self::softmax(&(hidden.dot(&self.w2) + &self.b2));

            let loss = Self::cross_entropy(&probabilities, &targets);
            if (previous_loss - loss).abs() < CONVERGENCE_TOLERANCE {
                debug!(epoch, loss, "Training converged");
                converged = true;
                break;
            }
            previous_loss = loss;

            // Backpropagation, averaged over the batch
            let scale = 1.0 / n_samples as f64;
            let d_logits = (&probabilities - &targets) * scale;

            let d_w2 = hidden.t().dot(&d_logits);
            let d_b2 = d_logits.sum_axis(Axis(0));

            let d_hidden = d_logits.dot(&self.w2.t()) * (1.0 - &hidden * &hidden);
            let d_w1 = features.t().dot(&d_hidden);
            let d_b1 = d_hidden.sum_axis(Axis(0));

            self.w2 = &self.w2 - &(d_w2 * self.learning_rate);
            self.b2 = &self.b2 - &(d_b2 * self.learning_rate);
            self.w1 = &self.w1 - &(d_w1 * self.learning_rate);
            self.b1 = &self.b1 - &(d_b1 * self.learning_rate);
        }

        if !converged {
            warn!(
                max_epochs = self.max_epochs,
                final_loss = previous_loss,
                "Epoch budget exhausted before convergence; keeping the model as-is"
            );
        }

        self.trained = true;
        Ok(())
    }

    /// Glorot-uniform initialization from the fixed seed.
    fn init_weights(&mut self) {
        let mut rng = StdRng::seed_from_u64(self.seed);

        let init = |fan_in: usize, fan_out: usize, rng: &mut StdRng| {
            let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
            Array2::from_shape_fn((fan_in, fan_out), |_| rng.random_range(-limit..limit))
        };

        self.w1 = init(self.n_features, self.hidden_size, &mut rng);
        self.b1 = Array1::zeros(self.hidden_size);
        self.w2 = init(self.hidden_size, self.n_classes, &mut rng);
        self.b2 = Array1::zeros(self.n_classes);
    }

    fn hidden_activations(&self, features: &Array2<f64>) -> Array2<f64> {
        (features.dot(&self.w1) + &self.b1).mapv(f64::tanh)
    }

    /// Row-wise softmax, shifted by the row maximum for stability.
    fn softmax(logits: &Array2<f64>) -> Array2<f64> {
        let mut out = logits.clone();
        for mut row in out.rows_mut() {
            let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            row.mapv_inplace(|v| (v - max).exp());
            let sum: f64 = row.sum();
            row.mapv_inplace(|v| v / sum);
        }
        out
    }

    fn cross_entropy(probabilities: &Array2<f64>, targets: &Array2<f64>) -> f64 {
        let n = probabilities.nrows() as f64;
        let mut loss = 0.0;
        for (p, t) in probabilities.iter().zip(targets.iter()) {
            if *t > 0.0 {
                loss -= t * p.max(1e-12).ln();
            }
        }
        loss / n
    }

    /// Predict class codes; ties resolve to the lowest code.
    pub fn predict(&self, features: &Array2<f64>) -> Result<Vec<usize>> {
        if !self.trained {
            return Err(AppError::Training("model is not trained".to_string()));
        }
        if features.ncols() != self.n_features {
            return Err(AppError::Training(format!(
                "expected {} features, got {}",
                self.n_features,
                features.ncols()
            )));
        }

        let hidden = self.hidden_activations(features);
        let probabilities = Self::softmax(&(hidden.dot(&self.w2) + &self.b2));

        Ok(probabilities
            .rows()
            .into_iter()
            .map(|row| {
                let mut best = 0;
                let mut best_value = f64::NEG_INFINITY;
                for (idx, &value) in row.iter().enumerate() {
                    if value > best_value {
                        best = idx;
                        best_value = value;
                    }
                }
                best
            })
            .collect())
    }

    /// Evaluate against true codes, computing accuracy and macro-averaged
    /// precision, recall, and F1 alongside per-class breakdowns.
    pub fn evaluate(&self, features: &Array2<f64>, labels: &[usize]) -> Result<ModelMetrics> {
        let predictions = self.predict(features)?;
        Ok(Self::calculate_metrics(labels, &predictions, self.n_classes))
    }

    fn calculate_metrics(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> ModelMetrics {
        let n_samples = y_true.len();
        if n_samples == 0 {
            return ModelMetrics::new();
        }

        let correct = y_true
            .iter()
            .zip(y_pred.iter())
            .filter(|(t, p)| t == p)
            .count();
        let accuracy = correct as f64 / n_samples as f64;

        let mut per_class = HashMap::new();

        for class_idx in 0..n_classes {
            let tp = y_true
                .iter()
                .zip(y_pred.iter())
                .filter(|(t, p)| **t == class_idx && **p == class_idx)
                .count();

            let fp = y_pred
                .iter()
                .zip(y_true.iter())
                .filter(|(p, t)| **p == class_idx && **t != class_idx)
                .count();

            let fn_count = y_true
                .iter()
                .zip(y_pred.iter())
                .filter(|(t, p)| **t == class_idx && **p != class_idx)
                .count();

            let precision = if tp + fp > 0 {
                tp as f64 / (tp + fp) as f64
            } else {
                0.0
            };

            let recall = if tp + fn_count > 0 {
                tp as f64 / (tp + fn_count) as f64
            } else {
                0.0
            };

            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };

            let support = y_true.iter().filter(|&&t| t == class_idx).count();

            per_class.insert(
                format!("class_{}", class_idx),
                ClassMetrics {
                    precision,
                    recall,
                    f1_score: f1,
                    support,
                },
            );
        }

        let avg_precision: f64 =
            per_class.values().map(|m| m.precision).sum::<f64>() / n_classes as f64;
        let avg_recall: f64 = per_class.values().map(|m| m.recall).sum::<f64>() / n_classes as f64;
        let avg_f1: f64 = per_class.values().map(|m| m.f1_score).sum::<f64>() / n_classes as f64;

        ModelMetrics {
            accuracy,
            precision: avg_precision,
            recall: avg_recall,
            f1_score: avg_f1,
            per_class_metrics: per_class,
        }
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }
}

/// Densify sparse vectors into the (n_samples x dim) matrix the
/// classifier consumes. All vectors must share one dimensionality.
pub fn to_dense_matrix(vectors: &[SparseVector]) -> Result<Array2<f64>> {
    let dim = vectors.first().map(|v| v.dim).unwrap_or(0);
    if vectors.iter().any(|v| v.dim != dim) {
        return Err(AppError::Data(
            "feature vectors have mismatched dimensions".to_string(),
        ));
    }

    let mut matrix = Array2::zeros((vectors.len(), dim));
    for (row, vector) in vectors.iter().enumerate() {
        for (&idx, &value) in vector.indices.iter().zip(vector.values.iter()) {
            matrix[[row, idx]] = value;
        }
    }
    Ok(matrix)
}
