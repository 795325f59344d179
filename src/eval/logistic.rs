// One-vs-rest L2-regularized logistic regression
//
// A linear, class-balanced binary classifier trained per genre label.
// The solver is deterministic full-batch gradient descent: zero
// initialization, a step size derived from a Lipschitz bound on the
// gradient, an iteration cap, and a gradient-norm stopping tolerance.
// No randomness anywhere, so repeated runs produce identical models.
//
// Class balancing follows the usual inverse-frequency scheme: each
// sample is weighted n / (2 * count(class)), which stops the frequent
// negative class from drowning out rare genre labels.

use ndarray::{Array2, ArrayView2};

use crate::config::EvalConfig;
use crate::features::CsrMatrix;

/// Solver settings shared by every per-label model
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// L2 penalty strength (the inverse of C)
    pub l2: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl TrainConfig {
    pub fn from_eval(config: &EvalConfig) -> Self {
        Self {
            l2: 1.0 / config.c,
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
        }
    }
}

/// Binary logistic regression model: decision(x) = w . x + b
#[derive(Debug, Clone)]
pub struct BinaryLogistic {
    weights: Vec<f64>,
    bias: f64,
}

impl BinaryLogistic {
    /// Fit with balanced class weights
    ///
    /// Minimizes the weighted log-loss plus an L2 penalty on the weight
    /// vector (the bias is unpenalized). The caller guarantees that both
    /// classes are present in `targets`.
    pub fn fit(features: &CsrMatrix, targets: &[u8], config: &TrainConfig) -> Self {
        let n_rows = features.n_rows();
        let n_cols = features.n_cols();

        let n_pos = targets.iter().filter(|&&t| t == 1).count();
        let n_neg = n_rows - n_pos;
        let weight_pos = n_rows as f64 / (2.0 * n_pos as f64);
        let weight_neg = n_rows as f64 / (2.0 * n_neg as f64);

        // Lipschitz bound on the gradient of the weighted loss; the +1
        // accounts for the bias coordinate
        let mut lipschitz = config.l2;
        for row in 0..n_rows {
            let (_, vals) = features.row(row);
            let sq_norm: f64 = vals.iter().map(|v| v * v).sum();
            let sample_weight = if targets[row] == 1 { weight_pos } else { weight_neg };
            lipschitz += 0.25 * sample_weight * (sq_norm + 1.0);
        }
        let step = 1.0 / lipschitz;

        let mut weights = vec![0.0; n_cols];
        let mut bias = 0.0;

        for _ in 0..config.max_iterations {
            let mut grad_w = vec![0.0; n_cols];
            let mut grad_b = 0.0;

            for row in 0..n_rows {
                let z = features.row_dot(row, &weights) + bias;
                let p = sigmoid(z);
                let sample_weight = if targets[row] == 1 { weight_pos } else { weight_neg };
                let residual = sample_weight * (p - f64::from(targets[row]));

                let (cols, vals) = features.row(row);
                for (&col, &val) in cols.iter().zip(vals) {
                    grad_w[col] += residual * val;
                }
                grad_b += residual;
            }
            for (g, w) in grad_w.iter_mut().zip(&weights) {
                *g += config.l2 * w;
            }

            let grad_norm: f64 = grad_w
                .iter()
                .map(|g| g * g)
                .sum::<f64>()
                .sqrt()
                .hypot(grad_b);
            if grad_norm < config.tolerance {
                break;
            }

            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= step * g;
            }
            bias -= step * grad_b;
        }

        Self { weights, bias }
    }

    /// Signed distance from the decision boundary for one row
    pub fn decision(&self, features: &CsrMatrix, row: usize) -> f64 {
        features.row_dot(row, &self.weights) + self.bias
    }
}

/// Per-label model: trained, or constant when training saw one class
#[derive(Debug, Clone)]
enum LabelModel {
    Trained(BinaryLogistic),
    Constant(u8),
}

/// One-vs-rest wrapper: one binary model per label column
#[derive(Debug, Clone)]
pub struct OneVsRest {
    models: Vec<LabelModel>,
}

impl OneVsRest {
    /// Train one model per label column of `labels`
    ///
    /// A column with a single observed class gets a constant model
    /// instead of a degenerate fit.
    pub fn fit(features: &CsrMatrix, labels: &ArrayView2<u8>, config: &TrainConfig) -> Self {
        let models = labels
            .columns()
            .into_iter()
            .map(|column| {
                let targets: Vec<u8> = column.iter().copied().collect();
                let n_pos = targets.iter().filter(|&&t| t == 1).count();
                if n_pos == 0 || n_pos == targets.len() {
                    LabelModel::Constant(if n_pos == 0 { 0 } else { 1 })
                } else {
                    LabelModel::Trained(BinaryLogistic::fit(features, &targets, config))
                }
            })
            .collect();
        Self { models }
    }

    /// Decision scores, shape (rows, labels)
    pub fn decision_matrix(&self, features: &CsrMatrix) -> Array2<f64> {
        let n_rows = features.n_rows();
        let mut scores = Array2::zeros((n_rows, self.models.len()));
        for (col, model) in self.models.iter().enumerate() {
            for row in 0..n_rows {
                scores[[row, col]] = match model {
                    LabelModel::Trained(m) => m.decision(features, row),
                    LabelModel::Constant(1) => 1.0,
                    LabelModel::Constant(_) => -1.0,
                };
            }
        }
        scores
    }

    /// Hard 0/1 predictions, shape (rows, labels)
    pub fn predict(&self, features: &CsrMatrix) -> Array2<u8> {
        self.decision_matrix(features).mapv(|z| u8::from(z > 0.0))
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
