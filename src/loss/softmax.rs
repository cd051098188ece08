use log::{debug, trace};
use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::loss::strategy::Strategy;
use crate::loss::validate::{ensure_finite, validate_inputs};
use crate::math::matrix::Matrix;

/// Output of one softmax evaluation.
///
/// `grad` has the shape of the weights it was computed for and is freshly
/// allocated on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossAndGradient {
    pub loss: f64,
    pub grad: Matrix,
}

impl LossAndGradient {
    pub fn into_parts(self) -> (f64, Matrix) {
        (self.loss, self.grad)
    }
}

/// Evaluates the softmax loss and its weight gradient with the given strategy.
///
/// - `weights` — D×C weights
/// - `data`    — N×D minibatch, one example per row
/// - `labels`  — N class indices, each in `0..C`
/// - `reg`     — regularization strength, added to the loss as `reg * sum(W²)`
pub fn evaluate(
    weights: &Matrix,
    data: &Matrix,
    labels: &[usize],
    reg: f64,
    strategy: Strategy,
) -> Result<LossAndGradient> {
    strategy.evaluate(weights, data, labels, reg)
}

/// Softmax loss with explicit loops over examples and classes.
///
/// Scores are shifted by their row maximum before exponentiating, so
/// `exp()` never sees a positive argument.
///
/// The gradient per example `i` and class `j` is
///   `(p_ij - 1) * x_i` when `j == y_i`, otherwise `p_ij * x_i`,
/// averaged over the batch, plus `2 * reg * W`.
pub fn softmax_loss_naive(
    weights: &Matrix,
    data: &Matrix,
    labels: &[usize],
    reg: f64,
) -> Result<LossAndGradient> {
    validate_inputs(weights, data, labels, reg)?;

    let num_train = data.rows;
    let num_features = data.cols;
    let num_classes = weights.cols;
    debug!(
        "softmax loss (iterative): {num_train} examples, {num_features} features, {num_classes} classes, reg = {reg}"
    );

    let mut probs = Matrix::zeros(num_train, num_classes);
    for i in 0..num_train {
        let x_i = data.row(i);

        let mut scores = vec![0.0; num_classes];
        for (j, score) in scores.iter_mut().enumerate() {
            for k in 0..num_features {
                *score += x_i[k] * weights.data[k][j];
            }
        }

        let shift = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mut total = 0.0;
        for score in scores.iter_mut() {
            *score = (*score - shift).exp();
            total += *score;
        }
        for (j, e) in scores.into_iter().enumerate() {
            probs.data[i][j] = e / total;
        }
        trace!("example {i}: label {} has probability {}", labels[i], probs.data[i][labels[i]]);
    }

    let mut data_loss = 0.0;
    for i in 0..num_train {
        data_loss += -probs.data[i][labels[i]].ln();
    }
    let loss = data_loss / num_train as f64 + reg * weights.sum_squares();

    let mut grad = Matrix::zeros(num_features, num_classes);
    for i in 0..num_train {
        for j in 0..num_classes {
            let p = probs.data[i][j];
            let coeff = if j == labels[i] { -(1.0 - p) } else { p };
            for k in 0..num_features {
                grad.data[k][j] += coeff * data.data[i][k];
            }
        }
    }
    let grad = grad
        .scale(1.0 / num_train as f64)
        .add(&weights.scale(2.0 * reg))?;

    ensure_finite(loss, &grad)?;
    debug!("softmax loss (iterative) = {loss}");
    Ok(LossAndGradient { loss, grad })
}

/// Softmax loss over the whole batch at once.
///
/// With `P` the row-wise softmax of `X · W` and `Y` the one-hot labels,
///   loss = mean(-ln P[i, y_i]) + reg * sum(W²)
///   dW   = Xᵀ · (P - Y) / N + 2 * reg * W
pub fn softmax_loss_vectorized(
    weights: &Matrix,
    data: &Matrix,
    labels: &[usize],
    reg: f64,
) -> Result<LossAndGradient> {
    validate_inputs(weights, data, labels, reg)?;

    let num_train = data.rows;
    debug!(
        "softmax loss (batched): {num_train}x{} data, {}x{} weights, reg = {reg}",
        data.cols, weights.rows, weights.cols
    );

    let scores = data.matmul(weights)?;
    let probs = row_softmax(&scores);

    let data_loss: f64 = labels
        .iter()
        .enumerate()
        .map(|(i, &label)| -probs.data[i][label].ln())
        .sum();
    let loss = data_loss / num_train as f64 + reg * weights.sum_squares();

    let mut dscores = probs;
    for (i, &label) in labels.iter().enumerate() {
        dscores.data[i][label] -= 1.0;
    }
    let grad = data
        .transpose()
        .matmul(&dscores)?
        .scale(1.0 / num_train as f64)
        .add(&weights.scale(2.0 * reg))?;

    ensure_finite(loss, &grad)?;
    debug!("softmax loss (batched) = {loss}");
    Ok(LossAndGradient { loss, grad })
}

/// Row-wise softmax, each row shifted by its own maximum first.
pub fn row_softmax(scores: &Matrix) -> Matrix {
    let shifts = scores.row_max();
    let exp = Matrix::filled_with(scores.rows, scores.cols, |i, j| {
        (scores.data[i][j] - shifts[i]).exp()
    });
    let totals = exp.row_sums();
    Matrix::filled_with(exp.rows, exp.cols, |i, j| exp.data[i][j] / totals[i])
}
