use log::warn;

use crate::error::{Result, SoftmaxError};
use crate::math::matrix::Matrix;

/// Checks every precondition of a softmax evaluation before any arithmetic
/// runs. Rejections are logged at `warn` and returned to the caller.
pub(crate) fn validate_inputs(
    weights: &Matrix,
    data: &Matrix,
    labels: &[usize],
    reg: f64,
) -> Result<()> {
    let result = check(weights, data, labels, reg);
    if let Err(ref e) = result {
        warn!("rejecting softmax evaluation: {e}");
    }
    result
}

fn check(weights: &Matrix, data: &Matrix, labels: &[usize], reg: f64) -> Result<()> {
    weights.check_layout()?;
    data.check_layout()?;
    if data.rows == 0 || weights.cols == 0 {
        return Err(SoftmaxError::EmptyBatch);
    }
    if data.cols != weights.rows {
        return Err(SoftmaxError::ShapeMismatch {
            what: "data columns vs weight rows",
            got: data.cols,
            expected: weights.rows,
        });
    }
    if labels.len() != data.rows {
        return Err(SoftmaxError::ShapeMismatch {
            what: "label count vs data rows",
            got: labels.len(),
            expected: data.rows,
        });
    }
    let classes = weights.cols;
    if let Some((index, &label)) = labels.iter().enumerate().find(|&(_, &l)| l >= classes) {
        return Err(SoftmaxError::LabelOutOfRange { index, label, classes });
    }
    if !reg.is_finite() || reg < 0.0 {
        return Err(SoftmaxError::InvalidRegularization(reg));
    }
    if !weights.is_finite() {
        return Err(SoftmaxError::NumericDegenerate { what: "weights" });
    }
    if !data.is_finite() {
        return Err(SoftmaxError::NumericDegenerate { what: "data" });
    }
    Ok(())
}

/// Rejects a computed loss or gradient that left the finite range.
pub(crate) fn ensure_finite(loss: f64, grad: &Matrix) -> Result<()> {
    if !loss.is_finite() {
        warn!("softmax loss is not finite ({loss}); scores are too far apart to represent");
        return Err(SoftmaxError::NumericDegenerate { what: "loss" });
    }
    if !grad.is_finite() {
        warn!("softmax gradient contains non-finite entries");
        return Err(SoftmaxError::NumericDegenerate { what: "gradient" });
    }
    Ok(())
}
