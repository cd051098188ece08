//! Finite-difference gradient checking.
//!
//! The analytic gradient returned by the softmax evaluator is compared
//! against centered differences `(f(w + h) - f(w - h)) / 2h` of the loss,
//! either over every weight (`numerical_gradient`) or over a random sample
//! of weights (`grad_check_sparse`).

use log::debug;
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::{Result, SoftmaxError};
use crate::math::matrix::Matrix;

/// Settings for a sparse gradient check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradCheckConfig {
    /// Number of randomly chosen weights to perturb.
    pub num_checks: usize,
    /// Perturbation `h` applied in each direction.
    pub step: f64,
    /// Largest relative error accepted by `GradCheckReport::passed`.
    pub tolerance: f64,
}

impl Default for GradCheckConfig {
    fn default() -> Self {
        GradCheckConfig {
            num_checks: 10,
            step: 1e-5,
            tolerance: 1e-6,
        }
    }
}

/// One perturbed weight and how the two gradients compared there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradCheckSample {
    pub row: usize,
    pub col: usize,
    pub numerical: f64,
    pub analytic: f64,
    pub rel_error: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradCheckReport {
    pub samples: Vec<GradCheckSample>,
    pub max_rel_error: f64,
    pub tolerance: f64,
}

impl GradCheckReport {
    pub fn passed(&self) -> bool {
        self.max_rel_error <= self.tolerance
    }
}

/// `|a - b| / max(1e-8, |a| + |b|)`
pub fn rel_error(a: f64, b: f64) -> f64 {
    (a - b).abs() / (a.abs() + b.abs()).max(1e-8)
}

/// Centered difference of `loss` with respect to every entry of `weights`.
///
/// `loss` is called twice per entry on a private copy of the weights; the
/// caller's matrix is never modified.
pub fn numerical_gradient<F>(mut loss: F, weights: &Matrix, step: f64) -> Result<Matrix>
where
    F: FnMut(&Matrix) -> Result<f64>,
{
    let mut probe = weights.clone();
    let mut grad = Matrix::zeros(weights.rows, weights.cols);

    for i in 0..weights.rows {
        for j in 0..weights.cols {
            grad.data[i][j] = centered_difference(&mut loss, &mut probe, i, j, step)?;
        }
    }

    Ok(grad)
}

/// Compares `analytic_grad` against centered differences at `config.num_checks`
/// randomly chosen weights.
pub fn grad_check_sparse<F, R>(
    mut loss: F,
    weights: &Matrix,
    analytic_grad: &Matrix,
    config: &GradCheckConfig,
    rng: &mut R,
) -> Result<GradCheckReport>
where
    F: FnMut(&Matrix) -> Result<f64>,
    R: Rng + ?Sized,
{
    weights.check_layout()?;
    analytic_grad.check_layout()?;
    if analytic_grad.rows != weights.rows {
        return Err(SoftmaxError::ShapeMismatch {
            what: "analytic gradient rows vs weight rows",
            got: analytic_grad.rows,
            expected: weights.rows,
        });
    }
    if analytic_grad.cols != weights.cols {
        return Err(SoftmaxError::ShapeMismatch {
            what: "analytic gradient columns vs weight columns",
            got: analytic_grad.cols,
            expected: weights.cols,
        });
    }

    let mut probe = weights.clone();
    let mut samples = Vec::with_capacity(config.num_checks);
    let mut max_rel_error: f64 = 0.0;

    if weights.rows > 0 && weights.cols > 0 {
        for _ in 0..config.num_checks {
            let row = rng.gen_range(0..weights.rows);
            let col = rng.gen_range(0..weights.cols);

            let numerical = centered_difference(&mut loss, &mut probe, row, col, config.step)?;
            let analytic = analytic_grad.data[row][col];
            let rel_error = rel_error(numerical, analytic);
            debug!(
                "grad check ({row}, {col}): numerical {numerical:.6e} analytic {analytic:.6e}, relative error {rel_error:.3e}"
            );

            max_rel_error = max_rel_error.max(rel_error);
            samples.push(GradCheckSample { row, col, numerical, analytic, rel_error });
        }
    }

    Ok(GradCheckReport {
        samples,
        max_rel_error,
        tolerance: config.tolerance,
    })
}

fn centered_difference<F>(
    loss: &mut F,
    probe: &mut Matrix,
    i: usize,
    j: usize,
    step: f64,
) -> Result<f64>
where
    F: FnMut(&Matrix) -> Result<f64>,
{
    let old = probe.data[i][j];

    probe.data[i][j] = old + step;
    let plus = loss(&*probe);
    probe.data[i][j] = old - step;
    let minus = loss(&*probe);
    probe.data[i][j] = old;

    Ok((plus? - minus?) / (2.0 * step))
}
