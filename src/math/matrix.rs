use rand::Rng;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;

use crate::error::{Result, SoftmaxError};

/// Dense row-major matrix of `f64`.
///
/// The constructors here keep `data` at `rows` rows of exactly `cols`
/// entries. A matrix deserialized or built from the public fields may not;
/// `check_layout` verifies it before the matrix reaches any arithmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix{
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>
}

impl Matrix{
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix{
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows]
        }
    }

    /// Builds a matrix whose entry `(i, j)` is `f(i, j)`.
    pub fn filled_with<F>(rows: usize, cols: usize, f: F) -> Matrix
    where
        F: Fn(usize, usize) -> f64,
    {
        let data = (0..rows)
            .map(|i| (0..cols).map(|j| f(i, j)).collect())
            .collect();
        Matrix { rows, cols, data }
    }

    /// Wraps row vectors. Fails with `ShapeMismatch` when the rows are ragged.
    /// An empty outer vector yields a 0×0 matrix.
    pub fn from_data(data: Vec<Vec<f64>>) -> Result<Matrix> {
        let cols = data.first().map_or(0, |row| row.len());
        if let Some(bad) = data.iter().find(|row| row.len() != cols) {
            return Err(SoftmaxError::ShapeMismatch {
                what: "row length",
                got: bad.len(),
                expected: cols,
            });
        }
        Ok(Matrix {
            rows: data.len(),
            cols,
            data,
        })
    }

    /// Samples from N(0, scale²). `gaussian(d, c, 1e-4, rng)` gives the small
    /// starting weights a linear classifier is usually checked with.
    pub fn gaussian<R: Rng + ?Sized>(rows: usize, cols: usize, scale: f64, rng: &mut R) -> Matrix {
        Matrix::filled_with_rng(rows, cols, rng, |rng| sample_standard_normal(rng) * scale)
    }

    fn filled_with_rng<R, F>(rows: usize, cols: usize, rng: &mut R, mut sample: F) -> Matrix
    where
        R: Rng + ?Sized,
        F: FnMut(&mut R) -> f64,
    {
        let mut res = Matrix::zeros(rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                res.data[i][j] = sample(&mut *rng);
            }
        }
        res
    }

    /// Fails with `ShapeMismatch` unless `data` has `rows` rows of `cols` entries.
    pub fn check_layout(&self) -> Result<()> {
        if self.data.len() != self.rows {
            return Err(SoftmaxError::ShapeMismatch {
                what: "row count",
                got: self.data.len(),
                expected: self.rows,
            });
        }
        if let Some(bad) = self.data.iter().find(|row| row.len() != self.cols) {
            return Err(SoftmaxError::ShapeMismatch {
                what: "row length",
                got: bad.len(),
                expected: self.cols,
            });
        }
        Ok(())
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i]
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i][j]
    }

    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i][j] = value;
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] = self.data[j][i];
            }
        }

        res
    }

    /// Matrix product `self · rhs`.
    pub fn matmul(&self, rhs: &Matrix) -> Result<Matrix> {
        if self.cols != rhs.rows {
            return Err(SoftmaxError::ShapeMismatch {
                what: "matmul inner dimension",
                got: rhs.rows,
                expected: self.cols,
            });
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);

        // i-k-j order walks both operands row by row.
        for i in 0..self.rows {
            let out = &mut res.data[i];
            for (k, &a) in self.data[i].iter().enumerate() {
                for (o, &b) in out.iter_mut().zip(rhs.data[k].iter()) {
                    *o += a * b;
                }
            }
        }

        Ok(res)
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data
                .iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect(),
        }
    }

    pub fn scale(&self, k: f64) -> Matrix {
        self.map(|x| x * k)
    }

    pub fn add(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with(rhs, |a, b| a + b)
    }

    pub fn sub(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with(rhs, |a, b| a - b)
    }

    fn zip_with<F>(&self, rhs: &Matrix, f: F) -> Result<Matrix>
    where
        F: Fn(f64, f64) -> f64,
    {
        if self.shape() != rhs.shape() {
            let what = "element-wise operand";
            return Err(if self.rows != rhs.rows {
                SoftmaxError::ShapeMismatch { what, got: rhs.rows, expected: self.rows }
            } else {
                SoftmaxError::ShapeMismatch { what, got: rhs.cols, expected: self.cols }
            });
        }

        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data
                .iter()
                .zip(rhs.data.iter())
                .map(|(ra, rb)| ra.iter().zip(rb.iter()).map(|(&a, &b)| f(a, b)).collect())
                .collect(),
        })
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().flatten().sum()
    }

    /// Sum of every entry squared (squared Frobenius norm).
    pub fn sum_squares(&self) -> f64 {
        self.data.iter().flatten().map(|x| x * x).sum()
    }

    pub fn max_abs(&self) -> f64 {
        self.data.iter().flatten().fold(0.0, |m, x| m.max(x.abs()))
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().flatten().all(|x| x.is_finite())
    }

    /// Largest entry of each row; `-inf` for rows with no columns.
    pub fn row_max(&self) -> Vec<f64> {
        self.data
            .iter()
            .map(|row| row.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            .collect()
    }

    pub fn row_sums(&self) -> Vec<f64> {
        self.data.iter().map(|row| row.iter().sum()).collect()
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

/// Samples a single value from N(0, 1) using the Box-Muller transform.
fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // Uniform samples in (0, 1] keep ln() finite.
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = 1.0 - rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}
