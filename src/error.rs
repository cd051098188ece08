use std::{
    error::Error,
    fmt::{self, Display},
};

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, SoftmaxError>;

/// Precondition and numeric failures reported by the evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum SoftmaxError {
    /// Two dimensions that must agree do not.
    ShapeMismatch {
        /// What was being compared (e.g. "data columns vs weight rows").
        what: &'static str,
        got: usize,
        expected: usize,
    },
    /// `labels[index]` does not address a column of the weights.
    LabelOutOfRange {
        index: usize,
        label: usize,
        classes: usize,
    },
    /// NaN or infinity found in an input or produced by the computation.
    NumericDegenerate { what: &'static str },
    /// Zero examples or zero classes; the mean over rows is undefined.
    EmptyBatch,
    /// Regularization strength is negative or not finite.
    InvalidRegularization(f64),
}

impl Display for SoftmaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoftmaxError::ShapeMismatch { what, got, expected } => {
                write!(f, "shape mismatch for {what}: got {got}, expected {expected}")
            }
            SoftmaxError::LabelOutOfRange { index, label, classes } => write!(
                f,
                "label {label} at position {index} is out of range for {classes} classes"
            ),
            SoftmaxError::NumericDegenerate { what } => {
                write!(f, "non-finite values in {what}")
            }
            SoftmaxError::EmptyBatch => {
                write!(f, "cannot evaluate the loss over an empty batch or zero classes")
            }
            SoftmaxError::InvalidRegularization(reg) => {
                write!(f, "regularization strength must be finite and non-negative, got {reg}")
            }
        }
    }
}

impl Error for SoftmaxError {}
