use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::loss::softmax::{softmax_loss_naive, softmax_loss_vectorized, LossAndGradient};
use crate::math::matrix::Matrix;

/// Selects how the softmax loss and gradient are evaluated.
///
/// - `Iterative` — explicit loops over examples and classes; the readable
///   reference.
/// - `Batched`   — whole-batch matrix products; the default.
///
/// Both produce the same result up to floating-point rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Iterative,
    #[default]
    Batched,
}

impl Strategy {
    pub const ALL: [Strategy; 2] = [Strategy::Iterative, Strategy::Batched];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Iterative => "iterative",
            Strategy::Batched => "batched",
        }
    }

    pub fn evaluate(
        &self,
        weights: &Matrix,
        data: &Matrix,
        labels: &[usize],
        reg: f64,
    ) -> Result<LossAndGradient> {
        match self {
            Strategy::Iterative => softmax_loss_naive(weights, data, labels, reg),
            Strategy::Batched => softmax_loss_vectorized(weights, data, labels, reg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_snake_case() {
        assert_eq!(serde_json::to_string(&Strategy::Iterative).unwrap(), "\"iterative\"");
        let parsed: Strategy = serde_json::from_str("\"batched\"").unwrap();
        assert_eq!(parsed, Strategy::Batched);
        assert_eq!(Strategy::default(), Strategy::Batched);
    }
}
