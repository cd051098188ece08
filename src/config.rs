use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::check::gradient::GradCheckConfig;
use crate::error::{Result, SoftmaxError};
use crate::math::matrix::Matrix;

/// Synthetic problem and gradient-check settings for the demo binary.
///
/// Every field has a default, so a JSON file only needs the fields it
/// changes, e.g. `{ "num_classes": 10, "seed": 42 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Batch size N.
    pub num_train: usize,
    /// Feature dimension D.
    pub num_features: usize,
    /// Number of classes C.
    pub num_classes: usize,
    /// Regularization strength used for the regularized checks.
    pub reg: f64,
    /// Standard deviation of the initial weights.
    pub weight_scale: f64,
    /// Seed for a reproducible problem; `None` seeds the RNG from OS entropy.
    pub seed: Option<u64>,
    pub grad_check: GradCheckConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        DemoConfig {
            num_train: 500,
            num_features: 64,
            num_classes: 10,
            reg: 5e1,
            weight_scale: 1e-4,
            seed: None,
            grad_check: GradCheckConfig::default(),
        }
    }
}

/// Weights, data and labels for one evaluation.
#[derive(Debug, Clone)]
pub struct SyntheticProblem {
    pub weights: Matrix,
    pub data: Matrix,
    pub labels: Vec<usize>,
}

impl DemoConfig {
    /// Serializes the config to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    /// Deserializes a config from a JSON file.
    pub fn load_json(path: &str) -> std::io::Result<DemoConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Draws Gaussian data, uniform labels and small Gaussian weights.
    pub fn sample_problem<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<SyntheticProblem> {
        if self.num_train == 0 || self.num_classes == 0 {
            return Err(SoftmaxError::EmptyBatch);
        }

        let data = Matrix::gaussian(self.num_train, self.num_features, 1.0, rng);
        let labels = (0..self.num_train)
            .map(|_| rng.gen_range(0..self.num_classes))
            .collect();
        let weights = Matrix::gaussian(self.num_features, self.num_classes, self.weight_scale, rng);

        Ok(SyntheticProblem { weights, data, labels })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn partial_json_keeps_defaults() {
        let config: DemoConfig =
            serde_json::from_str(r#"{ "num_classes": 4, "seed": 9, "grad_check": { "num_checks": 2 } }"#)
                .unwrap();
        assert_eq!(config.num_classes, 4);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.num_train, DemoConfig::default().num_train);
        assert_eq!(config.grad_check.num_checks, 2);
        assert_eq!(config.grad_check.step, GradCheckConfig::default().step);
    }

    #[test]
    fn json_file_round_trip() {
        let path = std::env::temp_dir().join(format!("softmax-linear-config-{}.json", std::process::id()));
        let path = path.to_str().unwrap();
        let config = DemoConfig { num_train: 7, seed: Some(1), ..DemoConfig::default() };
        config.save_json(path).unwrap();
        assert_eq!(DemoConfig::load_json(path).unwrap(), config);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn sampled_problem_has_consistent_shapes() {
        let config = DemoConfig { num_train: 6, num_features: 4, num_classes: 3, ..DemoConfig::default() };
        let problem = config.sample_problem(&mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(problem.data.shape(), (6, 4));
        assert_eq!(problem.weights.shape(), (4, 3));
        assert_eq!(problem.labels.len(), 6);
        assert!(problem.labels.iter().all(|&l| l < 3));
    }

    #[test]
    fn empty_problem_is_rejected() {
        let config = DemoConfig { num_classes: 0, ..DemoConfig::default() };
        assert!(matches!(
            config.sample_problem(&mut StdRng::seed_from_u64(0)),
            Err(SoftmaxError::EmptyBatch)
        ));
    }
}
