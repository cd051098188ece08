pub mod math;
pub mod error;
pub mod loss;
pub mod check;
pub mod config;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use error::{Result, SoftmaxError};
pub use loss::softmax::{evaluate, softmax_loss_naive, softmax_loss_vectorized, LossAndGradient};
pub use loss::strategy::Strategy;
pub use check::gradient::{grad_check_sparse, numerical_gradient, rel_error, GradCheckConfig, GradCheckReport};
pub use config::DemoConfig;
