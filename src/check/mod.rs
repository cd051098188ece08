pub mod gradient;

pub use gradient::{grad_check_sparse, numerical_gradient, rel_error, GradCheckConfig, GradCheckReport};
