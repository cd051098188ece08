pub mod softmax;
pub mod strategy;
mod validate;

pub use softmax::{evaluate, softmax_loss_naive, softmax_loss_vectorized, LossAndGradient};
pub use strategy::Strategy;
