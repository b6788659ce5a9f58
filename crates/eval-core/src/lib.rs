//! Core types for uncertainty evaluation
//!
//! Defines the classifier seam (stochastic forward passes behind a trait),
//! the evaluation configuration, and the shared error taxonomy. The model
//! itself, the dataset iterator, and device transfer all live behind these
//! interfaces — nothing in this workspace trains or defines a network.

pub mod classifier;
pub mod config;
pub mod error;

pub use classifier::{Device, StochasticClassifier};
pub use config::EvalConfig;
pub use error::{EvalError, EvalResult};
