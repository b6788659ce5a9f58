//! Calibration Evaluation Harness
//!
//! Runs a classifier over a dataset with Monte-Carlo stochastic forward
//! passes and reduces the accumulated confusion matrices into calibration
//! metrics (NLL, top-k, Brier, mean IoU, unconfidence, frequency, ECE),
//! rendering a confidence histogram and reliability diagram into an
//! in-memory PNG alongside the numeric report.

pub mod charts;
pub mod evaluator;
pub mod report;

pub use charts::{render_calibration, ReliabilityMode};
pub use evaluator::Evaluator;
pub use report::{BinMetrics, CutoffMetrics, EvalReport};
