use serde::{Deserialize, Serialize};

use crate::classifier::Device;
use crate::error::{EvalError, EvalResult};

fn default_cutoffs() -> Vec<f64> {
    vec![0.0, 0.9]
}

/// 10 equal-width bins over [0, 1].
fn default_bins() -> Vec<f64> {
    (0..=10).map(|i| i as f64 / 10.0).collect()
}

fn default_top_k() -> usize {
    5
}

fn default_period() -> usize {
    10
}

/// Configuration for one evaluation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Number of stochastic forward passes averaged per batch.
    pub n_ff: usize,
    /// Number of classes; every score matrix must have this many columns.
    pub num_classes: usize,
    /// Confidence cutoffs splitting predictions into certain/uncertain.
    #[serde(default = "default_cutoffs")]
    pub cutoffs: Vec<f64>,
    /// Bin edges for calibration binning (len = bins + 1, ascending).
    #[serde(default = "default_bins")]
    pub bins: Vec<f64>,
    /// k for top-k accuracy.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Emit periodic progress lines.
    #[serde(default)]
    pub verbose: bool,
    /// Progress reporting period, in steps.
    #[serde(default = "default_period")]
    pub period: usize,
    #[serde(default)]
    pub device: Device,
}

impl EvalConfig {
    pub fn new(n_ff: usize, num_classes: usize) -> Self {
        Self {
            n_ff,
            num_classes,
            cutoffs: default_cutoffs(),
            bins: default_bins(),
            top_k: default_top_k(),
            verbose: false,
            period: default_period(),
            device: Device::default(),
        }
    }

    pub fn validate(&self) -> EvalResult<()> {
        if self.n_ff == 0 {
            return Err(EvalError::InvalidConfig(
                "n_ff must be at least 1".to_string(),
            ));
        }
        if self.num_classes == 0 {
            return Err(EvalError::InvalidConfig(
                "num_classes must be at least 1".to_string(),
            ));
        }
        if self.bins.len() < 2 {
            return Err(EvalError::InvalidConfig(
                "bins must contain at least two edges".to_string(),
            ));
        }
        if self.bins.windows(2).any(|w| w[0] >= w[1]) {
            return Err(EvalError::InvalidConfig(
                "bin edges must be strictly ascending".to_string(),
            ));
        }
        if self.top_k == 0 {
            return Err(EvalError::InvalidConfig(
                "top_k must be at least 1".to_string(),
            ));
        }
        if self.period == 0 {
            return Err(EvalError::InvalidConfig(
                "period must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
