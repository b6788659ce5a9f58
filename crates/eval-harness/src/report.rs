use calibration_metrics::ConfusionMatrix;
use serde::{Deserialize, Serialize};

/// Metrics for one confidence cutoff: the certain/uncertain matrix pair and
/// the reductions derived from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutoffMetrics {
    pub cutoff: f64,
    pub cm_certain: ConfusionMatrix,
    pub cm_uncertain: ConfusionMatrix,
    /// p(accurate | confident) over the certain split.
    pub accuracy: f64,
    /// p(unconfident | inaccurate). NaN when no errors were made.
    pub unconfidence: f64,
    /// Mean IoU over the certain split.
    pub mean_iou: f64,
    /// Fraction of all predictions above the cutoff.
    pub frequency: f64,
}

/// Metrics for one confidence bin of the reliability diagram.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinMetrics {
    pub lower: f64,
    pub upper: f64,
    pub count: f64,
    pub accuracy: f64,
    pub mean_confidence: f64,
}

/// Everything produced by one evaluation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalReport {
    /// Total samples seen.
    pub samples: u64,
    /// Mean negative log-likelihood.
    pub nll: f64,
    /// k used for top-k accuracy.
    pub top_k: usize,
    pub top_k_accuracy: f64,
    /// Mean Brier score.
    pub brier: f64,
    pub ece: f64,
    pub cutoffs: Vec<CutoffMetrics>,
    pub bins: Vec<BinMetrics>,
    /// Mean forward time per batch (all n_ff passes), milliseconds.
    pub mean_forward_ms: f64,
    pub std_forward_ms: f64,
    /// Confidence histogram + reliability diagram, PNG-encoded.
    pub calibration_image: Vec<u8>,
}

impl EvalReport {
    /// One-line human-readable summary, mirroring the periodic progress
    /// format of the evaluator.
    pub fn summary(&self) -> String {
        let join = |values: &mut dyn Iterator<Item = f64>| -> String {
            values
                .map(|v| format!("{:.3} %", v * 100.0))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let parts = [
            format!("Time: {:.3} ± {:.3} ms", self.mean_forward_ms, self.std_forward_ms),
            format!("NLL: {:.4}", self.nll),
            format!(
                "Cutoffs: {}",
                self.cutoffs
                    .iter()
                    .map(|c| format!("{:.1} %", c.cutoff * 100.0))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            format!("Accs: {}", join(&mut self.cutoffs.iter().map(|c| c.accuracy))),
            format!("Uncs: {}", join(&mut self.cutoffs.iter().map(|c| c.unconfidence))),
            format!("IoUs: {}", join(&mut self.cutoffs.iter().map(|c| c.mean_iou))),
            format!("Freqs: {}", join(&mut self.cutoffs.iter().map(|c| c.frequency))),
            format!("Top-{}: {:.3} %", self.top_k, self.top_k_accuracy * 100.0),
            format!("Brier: {:.3}", self.brier),
            format!("ECE: {:.3} %", self.ece * 100.0),
        ];
        parts.join(", ")
    }
}
