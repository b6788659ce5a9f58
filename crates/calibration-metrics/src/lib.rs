//! Calibration Metrics
//!
//! Confusion matrices under confidence filtering and the pure reductions
//! derived from them: global/mean-IoU accuracy, unconfidence, frequency and
//! Expected Calibration Error, plus per-sample probability scores (NLL,
//! Brier, top-k). Everything here is deterministic and stateless — the
//! evaluation harness owns the accumulation loop.

pub mod confusion;
pub mod reduction;
pub mod scores;

pub use confusion::{ConfidenceFilter, ConfusionMatrix};
pub use reduction::{
    class_accuracies, class_ious, ece, frequency, global_accuracy, mean_iou, unconfidence,
};
pub use scores::{
    brier_scores, confidences, mean_probabilities, nll_sum, predicted_classes, softmax_rows,
    topk_hits,
};
