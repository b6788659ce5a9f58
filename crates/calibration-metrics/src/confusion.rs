use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Confidence window selecting which samples enter a confusion matrix.
///
/// Membership is half-open on the left: `min < confidence <= max`. This is
/// the cutoff convention; the per-bin mean-confidence accumulation in the
/// harness uses the opposite convention (`>=` lower, `<` upper). The two are
/// deliberately distinct — do not unify them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceFilter {
    pub min: f64,
    pub max: f64,
}

impl ConfidenceFilter {
    /// Accept every prediction (softmax confidence is always > 0).
    pub const ALL: ConfidenceFilter = ConfidenceFilter { min: 0.0, max: 1.0 };

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Predictions strictly above the cutoff ("certain").
    pub fn above(cutoff: f64) -> Self {
        Self { min: cutoff, max: 1.0 }
    }

    /// Predictions at or below the cutoff ("uncertain").
    pub fn at_or_below(cutoff: f64) -> Self {
        Self { min: 0.0, max: cutoff }
    }

    pub fn contains(&self, confidence: f64) -> bool {
        confidence > self.min && confidence <= self.max
    }
}

/// Square matrix of counts indexed `[true class][predicted class]`,
/// accumulated additively across batches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    counts: DMatrix<f64>,
}

impl ConfusionMatrix {
    pub fn zeros(num_classes: usize) -> Self {
        Self {
            counts: DMatrix::zeros(num_classes, num_classes),
        }
    }

    /// Build a confusion matrix from one batch of predictions.
    ///
    /// The predicted class is the row arg-max and the confidence the row
    /// max; a sample is counted only when its confidence passes `filter` and
    /// its label is a valid class index. Out-of-range labels are silently
    /// dropped, matching the accumulation semantics of the matrices (scoring
    /// functions reject them instead).
    pub fn from_predictions(
        labels: &[usize],
        probs: &DMatrix<f64>,
        filter: ConfidenceFilter,
    ) -> Self {
        let num_classes = probs.ncols();
        let mut cm = Self::zeros(num_classes);
        for (i, &label) in labels.iter().enumerate() {
            let (pred, confidence) = argmax_row(probs, i);
            if label < num_classes && filter.contains(confidence) {
                cm.record(label, pred);
            }
        }
        cm
    }

    pub fn record(&mut self, true_class: usize, predicted_class: usize) {
        self.counts[(true_class, predicted_class)] += 1.0;
    }

    /// Elementwise additive merge.
    pub fn merge(&mut self, other: &ConfusionMatrix) {
        self.counts += &other.counts;
    }

    pub fn num_classes(&self) -> usize {
        self.counts.nrows()
    }

    pub fn get(&self, true_class: usize, predicted_class: usize) -> f64 {
        self.counts[(true_class, predicted_class)]
    }

    /// Total sample count.
    pub fn total(&self) -> f64 {
        self.counts.iter().sum()
    }

    /// Correctly classified count (diagonal sum).
    pub fn correct(&self) -> f64 {
        self.counts.trace()
    }

    /// Misclassified count.
    pub fn errors(&self) -> f64 {
        self.total() - self.correct()
    }

    /// Ground-truth support of one class.
    pub fn row_total(&self, class: usize) -> f64 {
        self.counts.row(class).iter().sum()
    }

    /// Prediction count of one class.
    pub fn col_total(&self, class: usize) -> f64 {
        self.counts.column(class).iter().sum()
    }

    pub fn counts(&self) -> &DMatrix<f64> {
        &self.counts
    }
}

pub(crate) fn argmax_row(probs: &DMatrix<f64>, row: usize) -> (usize, f64) {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (j, value) in probs.row(row).iter().enumerate() {
        if *value > best_value {
            best = j;
            best_value = *value;
        }
    }
    (best, best_value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probs_2class() -> DMatrix<f64> {
        DMatrix::from_row_slice(4, 2, &[0.9, 0.1, 0.6, 0.4, 0.3, 0.7, 0.2, 0.8])
    }

    #[test]
    fn test_cutoff_boundary_is_strictly_greater() {
        // Labels [0,0,1,1]; confidences 0.9, 0.6, 0.7, 0.8 all exceed 0.5,
        // so every sample lands in the certain matrix.
        let labels = [0usize, 0, 1, 1];
        let probs = probs_2class();

        let certain = ConfusionMatrix::from_predictions(&labels, &probs, ConfidenceFilter::above(0.5));
        let uncertain =
            ConfusionMatrix::from_predictions(&labels, &probs, ConfidenceFilter::at_or_below(0.5));

        assert_eq!(certain.total(), 4.0);
        assert_eq!(uncertain.total(), 0.0);
        assert_eq!(certain.correct(), 4.0);

        // A confidence exactly equal to the filter minimum is excluded.
        let at_cutoff =
            ConfusionMatrix::from_predictions(&labels, &probs, ConfidenceFilter::above(0.9));
        assert_eq!(at_cutoff.total(), 0.0);
        let up_to_cutoff =
            ConfidenceFilter::at_or_below(0.9);
        let cm = ConfusionMatrix::from_predictions(&labels, &probs, up_to_cutoff);
        assert_eq!(cm.total(), 4.0);
    }

    #[test]
    fn test_bin_matrices_sum_to_unfiltered() {
        let labels = [0usize, 0, 1, 1];
        let probs = probs_2class();
        let edges: Vec<f64> = (0..=10).map(|i| i as f64 / 10.0).collect();

        let mut summed = ConfusionMatrix::zeros(2);
        for w in edges.windows(2) {
            let bin = ConfusionMatrix::from_predictions(
                &labels,
                &probs,
                ConfidenceFilter::new(w[0], w[1]),
            );
            summed.merge(&bin);
        }

        let unfiltered =
            ConfusionMatrix::from_predictions(&labels, &probs, ConfidenceFilter::ALL);
        assert_eq!(summed, unfiltered);
        assert_eq!(unfiltered.total(), 4.0);
    }

    #[test]
    fn test_out_of_range_labels_dropped() {
        let labels = [0usize, 7, 1, 9];
        let probs = probs_2class();
        let cm = ConfusionMatrix::from_predictions(&labels, &probs, ConfidenceFilter::ALL);
        assert_eq!(cm.total(), 2.0);
    }

    #[test]
    fn test_record_and_totals() {
        let mut cm = ConfusionMatrix::zeros(3);
        cm.record(0, 0);
        cm.record(0, 0);
        cm.record(1, 2);
        assert_eq!(cm.total(), 3.0);
        assert_eq!(cm.correct(), 2.0);
        assert_eq!(cm.errors(), 1.0);
        assert_eq!(cm.row_total(0), 2.0);
        assert_eq!(cm.col_total(2), 1.0);
        assert_eq!(cm.row_total(2), 0.0);
    }
}
