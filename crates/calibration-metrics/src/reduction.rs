//! Pure reductions over confusion matrices.
//!
//! Division-by-zero is guarded with an explicit 0.0 fallback exactly where
//! a metric is defined to degrade gracefully (IoU, accuracies, ECE bin
//! frequency). `unconfidence` and `frequency` over empty matrices return
//! NaN instead: an empty split carries no information and the caller sees a
//! non-finite value rather than a fabricated one.

use crate::confusion::ConfusionMatrix;

/// Per-class intersection-over-union: `diag / (row + col - diag)`,
/// 0 where the denominator is 0.
pub fn class_ious(cm: &ConfusionMatrix) -> Vec<f64> {
    (0..cm.num_classes())
        .map(|c| {
            let intersection = cm.get(c, c);
            let union = cm.row_total(c) + cm.col_total(c) - intersection;
            if union != 0.0 {
                intersection / union
            } else {
                0.0
            }
        })
        .collect()
}

/// Mean IoU over classes present in the ground truth of this matrix.
/// Classes with zero support are excluded; 0 if no class qualifies.
pub fn mean_iou(cm: &ConfusionMatrix) -> f64 {
    let ious = class_ious(cm);
    let supported: Vec<usize> = (0..cm.num_classes())
        .filter(|&c| cm.row_total(c) > 0.0)
        .collect();
    if supported.is_empty() {
        return 0.0;
    }
    supported.iter().map(|&c| ious[c]).sum::<f64>() / supported.len() as f64
}

/// Global accuracy `trace / total`, 0 for an empty matrix.
/// Over a certain-split matrix this reads as p(accurate | confident).
pub fn global_accuracy(cm: &ConfusionMatrix) -> f64 {
    let total = cm.total();
    if total != 0.0 {
        cm.correct() / total
    } else {
        0.0
    }
}

/// Per-class recall `diag / row`, 0 for absent classes.
pub fn class_accuracies(cm: &ConfusionMatrix) -> Vec<f64> {
    (0..cm.num_classes())
        .map(|c| {
            let support = cm.row_total(c);
            if support != 0.0 {
                cm.get(c, c) / support
            } else {
                0.0
            }
        })
        .collect()
}

/// p(unconfident | inaccurate): the fraction of all misclassifications that
/// fall in the uncertain split. NaN when there are no misclassifications.
pub fn unconfidence(cm_certain: &ConfusionMatrix, cm_uncertain: &ConfusionMatrix) -> f64 {
    let errors_certain = cm_certain.errors();
    let errors_uncertain = cm_uncertain.errors();
    errors_uncertain / (errors_certain + errors_uncertain)
}

/// Fraction of all samples falling in the certain split. NaN when both
/// splits are empty.
pub fn frequency(cm_certain: &ConfusionMatrix, cm_uncertain: &ConfusionMatrix) -> f64 {
    let certain = cm_certain.total();
    certain / (certain + cm_uncertain.total())
}

/// Expected Calibration Error: per-bin |accuracy - mean confidence|,
/// weighted by the bin's sample fraction. Bins with zero count contribute
/// zero weight; an entirely empty binning yields 0.
pub fn ece(count_bin: &[f64], acc_bin: &[f64], conf_bin: &[f64]) -> f64 {
    let total: f64 = count_bin.iter().sum();
    count_bin
        .iter()
        .zip(acc_bin.iter())
        .zip(conf_bin.iter())
        .map(|((&count, &acc), &conf)| {
            let freq = count / total;
            let freq = if freq.is_finite() { freq } else { 0.0 };
            (acc - conf).abs() * freq
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagonal_cm() -> ConfusionMatrix {
        let mut cm = ConfusionMatrix::zeros(3);
        for c in 0..3 {
            cm.record(c, c);
            cm.record(c, c);
        }
        cm
    }

    fn hollow_cm() -> ConfusionMatrix {
        let mut cm = ConfusionMatrix::zeros(3);
        cm.record(0, 1);
        cm.record(1, 2);
        cm.record(2, 0);
        cm
    }

    #[test]
    fn test_global_accuracy_bounds() {
        assert_eq!(global_accuracy(&diagonal_cm()), 1.0);
        assert_eq!(global_accuracy(&hollow_cm()), 0.0);
        assert_eq!(global_accuracy(&ConfusionMatrix::zeros(3)), 0.0);

        let mut mixed = diagonal_cm();
        mixed.record(0, 1);
        let acc = global_accuracy(&mixed);
        assert!(acc > 0.0 && acc < 1.0);
    }

    #[test]
    fn test_mean_iou_excludes_absent_classes() {
        // Only classes 0 and 1 appear in the ground truth.
        let mut cm = ConfusionMatrix::zeros(3);
        cm.record(0, 0);
        cm.record(0, 0);
        cm.record(1, 0);
        cm.record(1, 1);
        // Class 0: diag 2, row 2, col 3 -> 2/3. Class 1: diag 1, row 2,
        // col 1 -> 1/2. Class 2: no support, excluded.
        let expected = (2.0 / 3.0 + 0.5) / 2.0;
        assert!((mean_iou(&cm) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_mean_iou_empty_matrix_is_zero() {
        assert_eq!(mean_iou(&ConfusionMatrix::zeros(4)), 0.0);
    }

    #[test]
    fn test_mean_iou_below_accuracy_with_false_positive_skew() {
        // Balanced supports, every error a false positive into class 0.
        let mut cm = ConfusionMatrix::zeros(2);
        for _ in 0..8 {
            cm.record(0, 0);
        }
        for _ in 0..4 {
            cm.record(1, 1);
        }
        for _ in 0..4 {
            cm.record(1, 0);
        }
        assert!(mean_iou(&cm) <= global_accuracy(&cm));
    }

    #[test]
    fn test_class_accuracies() {
        let mut cm = ConfusionMatrix::zeros(3);
        cm.record(0, 0);
        cm.record(0, 1);
        cm.record(1, 1);
        let accs = class_accuracies(&cm);
        assert_eq!(accs, vec![0.5, 1.0, 0.0]);
    }

    #[test]
    fn test_unconfidence_all_errors_uncertain() {
        let certain = diagonal_cm();
        let uncertain = hollow_cm();
        assert_eq!(unconfidence(&certain, &uncertain), 1.0);

        let value = unconfidence(&hollow_cm(), &hollow_cm());
        assert!((0.0..=1.0).contains(&value));
    }

    #[test]
    fn test_unconfidence_undefined_without_errors() {
        let value = unconfidence(&diagonal_cm(), &ConfusionMatrix::zeros(3));
        assert!(value.is_nan());
    }

    #[test]
    fn test_frequency() {
        let certain = diagonal_cm(); // 6 samples
        let uncertain = hollow_cm(); // 3 samples
        assert!((frequency(&certain, &uncertain) - 6.0 / 9.0).abs() < 1e-12);
        assert!(frequency(&ConfusionMatrix::zeros(3), &ConfusionMatrix::zeros(3)).is_nan());
    }

    #[test]
    fn test_ece_zero_when_calibrated() {
        let counts = [10.0, 20.0, 0.0, 5.0];
        let accs = [0.1, 0.4, 0.0, 0.9];
        let confs = accs;
        assert_eq!(ece(&counts, &accs, &confs), 0.0);
    }

    #[test]
    fn test_ece_weights_by_bin_fraction() {
        let counts = [30.0, 10.0];
        let accs = [0.5, 0.5];
        let confs = [0.6, 0.9];
        // 0.75 * 0.1 + 0.25 * 0.4
        assert!((ece(&counts, &accs, &confs) - 0.175).abs() < 1e-12);
    }

    #[test]
    fn test_ece_empty_bins() {
        let counts = [0.0, 0.0];
        let accs = [0.3, 0.7];
        let confs = [0.5, 0.5];
        assert_eq!(ece(&counts, &accs, &confs), 0.0);
    }
}
