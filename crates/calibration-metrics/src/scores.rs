//! Per-sample probability scores and softmax utilities.
//!
//! All functions take a probability (or raw score) matrix with one row per
//! sample and one column per class. Scoring functions require labels to be
//! valid class indices; the harness validates labels before calling in.

use nalgebra::DMatrix;

use crate::confusion::argmax_row;

/// Numerically stable row-wise softmax.
pub fn softmax_rows(scores: &DMatrix<f64>) -> DMatrix<f64> {
    let mut out = scores.clone();
    for mut row in out.row_iter_mut() {
        let max = row.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        let mut sum = 0.0;
        for value in row.iter_mut() {
            *value = (*value - max).exp();
            sum += *value;
        }
        for value in row.iter_mut() {
            *value /= sum;
        }
    }
    out
}

/// Elementwise mean of several probability matrices (one per stochastic
/// forward pass). All matrices must share the same shape; panics on an
/// empty slice.
pub fn mean_probabilities(passes: &[DMatrix<f64>]) -> DMatrix<f64> {
    let mut mean = passes[0].clone();
    for pass in &passes[1..] {
        mean += pass;
    }
    mean / passes.len() as f64
}

/// Summed negative log-likelihood of the true class. A zero probability on
/// a true class yields +inf; deliberately unguarded.
pub fn nll_sum(labels: &[usize], probs: &DMatrix<f64>) -> f64 {
    labels
        .iter()
        .enumerate()
        .map(|(i, &label)| -probs[(i, label)].ln())
        .sum()
}

/// Per-sample Brier score: squared distance between the probability row and
/// the one-hot label.
pub fn brier_scores(labels: &[usize], probs: &DMatrix<f64>) -> Vec<f64> {
    labels
        .iter()
        .enumerate()
        .map(|(i, &label)| {
            probs
                .row(i)
                .iter()
                .enumerate()
                .map(|(j, &p)| {
                    let target = if j == label { 1.0 } else { 0.0 };
                    (target - p) * (target - p)
                })
                .sum()
        })
        .collect()
}

/// Per-sample top-k membership: true when the label is among the k
/// highest-probability classes.
pub fn topk_hits(labels: &[usize], probs: &DMatrix<f64>, k: usize) -> Vec<bool> {
    let k = k.min(probs.ncols());
    labels
        .iter()
        .enumerate()
        .map(|(i, &label)| {
            let mut order: Vec<usize> = (0..probs.ncols()).collect();
            order.sort_by(|&a, &b| {
                probs[(i, b)]
                    .partial_cmp(&probs[(i, a)])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            order[..k].contains(&label)
        })
        .collect()
}

/// Row maxima: the confidence of each prediction.
pub fn confidences(probs: &DMatrix<f64>) -> Vec<f64> {
    (0..probs.nrows()).map(|i| argmax_row(probs, i).1).collect()
}

/// Row arg-maxima: the predicted class of each sample.
pub fn predicted_classes(probs: &DMatrix<f64>) -> Vec<usize> {
    (0..probs.nrows()).map(|i| argmax_row(probs, i).0).collect()
}
