use std::time::Instant;

use calibration_metrics::{
    brier_scores, confidences, ece, frequency, global_accuracy, mean_iou, mean_probabilities,
    nll_sum, softmax_rows, topk_hits, unconfidence, ConfidenceFilter, ConfusionMatrix,
};
use eval_core::{EvalConfig, EvalError, EvalResult, StochasticClassifier};
use statrs::statistics::Statistics;

use crate::charts::{self, ReliabilityMode};
use crate::report::{BinMetrics, CutoffMetrics, EvalReport};

/// Running sums, mutated once per batch. Strictly additive; every partial
/// state is a valid running estimate.
struct Accumulators {
    samples: f64,
    nll: f64,
    topk: f64,
    brier: f64,
    /// (certain, uncertain) pair per configured cutoff.
    cutoff_cms: Vec<(ConfusionMatrix, ConfusionMatrix)>,
    bin_cms: Vec<ConfusionMatrix>,
    bin_conf_sums: Vec<f64>,
    /// Wall time of all n_ff passes, per batch, seconds.
    forward_secs: Vec<f64>,
}

impl Accumulators {
    fn new(config: &EvalConfig) -> Self {
        let zeros = || ConfusionMatrix::zeros(config.num_classes);
        let n_bins = config.bins.len() - 1;
        Self {
            samples: 0.0,
            nll: 0.0,
            topk: 0.0,
            brier: 0.0,
            cutoff_cms: config.cutoffs.iter().map(|_| (zeros(), zeros())).collect(),
            bin_cms: (0..n_bins).map(|_| zeros()).collect(),
            bin_conf_sums: vec![0.0; n_bins],
            forward_secs: Vec::new(),
        }
    }
}

/// The Calibration Evaluator: runs a classifier over a dataset with
/// Monte-Carlo stochastic forward passes and reduces the accumulated counts
/// into an [`EvalReport`].
pub struct Evaluator {
    config: EvalConfig,
    reliability_mode: ReliabilityMode,
}

impl Evaluator {
    pub fn new(config: EvalConfig) -> EvalResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            reliability_mode: ReliabilityMode::default(),
        })
    }

    pub fn with_reliability_mode(mut self, mode: ReliabilityMode) -> Self {
        self.reliability_mode = mode;
        self
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Run one full evaluation pass.
    ///
    /// For each batch the classifier is invoked `n_ff` times; each pass is
    /// softmaxed row-wise and the passes are averaged elementwise before
    /// scoring. Progress is logged every `period` steps when `verbose`, and
    /// a final summary line is always logged. Any classifier failure
    /// propagates immediately; there is no retry.
    pub fn evaluate<M, D>(&self, model: &M, dataset: D) -> EvalResult<EvalReport>
    where
        M: StochasticClassifier,
        D: IntoIterator<Item = (M::Input, Vec<usize>)>,
    {
        let cfg = &self.config;
        let mut acc = Accumulators::new(cfg);

        for (step, (batch, labels)) in dataset.into_iter().enumerate() {
            let batch = model.to_device(batch, cfg.device);

            let started = Instant::now();
            let mut passes = Vec::with_capacity(cfg.n_ff);
            for _ in 0..cfg.n_ff {
                let scores = model.forward(&batch)?;
                if scores.nrows() != labels.len() || scores.ncols() != cfg.num_classes {
                    return Err(EvalError::ShapeMismatch {
                        rows: scores.nrows(),
                        cols: scores.ncols(),
                        expected_rows: labels.len(),
                        expected_cols: cfg.num_classes,
                    });
                }
                passes.push(softmax_rows(&scores));
            }
            let probs = mean_probabilities(&passes);
            acc.forward_secs.push(started.elapsed().as_secs_f64());

            if let Some(&label) = labels.iter().find(|&&l| l >= cfg.num_classes) {
                return Err(EvalError::LabelOutOfRange {
                    label,
                    num_classes: cfg.num_classes,
                });
            }

            acc.samples += labels.len() as f64;
            acc.nll += nll_sum(&labels, &probs);
            acc.topk += topk_hits(&labels, &probs, cfg.top_k)
                .iter()
                .filter(|&&hit| hit)
                .count() as f64;
            acc.brier += brier_scores(&labels, &probs).iter().sum::<f64>();

            for (cutoff, (certain, uncertain)) in
                cfg.cutoffs.iter().zip(acc.cutoff_cms.iter_mut())
            {
                certain.merge(&ConfusionMatrix::from_predictions(
                    &labels,
                    &probs,
                    ConfidenceFilter::above(*cutoff),
                ));
                uncertain.merge(&ConfusionMatrix::from_predictions(
                    &labels,
                    &probs,
                    ConfidenceFilter::at_or_below(*cutoff),
                ));
            }

            let confs = confidences(&probs);
            for (i, edges) in cfg.bins.windows(2).enumerate() {
                acc.bin_cms[i].merge(&ConfusionMatrix::from_predictions(
                    &labels,
                    &probs,
                    ConfidenceFilter::new(edges[0], edges[1]),
                ));
                // The mean-confidence sum uses the [start, end) convention,
                // unlike the (min, max] matrix filter. Both are kept as-is.
                acc.bin_conf_sums[i] += confs
                    .iter()
                    .filter(|&&c| c >= edges[0] && c < edges[1])
                    .sum::<f64>();
            }

            if cfg.verbose && (step + 1) % cfg.period == 0 {
                let report = self.derive(&acc);
                tracing::info!("{} steps, {}", step + 1, report.summary());
            }
        }

        let mut report = self.derive(&acc);
        tracing::info!("{}", report.summary());

        let count_bin: Vec<f64> = report.bins.iter().map(|b| b.count).collect();
        let acc_bin: Vec<f64> = report.bins.iter().map(|b| b.accuracy).collect();
        report.calibration_image =
            charts::render_calibration(&count_bin, &acc_bin, self.reliability_mode)?;
        Ok(report)
    }

    /// Reduce the accumulators into a report. Pure with respect to `acc`;
    /// called fresh at each progress step and once at the end. The image is
    /// left empty here and attached by the caller.
    fn derive(&self, acc: &Accumulators) -> EvalReport {
        let cfg = &self.config;
        let n = acc.samples;

        let cutoffs: Vec<CutoffMetrics> = cfg
            .cutoffs
            .iter()
            .zip(acc.cutoff_cms.iter())
            .map(|(&cutoff, (certain, uncertain))| CutoffMetrics {
                cutoff,
                accuracy: global_accuracy(certain),
                unconfidence: unconfidence(certain, uncertain),
                mean_iou: mean_iou(certain),
                frequency: frequency(certain, uncertain),
                cm_certain: certain.clone(),
                cm_uncertain: uncertain.clone(),
            })
            .collect();

        let bins: Vec<BinMetrics> = cfg
            .bins
            .windows(2)
            .zip(acc.bin_cms.iter().zip(acc.bin_conf_sums.iter()))
            .map(|(edges, (cm, &conf_sum))| {
                let count = cm.total();
                BinMetrics {
                    lower: edges[0],
                    upper: edges[1],
                    count,
                    accuracy: global_accuracy(cm),
                    // Epsilon keeps empty bins at ~0 instead of NaN.
                    mean_confidence: conf_sum / (count + 1e-7),
                }
            })
            .collect();

        let count_bin: Vec<f64> = bins.iter().map(|b| b.count).collect();
        let acc_bin: Vec<f64> = bins.iter().map(|b| b.accuracy).collect();
        let conf_bin: Vec<f64> = bins.iter().map(|b| b.mean_confidence).collect();
        let (mean_forward_ms, std_forward_ms) = forward_stats(&acc.forward_secs);

        EvalReport {
            samples: acc.samples as u64,
            nll: acc.nll / n,
            top_k: cfg.top_k,
            top_k_accuracy: acc.topk / n,
            brier: acc.brier / n,
            ece: ece(&count_bin, &acc_bin, &conf_bin),
            cutoffs,
            bins,
            mean_forward_ms,
            std_forward_ms,
            calibration_image: Vec::new(),
        }
    }
}

fn forward_stats(secs: &[f64]) -> (f64, f64) {
    if secs.is_empty() {
        return (0.0, 0.0);
    }
    // Population deviation: the recorded timings are the whole population,
    // not a sample from one.
    (secs.mean() * 1e3, secs.population_std_dev() * 1e3)
}
