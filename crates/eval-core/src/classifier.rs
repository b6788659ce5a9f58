use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::EvalResult;

/// Execution device for the forward pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Device {
    #[default]
    Cpu,
    /// GPU or other accelerator, if the classifier supports one.
    Accelerator,
}

/// Backend-agnostic interface to a classifier evaluated with test-time
/// stochasticity (MC dropout, ensembling, ...).
///
/// Each call to [`forward`](Self::forward) is expected to be one stochastic
/// sample: with dropout active, repeated calls on the same batch return
/// different score matrices. The harness applies a row-wise softmax to each
/// pass and averages them — implementors return raw scores (logits), not
/// probabilities.
pub trait StochasticClassifier {
    /// Opaque batch type (tensor handle, feature matrix, ...).
    type Input;

    /// One stochastic forward pass. Rows are samples, columns are raw class
    /// scores; the returned matrix must be `batch_size x num_classes`.
    fn forward(&self, batch: &Self::Input) -> EvalResult<DMatrix<f64>>;

    /// Move a batch onto the execution device. Identity by default, for
    /// classifiers with no device distinction.
    fn to_device(&self, batch: Self::Input, _device: Device) -> Self::Input {
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl StochasticClassifier for Echo {
        type Input = DMatrix<f64>;

        fn forward(&self, batch: &Self::Input) -> EvalResult<DMatrix<f64>> {
            Ok(batch.clone())
        }
    }

    #[test]
    fn test_to_device_defaults_to_identity() {
        let model = Echo;
        let batch = DMatrix::from_row_slice(1, 2, &[0.5, 0.5]);
        let moved = model.to_device(batch.clone(), Device::Accelerator);
        assert_eq!(moved, batch);
    }

    #[test]
    fn test_device_default_is_cpu() {
        assert_eq!(Device::default(), Device::Cpu);
    }
}
