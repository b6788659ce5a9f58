use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("model forward pass failed: {0}")]
    Model(String),

    #[error("score matrix is {rows}x{cols}, expected {expected_rows}x{expected_cols}")]
    ShapeMismatch {
        rows: usize,
        cols: usize,
        expected_rows: usize,
        expected_cols: usize,
    },

    #[error("label {label} out of range for {num_classes} classes")]
    LabelOutOfRange { label: usize, num_classes: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("chart render failed: {0}")]
    Render(String),
}

pub type EvalResult<T> = Result<T, EvalError>;
