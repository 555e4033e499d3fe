use burn::{config::ConfigError, record::RecorderError};
use thiserror::Error;

/// Error type for training, evaluation and inference runs.
#[derive(Error, Debug)]
pub enum TrainingError {
    /// A configuration value can't be used to run training.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The training loss diverged.
    #[error("non-finite training loss at epoch {epoch}, iteration {iteration}")]
    NonFiniteLoss { epoch: usize, iteration: usize },

    /// The evaluated split yielded no samples.
    #[error("the evaluation split is empty")]
    EmptyDataset,

    /// The requested item is past the end of the split.
    #[error("index {index} is out of range for a split of {len} items")]
    IndexOutOfRange { index: usize, len: usize },

    /// I/O error while writing artifacts.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Model record could not be saved or loaded.
    #[error("record error: {0}")]
    Record(#[from] RecorderError),

    /// Saved configuration could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
