//! Error types for the benchmark harness

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, BenchError>;

/// Error taxonomy for the benchmark harness.
///
/// The evaluation loop treats `Data`, `Training`, `FeatureNotFound` and
/// `NotFitted` as per-dataset failures that are logged and skipped, while
/// `Configuration` and `State` indicate a misassembled pipeline and abort
/// the whole run.
#[derive(Debug, Error)]
pub enum BenchError {
    /// Invalid strategy name, empty preprocessor, malformed search space
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Operation invoked before required setup (e.g. fit before merge)
    #[error("State error: {0}")]
    State(String),

    /// Target column missing, unparseable file, incompatible shapes
    #[error("Data error: {0}")]
    Data(String),

    /// Model fitting failed on otherwise valid data
    #[error("Training error: {0}")]
    Training(String),

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model has not been fitted yet")]
    NotFitted,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BenchError {
    /// Whether the evaluation loop may record this error as a per-dataset
    /// failure and continue with the next dataset.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BenchError::Data(_)
                | BenchError::Training(_)
                | BenchError::FeatureNotFound(_)
                | BenchError::NotFitted
        )
    }
}
