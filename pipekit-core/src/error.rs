//! Error types for pipeline construction and triggering
//!
//! Item-level failures raised by user functions travel as [`anyhow::Error`]
//! and come out of a run unchanged. The enum below only covers the errors the
//! engine raises on its own.

use thiserror::Error;

/// Result type for pipeline construction operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for pipeline construction and usage
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A stage was attached with invalid parameters
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The chain's source was already consumed by an earlier run
    #[error("Pipeline already consumed: a chain can only be run once")]
    Consumed,
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }
}
