//! Lazy, chainable sequence-processing pipelines
//!
//! A pipeline wraps an iterable source and a list of stages. Attaching a
//! stage only records it; items are pulled one at a time when the pipeline
//! is run into a sink, and each run reports a [`RunStats`] record.
//!
//! ```
//! use pipekit_core::prelude::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let (items, stats) = pipe(vec![1, 2, 2, 3, 1, 4])
//!     .dedupe(None)?
//!     .map(|x| x * 10)?
//!     .collect()?;
//!
//! assert_eq!(items, vec![10, 20, 30, 40]);
//! assert_eq!(stats.dropped(), 2);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod backoff;
pub mod clock;
pub mod config;
pub mod error;
pub mod retryable;
pub mod seen;
pub mod sink;
pub mod stage;
pub mod stats;

mod chain;
mod pipe;
mod runner;

// Re-export key types for convenience
pub use backoff::backoff_delay;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{RateLimit, RetryPolicy};
pub use error::{Error, Result};
pub use pipe::{pipe, try_pipe, Pipe};
pub use retryable::Retryable;
pub use seen::SeenSet;
pub use sink::{CollectingSink, Discard, FnSink, Sink, TryFnSink};
pub use stage::StageKind;
pub use stats::RunStats;

/// Everything needed to build and run a pipeline
pub mod prelude {
    pub use crate::config::RetryPolicy;
    pub use crate::pipe::{pipe, try_pipe, Pipe};
    pub use crate::retryable::Retryable;
    pub use crate::sink::Sink;
    pub use crate::stats::RunStats;
}
