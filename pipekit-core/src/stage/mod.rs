//! Stage descriptors and the pull adapters that execute them
//!
//! Every stage is an iterator over `anyhow::Result<T>` wrapping the stage
//! before it. An `Err` travelling down the chain is passed through untouched
//! by every stage so the runner can abort on it.

mod batch;
mod catch;
mod dedupe;
mod rate_limit;
mod retry;
mod source;
mod take;
mod transform;

use std::fmt;
use std::time::Duration;

pub(crate) use batch::Batch;
pub(crate) use catch::Catch;
pub(crate) use dedupe::Dedupe;
pub(crate) use rate_limit::RateLimited;
pub(crate) use retry::RetryMap;
pub(crate) use source::Source;
pub(crate) use take::Take;
pub(crate) use transform::{Filter, FlatMap, Map, Tap, TryFilter, TryMap, TryTap};

/// A type-erased stage output stream
pub(crate) type Items<'a, T> = Box<dyn Iterator<Item = anyhow::Result<T>> + 'a>;

/// Descriptor of one attached stage, in attachment order
#[derive(Debug, Clone, PartialEq)]
pub enum StageKind {
    /// One-to-one transform
    Map,
    /// One-to-one transform that may fail
    TryMap,
    /// One-to-many transform
    FlatMap,
    /// Predicate filter
    Filter,
    /// Predicate filter whose predicate may fail
    TryFilter,
    /// Side effect, item passes unchanged
    Tap,
    /// Side effect that may fail
    TryTap,
    /// Groups items into vectors of `size`
    Batch {
        /// Items per full batch
        size: usize,
    },
    /// Spaces releases to at most `rate` items per `per`
    RateLimit {
        /// Items per window
        rate: f64,
        /// Window length
        per: Duration,
    },
    /// Drops items whose key was already seen
    Dedupe {
        /// Maximum number of tracked keys
        max_size: Option<usize>,
    },
    /// Transform with retries and exponential backoff
    RetryMap {
        /// Retries after the first attempt
        retries: u32,
        /// Base backoff
        backoff: Duration,
    },
    /// Transform whose declared failures drop the item
    Catch,
    /// Stops after `limit` items
    Take {
        /// Maximum items passed downstream
        limit: usize,
    },
}

impl StageKind {
    /// Operator name as used by the builder method
    pub fn name(&self) -> &'static str {
        match self {
            StageKind::Map => "map",
            StageKind::TryMap => "try_map",
            StageKind::FlatMap => "flat_map",
            StageKind::Filter => "filter",
            StageKind::TryFilter => "try_filter",
            StageKind::Tap => "tap",
            StageKind::TryTap => "try_tap",
            StageKind::Batch { .. } => "batch",
            StageKind::RateLimit { .. } => "rate_limit",
            StageKind::Dedupe { .. } => "dedupe",
            StageKind::RetryMap { .. } => "retry_map",
            StageKind::Catch => "catch",
            StageKind::Take { .. } => "take",
        }
    }

    /// Whether the stage keeps state across items within a run
    pub fn is_stateful(&self) -> bool {
        matches!(
            self,
            StageKind::Batch { .. }
                | StageKind::RateLimit { .. }
                | StageKind::Dedupe { .. }
                | StageKind::Take { .. }
        )
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Batch { size } => write!(f, "batch({size})"),
            StageKind::RateLimit { rate, per } => write!(f, "rate_limit({rate}/{per:?})"),
            StageKind::Dedupe { max_size: Some(max) } => write!(f, "dedupe(max={max})"),
            StageKind::RetryMap { retries, backoff } => {
                write!(f, "retry_map(retries={retries}, backoff={backoff:?})")
            }
            StageKind::Take { limit } => write!(f, "take({limit})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Render a stage list as `a -> b -> c`
pub(crate) fn describe(stages: &[StageKind]) -> String {
    stages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Wrap plain values as a successful upstream
#[cfg(test)]
pub(crate) fn upstream<T>(items: Vec<T>) -> impl Iterator<Item = anyhow::Result<T>> {
    items.into_iter().map(Ok)
}

/// Drain a stage, panicking on the first failure
#[cfg(test)]
pub(crate) fn drain_ok<T>(stage: impl Iterator<Item = anyhow::Result<T>>) -> Vec<T> {
    stage.map(|item| item.unwrap()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(StageKind::Map.to_string(), "map");
        assert_eq!(StageKind::Batch { size: 3 }.to_string(), "batch(3)");
        assert_eq!(StageKind::Dedupe { max_size: None }.to_string(), "dedupe");
        assert_eq!(StageKind::Dedupe { max_size: Some(8) }.to_string(), "dedupe(max=8)");
        assert_eq!(
            StageKind::RetryMap {
                retries: 2,
                backoff: Duration::from_millis(50)
            }
            .to_string(),
            "retry_map(retries=2, backoff=50ms)"
        );
    }

    #[test]
    fn test_describe_chain() {
        let stages = [
            StageKind::Filter,
            StageKind::Map,
            StageKind::Batch { size: 2 },
            StageKind::Take { limit: 4 },
        ];
        assert_eq!(describe(&stages), "filter -> map -> batch(2) -> take(4)");
        assert_eq!(describe(&[]), "");
    }

    #[test]
    fn test_stateful_kinds() {
        assert!(StageKind::Take { limit: 1 }.is_stateful());
        assert!(!StageKind::Catch.is_stateful());
        assert!(!StageKind::RetryMap {
            retries: 1,
            backoff: Duration::ZERO
        }
        .is_stateful());
    }
}
