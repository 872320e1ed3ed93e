//! Run statistics

use std::cell::Cell;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use static_assertions::assert_impl_all;

/// Summary of one completed pipeline run.
///
/// Counters are not tied together by a fixed identity. Without batch or
/// flat-map stages, `processed == emitted + dropped` holds for any mix of
/// filter, dedupe and catch stages, but a batch stage emits one unit per
/// batch and a flat-map stage may emit several units per pulled item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunStats {
    processed: u64,
    emitted: u64,
    dropped: u64,
    batches: u64,
    errors: u64,
    duration: Duration,
}

assert_impl_all!(RunStats: Send, Sync, Copy);

impl RunStats {
    /// Items pulled from the source
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Units delivered to the sink (one per batch after a batch stage)
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Items removed by filter, dedupe or catch stages
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Batches produced by batch stages, partial final batches included
    pub fn batches(&self) -> u64 {
        self.batches
    }

    /// Failures handled by retry_map and catch stages
    pub fn errors(&self) -> u64 {
        self.errors
    }

    /// Wall time from loop start to loop end
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed={} emitted={} dropped={} batches={} errors={} duration={:?}",
            self.processed, self.emitted, self.dropped, self.batches, self.errors, self.duration
        )
    }
}

/// Mutable counters shared by the stages of one run
#[derive(Debug, Default)]
pub(crate) struct Counters {
    processed: Cell<u64>,
    emitted: Cell<u64>,
    dropped: Cell<u64>,
    batches: Cell<u64>,
    errors: Cell<u64>,
}

fn bump(counter: &Cell<u64>) {
    counter.set(counter.get() + 1);
}

impl Counters {
    pub(crate) fn processed(&self) {
        bump(&self.processed);
    }

    pub(crate) fn emitted(&self) {
        bump(&self.emitted);
    }

    pub(crate) fn dropped(&self) {
        bump(&self.dropped);
    }

    pub(crate) fn batch(&self) {
        bump(&self.batches);
    }

    pub(crate) fn error(&self) {
        bump(&self.errors);
    }

    /// Freeze the counters into the value handed back to the caller
    pub(crate) fn finish(&self, duration: Duration) -> RunStats {
        RunStats {
            processed: self.processed.get(),
            emitted: self.emitted.get(),
            dropped: self.dropped.get(),
            batches: self.batches.get(),
            errors: self.errors.get(),
            duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_freeze_into_stats() {
        let counters = Counters::default();
        counters.processed();
        counters.processed();
        counters.emitted();
        counters.dropped();
        counters.batch();
        counters.error();

        let stats = counters.finish(Duration::from_millis(3));
        assert_eq!(stats.processed(), 2);
        assert_eq!(stats.emitted(), 1);
        assert_eq!(stats.dropped(), 1);
        assert_eq!(stats.batches(), 1);
        assert_eq!(stats.errors(), 1);
        assert_eq!(stats.duration(), Duration::from_millis(3));
    }

    #[test]
    fn test_stats_json_roundtrip() {
        let counters = Counters::default();
        counters.processed();
        let stats = counters.finish(Duration::from_millis(7));

        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["processed"], 1);
        assert_eq!(json["duration"]["nanos"], 7_000_000);

        let back: RunStats = serde_json::from_value(json).unwrap();
        assert_eq!(back, stats);
    }

    #[test]
    fn test_display_summary() {
        let stats = RunStats::default();
        assert_eq!(
            stats.to_string(),
            "processed=0 emitted=0 dropped=0 batches=0 errors=0 duration=0ns"
        );
    }
}
