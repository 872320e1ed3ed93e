//! Pipeline execution loop

use std::rc::Rc;

use uuid::Uuid;

use crate::chain::{Chain, RunContext};
use crate::sink::Sink;
use crate::stage::describe;
use crate::stats::{Counters, RunStats};

/// Drives a chain to exhaustion, feeding a sink and collecting statistics
pub(crate) struct Runner<'a, T> {
    chain: Chain<'a, T>,
}

impl<'a, T: 'a> Runner<'a, T> {
    pub(crate) fn new(chain: Chain<'a, T>) -> Self {
        Self { chain }
    }

    /// Run the pipeline until completion.
    ///
    /// Stops at the first unrecovered failure and returns it unchanged; no
    /// statistics are produced for an aborted run.
    pub(crate) fn run<K: Sink<T>>(self, mut sink: K) -> anyhow::Result<RunStats> {
        let plan = self.chain.take_plan()?;

        let span = tracing::info_span!(
            "pipeline",
            run_id = %Uuid::new_v4(),
            name = self.chain.name().unwrap_or("pipe"),
            stages = %describe(self.chain.stages()),
        );
        let _entered = span.enter();

        let clock = self.chain.clock();
        let counters = Rc::new(Counters::default());
        let ctx = RunContext {
            counters: Rc::clone(&counters),
            clock: Rc::clone(&clock),
        };

        tracing::debug!("run started");
        let start = clock.now();

        for item in plan(&ctx)? {
            sink.consume(item?)?;
            counters.emitted();
        }
        sink.flush()?;

        let stats = counters.finish(clock.now().saturating_duration_since(start));
        tracing::info!(
            processed = stats.processed(),
            emitted = stats.emitted(),
            dropped = stats.dropped(),
            batches = stats.batches(),
            errors = stats.errors(),
            duration = ?stats.duration(),
            "run complete"
        );

        Ok(stats)
    }
}
