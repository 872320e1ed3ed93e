//! Throughput benchmarks for pipekit pipelines

use std::time::{Duration, Instant};

use pipekit_core::{pipe, Retryable, RetryPolicy, RunStats};
use serde::Serialize;

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Number of measured iterations
    pub iterations: usize,

    /// Warmup iterations
    pub warmup_iterations: usize,

    /// Items produced by the source per iteration
    pub items: usize,

    /// Batch size for batching benchmarks
    pub batch_size: usize,

    /// Bound for the dedupe seen-set; `None` keeps every key
    pub dedupe_window: Option<usize>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            iterations: 10,
            warmup_iterations: 3,
            items: 100_000,
            batch_size: 256,
            dedupe_window: Some(1024),
        }
    }
}

/// Benchmark result
#[derive(Debug, Clone, Serialize)]
pub struct BenchResult {
    /// Name of the benchmark
    pub name: String,

    /// Total time taken
    pub total_time: Duration,

    /// Average time per iteration
    pub avg_time: Duration,

    /// Min time per iteration
    pub min_time: Duration,

    /// Max time per iteration
    pub max_time: Duration,

    /// Source items per second
    pub throughput: f64,

    /// Stats of the last measured run
    pub last_run: RunStats,
}

/// Run a benchmark
pub fn run_benchmark<F>(name: &str, config: &BenchConfig, mut func: F) -> anyhow::Result<BenchResult>
where
    F: FnMut() -> anyhow::Result<RunStats>,
{
    for _ in 0..config.warmup_iterations {
        func()?;
    }

    let mut times = Vec::with_capacity(config.iterations);
    let mut last_run = RunStats::default();
    let start_total = Instant::now();

    for _ in 0..config.iterations {
        let start = Instant::now();
        last_run = func()?;
        times.push(start.elapsed());
    }

    let total_time = start_total.elapsed();
    let min_time = times.iter().min().copied().unwrap_or_default();
    let max_time = times.iter().max().copied().unwrap_or_default();
    let avg_time = u32::try_from(times.len())
        .ok()
        .filter(|n| *n > 0)
        .map_or(Duration::ZERO, |n| times.iter().sum::<Duration>() / n);

    #[allow(clippy::cast_precision_loss)]
    let throughput = (config.iterations * config.items) as f64 / total_time.as_secs_f64();

    tracing::debug!(name, ?avg_time, throughput, "benchmark finished");

    Ok(BenchResult {
        name: name.to_string(),
        total_time,
        avg_time,
        min_time,
        max_time,
        throughput,
        last_run,
    })
}

/// Stateless stages only: map then filter
pub fn bench_map_filter(config: &BenchConfig) -> anyhow::Result<BenchResult> {
    run_benchmark("map + filter", config, || {
        pipe(0..config.items as u64)
            .map(|x| x.wrapping_mul(2_654_435_761))?
            .filter(|x| x % 3 != 0)?
            .drain()
    })
}

/// Batching into owned vectors
pub fn bench_batch(config: &BenchConfig) -> anyhow::Result<BenchResult> {
    run_benchmark("batch", config, || {
        pipe(0..config.items as u64).batch(config.batch_size)?.drain()
    })
}

/// Dedupe over a source with many repeats
pub fn bench_dedupe(config: &BenchConfig) -> anyhow::Result<BenchResult> {
    run_benchmark("dedupe", config, || {
        pipe((0..config.items as u64).map(|x| x % 4096))
            .dedupe(config.dedupe_window)?
            .drain()
    })
}

/// Every non-sleeping stage in one chain
pub fn bench_full_chain(config: &BenchConfig) -> anyhow::Result<BenchResult> {
    run_benchmark("full chain", config, || {
        let policy = RetryPolicy::new(1).backoff(Duration::ZERO);
        pipe(0..config.items as u64)
            .flat_map(|x| [x, x + 1])?
            .dedupe(config.dedupe_window)?
            .retry_map(|x| Ok::<_, anyhow::Error>(x * 2), policy)?
            .catch(
                |x| u32::try_from(*x),
                |_, _| {},
                Retryable::of::<std::num::TryFromIntError>(),
            )?
            .tap(|_| {})?
            .batch(config.batch_size)?
            .take(config.items)?
            .drain()
    })
}

/// Run every benchmark with one configuration
pub fn run_all(config: &BenchConfig) -> anyhow::Result<Vec<BenchResult>> {
    Ok(vec![
        bench_map_filter(config)?,
        bench_batch(config)?,
        bench_dedupe(config)?,
        bench_full_chain(config)?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> BenchConfig {
        BenchConfig {
            iterations: 2,
            warmup_iterations: 1,
            items: 1_000,
            batch_size: 10,
            dedupe_window: Some(16),
        }
    }

    #[test]
    fn test_batch_bench_reports_last_run() {
        let result = bench_batch(&small()).unwrap();
        assert_eq!(result.last_run.processed(), 1_000);
        assert_eq!(result.last_run.batches(), 100);
        assert!(result.min_time <= result.max_time);
    }

    #[test]
    fn test_all_benches_run() {
        let results = run_all(&small()).unwrap();
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.last_run.processed() > 0));
    }
}
