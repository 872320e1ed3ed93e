//! Benchmark runner for pipekit pipelines

use pipekit_bench::{run_all, BenchConfig, BenchResult};
use tracing_subscriber::EnvFilter;

fn print_result(result: &BenchResult) {
    println!("\nBenchmark: {}", result.name);
    println!("  Total time:   {:?}", result.total_time);
    println!("  Average time: {:?}", result.avg_time);
    println!("  Min time:     {:?}", result.min_time);
    println!("  Max time:     {:?}", result.max_time);
    println!("  Throughput:   {:.2} items/sec", result.throughput);
    println!("  Last run:     {}", result.last_run);
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Pipeline Benchmarks ===");

    let config = BenchConfig::default();
    let results = run_all(&config)?;
    for result in &results {
        print_result(result);
    }

    // Scaling with the dedupe window
    println!("\n=== Dedupe Window Scaling ===");
    for window in [Some(64), Some(1024), Some(16_384), None] {
        let config = BenchConfig {
            iterations: 3,
            warmup_iterations: 1,
            dedupe_window: window,
            ..BenchConfig::default()
        };
        let result = pipekit_bench::bench_dedupe(&config)?;
        println!("\nWindow: {window:?}");
        println!("  Average time: {:?}", result.avg_time);
        println!("  Throughput:   {:.2} items/sec", result.throughput);
        println!("  Dropped:      {}", result.last_run.dropped());
    }

    println!("\n=== JSON Report ===");
    println!("{}", serde_json::to_string_pretty(&results)?);

    Ok(())
}
