//! Benchmark suite comparing baseline and optimized vector kernels.
//!
//! Configuration, the per-run driver, latency measurement, relative error
//! analysis and result rendering live here.

pub mod benchmark_runner;
pub mod benchmark_types;
pub mod config_loader;
pub mod performance_metrics;
pub mod report;

pub use benchmark_runner::{BenchmarkRunner, OperationDriver, RunStage};
pub use benchmark_types::{
    BenchmarkConfig, BenchmarkRecord, DEFAULT_REPETITIONS, DEFAULT_SEED, DEFAULT_SIZE_BYTES,
    DEFAULT_TOLERANCE, ErrorOutcome, LATENCY_UNIT, TimingResult,
};
pub use config_loader::{ConfigLoader, ConfigOverrides, ConfigWarning};
pub use performance_metrics::{MonotonicTimer, RelativeErrorAnalyzer};
