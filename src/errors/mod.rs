//! Error types for the benchmark harness.
//!
//! Each concern has its own enum so callers can match on the exact failure
//! instead of digging through a generic wrapper.

mod benchmark_error;
mod config_error;

pub use benchmark_error::BenchmarkError;
pub use config_error::ConfigError;

/// Result type alias for benchmark setup, measurement and analysis.
pub type BenchmarkResult<T> = std::result::Result<T, BenchmarkError>;

/// Result type alias for configuration loading and resolution.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
