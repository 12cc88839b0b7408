//! Benchmark harness for interchangeable vector kernel implementations.
//!
//! Each run generates seeded, cache-line aligned operand pairs, times a
//! baseline and a candidate implementation of the same operation, and checks
//! the candidate against the baseline with a mean relative error budget.

pub mod aligned_vector;
pub mod benchmarks;
pub mod errors;
pub mod kernels;

pub use aligned_vector::{AlignedBuffer, AlignedVectorPairFactory, FillMode, Side, VectorPair};
pub use benchmarks::{
    BenchmarkConfig, BenchmarkRecord, BenchmarkRunner, ConfigLoader, ConfigOverrides,
    ErrorOutcome, OperationDriver, TimingResult,
};
pub use errors::{BenchmarkError, BenchmarkResult, ConfigError, ConfigResult};
pub use kernels::{BaselineKernels, OperationKind, OptimizedKernels, VectorKernels};
