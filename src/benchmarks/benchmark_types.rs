//! Benchmark type definitions and configuration structures.

use serde::Serialize;

use crate::aligned_vector::ELEMENT_SIZE;
use crate::errors::{BenchmarkError, BenchmarkResult};
use crate::kernels::OperationKind;

/// Default operand size: 16 KiB, i.e. 2048 doubles.
pub const DEFAULT_SIZE_BYTES: usize = 16 * 1024;

/// Default number of repetitions inside one timed window.
pub const DEFAULT_REPETITIONS: usize = 1000;

/// Default mean relative error budget.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Default seed for operand generation.
pub const DEFAULT_SEED: u64 = 0;

/// Unit of every latency stored in [`TimingResult`].
pub const LATENCY_UNIT: &str = "µs";

/// Immutable description of one benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkConfig {
    pub(crate) kind: OperationKind,
    pub(crate) size_bytes: usize,
    pub(crate) repetitions: usize,
    pub(crate) tolerance: f64,
    pub(crate) seed: u64,
}

impl BenchmarkConfig {
    /// Creates a configuration for `kind` with every other setting at its default.
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            size_bytes: DEFAULT_SIZE_BYTES,
            repetitions: DEFAULT_REPETITIONS,
            tolerance: DEFAULT_TOLERANCE,
            seed: DEFAULT_SEED,
        }
    }

    /// Sets the operand size in bytes. Must hold at least one element.
    pub fn with_size_bytes(mut self, size_bytes: usize) -> BenchmarkResult<Self> {
        if size_bytes < ELEMENT_SIZE {
            return Err(BenchmarkError::InvalidVectorSize { size_bytes });
        }
        self.size_bytes = size_bytes;
        Ok(self)
    }

    pub fn with_repetitions(mut self, repetitions: usize) -> BenchmarkResult<Self> {
        if repetitions == 0 {
            return Err(BenchmarkError::InvalidRepetitions { value: repetitions });
        }
        self.repetitions = repetitions;
        Ok(self)
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> BenchmarkResult<Self> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(BenchmarkError::InvalidTolerance { value: tolerance });
        }
        self.tolerance = tolerance;
        Ok(self)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn repetitions(&self) -> usize {
        self.repetitions
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

/// Average per-repetition latency of both implementations, in [`LATENCY_UNIT`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimingResult {
    pub baseline_latency: f64,
    pub candidate_latency: f64,
}

impl TimingResult {
    pub fn new(baseline_latency: f64, candidate_latency: f64) -> Self {
        Self {
            baseline_latency,
            candidate_latency,
        }
    }

    /// `baseline_latency / candidate_latency`, or `None` when the candidate
    /// latency is not strictly positive.
    ///
    /// A value above 1 means the candidate is faster.
    pub fn speedup(&self) -> Option<f64> {
        if self.candidate_latency > 0.0 {
            Some(self.baseline_latency / self.candidate_latency)
        } else {
            None
        }
    }
}

/// Result of comparing candidate output against the baseline reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorOutcome {
    pub computed_error: f64,
    pub tolerance: f64,
    pub passed: bool,
}

impl ErrorOutcome {
    /// Passes when `computed_error <= tolerance`. A non-finite error never passes.
    pub fn classify(computed_error: f64, tolerance: f64) -> Self {
        Self {
            computed_error,
            tolerance,
            passed: computed_error <= tolerance,
        }
    }
}

/// Everything a reporter needs about one finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkRecord {
    pub config: BenchmarkConfig,
    pub baseline_name: String,
    pub candidate_name: String,
    pub elements: usize,
    /// Bytes per operand actually used, after rounding to whole elements.
    pub effective_size_bytes: usize,
    pub timing: TimingResult,
    pub speedup: Option<f64>,
    pub error: ErrorOutcome,
}

impl BenchmarkRecord {
    pub fn new(
        config: BenchmarkConfig,
        baseline_name: impl Into<String>,
        candidate_name: impl Into<String>,
        elements: usize,
        timing: TimingResult,
        error: ErrorOutcome,
    ) -> Self {
        Self {
            config,
            baseline_name: baseline_name.into(),
            candidate_name: candidate_name.into(),
            elements,
            effective_size_bytes: elements * ELEMENT_SIZE,
            speedup: timing.speedup(),
            timing,
            error,
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.config.kind
    }

    pub fn passed(&self) -> bool {
        self.error.passed
    }

    /// True when the requested size was rounded down to whole elements.
    pub fn size_adjusted(&self) -> bool {
        self.effective_size_bytes != self.config.size_bytes
    }
}
