//! Latency measurement and relative error analysis.

use std::time::Instant;

use log::debug;

use super::benchmark_types::ErrorOutcome;
use crate::errors::{BenchmarkError, BenchmarkResult};

/// Brackets a repetition loop with two monotonic timestamps.
pub struct MonotonicTimer;

impl MonotonicTimer {
    /// Runs `body` exactly `repetitions` times back to back and returns the
    /// average latency of one call in microseconds.
    ///
    /// `body` receives the repetition index. There is no warm-up and no outlier
    /// trimming: one unbroken window is the whole measurement. State mutated by
    /// `body` carries over from one repetition to the next.
    pub fn measure<F>(repetitions: usize, mut body: F) -> BenchmarkResult<f64>
    where
        F: FnMut(usize),
    {
        if repetitions == 0 {
            return Err(BenchmarkError::InvalidRepetitions { value: repetitions });
        }

        let start = Instant::now();
        for i in 0..repetitions {
            body(i);
        }
        let elapsed = start.elapsed();

        debug!("{} repetitions took {:?}", repetitions, elapsed);
        Ok(elapsed.as_secs_f64() * 1e6 / repetitions as f64)
    }
}

/// Mean absolute relative error between a reference and a candidate sequence.
pub struct RelativeErrorAnalyzer;

impl RelativeErrorAnalyzer {
    /// Returns `Σ |(reference[i] - candidate[i]) / reference[i]| / len`.
    ///
    /// A reference value of exactly zero makes the result non-finite (NaN or
    /// infinity), which then fails any tolerance check.
    pub fn compute(reference: &[f64], candidate: &[f64]) -> BenchmarkResult<f64> {
        if reference.len() != candidate.len() {
            return Err(BenchmarkError::LengthMismatch {
                reference: reference.len(),
                candidate: candidate.len(),
            });
        }
        if reference.is_empty() {
            return Err(BenchmarkError::EmptySequence);
        }

        let total: f64 = reference
            .iter()
            .zip(candidate)
            .map(|(&r, &c)| ((r - c) / r).abs())
            .sum();

        Ok(total / reference.len() as f64)
    }

    /// Computes the error and classifies it against `tolerance`.
    pub fn analyze(
        reference: &[f64],
        candidate: &[f64],
        tolerance: f64,
    ) -> BenchmarkResult<ErrorOutcome> {
        let computed = Self::compute(reference, candidate)?;
        Ok(ErrorOutcome::classify(computed, tolerance))
    }
}
