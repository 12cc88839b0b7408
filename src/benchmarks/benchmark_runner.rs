//! Core benchmark execution logic.

use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::benchmark_types::{BenchmarkConfig, BenchmarkRecord, TimingResult};
use super::performance_metrics::{MonotonicTimer, RelativeErrorAnalyzer};
use crate::aligned_vector::{AlignedVectorPairFactory, Side, VectorPair};
use crate::errors::{BenchmarkError, BenchmarkResult};
use crate::kernels::{BaselineKernels, OperationKind, OptimizedKernels, OutputKind, VectorKernels};

/// Stages of a single driver run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Setup,
    WarmSeed,
    RunBaseline,
    RunCandidate,
    Analyze,
    Done,
}

/// Runs one operation kind against a baseline and a candidate kernel set.
///
/// The same five stages serve every kind; arity and output shape come from
/// the [`OperationKind`] descriptor.
pub struct OperationDriver<'k> {
    baseline: &'k dyn VectorKernels,
    candidate: &'k dyn VectorKernels,
}

impl<'k> OperationDriver<'k> {
    pub fn new(baseline: &'k dyn VectorKernels, candidate: &'k dyn VectorKernels) -> Self {
        Self {
            baseline,
            candidate,
        }
    }

    /// Generates seeded operands for `config` and measures both implementations.
    ///
    /// Buffers live for the duration of this call only.
    pub fn run(&self, config: &BenchmarkConfig) -> BenchmarkResult<BenchmarkRecord> {
        let kind = config.kind();
        Self::enter(kind, RunStage::Setup);

        let len = AlignedVectorPairFactory::element_count(config.size_bytes())?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed());
        let mut operands = kind
            .operand_fills()
            .iter()
            .map(|&fill| AlignedVectorPairFactory::with_len(len, fill, &mut rng))
            .collect::<BenchmarkResult<Vec<VectorPair>>>()?;

        Self::enter(kind, RunStage::WarmSeed);
        let coefficient = if kind.takes_coefficient() {
            AlignedVectorPairFactory::draw_scalar(&mut rng)
        } else {
            0.0
        };

        self.measure_and_analyze(config, &mut operands, coefficient)
    }

    /// Measures both implementations over caller-supplied operands.
    ///
    /// `operands` must match the kind's arity and share one length; each pair
    /// should start with identical content on both sides.
    pub fn run_with_operands(
        &self,
        config: &BenchmarkConfig,
        operands: &mut [VectorPair],
        coefficient: f64,
    ) -> BenchmarkResult<BenchmarkRecord> {
        Self::enter(config.kind(), RunStage::Setup);
        Self::enter(config.kind(), RunStage::WarmSeed);
        self.measure_and_analyze(config, operands, coefficient)
    }

    fn measure_and_analyze(
        &self,
        config: &BenchmarkConfig,
        operands: &mut [VectorPair],
        coefficient: f64,
    ) -> BenchmarkResult<BenchmarkRecord> {
        let kind = config.kind();
        let repetitions = config.repetitions();

        if operands.len() != kind.arity() {
            return Err(BenchmarkError::OperandCountMismatch {
                kind,
                expected: kind.arity(),
                provided: operands.len(),
            });
        }
        let elements = operands.first().map_or(0, VectorPair::len);
        if let Some(pair) = operands.iter().find(|pair| pair.len() != elements) {
            return Err(BenchmarkError::LengthMismatch {
                reference: elements,
                candidate: pair.len(),
            });
        }

        info!(
            "Running `{}` benchmark ({}): {} elements, {} repetitions, {} vs {}",
            kind,
            kind.description(),
            elements,
            repetitions,
            self.baseline.name(),
            self.candidate.name()
        );

        // Result slots exist before timing so the timed loop never allocates.
        let slots = match kind.output() {
            OutputKind::Scalar => repetitions,
            OutputKind::Operand(_) => 0,
        };
        let mut baseline_scalars = AlignedVectorPairFactory::scalar_slots(slots)?;
        let mut candidate_scalars = AlignedVectorPairFactory::scalar_slots(slots)?;

        Self::enter(kind, RunStage::RunBaseline);
        let baseline_latency = Self::timed_side(
            kind,
            self.baseline,
            operands,
            Side::Baseline,
            coefficient,
            repetitions,
            &mut baseline_scalars,
        )?;

        Self::enter(kind, RunStage::RunCandidate);
        let candidate_latency = Self::timed_side(
            kind,
            self.candidate,
            operands,
            Side::Candidate,
            coefficient,
            repetitions,
            &mut candidate_scalars,
        )?;

        Self::enter(kind, RunStage::Analyze);
        let (reference, produced): (&[f64], &[f64]) = match kind.output() {
            OutputKind::Scalar => (baseline_scalars.as_slice(), candidate_scalars.as_slice()),
            OutputKind::Operand(index) => (
                operands[index].side(Side::Baseline),
                operands[index].side(Side::Candidate),
            ),
        };
        let error = RelativeErrorAnalyzer::analyze(reference, produced, config.tolerance())?;
        let timing = TimingResult::new(baseline_latency, candidate_latency);

        let record = BenchmarkRecord::new(
            config.clone(),
            self.baseline.name(),
            self.candidate.name(),
            elements,
            timing,
            error,
        );

        Self::enter(kind, RunStage::Done);
        info!(
            "`{}` finished: baseline {:.3}µs, candidate {:.3}µs, error {:e} (tolerance {:e})",
            kind,
            timing.baseline_latency,
            timing.candidate_latency,
            error.computed_error,
            error.tolerance
        );

        Ok(record)
    }

    fn timed_side(
        kind: OperationKind,
        kernels: &dyn VectorKernels,
        operands: &mut [VectorPair],
        side: Side,
        coefficient: f64,
        repetitions: usize,
        scalars: &mut [f64],
    ) -> BenchmarkResult<f64> {
        let buffers: Vec<&mut [f64]> = operands
            .iter_mut()
            .map(|pair| pair.side_mut(side))
            .collect();
        let mut operation = kind.bind(kernels, buffers, coefficient)?;

        MonotonicTimer::measure(repetitions, |i| {
            if let Some(value) = operation() {
                scalars[i] = value;
            }
        })
    }

    fn enter(kind: OperationKind, stage: RunStage) {
        debug!("`{}` -> {:?}", kind, stage);
    }
}

/// Main benchmark runner: straight-loop baseline against the optimized kernels.
pub struct BenchmarkRunner;

impl BenchmarkRunner {
    /// Runs the benchmark described by `config`.
    pub fn run_benchmark(config: &BenchmarkConfig) -> BenchmarkResult<BenchmarkRecord> {
        let baseline = BaselineKernels;
        let candidate = OptimizedKernels::new();
        OperationDriver::new(&baseline, &candidate).run(config)
    }

    /// Lists available benchmarks.
    pub fn list_benchmarks() {
        println!("Available benchmarks:");
        for kind in OperationKind::ALL {
            println!("  {:<10} - {}", kind.as_str(), kind.description());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(kind: OperationKind, size_bytes: usize, repetitions: usize) -> BenchmarkConfig {
        BenchmarkConfig::new(kind)
            .with_size_bytes(size_bytes)
            .unwrap()
            .with_repetitions(repetitions)
            .unwrap()
    }

    #[test]
    fn test_every_kind_passes_against_itself() {
        let kernels = BaselineKernels;
        let driver = OperationDriver::new(&kernels, &kernels);
        for kind in OperationKind::ALL {
            let record = driver.run(&config(kind, 256, 4)).unwrap();
            assert_eq!(record.error.computed_error, 0.0, "{kind}");
            assert!(record.passed(), "{kind}");
            assert_eq!(record.elements, 32);
        }
    }

    #[test]
    fn test_runner_passes_default_tolerance() {
        for kind in OperationKind::ALL {
            let record = BenchmarkRunner::run_benchmark(&config(kind, 2048, 10)).unwrap();
            assert!(record.passed(), "{kind}: {}", record.error.computed_error);
        }
    }

    #[test]
    fn test_operand_count_is_checked() {
        let kernels = BaselineKernels;
        let driver = OperationDriver::new(&kernels, &kernels);
        let mut operands = vec![AlignedVectorPairFactory::from_values(&[1.0, 2.0]).unwrap()];
        let result =
            driver.run_with_operands(&config(OperationKind::Copy, 16, 1), &mut operands, 0.0);
        assert!(matches!(
            result,
            Err(BenchmarkError::OperandCountMismatch {
                expected: 2,
                provided: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_operand_lengths_must_agree() {
        let kernels = BaselineKernels;
        let driver = OperationDriver::new(&kernels, &kernels);
        let mut operands = vec![
            AlignedVectorPairFactory::from_values(&[1.0, 2.0]).unwrap(),
            AlignedVectorPairFactory::from_values(&[1.0]).unwrap(),
        ];
        let result =
            driver.run_with_operands(&config(OperationKind::DotProd, 16, 1), &mut operands, 0.0);
        assert!(matches!(result, Err(BenchmarkError::LengthMismatch { .. })));
    }

    #[test]
    fn test_unrepresentable_scalar_slots_fail_before_timing() {
        let kernels = BaselineKernels;
        let driver = OperationDriver::new(&kernels, &kernels);
        let result = driver.run(&config(OperationKind::Reduce, 8, usize::MAX / 4));
        assert!(matches!(
            result,
            Err(BenchmarkError::InvalidLayout {
                elements,
                ..
            }) if elements == usize::MAX / 4
        ));
    }
}
