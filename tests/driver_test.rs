//! End-to-end tests for the operation driver.
//!
//! These run real kernel pairs through every stage and check the resulting
//! records rather than individual helpers.

use std::cell::Cell;

use vecop_bench::aligned_vector::AlignedVectorPairFactory;
use vecop_bench::benchmarks::{BenchmarkConfig, BenchmarkRunner, OperationDriver};
use vecop_bench::kernels::{BaselineKernels, OperationKind, OptimizedKernels, VectorKernels};

fn config(kind: OperationKind, size_bytes: usize, repetitions: usize) -> BenchmarkConfig {
    BenchmarkConfig::new(kind)
        .with_size_bytes(size_bytes)
        .unwrap()
        .with_repetitions(repetitions)
        .unwrap()
}

/// Baseline kernels with a relative perturbation of the first vector-sum output.
struct PerturbedSum {
    factor: f64,
}

impl VectorKernels for PerturbedSum {
    fn name(&self) -> &str {
        "perturbed"
    }
    fn init(&self, value: f64, x: &mut [f64]) {
        BaselineKernels.init(value, x)
    }
    fn copy(&self, dst: &mut [f64], src: &[f64]) {
        BaselineKernels.copy(dst, src)
    }
    fn reduce(&self, x: &[f64]) -> f64 {
        BaselineKernels.reduce(x)
    }
    fn dot(&self, x: &[f64], y: &[f64]) -> f64 {
        BaselineKernels.dot(x, y)
    }
    fn scaled_add(&self, a: f64, x: &[f64], y: &mut [f64]) {
        BaselineKernels.scaled_add(a, x, y)
    }
    fn vector_sum(&self, out: &mut [f64], x: &[f64], y: &[f64]) {
        BaselineKernels.vector_sum(out, x, y);
        out[0] *= self.factor;
    }
    fn vector_scale(&self, k: f64, x: &mut [f64]) {
        BaselineKernels.vector_scale(k, x)
    }
}

/// Baseline kernels whose reduction is off by 0.1% on every other call.
struct FlakyReduce {
    calls: Cell<usize>,
}

impl VectorKernels for FlakyReduce {
    fn name(&self) -> &str {
        "flaky"
    }
    fn init(&self, value: f64, x: &mut [f64]) {
        BaselineKernels.init(value, x)
    }
    fn copy(&self, dst: &mut [f64], src: &[f64]) {
        BaselineKernels.copy(dst, src)
    }
    fn reduce(&self, x: &[f64]) -> f64 {
        let call = self.calls.get();
        self.calls.set(call + 1);
        let sum = BaselineKernels.reduce(x);
        if call % 2 == 1 { sum * 1.001 } else { sum }
    }
    fn dot(&self, x: &[f64], y: &[f64]) -> f64 {
        BaselineKernels.dot(x, y)
    }
    fn scaled_add(&self, a: f64, x: &[f64], y: &mut [f64]) {
        BaselineKernels.scaled_add(a, x, y)
    }
    fn vector_sum(&self, out: &mut [f64], x: &[f64], y: &[f64]) {
        BaselineKernels.vector_sum(out, x, y)
    }
    fn vector_scale(&self, k: f64, x: &mut [f64]) {
        BaselineKernels.vector_scale(k, x)
    }
}

#[cfg(test)]
mod scenario_tests {
    use super::*;

    #[test]
    fn test_vector_sum_of_mirrored_operands() {
        let kernels = BaselineKernels;
        let driver = OperationDriver::new(&kernels, &kernels);
        let x: Vec<f64> = (1..=8).map(f64::from).collect();
        let y: Vec<f64> = (1..=8).rev().map(f64::from).collect();
        let mut operands = vec![
            AlignedVectorPairFactory::from_values(&[0.0; 8]).unwrap(),
            AlignedVectorPairFactory::from_values(&x).unwrap(),
            AlignedVectorPairFactory::from_values(&y).unwrap(),
        ];

        let record = driver
            .run_with_operands(&config(OperationKind::VectorSum, 64, 1), &mut operands, 0.0)
            .unwrap();

        assert_eq!(operands[0].baseline.as_slice(), &[9.0; 8]);
        assert_eq!(operands[0].candidate.as_slice(), &[9.0; 8]);
        assert_eq!(record.elements, 8);
        assert!(!record.size_adjusted());
        assert_eq!(record.error.computed_error, 0.0);
        assert!(record.passed());
    }

    #[test]
    fn test_unaligned_size_is_rounded_down() {
        let kernels = BaselineKernels;
        let driver = OperationDriver::new(&kernels, &kernels);
        let record = driver.run(&config(OperationKind::Copy, 60, 2)).unwrap();
        assert_eq!(record.elements, 7);
        assert_eq!(record.config.size_bytes(), 60);
        assert_eq!(record.effective_size_bytes, 56);
        assert!(record.size_adjusted());
        assert!(record.passed());
    }

    #[test]
    fn test_small_perturbation_fails_tight_tolerance() {
        let baseline = BaselineKernels;
        let candidate = PerturbedSum {
            factor: 1.0 + 1e-6,
        };
        let driver = OperationDriver::new(&baseline, &candidate);
        let config = config(OperationKind::VectorSum, 64, 1)
            .with_tolerance(1e-15)
            .unwrap();

        let record = driver.run(&config).unwrap();

        assert!(!record.passed());
        assert!(record.error.computed_error > record.error.tolerance);
        // One of eight elements is off by 1e-6.
        let expected = 1e-6 / 8.0;
        assert!((record.error.computed_error - expected).abs() < 1e-9);
    }

    #[test]
    fn test_same_perturbation_passes_loose_tolerance() {
        let baseline = BaselineKernels;
        let candidate = PerturbedSum {
            factor: 1.0 + 1e-6,
        };
        let driver = OperationDriver::new(&baseline, &candidate);
        let config = config(OperationKind::VectorSum, 64, 1)
            .with_tolerance(1e-3)
            .unwrap();
        assert!(driver.run(&config).unwrap().passed());
    }

    #[test]
    fn test_scalar_results_are_compared_across_all_repetitions() {
        let baseline = BaselineKernels;
        let candidate = FlakyReduce {
            calls: Cell::new(0),
        };
        let driver = OperationDriver::new(&baseline, &candidate);

        let record = driver.run(&config(OperationKind::Reduce, 256, 4)).unwrap();

        assert_eq!(candidate.calls.get(), 4);
        // Two of four repetitions carry a 1e-3 relative error.
        assert!((record.error.computed_error - 0.5e-3).abs() < 1e-9);
        assert!(!record.passed());
    }
}

#[cfg(test)]
mod invariant_tests {
    use super::*;

    #[test]
    fn test_identical_implementations_never_diverge() {
        let kernels = OptimizedKernels::new();
        let driver = OperationDriver::new(&kernels, &kernels);
        for kind in OperationKind::ALL {
            let config = config(kind, 1000, 5).with_tolerance(0.0).unwrap();
            let record = driver.run(&config).unwrap();
            assert_eq!(record.error.computed_error, 0.0, "{kind}");
            assert!(record.passed(), "{kind}");
        }
    }

    #[test]
    fn test_speedup_is_exact_latency_ratio() {
        let config = config(OperationKind::DotProd, 4096, 50);
        let record = BenchmarkRunner::run_benchmark(&config).unwrap();
        let timing = record.timing;
        assert!(timing.baseline_latency > 0.0);
        assert!(timing.candidate_latency > 0.0);
        assert_eq!(
            record.speedup,
            Some(timing.baseline_latency / timing.candidate_latency)
        );
    }

    #[test]
    fn test_runs_are_reproducible() {
        let kernels = BaselineKernels;
        let driver = OperationDriver::new(&kernels, &kernels);
        let config = config(OperationKind::ScaledAdd, 512, 3).with_seed(11);
        let first = driver.run(&config).unwrap();
        let second = driver.run(&config).unwrap();
        assert_eq!(first.error, second.error);
        assert_eq!(first.elements, second.elements);
    }

    #[test]
    fn test_optimized_candidate_passes_every_kind() {
        for kind in OperationKind::ALL {
            let config = config(kind, 16 * 1024, 100);
            let record = BenchmarkRunner::run_benchmark(&config).unwrap();
            assert!(
                record.passed(),
                "{kind}: error {} exceeds {}",
                record.error.computed_error,
                record.error.tolerance
            );
        }
    }
}
