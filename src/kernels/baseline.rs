//! Straight-loop kernels, left entirely to the compiler's code generation.

use super::VectorKernels;

/// Reference implementation of every operation.
///
/// Each kernel is a single indexed loop with one accumulator, so results follow
/// strict left-to-right evaluation order.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaselineKernels;

#[allow(clippy::needless_range_loop)]
impl VectorKernels for BaselineKernels {
    fn name(&self) -> &str {
        "baseline"
    }

    fn init(&self, value: f64, x: &mut [f64]) {
        for i in 0..x.len() {
            x[i] = value;
        }
    }

    fn copy(&self, dst: &mut [f64], src: &[f64]) {
        for i in 0..dst.len() {
            dst[i] = src[i];
        }
    }

    fn reduce(&self, x: &[f64]) -> f64 {
        let mut acc = 0.0;
        for i in 0..x.len() {
            acc += x[i];
        }
        acc
    }

    fn dot(&self, x: &[f64], y: &[f64]) -> f64 {
        let mut acc = 0.0;
        for i in 0..x.len() {
            acc += x[i] * y[i];
        }
        acc
    }

    fn scaled_add(&self, a: f64, x: &[f64], y: &mut [f64]) {
        for i in 0..y.len() {
            y[i] += a * x[i];
        }
    }

    fn vector_sum(&self, out: &mut [f64], x: &[f64], y: &[f64]) {
        for i in 0..out.len() {
            out[i] = x[i] + y[i];
        }
    }

    fn vector_scale(&self, k: f64, x: &mut [f64]) {
        for i in 0..x.len() {
            x[i] *= k;
        }
    }
}
