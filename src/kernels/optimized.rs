//! Hand-optimized kernels.
//!
//! The portable path unrolls by four with independent accumulators. On x86_64
//! an AVX2/FMA path is picked at construction time when the CPU supports it.

use log::debug;

use super::VectorKernels;

/// Instruction-set path used by [`OptimizedKernels`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelPath {
    Scalar,
    #[cfg(target_arch = "x86_64")]
    Avx2Fma,
}

impl KernelPath {
    #[inline(always)]
    pub fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            if std::is_x86_feature_detected!("avx2") && std::is_x86_feature_detected!("fma") {
                return KernelPath::Avx2Fma;
            }
        }

        KernelPath::Scalar
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OptimizedKernels {
    path: KernelPath,
}

impl Default for OptimizedKernels {
    fn default() -> Self {
        Self::new()
    }
}

impl OptimizedKernels {
    /// Uses the widest path the running CPU supports.
    pub fn new() -> Self {
        let path = KernelPath::detect();
        debug!("Optimized kernels using {:?} path", path);
        Self { path }
    }

    /// Forces the portable unrolled path.
    pub fn scalar() -> Self {
        Self {
            path: KernelPath::Scalar,
        }
    }

    pub fn path(&self) -> KernelPath {
        self.path
    }
}

impl VectorKernels for OptimizedKernels {
    fn name(&self) -> &str {
        match self.path {
            KernelPath::Scalar => "optimized (scalar x4)",
            #[cfg(target_arch = "x86_64")]
            KernelPath::Avx2Fma => "optimized (avx2+fma)",
        }
    }

    fn init(&self, value: f64, x: &mut [f64]) {
        match self.path {
            KernelPath::Scalar => x.fill(value),
            // SAFETY: the path is only selected when AVX2 and FMA are present.
            #[cfg(target_arch = "x86_64")]
            KernelPath::Avx2Fma => unsafe { avx2::init(value, x) },
        }
    }

    fn copy(&self, dst: &mut [f64], src: &[f64]) {
        let src = &src[..dst.len()];
        match self.path {
            KernelPath::Scalar => dst.copy_from_slice(src),
            #[cfg(target_arch = "x86_64")]
            KernelPath::Avx2Fma => unsafe { avx2::copy(dst, src) },
        }
    }

    fn reduce(&self, x: &[f64]) -> f64 {
        match self.path {
            KernelPath::Scalar => reduce_unrolled(x),
            #[cfg(target_arch = "x86_64")]
            KernelPath::Avx2Fma => unsafe { avx2::reduce(x) },
        }
    }

    fn dot(&self, x: &[f64], y: &[f64]) -> f64 {
        let y = &y[..x.len()];
        match self.path {
            KernelPath::Scalar => dot_unrolled(x, y),
            #[cfg(target_arch = "x86_64")]
            KernelPath::Avx2Fma => unsafe { avx2::dot(x, y) },
        }
    }

    fn scaled_add(&self, a: f64, x: &[f64], y: &mut [f64]) {
        let x = &x[..y.len()];
        match self.path {
            KernelPath::Scalar => {
                for (yv, &xv) in y.iter_mut().zip(x) {
                    *yv += a * xv;
                }
            }
            #[cfg(target_arch = "x86_64")]
            KernelPath::Avx2Fma => unsafe { avx2::scaled_add(a, x, y) },
        }
    }

    fn vector_sum(&self, out: &mut [f64], x: &[f64], y: &[f64]) {
        let x = &x[..out.len()];
        let y = &y[..out.len()];
        match self.path {
            KernelPath::Scalar => {
                for ((o, &xv), &yv) in out.iter_mut().zip(x).zip(y) {
                    *o = xv + yv;
                }
            }
            #[cfg(target_arch = "x86_64")]
            KernelPath::Avx2Fma => unsafe { avx2::vector_sum(out, x, y) },
        }
    }

    fn vector_scale(&self, k: f64, x: &mut [f64]) {
        match self.path {
            KernelPath::Scalar => {
                for v in x.iter_mut() {
                    *v *= k;
                }
            }
            #[cfg(target_arch = "x86_64")]
            KernelPath::Avx2Fma => unsafe { avx2::vector_scale(k, x) },
        }
    }
}

#[inline(always)]
fn reduce_unrolled(x: &[f64]) -> f64 {
    let mut sum0 = 0.0;
    let mut sum1 = 0.0;
    let mut sum2 = 0.0;
    let mut sum3 = 0.0;

    let mut chunks = x.chunks_exact(4);
    for c in &mut chunks {
        sum0 += c[0];
        sum1 += c[1];
        sum2 += c[2];
        sum3 += c[3];
    }

    let mut sum = (sum0 + sum1) + (sum2 + sum3);
    for &v in chunks.remainder() {
        sum += v;
    }
    sum
}

#[inline(always)]
fn dot_unrolled(x: &[f64], y: &[f64]) -> f64 {
    let mut sum0 = 0.0;
    let mut sum1 = 0.0;
    let mut sum2 = 0.0;
    let mut sum3 = 0.0;

    let mut xs = x.chunks_exact(4);
    let mut ys = y.chunks_exact(4);
    for (a, b) in (&mut xs).zip(&mut ys) {
        sum0 += a[0] * b[0];
        sum1 += a[1] * b[1];
        sum2 += a[2] * b[2];
        sum3 += a[3] * b[3];
    }

    let mut sum = (sum0 + sum1) + (sum2 + sum3);
    for (&a, &b) in xs.remainder().iter().zip(ys.remainder()) {
        sum += a * b;
    }
    sum
}

#[cfg(target_arch = "x86_64")]
mod avx2 {
    use core::arch::x86_64::*;

    // All functions require equal-length operands; callers slice them first.

    #[inline(always)]
    unsafe fn hsum(v: __m256d) -> f64 {
        let mut tmp = [0.0f64; 4];
        unsafe { _mm256_storeu_pd(tmp.as_mut_ptr(), v) };
        (tmp[0] + tmp[1]) + (tmp[2] + tmp[3])
    }

    #[target_feature(enable = "avx2,fma")]
    pub(super) unsafe fn init(value: f64, x: &mut [f64]) {
        let len = x.len();
        let p = x.as_mut_ptr();
        let v = _mm256_set1_pd(value);
        let mut i = 0usize;

        while i + 8 <= len {
            unsafe {
                _mm256_storeu_pd(p.add(i), v);
                _mm256_storeu_pd(p.add(i + 4), v);
            }
            i += 8;
        }
        while i < len {
            unsafe { *p.add(i) = value };
            i += 1;
        }
    }

    #[target_feature(enable = "avx2,fma")]
    pub(super) unsafe fn copy(dst: &mut [f64], src: &[f64]) {
        let len = dst.len();
        let d = dst.as_mut_ptr();
        let s = src.as_ptr();
        let mut i = 0usize;

        while i + 8 <= len {
            unsafe {
                let lo = _mm256_loadu_pd(s.add(i));
                let hi = _mm256_loadu_pd(s.add(i + 4));
                _mm256_storeu_pd(d.add(i), lo);
                _mm256_storeu_pd(d.add(i + 4), hi);
            }
            i += 8;
        }
        while i < len {
            unsafe { *d.add(i) = *s.add(i) };
            i += 1;
        }
    }

    #[target_feature(enable = "avx2,fma")]
    pub(super) unsafe fn reduce(x: &[f64]) -> f64 {
        let len = x.len();
        let p = x.as_ptr();
        let mut acc0 = _mm256_setzero_pd();
        let mut acc1 = _mm256_setzero_pd();
        let mut i = 0usize;

        while i + 8 <= len {
            unsafe {
                acc0 = _mm256_add_pd(acc0, _mm256_loadu_pd(p.add(i)));
                acc1 = _mm256_add_pd(acc1, _mm256_loadu_pd(p.add(i + 4)));
            }
            i += 8;
        }

        let mut sum = unsafe { hsum(_mm256_add_pd(acc0, acc1)) };
        while i < len {
            sum += unsafe { *p.add(i) };
            i += 1;
        }
        sum
    }

    #[target_feature(enable = "avx2,fma")]
    pub(super) unsafe fn dot(x: &[f64], y: &[f64]) -> f64 {
        let len = x.len();
        let a = x.as_ptr();
        let b = y.as_ptr();
        let mut acc0 = _mm256_setzero_pd();
        let mut acc1 = _mm256_setzero_pd();
        let mut i = 0usize;

        while i + 8 <= len {
            unsafe {
                acc0 = _mm256_fmadd_pd(_mm256_loadu_pd(a.add(i)), _mm256_loadu_pd(b.add(i)), acc0);
                acc1 = _mm256_fmadd_pd(
                    _mm256_loadu_pd(a.add(i + 4)),
                    _mm256_loadu_pd(b.add(i + 4)),
                    acc1,
                );
            }
            i += 8;
        }

        let mut sum = unsafe { hsum(_mm256_add_pd(acc0, acc1)) };
        while i < len {
            let (av, bv) = unsafe { (*a.add(i), *b.add(i)) };
            sum = av.mul_add(bv, sum);
            i += 1;
        }
        sum
    }

    #[target_feature(enable = "avx2,fma")]
    pub(super) unsafe fn scaled_add(a: f64, x: &[f64], y: &mut [f64]) {
        let len = y.len();
        let xp = x.as_ptr();
        let yp = y.as_mut_ptr();
        let va = _mm256_set1_pd(a);
        let mut i = 0usize;

        while i + 4 <= len {
            unsafe {
                let r = _mm256_fmadd_pd(va, _mm256_loadu_pd(xp.add(i)), _mm256_loadu_pd(yp.add(i)));
                _mm256_storeu_pd(yp.add(i), r);
            }
            i += 4;
        }
        while i < len {
            unsafe { *yp.add(i) = a.mul_add(*xp.add(i), *yp.add(i)) };
            i += 1;
        }
    }

    #[target_feature(enable = "avx2,fma")]
    pub(super) unsafe fn vector_sum(out: &mut [f64], x: &[f64], y: &[f64]) {
        let len = out.len();
        let op = out.as_mut_ptr();
        let xp = x.as_ptr();
        let yp = y.as_ptr();
        let mut i = 0usize;

        while i + 4 <= len {
            unsafe {
                let r = _mm256_add_pd(_mm256_loadu_pd(xp.add(i)), _mm256_loadu_pd(yp.add(i)));
                _mm256_storeu_pd(op.add(i), r);
            }
            i += 4;
        }
        while i < len {
            unsafe { *op.add(i) = *xp.add(i) + *yp.add(i) };
            i += 1;
        }
    }

    #[target_feature(enable = "avx2,fma")]
    pub(super) unsafe fn vector_scale(k: f64, x: &mut [f64]) {
        let len = x.len();
        let p = x.as_mut_ptr();
        let vk = _mm256_set1_pd(k);
        let mut i = 0usize;

        while i + 4 <= len {
            unsafe {
                let r = _mm256_mul_pd(_mm256_loadu_pd(p.add(i)), vk);
                _mm256_storeu_pd(p.add(i), r);
            }
            i += 4;
        }
        while i < len {
            unsafe { *p.add(i) *= k };
            i += 1;
        }
    }
}
