//! Cache-line aligned `f64` buffers and the factory that builds comparable pairs.
//!
//! Every benchmark operand comes as a [`VectorPair`]: one buffer handed to the
//! baseline kernels and one handed to the candidate kernels. Both start out with
//! bit-identical content so that any divergence after a run is caused by the
//! kernels under test.

use std::alloc::{Layout, alloc_zeroed, dealloc, handle_alloc_error};
use std::fmt;
use std::ops::{Deref, DerefMut, Range};
use std::ptr::NonNull;

use log::{debug, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::errors::{BenchmarkError, BenchmarkResult};

/// Byte alignment of every buffer start address (one cache line, one AVX-512 register).
pub const ALIGNMENT: usize = 64;

/// Size of a single vector element in bytes.
pub const ELEMENT_SIZE: usize = std::mem::size_of::<f64>();

/// Range sampled by [`FillMode::Random`] and by scalar coefficient draws.
///
/// It excludes zero so relative errors against reference outputs stay finite.
pub const FILL_RANGE: Range<f64> = 0.5..1.5;

/// How a freshly allocated pair is initialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    /// Both buffers hold `0.0`. Used for pure output operands.
    Zero,
    /// Each position gets one uniform draw from [`FILL_RANGE`], written to both buffers.
    Random,
}

/// Selects which buffer of a [`VectorPair`] an implementation operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Baseline,
    Candidate,
}

/// Owned, zero-initialised, [`ALIGNMENT`]-aligned `f64` storage.
pub struct AlignedBuffer {
    ptr: NonNull<f64>,
    len: usize,
    layout: Layout,
}

// The buffer exclusively owns its allocation.
unsafe impl Send for AlignedBuffer {}
unsafe impl Sync for AlignedBuffer {}

impl AlignedBuffer {
    /// Allocates `len` zeroed elements.
    ///
    /// Aborts the process through [`handle_alloc_error`] when the allocator
    /// cannot satisfy the request.
    ///
    /// A `len` whose byte size cannot be described by a [`Layout`] (above
    /// `isize::MAX`) never reaches the allocator and is returned as
    /// [`BenchmarkError::InvalidLayout`].
    pub fn zeroed(len: usize) -> BenchmarkResult<Self> {
        let bytes = len
            .checked_mul(ELEMENT_SIZE)
            .ok_or_else(|| BenchmarkError::InvalidLayout {
                elements: len,
                message: "byte size overflows usize".to_string(),
            })?;

        // Empty buffers still reserve one line so the pointer is real and aligned.
        let layout = Layout::from_size_align(bytes.max(ALIGNMENT), ALIGNMENT).map_err(|e| {
            BenchmarkError::InvalidLayout {
                elements: len,
                message: e.to_string(),
            }
        })?;

        // SAFETY: `layout` has a non-zero size.
        let raw = unsafe { alloc_zeroed(layout) };
        let ptr = match NonNull::new(raw.cast::<f64>()) {
            Some(ptr) => ptr,
            None => handle_alloc_error(layout),
        };

        debug!(
            "Allocated {} bytes at {:?} with alignment {}",
            layout.size(),
            ptr,
            ALIGNMENT
        );

        Ok(Self { ptr, len, layout })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true when the start address honours [`ALIGNMENT`].
    pub fn is_aligned(&self) -> bool {
        (self.ptr.as_ptr() as usize) % ALIGNMENT == 0
    }

    pub fn as_slice(&self) -> &[f64] {
        // SAFETY: `ptr` points to `len` initialised elements owned by `self`.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        // SAFETY: as above, and `&mut self` guarantees exclusive access.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Deref for AlignedBuffer {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        self.as_slice()
    }
}

impl DerefMut for AlignedBuffer {
    fn deref_mut(&mut self) -> &mut [f64] {
        self.as_mut_slice()
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        // SAFETY: allocated in `zeroed` with exactly this layout.
        unsafe { dealloc(self.ptr.as_ptr().cast::<u8>(), self.layout) };
    }
}

impl fmt::Debug for AlignedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("len", &self.len)
            .field("ptr", &self.ptr)
            .finish()
    }
}

/// Two equal-length buffers with identical initial content.
#[derive(Debug)]
pub struct VectorPair {
    pub baseline: AlignedBuffer,
    pub candidate: AlignedBuffer,
}

impl VectorPair {
    pub fn len(&self) -> usize {
        self.baseline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.baseline.is_empty()
    }

    pub fn side(&self, side: Side) -> &[f64] {
        match side {
            Side::Baseline => &self.baseline,
            Side::Candidate => &self.candidate,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut [f64] {
        match side {
            Side::Baseline => &mut self.baseline,
            Side::Candidate => &mut self.candidate,
        }
    }
}

/// Builds [`VectorPair`]s from a byte size, a fill mode and a seeded generator.
pub struct AlignedVectorPairFactory;

impl AlignedVectorPairFactory {
    /// Number of whole elements that fit in `size_bytes`.
    ///
    /// A size that is not a multiple of [`ELEMENT_SIZE`] is rounded down with a
    /// warning. A size below one element is rejected.
    pub fn element_count(size_bytes: usize) -> BenchmarkResult<usize> {
        let adjusted = Self::adjusted_size_bytes(size_bytes);
        if adjusted != size_bytes {
            warn!(
                "Size {} is not a multiple of {}, using the nearest multiple ({}) instead",
                size_bytes, ELEMENT_SIZE, adjusted
            );
        }

        let len = adjusted / ELEMENT_SIZE;
        if len == 0 {
            return Err(BenchmarkError::InvalidVectorSize { size_bytes });
        }
        Ok(len)
    }

    /// Largest multiple of [`ELEMENT_SIZE`] not above `size_bytes`.
    pub fn adjusted_size_bytes(size_bytes: usize) -> usize {
        size_bytes - size_bytes % ELEMENT_SIZE
    }

    /// Creates a pair with a generator seeded from `seed`.
    ///
    /// Identical `(size_bytes, fill, seed)` always yield bit-identical buffers.
    pub fn create(size_bytes: usize, fill: FillMode, seed: u64) -> BenchmarkResult<VectorPair> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Self::create_with_rng(size_bytes, fill, &mut rng)
    }

    /// Creates a pair drawing random content from a caller-owned generator.
    pub fn create_with_rng<R: Rng + ?Sized>(
        size_bytes: usize,
        fill: FillMode,
        rng: &mut R,
    ) -> BenchmarkResult<VectorPair> {
        let len = Self::element_count(size_bytes)?;
        Self::with_len(len, fill, rng)
    }

    /// Creates a pair of exactly `len` elements.
    pub fn with_len<R: Rng + ?Sized>(
        len: usize,
        fill: FillMode,
        rng: &mut R,
    ) -> BenchmarkResult<VectorPair> {
        let mut baseline = AlignedBuffer::zeroed(len)?;
        let mut candidate = AlignedBuffer::zeroed(len)?;

        if fill == FillMode::Random {
            for (b, c) in baseline.iter_mut().zip(candidate.iter_mut()) {
                let value = rng.gen_range(FILL_RANGE);
                *b = value;
                *c = value;
            }
        }

        Ok(VectorPair {
            baseline,
            candidate,
        })
    }

    /// Creates a pair holding a copy of `values` on both sides.
    pub fn from_values(values: &[f64]) -> BenchmarkResult<VectorPair> {
        let mut baseline = AlignedBuffer::zeroed(values.len())?;
        let mut candidate = AlignedBuffer::zeroed(values.len())?;
        baseline.copy_from_slice(values);
        candidate.copy_from_slice(values);
        Ok(VectorPair {
            baseline,
            candidate,
        })
    }

    /// Draws one scalar coefficient from the same distribution as random fills.
    pub fn draw_scalar<R: Rng + ?Sized>(rng: &mut R) -> f64 {
        rng.gen_range(FILL_RANGE)
    }

    /// Zeroed storage for `len` per-repetition scalar results.
    ///
    /// Follows the same rules as [`AlignedBuffer::zeroed`]: an unrepresentable
    /// size is an error, an allocator failure aborts.
    pub fn scalar_slots(len: usize) -> BenchmarkResult<Vec<f64>> {
        let layout = Layout::array::<f64>(len).map_err(|e| BenchmarkError::InvalidLayout {
            elements: len,
            message: e.to_string(),
        })?;

        let mut slots = Vec::new();
        if slots.try_reserve_exact(len).is_err() {
            handle_alloc_error(layout);
        }
        slots.resize(len, 0.0);
        Ok(slots)
    }
}
