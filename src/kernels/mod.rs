//! Vector kernels under comparison and the operation descriptor that drives them.
//!
//! A [`VectorKernels`] implementation supplies one function per
//! [`OperationKind`]. The driver never calls those functions directly: it asks
//! the kind to [`bind`](OperationKind::bind) a kernel set to concrete operand
//! buffers, which yields a single repetition closure regardless of arity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::aligned_vector::FillMode;
use crate::errors::{BenchmarkError, BenchmarkResult, ConfigError};

pub mod baseline;
pub mod optimized;

pub use baseline::BaselineKernels;
pub use optimized::{KernelPath, OptimizedKernels};

/// The contract every implementation strategy fulfils.
///
/// Operand slices never alias one another and all have the same length.
/// Implementations must not touch memory past `len()`.
pub trait VectorKernels {
    /// Short label used in logs and reports.
    fn name(&self) -> &str;

    /// `x[i] = value`
    fn init(&self, value: f64, x: &mut [f64]);

    /// `dst[i] = src[i]`
    fn copy(&self, dst: &mut [f64], src: &[f64]);

    /// `Σ x[i]`
    fn reduce(&self, x: &[f64]) -> f64;

    /// `Σ x[i] * y[i]`
    fn dot(&self, x: &[f64], y: &[f64]) -> f64;

    /// `y[i] += a * x[i]`
    fn scaled_add(&self, a: f64, x: &[f64], y: &mut [f64]);

    /// `out[i] = x[i] + y[i]`
    fn vector_sum(&self, out: &mut [f64], x: &[f64], y: &[f64]);

    /// `x[i] *= k`
    fn vector_scale(&self, k: f64, x: &mut [f64]);
}

/// Where an operation leaves its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// The operand at this index is mutated in place.
    Operand(usize),
    /// One scalar per repetition.
    Scalar,
}

/// Benchmarked vector primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Init,
    Copy,
    Reduce,
    DotProd,
    ScaledAdd,
    VectorSum,
    VectorScale,
}

/// One repetition of an operation bound to its operands.
///
/// Returns the scalar result for scalar-producing kinds, `None` otherwise.
pub type BoundOperation<'a> = Box<dyn FnMut() -> Option<f64> + 'a>;

impl OperationKind {
    pub const ALL: [OperationKind; 7] = [
        OperationKind::Init,
        OperationKind::Copy,
        OperationKind::Reduce,
        OperationKind::DotProd,
        OperationKind::ScaledAdd,
        OperationKind::VectorSum,
        OperationKind::VectorScale,
    ];

    /// Name accepted on the command line and printed in reports.
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Init => "init",
            OperationKind::Copy => "copy",
            OperationKind::Reduce => "reduc",
            OperationKind::DotProd => "dotprod",
            OperationKind::ScaledAdd => "gaxpy",
            OperationKind::VectorSum => "vec_sum",
            OperationKind::VectorScale => "vec_scale",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            OperationKind::Init => "x[i] = k",
            OperationKind::Copy => "x[i] = y[i]",
            OperationKind::Reduce => "r = sum(x[i])",
            OperationKind::DotProd => "d = sum(x[i] * y[i])",
            OperationKind::ScaledAdd => "y[i] += a * x[i]",
            OperationKind::VectorSum => "z[i] = x[i] + y[i]",
            OperationKind::VectorScale => "x[i] *= k",
        }
    }

    /// Initial content of each vector operand, in operand order.
    pub fn operand_fills(self) -> &'static [FillMode] {
        use FillMode::{Random, Zero};
        match self {
            OperationKind::Init => &[Zero],
            OperationKind::Copy => &[Zero, Random],
            OperationKind::Reduce => &[Random],
            OperationKind::DotProd => &[Random, Random],
            OperationKind::ScaledAdd => &[Random, Random],
            OperationKind::VectorSum => &[Zero, Random, Random],
            OperationKind::VectorScale => &[Random],
        }
    }

    /// Number of vector operands (1 to 3).
    pub fn arity(self) -> usize {
        self.operand_fills().len()
    }

    /// Whether the operation takes a scalar coefficient.
    pub fn takes_coefficient(self) -> bool {
        matches!(
            self,
            OperationKind::Init | OperationKind::ScaledAdd | OperationKind::VectorScale
        )
    }

    pub fn output(self) -> OutputKind {
        match self {
            OperationKind::Reduce | OperationKind::DotProd => OutputKind::Scalar,
            OperationKind::ScaledAdd => OutputKind::Operand(1),
            OperationKind::Init
            | OperationKind::Copy
            | OperationKind::VectorSum
            | OperationKind::VectorScale => OutputKind::Operand(0),
        }
    }

    /// Binds `kernels` to `operands` for this kind.
    ///
    /// Fails before any work happens when the operand count does not match
    /// [`arity`](Self::arity). `coefficient` is ignored by kinds that take none.
    pub fn bind<'a>(
        self,
        kernels: &'a dyn VectorKernels,
        operands: Vec<&'a mut [f64]>,
        coefficient: f64,
    ) -> BenchmarkResult<BoundOperation<'a>> {
        let bound: BoundOperation<'a> = match self {
            OperationKind::Init => {
                let [x] = self.take_operands::<1>(operands)?;
                Box::new(move || {
                    kernels.init(coefficient, x);
                    None
                })
            }
            OperationKind::Copy => {
                let [dst, src] = self.take_operands::<2>(operands)?;
                Box::new(move || {
                    kernels.copy(dst, src);
                    None
                })
            }
            OperationKind::Reduce => {
                let [x] = self.take_operands::<1>(operands)?;
                Box::new(move || Some(kernels.reduce(x)))
            }
            OperationKind::DotProd => {
                let [x, y] = self.take_operands::<2>(operands)?;
                Box::new(move || Some(kernels.dot(x, y)))
            }
            OperationKind::ScaledAdd => {
                let [x, y] = self.take_operands::<2>(operands)?;
                Box::new(move || {
                    kernels.scaled_add(coefficient, x, y);
                    None
                })
            }
            OperationKind::VectorSum => {
                let [out, x, y] = self.take_operands::<3>(operands)?;
                Box::new(move || {
                    kernels.vector_sum(out, x, y);
                    None
                })
            }
            OperationKind::VectorScale => {
                let [x] = self.take_operands::<1>(operands)?;
                Box::new(move || {
                    kernels.vector_scale(coefficient, x);
                    None
                })
            }
        };
        Ok(bound)
    }

    fn take_operands<'a, const N: usize>(
        self,
        operands: Vec<&'a mut [f64]>,
    ) -> BenchmarkResult<[&'a mut [f64]; N]> {
        let provided = operands.len();
        operands
            .try_into()
            .map_err(|_| BenchmarkError::OperandCountMismatch {
                kind: self,
                expected: N,
                provided,
            })
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "init" => OperationKind::Init,
            "copy" => OperationKind::Copy,
            "reduc" | "reduce" => OperationKind::Reduce,
            "dotprod" | "dot" | "dot_prod" => OperationKind::DotProd,
            "gaxpy" | "axpy" | "scaled-add" | "scaled_add" => OperationKind::ScaledAdd,
            "vec_sum" | "vector-sum" | "vector_sum" => OperationKind::VectorSum,
            "vec_scale" | "vector-scale" | "vector_scale" => OperationKind::VectorScale,
            _ => {
                return Err(ConfigError::UnknownKind {
                    kind: s.to_string(),
                })
            }
        };
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_from_str() {
        for kind in OperationKind::ALL {
            assert_eq!(kind.as_str().parse::<OperationKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_aliases_are_accepted() {
        assert_eq!("scaled-add".parse::<OperationKind>().unwrap(), OperationKind::ScaledAdd);
        assert_eq!("vector-sum".parse::<OperationKind>().unwrap(), OperationKind::VectorSum);
        assert_eq!("REDUCE".parse::<OperationKind>().unwrap(), OperationKind::Reduce);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let result = "matmul".parse::<OperationKind>();
        assert!(matches!(result, Err(ConfigError::UnknownKind { kind }) if kind == "matmul"));
    }

    #[test]
    fn test_output_operand_is_within_arity() {
        for kind in OperationKind::ALL {
            if let OutputKind::Operand(index) = kind.output() {
                assert!(index < kind.arity(), "{kind}");
            }
        }
    }

    #[test]
    fn test_bind_rejects_wrong_operand_count() {
        let kernels = BaselineKernels;
        let mut a = vec![1.0; 4];
        let result = OperationKind::DotProd.bind(&kernels, vec![a.as_mut_slice()], 0.0);
        assert!(matches!(
            result,
            Err(BenchmarkError::OperandCountMismatch {
                kind: OperationKind::DotProd,
                expected: 2,
                provided: 1,
            })
        ));
    }

    #[test]
    fn test_bound_scaled_add_mutates_second_operand() {
        let kernels = BaselineKernels;
        let mut x = vec![1.0, 2.0, 3.0];
        let mut y = vec![1.0, 1.0, 1.0];
        {
            let mut op = OperationKind::ScaledAdd
                .bind(&kernels, vec![x.as_mut_slice(), y.as_mut_slice()], 2.0)
                .unwrap();
            assert_eq!(op(), None);
        }
        assert_eq!(y, vec![3.0, 5.0, 7.0]);
        assert_eq!(x, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_bound_reduce_returns_scalar() {
        let kernels = BaselineKernels;
        let mut x = vec![1.0, 2.0, 3.0, 4.0];
        let mut op = OperationKind::Reduce
            .bind(&kernels, vec![x.as_mut_slice()], 0.0)
            .unwrap();
        assert_eq!(op(), Some(10.0));
    }
}
