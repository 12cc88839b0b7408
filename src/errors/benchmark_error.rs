//! Error types for benchmark operations.

use thiserror::Error;

use super::ConfigError;
use crate::kernels::OperationKind;

#[derive(Error, Debug)]
pub enum BenchmarkError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Operation '{kind}' expects {expected} vector operands, got {provided}")]
    OperandCountMismatch {
        kind: OperationKind,
        expected: usize,
        provided: usize,
    },

    #[error("Invalid number of repetitions: {value}. Must be greater than 0")]
    InvalidRepetitions { value: usize },

    #[error("Error tolerance must be a finite value >= 0, got {value}")]
    InvalidTolerance { value: f64 },

    #[error("Vector size must hold at least one element, got {size_bytes} bytes")]
    InvalidVectorSize { size_bytes: usize },

    #[error("Result sequences differ in length: reference {reference}, candidate {candidate}")]
    LengthMismatch { reference: usize, candidate: usize },

    #[error("Cannot compute relative error over an empty sequence")]
    EmptySequence,

    #[error("Cannot build an aligned layout for {elements} elements: {message}")]
    InvalidLayout { elements: usize, message: String },

    #[error("Failed to serialize benchmark record: {0}")]
    Serialization(#[from] serde_json::Error),
}
