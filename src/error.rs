//! Error types for tilemm operations.
//!
//! Every precondition the kernels rely on (dimension, tile sizes, alignment,
//! backend availability) is checked up front and reported through [`Error`]
//! instead of producing silently wrong numbers.

use thiserror::Error;

/// Errors that can occur while allocating matrices or running a kernel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Memory allocation failed.
    #[error("Memory allocation failed: {message} (requested {requested_size} bytes with {requested_alignment} byte alignment)")]
    Allocation {
        /// The size that was requested to be allocated.
        requested_size: usize,
        /// The alignment that was requested.
        requested_alignment: usize,
        /// Human-readable error message.
        message: String,
    },

    /// Invalid layout parameters were provided.
    #[error("Invalid memory layout: {message} (size: {size}, alignment: {alignment})")]
    Layout {
        size: usize,
        alignment: usize,
        message: String,
    },

    /// Configuration or input validation error.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// An operand does not have the dimension the kernel was configured for.
    #[error("Dimension mismatch for operand {operand}: expected {expected}x{expected}, got {actual}x{actual}")]
    DimensionMismatch {
        operand: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A row of an operand does not start on the alignment the vector loads require.
    #[error("Operand {operand} row {row} is not aligned to {alignment} bytes")]
    Misaligned {
        operand: &'static str,
        row: usize,
        alignment: usize,
    },

    /// A `Storage` implementation handed out a row (or a row set) whose length
    /// is not the dimension it reports.
    #[error("Operand {operand} row {row} has {actual} values, expected {expected}")]
    RowLength {
        operand: &'static str,
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// The requested vector backend is not available on this CPU or toolchain.
    #[error("Backend {backend} is not supported on this machine")]
    UnsupportedBackend { backend: String },
}

/// Result type alias for tilemm operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Creates an allocation error.
pub fn allocation_error(size: usize, alignment: usize, message: impl Into<String>) -> Error {
    Error::Allocation {
        requested_size: size,
        requested_alignment: alignment,
        message: message.into(),
    }
}

/// Creates a layout error.
pub fn layout_error(size: usize, alignment: usize, message: impl Into<String>) -> Error {
    Error::Layout {
        size,
        alignment,
        message: message.into(),
    }
}

/// Creates a validation error.
pub fn validation_error(message: impl Into<String>) -> Error {
    Error::Validation {
        message: message.into(),
    }
}
