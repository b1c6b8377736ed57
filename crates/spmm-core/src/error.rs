//! Error types for sparse-dense aggregation
//!
//! Provides a unified error type for all spmm crates.

use thiserror::Error;

/// Core error type for aggregation kernels
#[derive(Error, Debug)]
pub enum Error {
    /// Combine operator identifier outside the supported set
    #[error("Unsupported SpMM binary operator: {0}")]
    UnsupportedOperator(String),

    /// Reducer identifier outside the supported set
    #[error("Unsupported SpMM reducer: {0}")]
    UnsupportedReducer(String),

    /// Sparse descriptor violates its structural invariants
    #[error("Malformed sparse structure: {0}")]
    MalformedSparse(String),

    /// Dense buffer shape does not match the sparse descriptor or the other operands
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Feature shapes cannot be unified by broadcasting
    #[error("Broadcast error: {0}")]
    Broadcast(String),

    /// Invalid parameter provided to a function
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Threading or parallelization error
    #[error("Execution error: {0}")]
    Execution(String),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

// Helper functions for common error patterns

impl Error {
    /// Create an error for a malformed sparse descriptor
    pub fn malformed(layout: &str, detail: impl std::fmt::Display) -> Self {
        Self::MalformedSparse(format!("{layout}: {detail}"))
    }

    /// Create an error for size mismatch
    pub fn size_mismatch(expected: usize, actual: usize, context: &str) -> Self {
        Self::ShapeMismatch(format!(
            "{context}: expected {expected}, got {actual}"
        ))
    }

    /// Create an error for an out-of-range sparse index
    pub fn index_out_of_bounds(layout: &str, what: &str, position: usize, bound: usize) -> Self {
        Self::malformed(
            layout,
            format!("{what} at position {position} out of bounds for extent {bound}"),
        )
    }
}
