//! Core types for sparse-dense aggregation
//!
//! This crate provides the data model and execution layer shared by the
//! aggregation kernels in `spmm-kernels`.
//!
//! # Architecture Overview
//!
//! 1. **Descriptors** - [`CsrMatrix`], [`CooMatrix`] and [`DenseTensor`]
//! 2. **Broadcasting** - [`BcastInfo`] maps output feature offsets onto
//!    operand offsets
//! 3. **Execution Engines** - sequential or Rayon-backed fan-out over rows
//!    and entries
//!
//! # Example
//!
//! ```rust
//! use spmm_core::{execution::sequential, CsrMatrix, ExecutionEngine};
//!
//! let csr = CsrMatrix::<i64>::from_edges(3, 3, &[(0, 1), (2, 0)]).unwrap();
//! csr.validate().unwrap();
//! assert_eq!(csr.nnz(), 2);
//!
//! let engine = sequential();
//! assert_eq!(engine.num_threads(), 1);
//! ```

pub mod bcast;
pub mod config;
pub mod dense;
pub mod error;
pub mod execution;
pub mod numeric;
pub mod sparse;

// Re-export core types
pub use error::{Error, Result};

pub use execution::{
    auto_engine, sequential, ConfiguredEngine, ExecutionEngine, ExecutionMode, ExecutionStrategy,
    SequentialEngine,
};
#[cfg(feature = "parallel")]
pub use execution::{parallel, ParallelEngine};

pub use bcast::BcastInfo;
pub use config::SpmmConfig;
pub use dense::DenseTensor;
pub use numeric::{AtomicAccumulator, AtomicF32, AtomicF64, IndexType, Numeric};
pub use sparse::{CooMatrix, CsrMatrix, SparseFormat, SparseMatrix};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        BcastInfo, ConfiguredEngine, CooMatrix, CsrMatrix, DenseTensor, Error, ExecutionEngine,
        ExecutionStrategy, IndexType, Numeric, Result, SequentialEngine, SparseMatrix,
        SpmmConfig,
    };

    #[cfg(feature = "parallel")]
    pub use crate::ParallelEngine;
}
