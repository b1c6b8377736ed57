//! Sparse-dense aggregation for graph message passing
//!
//! Facade over the workspace crates:
//!
//! - [`core`] (`spmm-core`): sparse descriptors, dense tensors, broadcast
//!   metadata, configuration and execution engines
//! - [`kernels`] (`spmm-kernels`): the CSR / COO aggregation kernels and the
//!   [`Spmm`] front door
//!
//! # Example
//!
//! ```rust
//! use spmm::prelude::*;
//!
//! // dst 0 <- src 0, src 1; dst 2 <- src 0
//! let graph: SparseMatrix = CsrMatrix::<i64>::from_edges(3, 3, &[(0, 0), (0, 1), (2, 0)])
//!     .unwrap()
//!     .into();
//! let ufeat = DenseTensor::from_vec(vec![3, 1], vec![10.0, 20.0, 30.0]).unwrap();
//! let mut out = DenseTensor::zeros(&[3, 1]);
//!
//! Spmm::sequential()
//!     .aggregate("copy_u", "sum", &graph, &ufeat, &DenseTensor::empty(), &mut out, None, None)
//!     .unwrap();
//! assert_eq!(out.as_slice(), &[30.0, 0.0, 10.0]);
//! ```

pub use spmm_core as core;
pub use spmm_kernels as kernels;

pub use spmm_core::{
    auto_engine, sequential, BcastInfo, ConfiguredEngine, CooMatrix, CsrMatrix, DenseTensor,
    Error, ExecutionEngine, ExecutionStrategy, IndexType, Numeric, Result, SequentialEngine,
    SparseFormat, SparseMatrix, SpmmConfig,
};
#[cfg(feature = "parallel")]
pub use spmm_core::{parallel, ParallelEngine};

pub use spmm_kernels::{
    ops, spmm_bcast_cmp_coo, spmm_bcast_cmp_csr, spmm_bcast_sum_coo, spmm_bcast_sum_csr,
    spmm_cmp_coo, spmm_cmp_csr, spmm_sum_coo, spmm_sum_csr, AggregateOutcome, BinaryOpKind,
    ReduceKind, Spmm,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use spmm_core::prelude::*;
    pub use spmm_kernels::ops::{Add, CopyLhs, CopyRhs, Max, Min, Mul};
    pub use spmm_kernels::{AggregateOutcome, BinaryOpKind, ReduceKind, Spmm};
}
