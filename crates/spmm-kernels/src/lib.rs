//! Sparse-dense aggregation kernels for graph message passing
//!
//! Every kernel reduces, per destination, the values
//! `op(ufeat[src], efeat[edge])` of the sparse entries pointing at it.
//!
//! # Kernels
//!
//! | layout | sum | max / min |
//! |--------|-----|-----------|
//! | CSR (destination = row)    | [`spmm_sum_csr`] | [`spmm_cmp_csr`] |
//! | COO (destination = column) | [`spmm_sum_coo`] | [`spmm_cmp_coo`] |
//!
//! Each has a `spmm_bcast_*` twin taking a [`BcastInfo`](spmm_core::BcastInfo)
//! for operands whose feature shapes differ.
//!
//! # Example
//!
//! ```rust
//! use spmm_core::{execution::sequential, CsrMatrix, DenseTensor};
//! use spmm_kernels::{ops::Add, spmm_sum_csr};
//!
//! let csr = CsrMatrix::<i64>::new(2, 2, vec![0, 2, 2], vec![0, 1], None);
//! let ufeat = DenseTensor::from_vec(vec![2, 1], vec![1.0, 2.0]).unwrap();
//! let efeat = DenseTensor::from_vec(vec![2, 1], vec![0.5, 0.5]).unwrap();
//! let mut out = DenseTensor::zeros(&[2, 1]);
//!
//! spmm_sum_csr(&sequential(), Add, &csr, &ufeat, &efeat, &mut out).unwrap();
//! assert_eq!(out.as_slice(), &[4.0, 0.0]);
//! ```

pub mod coo;
pub mod csr;
pub mod dispatch;
pub mod features;
pub mod ops;
mod rows;
mod validate;

pub use spmm_core::{Error, Result};

pub use coo::{spmm_bcast_cmp_coo, spmm_bcast_sum_coo, spmm_cmp_coo, spmm_sum_coo};
pub use csr::{spmm_bcast_cmp_csr, spmm_bcast_sum_csr, spmm_cmp_csr, spmm_sum_csr};
pub use dispatch::{AggregateOutcome, Spmm};
pub use features::{Aligned, Broadcast, FeatureMap};
pub use ops::{BinaryOpKind, BinaryOperator, Comparator, ReduceKind};
