//! Identifier-driven front door over the kernel catalog
//!
//! [`Spmm`] resolves operator and reducer identifiers once, picks the CSR or
//! COO engine from the descriptor, and switches to the broadcast variant when
//! the operand feature shapes differ.

use crate::ops::{BinaryOpKind, ReduceKind};
use crate::{coo, csr};
use spmm_core::{
    BcastInfo, ConfiguredEngine, DenseTensor, ExecutionEngine, IndexType, Numeric, Result,
    SequentialEngine, SparseFormat, SparseMatrix, SpmmConfig,
};
use tracing::{debug, instrument, trace};

/// What an [`Spmm::aggregate`] call ran
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AggregateOutcome {
    pub format: SparseFormat,
    pub op: BinaryOpKind,
    pub reduce: ReduceKind,
    pub broadcast: bool,
}

/// Aggregation front door bound to an execution engine
#[derive(Clone, Debug, Default)]
pub struct Spmm<E: ExecutionEngine = SequentialEngine> {
    engine: E,
}

impl Spmm<SequentialEngine> {
    /// Front door running every kernel on the calling thread
    pub fn sequential() -> Self {
        Self::new(SequentialEngine::new())
    }
}

impl Spmm<ConfiguredEngine> {
    /// Build the engine described by `config`
    pub fn from_config(config: &SpmmConfig) -> Result<Self> {
        Ok(Self::new(config.build_engine()?))
    }
}

impl<E: ExecutionEngine> Spmm<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Aggregate with operator and reducer given by name
    ///
    /// # Errors
    /// `UnsupportedOperator` / `UnsupportedReducer` for unknown identifiers,
    /// otherwise whatever the selected kernel reports.
    #[allow(clippy::too_many_arguments)]
    pub fn aggregate<T: Numeric, I: IndexType>(
        &self,
        op: &str,
        reduce: &str,
        graph: &SparseMatrix<I>,
        ufeat: &DenseTensor<T>,
        efeat: &DenseTensor<T>,
        out: &mut DenseTensor<T>,
        argu: Option<&mut DenseTensor<I>>,
        arge: Option<&mut DenseTensor<I>>,
    ) -> Result<AggregateOutcome> {
        let op = BinaryOpKind::parse(op)?;
        let reduce = ReduceKind::parse(reduce)?;
        self.aggregate_with(op, reduce, graph, ufeat, efeat, out, argu, arge)
    }

    /// Aggregate with already resolved operator and reducer
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip_all, fields(op = %op, reduce = %reduce, format = graph.format().name()))]
    pub fn aggregate_with<T: Numeric, I: IndexType>(
        &self,
        op: BinaryOpKind,
        reduce: ReduceKind,
        graph: &SparseMatrix<I>,
        ufeat: &DenseTensor<T>,
        efeat: &DenseTensor<T>,
        out: &mut DenseTensor<T>,
        argu: Option<&mut DenseTensor<I>>,
        arge: Option<&mut DenseTensor<I>>,
    ) -> Result<AggregateOutcome> {
        let bcast = broadcast_info(op, ufeat, efeat)?;
        trace!(strategy = ?self.engine.strategy(), threads = self.engine.num_threads(), "engine");
        debug!(broadcast = bcast.is_some(), nnz = graph.nnz(), "dispatching aggregation");

        let engine = &self.engine;
        match (graph, reduce, &bcast) {
            (SparseMatrix::Csr(m), ReduceKind::Sum, None) => {
                crate::with_binary_op!(op, o => csr::spmm_sum_csr(engine, o, m, ufeat, efeat, out))
            }
            (SparseMatrix::Csr(m), ReduceKind::Sum, Some(info)) => {
                crate::with_binary_op!(op, o => csr::spmm_bcast_sum_csr(engine, o, info, m, ufeat, efeat, out))
            }
            (SparseMatrix::Coo(m), ReduceKind::Sum, None) => {
                crate::with_binary_op!(op, o => coo::spmm_sum_coo(engine, o, m, ufeat, efeat, out))
            }
            (SparseMatrix::Coo(m), ReduceKind::Sum, Some(info)) => {
                crate::with_binary_op!(op, o => coo::spmm_bcast_sum_coo(engine, o, info, m, ufeat, efeat, out))
            }
            (SparseMatrix::Csr(m), _, None) => crate::with_binary_op!(op, o => {
                crate::with_comparator!(reduce, c => csr::spmm_cmp_csr(engine, o, c, m, ufeat, efeat, out, argu, arge))
            }),
            (SparseMatrix::Csr(m), _, Some(info)) => crate::with_binary_op!(op, o => {
                crate::with_comparator!(reduce, c => csr::spmm_bcast_cmp_csr(engine, o, c, info, m, ufeat, efeat, out, argu, arge))
            }),
            (SparseMatrix::Coo(m), _, None) => crate::with_binary_op!(op, o => {
                crate::with_comparator!(reduce, c => coo::spmm_cmp_coo(engine, o, c, m, ufeat, efeat, out, argu, arge))
            }),
            (SparseMatrix::Coo(m), _, Some(info)) => crate::with_binary_op!(op, o => {
                crate::with_comparator!(reduce, c => coo::spmm_bcast_cmp_coo(engine, o, c, info, m, ufeat, efeat, out, argu, arge))
            }),
        }?;

        Ok(AggregateOutcome {
            format: graph.format(),
            op,
            reduce,
            broadcast: bcast.is_some(),
        })
    }
}

/// Broadcast descriptor when both operands are read and their feature
/// shapes differ
fn broadcast_info<T: Numeric>(
    op: BinaryOpKind,
    ufeat: &DenseTensor<T>,
    efeat: &DenseTensor<T>,
) -> Result<Option<BcastInfo>> {
    if !(op.uses_lhs() && op.uses_rhs()) || ufeat.feature_shape() == efeat.feature_shape() {
        return Ok(None);
    }
    BcastInfo::from_feature_shapes(ufeat.feature_shape(), efeat.feature_shape()).map(Some)
}
