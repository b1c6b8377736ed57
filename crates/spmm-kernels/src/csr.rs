//! Row-driven aggregation over a CSR descriptor
//!
//! Each output row `r` reduces the entries `j` stored in row `r`: the column
//! index selects the left operand row and the edge id selects the right
//! operand row. Rows are independent, so rows are fanned out on the engine
//! without synchronization.

use crate::features::{gather, Aligned, Broadcast, FeatureMap};
use crate::ops::{BinaryOperator, Comparator};
use crate::rows::split_rows;
use crate::validate::{check_args, check_dense, Extents};
use spmm_core::{BcastInfo, CsrMatrix, DenseTensor, ExecutionEngine, IndexType, Numeric, Result};
use tracing::{debug, instrument};

fn extents<I: IndexType>(csr: &CsrMatrix<I>) -> Extents {
    Extents {
        lhs_rows: csr.num_cols,
        rhs_rows: csr.nnz(),
        out_rows: csr.num_rows,
    }
}

/// Sum aggregation: `out[r] = Σ_{j in row r} op(ufeat[col(j)], efeat[edge(j)])`
///
/// Every output row is overwritten; rows without entries become zero.
///
/// # Errors
/// - `MalformedSparse` if `csr` fails validation
/// - `ShapeMismatch` if a read operand or the output disagrees with `csr`
#[instrument(skip_all, fields(op = Op::NAME, rows = csr.num_rows, nnz = csr.nnz()))]
pub fn spmm_sum_csr<T, I, Op, E>(
    engine: &E,
    _op: Op,
    csr: &CsrMatrix<I>,
    ufeat: &DenseTensor<T>,
    efeat: &DenseTensor<T>,
    out: &mut DenseTensor<T>,
) -> Result<()>
where
    T: Numeric,
    I: IndexType,
    Op: BinaryOperator<T>,
    E: ExecutionEngine,
{
    csr.validate()?;
    let map = Aligned::new(out.feature_dim());
    check_dense(&map, extents(csr), Op::USE_LHS, Op::USE_RHS, ufeat, efeat, out)?;
    debug!(dim = map.out_len(), strategy = ?engine.strategy(), "csr sum");
    sum_rows::<T, I, Op, _, _>(engine, csr, &map, ufeat.as_slice(), efeat.as_slice(), out.as_mut_slice());
    Ok(())
}

/// Sum aggregation with broadcasting between operand feature shapes
///
/// `info` maps each output feature offset onto left and right offsets.
#[instrument(skip_all, fields(op = Op::NAME, rows = csr.num_rows, nnz = csr.nnz()))]
pub fn spmm_bcast_sum_csr<T, I, Op, E>(
    engine: &E,
    _op: Op,
    info: &BcastInfo,
    csr: &CsrMatrix<I>,
    ufeat: &DenseTensor<T>,
    efeat: &DenseTensor<T>,
    out: &mut DenseTensor<T>,
) -> Result<()>
where
    T: Numeric,
    I: IndexType,
    Op: BinaryOperator<T>,
    E: ExecutionEngine,
{
    csr.validate()?;
    let map = Broadcast::new(info);
    check_dense(&map, extents(csr), Op::USE_LHS, Op::USE_RHS, ufeat, efeat, out)?;
    debug!(
        out_len = map.out_len(),
        lhs_len = map.lhs_len(),
        rhs_len = map.rhs_len(),
        "csr broadcast sum"
    );
    sum_rows::<T, I, Op, _, _>(engine, csr, &map, ufeat.as_slice(), efeat.as_slice(), out.as_mut_slice());
    Ok(())
}

/// Extremum aggregation with argument tracking
///
/// For every row and feature the first entry (in stored order) holding the
/// extremum wins. `argu` receives its column index and `arge` its edge id;
/// each is written only when the operator reads that operand. Rows without
/// entries get the comparator identity and argument 0.
#[allow(clippy::too_many_arguments)]
#[instrument(skip_all, fields(op = Op::NAME, reduce = C::NAME, rows = csr.num_rows, nnz = csr.nnz()))]
pub fn spmm_cmp_csr<T, I, Op, C, E>(
    engine: &E,
    _op: Op,
    _cmp: C,
    csr: &CsrMatrix<I>,
    ufeat: &DenseTensor<T>,
    efeat: &DenseTensor<T>,
    out: &mut DenseTensor<T>,
    argu: Option<&mut DenseTensor<I>>,
    arge: Option<&mut DenseTensor<I>>,
) -> Result<()>
where
    T: Numeric,
    I: IndexType,
    Op: BinaryOperator<T>,
    C: Comparator<T>,
    E: ExecutionEngine,
{
    csr.validate()?;
    let map = Aligned::new(out.feature_dim());
    check_dense(&map, extents(csr), Op::USE_LHS, Op::USE_RHS, ufeat, efeat, out)?;
    check_args(out, argu.as_deref(), arge.as_deref(), Op::USE_LHS, Op::USE_RHS)?;
    debug!(dim = map.out_len(), strategy = ?engine.strategy(), "csr extremum");
    cmp_rows::<T, I, Op, C, _, _>(engine, csr, &map, ufeat, efeat, out, argu, arge);
    Ok(())
}

/// Extremum aggregation with broadcasting between operand feature shapes
#[allow(clippy::too_many_arguments)]
#[instrument(skip_all, fields(op = Op::NAME, reduce = C::NAME, rows = csr.num_rows, nnz = csr.nnz()))]
pub fn spmm_bcast_cmp_csr<T, I, Op, C, E>(
    engine: &E,
    _op: Op,
    _cmp: C,
    info: &BcastInfo,
    csr: &CsrMatrix<I>,
    ufeat: &DenseTensor<T>,
    efeat: &DenseTensor<T>,
    out: &mut DenseTensor<T>,
    argu: Option<&mut DenseTensor<I>>,
    arge: Option<&mut DenseTensor<I>>,
) -> Result<()>
where
    T: Numeric,
    I: IndexType,
    Op: BinaryOperator<T>,
    C: Comparator<T>,
    E: ExecutionEngine,
{
    csr.validate()?;
    let map = Broadcast::new(info);
    check_dense(&map, extents(csr), Op::USE_LHS, Op::USE_RHS, ufeat, efeat, out)?;
    check_args(out, argu.as_deref(), arge.as_deref(), Op::USE_LHS, Op::USE_RHS)?;
    debug!(out_len = map.out_len(), "csr broadcast extremum");
    cmp_rows::<T, I, Op, C, _, _>(engine, csr, &map, ufeat, efeat, out, argu, arge);
    Ok(())
}

fn sum_rows<T, I, Op, M, E>(
    engine: &E,
    csr: &CsrMatrix<I>,
    map: &M,
    ufeat: &[T],
    efeat: &[T],
    out: &mut [T],
) where
    T: Numeric,
    I: IndexType,
    Op: BinaryOperator<T>,
    M: FeatureMap,
    E: ExecutionEngine,
{
    let out_len = map.out_len();
    if out_len == 0 {
        return;
    }
    let (lhs_len, rhs_len) = (map.lhs_len(), map.rhs_len());

    engine.for_each_chunk_mut(out, out_len, |r, row| {
        row.fill(T::zero());
        for j in csr.row_range(r) {
            let lhs_base = csr.indices[j].index() * lhs_len;
            let rhs_base = csr.edge_id(j) * rhs_len;
            for (k, slot) in row.iter_mut().enumerate() {
                let (lk, rk) = map.offsets(k);
                let lhs = gather(Op::USE_LHS, ufeat, lhs_base + lk);
                let rhs = gather(Op::USE_RHS, efeat, rhs_base + rk);
                *slot = slot.add_wrapping(Op::call(lhs, rhs));
            }
        }
    });
}

#[allow(clippy::too_many_arguments)]
fn cmp_rows<T, I, Op, C, M, E>(
    engine: &E,
    csr: &CsrMatrix<I>,
    map: &M,
    ufeat: &DenseTensor<T>,
    efeat: &DenseTensor<T>,
    out: &mut DenseTensor<T>,
    argu: Option<&mut DenseTensor<I>>,
    arge: Option<&mut DenseTensor<I>>,
) where
    T: Numeric,
    I: IndexType,
    Op: BinaryOperator<T>,
    C: Comparator<T>,
    M: FeatureMap,
    E: ExecutionEngine,
{
    let out_len = map.out_len();
    if out_len == 0 {
        return;
    }
    let (lhs_len, rhs_len) = (map.lhs_len(), map.rhs_len());
    let (ufeat, efeat) = (ufeat.as_slice(), efeat.as_slice());
    let argu = argu.filter(|_| Op::USE_LHS).map(|a| a.as_mut_slice());
    let arge = arge.filter(|_| Op::USE_RHS).map(|a| a.as_mut_slice());
    let mut rows = split_rows(out.as_mut_slice(), argu, arge, out_len);

    engine.for_each_mut(&mut rows, |r, slots| {
        let range = csr.row_range(r);
        for k in 0..out_len {
            let (lk, rk) = map.offsets(k);
            let mut accum = C::identity();
            let (mut arg_lhs, mut arg_edge) = (0, 0);
            for j in range.clone() {
                let cid = csr.indices[j].index();
                let eid = csr.edge_id(j);
                let lhs = gather(Op::USE_LHS, ufeat, cid * lhs_len + lk);
                let rhs = gather(Op::USE_RHS, efeat, eid * rhs_len + rk);
                let val = Op::call(lhs, rhs);
                if C::replace(accum, val) {
                    accum = val;
                    arg_lhs = cid;
                    arg_edge = eid;
                }
            }
            slots.record(k, accum, arg_lhs, arg_edge);
        }
    });
}
