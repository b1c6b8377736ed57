//! Entry-driven aggregation over a COO descriptor
//!
//! Entry `i` contributes `op(ufeat[row(i)], efeat[edge(i)])` to output row
//! `col(i)`. Entries are fanned out on the engine, so several tasks may hit
//! the same destination:
//!
//! - sums accumulate into a scratch buffer of lock-free atomic cells
//! - extrema take one mutex per destination row, guarding the value and its
//!   argument indices together
//!
//! Summation order and extremum tie winners depend on scheduling.

use crate::features::{gather, Aligned, Broadcast, FeatureMap};
use crate::ops::{BinaryOperator, Comparator};
use crate::rows::split_rows;
use crate::validate::{check_args, check_dense, Extents};
use spmm_core::{
    AtomicAccumulator, BcastInfo, CooMatrix, DenseTensor, ExecutionEngine, IndexType, Numeric,
    Result,
};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, instrument};

fn extents<I: IndexType>(coo: &CooMatrix<I>) -> Extents {
    Extents {
        lhs_rows: coo.num_rows,
        rhs_rows: coo.nnz(),
        out_rows: coo.num_cols,
    }
}

/// Sum aggregation into `out[col(i)]`
///
/// Output has `num_cols` rows; destinations without entries become zero.
///
/// # Errors
/// - `MalformedSparse` if `coo` fails validation
/// - `ShapeMismatch` if a read operand or the output disagrees with `coo`
#[instrument(skip_all, fields(op = Op::NAME, cols = coo.num_cols, nnz = coo.nnz()))]
pub fn spmm_sum_coo<T, I, Op, E>(
    engine: &E,
    _op: Op,
    coo: &CooMatrix<I>,
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
    coo.validate()?;
    let map = Aligned::new(out.feature_dim());
    check_dense(&map, extents(coo), Op::USE_LHS, Op::USE_RHS, ufeat, efeat, out)?;
    debug!(dim = map.out_len(), strategy = ?engine.strategy(), "coo sum");
    sum_entries::<T, I, Op, _, _>(engine, coo, &map, ufeat.as_slice(), efeat.as_slice(), out.as_mut_slice());
    Ok(())
}

/// Sum aggregation with broadcasting between operand feature shapes
#[instrument(skip_all, fields(op = Op::NAME, cols = coo.num_cols, nnz = coo.nnz()))]
pub fn spmm_bcast_sum_coo<T, I, Op, E>(
    engine: &E,
    _op: Op,
    info: &BcastInfo,
    coo: &CooMatrix<I>,
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
    coo.validate()?;
    let map = Broadcast::new(info);
    check_dense(&map, extents(coo), Op::USE_LHS, Op::USE_RHS, ufeat, efeat, out)?;
    debug!(out_len = map.out_len(), "coo broadcast sum");
    sum_entries::<T, I, Op, _, _>(engine, coo, &map, ufeat.as_slice(), efeat.as_slice(), out.as_mut_slice());
    Ok(())
}

/// Extremum aggregation with argument tracking
///
/// `argu` receives `row(i)` and `arge` the edge id of the winning entry,
/// each only when the operator reads that operand. When several entries
/// tie, which one wins is unspecified.
#[allow(clippy::too_many_arguments)]
#[instrument(skip_all, fields(op = Op::NAME, reduce = C::NAME, cols = coo.num_cols, nnz = coo.nnz()))]
pub fn spmm_cmp_coo<T, I, Op, C, E>(
    engine: &E,
    _op: Op,
    _cmp: C,
    coo: &CooMatrix<I>,
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
    coo.validate()?;
    let map = Aligned::new(out.feature_dim());
    check_dense(&map, extents(coo), Op::USE_LHS, Op::USE_RHS, ufeat, efeat, out)?;
    check_args(out, argu.as_deref(), arge.as_deref(), Op::USE_LHS, Op::USE_RHS)?;
    debug!(dim = map.out_len(), strategy = ?engine.strategy(), "coo extremum");
    cmp_entries::<T, I, Op, C, _, _>(engine, coo, &map, ufeat, efeat, out, argu, arge);
    Ok(())
}

/// Extremum aggregation with broadcasting between operand feature shapes
#[allow(clippy::too_many_arguments)]
#[instrument(skip_all, fields(op = Op::NAME, reduce = C::NAME, cols = coo.num_cols, nnz = coo.nnz()))]
pub fn spmm_bcast_cmp_coo<T, I, Op, C, E>(
    engine: &E,
    _op: Op,
    _cmp: C,
    info: &BcastInfo,
    coo: &CooMatrix<I>,
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
    coo.validate()?;
    let map = Broadcast::new(info);
    check_dense(&map, extents(coo), Op::USE_LHS, Op::USE_RHS, ufeat, efeat, out)?;
    check_args(out, argu.as_deref(), arge.as_deref(), Op::USE_LHS, Op::USE_RHS)?;
    debug!(out_len = map.out_len(), "coo broadcast extremum");
    cmp_entries::<T, I, Op, C, _, _>(engine, coo, &map, ufeat, efeat, out, argu, arge);
    Ok(())
}

fn sum_entries<T, I, Op, M, E>(
    engine: &E,
    coo: &CooMatrix<I>,
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
    let cells: Vec<T::Atomic> = (0..out.len())
        .map(|_| <T::Atomic as AtomicAccumulator<T>>::new(T::zero()))
        .collect();

    engine.for_each_index(coo.nnz(), |i| {
        let lhs_base = coo.row[i].index() * lhs_len;
        let rhs_base = coo.edge_id(i) * rhs_len;
        let dst = &cells[coo.col[i].index() * out_len..][..out_len];
        for (k, cell) in dst.iter().enumerate() {
            let (lk, rk) = map.offsets(k);
            let lhs = gather(Op::USE_LHS, ufeat, lhs_base + lk);
            let rhs = gather(Op::USE_RHS, efeat, rhs_base + rk);
            cell.fetch_add(Op::call(lhs, rhs));
        }
    });

    engine.for_each_mut(out, |idx, slot| *slot = cells[idx].load());
}

#[allow(clippy::too_many_arguments)]
fn cmp_entries<T, I, Op, C, M, E>(
    engine: &E,
    coo: &CooMatrix<I>,
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
    engine.for_each_mut(&mut rows, |_, slots| slots.reset(C::identity()));
    let locks: Vec<_> = rows.into_iter().map(Mutex::new).collect();

    engine.for_each_index(coo.nnz(), |i| {
        let rid = coo.row[i].index();
        let eid = coo.edge_id(i);
        let (lhs_base, rhs_base) = (rid * lhs_len, eid * rhs_len);
        let mut slots = locks[coo.col[i].index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for k in 0..out_len {
            let (lk, rk) = map.offsets(k);
            let lhs = gather(Op::USE_LHS, ufeat, lhs_base + lk);
            let rhs = gather(Op::USE_RHS, efeat, rhs_base + rk);
            let val = Op::call(lhs, rhs);
            if C::replace(slots.out[k], val) {
                slots.record(k, val, rid, eid);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{Add, CopyLhs, CopyRhs, Max, Min, Mul};
    use spmm_core::execution::sequential;
    use spmm_core::Error;

    /// Entries (row -> col): 0->1, 2->1, 1->0, 0->0
    fn graph() -> CooMatrix<i32> {
        CooMatrix::new(3, 2, vec![0, 2, 1, 0], vec![1, 1, 0, 0], None)
    }

    fn column(values: &[f64]) -> DenseTensor<f64> {
        DenseTensor::from_vec(vec![values.len(), 1], values.to_vec()).unwrap()
    }

    #[test]
    fn test_sum_targets_columns() {
        let u = column(&[1.0, 2.0, 4.0]);
        let e = column(&[10.0, 20.0, 30.0, 40.0]);
        let mut out = DenseTensor::full(&[2, 1], -1.0);
        spmm_sum_coo(&sequential(), Add, &graph(), &u, &e, &mut out).unwrap();
        // col 0: (2 + 30) + (1 + 40); col 1: (1 + 10) + (4 + 20)
        assert_eq!(out.as_slice(), &[73.0, 35.0]);
    }

    #[test]
    fn test_sum_integer_features() {
        let u = DenseTensor::from_vec(vec![3, 2], vec![1i64, 2, 3, 4, 5, 6]).unwrap();
        let mut out = DenseTensor::zeros(&[2, 2]);
        spmm_sum_coo(&sequential(), CopyLhs, &graph(), &u, &DenseTensor::empty(), &mut out)
            .unwrap();
        assert_eq!(out.as_slice(), &[4, 6, 6, 8]);
    }

    #[test]
    fn test_sum_empty_destination_is_zero() {
        let coo = CooMatrix::<i64>::new(2, 3, vec![0], vec![2], None);
        let e = column(&[5.0]);
        let mut out = DenseTensor::full(&[3, 1], 8.0);
        spmm_sum_coo(&sequential(), CopyRhs, &coo, &DenseTensor::empty(), &e, &mut out).unwrap();
        assert_eq!(out.as_slice(), &[0.0, 0.0, 5.0]);
    }

    #[test]
    fn test_max_with_distinct_values() {
        let u = column(&[1.0, 2.0, 4.0]);
        let e = column(&[3.0, 1.0, 1.0, 1.0]);
        let mut out = DenseTensor::zeros(&[2, 1]);
        let mut argu = DenseTensor::<i32>::full(&[2, 1], 9);
        let mut arge = DenseTensor::<i32>::full(&[2, 1], 9);
        spmm_cmp_coo(
            &sequential(),
            Mul,
            Max,
            &graph(),
            &u,
            &e,
            &mut out,
            Some(&mut argu),
            Some(&mut arge),
        )
        .unwrap();
        // col 0: 2*1 (row 1, edge 2) vs 1*1; col 1: 1*3 vs 4*1 (row 2, edge 1)
        assert_eq!(out.as_slice(), &[2.0, 4.0]);
        assert_eq!(argu.as_slice(), &[1, 2]);
        assert_eq!(arge.as_slice(), &[2, 1]);
    }

    #[test]
    fn test_min_initialises_untouched_rows() {
        let coo = CooMatrix::<i64>::new(1, 3, vec![0], vec![1], None);
        let u = column(&[7.0]);
        let mut out = DenseTensor::zeros(&[3, 1]);
        let mut argu = DenseTensor::<i64>::full(&[3, 1], 4);
        spmm_cmp_coo(
            &sequential(),
            CopyLhs,
            Min,
            &coo,
            &u,
            &DenseTensor::empty(),
            &mut out,
            Some(&mut argu),
            None,
        )
        .unwrap();
        assert_eq!(out.as_slice(), &[f64::MAX, 7.0, f64::MAX]);
        assert_eq!(argu.as_slice(), &[0, 0, 0]);
    }

    #[test]
    fn test_broadcast_sum_and_max() {
        let info = BcastInfo::from_feature_shapes(&[1], &[3]).unwrap();
        let u = column(&[1.0, 2.0, 4.0]);
        let e = DenseTensor::from_vec(
            vec![4, 3],
            vec![
                0.0, 1.0, 2.0, //
                1.0, 1.0, 1.0, //
                3.0, 0.0, 0.0, //
                0.0, 0.0, 5.0,
            ],
        )
        .unwrap();

        let mut out = DenseTensor::zeros(&[2, 3]);
        spmm_bcast_sum_coo(&sequential(), Mul, &info, &graph(), &u, &e, &mut out).unwrap();
        // col 0: 2*[3,0,0] + 1*[0,0,5]; col 1: 1*[0,1,2] + 4*[1,1,1]
        assert_eq!(out.as_slice(), &[6.0, 0.0, 5.0, 4.0, 5.0, 6.0]);

        let mut out = DenseTensor::zeros(&[2, 3]);
        let mut arge = DenseTensor::<i32>::zeros(&[2, 3]);
        spmm_bcast_cmp_coo(
            &sequential(),
            Mul,
            Max,
            &info,
            &graph(),
            &u,
            &e,
            &mut out,
            None,
            Some(&mut arge),
        )
        .unwrap();
        assert_eq!(out.as_slice(), &[6.0, 0.0, 5.0, 4.0, 4.0, 4.0]);
        assert_eq!(arge.as_slice(), &[2, 2, 3, 1, 1, 1]);
    }

    #[test]
    fn test_malformed_coo_rejected() {
        let coo = CooMatrix::<i32>::new(3, 2, vec![0, 1], vec![1], None);
        let u = column(&[1.0, 2.0, 3.0]);
        let mut out = DenseTensor::zeros(&[2, 1]);
        let err = spmm_sum_coo(&sequential(), CopyLhs, &coo, &u, &DenseTensor::empty(), &mut out)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedSparse(_)));
    }
}
