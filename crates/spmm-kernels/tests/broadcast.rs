//! Broadcast kernels against plain kernels on explicitly expanded operands

mod common;

use common::*;
use spmm_core::execution::sequential;
use spmm_core::{BcastInfo, DenseTensor};
use spmm_kernels::ops::{Add, Max, Min, Mul};
use spmm_kernels::{
    spmm_bcast_cmp_coo, spmm_bcast_cmp_csr, spmm_bcast_sum_coo, spmm_bcast_sum_csr, spmm_cmp_coo,
    spmm_cmp_csr, spmm_sum_coo, spmm_sum_csr,
};

/// Operand feature shape pairs covering lhs, rhs and two-sided broadcasts
fn shape_cases() -> Vec<(Vec<usize>, Vec<usize>)> {
    vec![
        (vec![3], vec![1]),
        (vec![1], vec![4]),
        (vec![2, 1], vec![1, 3]),
        (vec![2, 3], vec![3]),
        (vec![1, 3], vec![2, 1]),
        (vec![4, 1, 2], vec![3, 1]),
    ]
}

fn with_rows(rows: usize, feature_shape: &[usize]) -> Vec<usize> {
    let mut shape = vec![rows];
    shape.extend_from_slice(feature_shape);
    shape
}

#[test]
fn broadcast_sums_match_expanded_operands() {
    let g = random_graph(7, 6, 5, 30);
    let csr = g.csr();
    let coo = g.coo();

    for (case, (lhs, rhs)) in shape_cases().into_iter().enumerate() {
        let info = BcastInfo::from_feature_shapes(&lhs, &rhs).unwrap();
        let u = random_features(case as u64, &with_rows(g.num_src, &lhs));
        let e = random_features(100 + case as u64, &with_rows(g.nnz(), &rhs));
        let (ux, ex) = (expand(&u, &info, true), expand(&e, &info, false));
        let out_shape = with_rows(g.num_dst, info.out_shape());

        let mut got = DenseTensor::zeros(&out_shape);
        let mut want = DenseTensor::zeros(&out_shape);
        spmm_bcast_sum_csr(&sequential(), Mul, &info, &csr, &u, &e, &mut got).unwrap();
        spmm_sum_csr(&sequential(), Mul, &csr, &ux, &ex, &mut want).unwrap();
        assert_eq!(got.as_slice(), want.as_slice(), "csr sum, case {case}");

        let mut got = DenseTensor::zeros(&out_shape);
        let mut want = DenseTensor::zeros(&out_shape);
        spmm_bcast_sum_coo(&sequential(), Add, &info, &coo, &u, &e, &mut got).unwrap();
        spmm_sum_coo(&sequential(), Add, &coo, &ux, &ex, &mut want).unwrap();
        assert_vectors_close(got.as_slice(), want.as_slice(), &format!("coo sum, case {case}"));
    }
}

#[test]
fn broadcast_extrema_match_expanded_operands() {
    let g = random_graph(11, 5, 6, 25);
    let csr = g.csr();
    let coo = g.coo();

    for (case, (lhs, rhs)) in shape_cases().into_iter().enumerate() {
        let info = BcastInfo::from_feature_shapes(&lhs, &rhs).unwrap();
        let u = random_features(case as u64, &with_rows(g.num_src, &lhs));
        let e = random_features(50 + case as u64, &with_rows(g.nnz(), &rhs));
        let (ux, ex) = (expand(&u, &info, true), expand(&e, &info, false));
        let out_shape = with_rows(g.num_dst, info.out_shape());

        let mut got = DenseTensor::zeros(&out_shape);
        let mut got_u = DenseTensor::<i64>::zeros(&out_shape);
        let mut got_e = DenseTensor::<i64>::zeros(&out_shape);
        spmm_bcast_cmp_csr(
            &sequential(),
            Add,
            Max,
            &info,
            &csr,
            &u,
            &e,
            &mut got,
            Some(&mut got_u),
            Some(&mut got_e),
        )
        .unwrap();
        let mut want = DenseTensor::zeros(&out_shape);
        let mut want_u = DenseTensor::<i64>::zeros(&out_shape);
        let mut want_e = DenseTensor::<i64>::zeros(&out_shape);
        spmm_cmp_csr(
            &sequential(),
            Add,
            Max,
            &csr,
            &ux,
            &ex,
            &mut want,
            Some(&mut want_u),
            Some(&mut want_e),
        )
        .unwrap();
        assert_eq!(got, want, "csr max, case {case}");
        assert_eq!(got_u, want_u, "csr argu, case {case}");
        assert_eq!(got_e, want_e, "csr arge, case {case}");

        let mut got = DenseTensor::zeros(&out_shape);
        let mut got_e = DenseTensor::<i64>::zeros(&out_shape);
        spmm_bcast_cmp_coo(
            &sequential(),
            Mul,
            Min,
            &info,
            &coo,
            &u,
            &e,
            &mut got,
            None,
            Some(&mut got_e),
        )
        .unwrap();
        let mut want = DenseTensor::zeros(&out_shape);
        let mut want_e = DenseTensor::<i64>::zeros(&out_shape);
        spmm_cmp_coo(
            &sequential(),
            Mul,
            Min,
            &coo,
            &ux,
            &ex,
            &mut want,
            None,
            Some(&mut want_e),
        )
        .unwrap();
        assert_eq!(got, want, "coo min, case {case}");
        assert_eq!(got_e, want_e, "coo arge, case {case}");
    }
}

#[test]
fn broadcast_shape_errors() {
    let g = random_graph(3, 4, 4, 10);
    let info = BcastInfo::from_feature_shapes(&[2, 1], &[1, 3]).unwrap();
    let u = random_features(0, &[4, 2, 1]);
    // rhs rows carry 2 features where the descriptor expects 3
    let e = random_features(1, &[10, 1, 2]);
    let mut out = DenseTensor::zeros(&[4, 2, 3]);
    let err = spmm_bcast_sum_csr(&sequential(), Add, &info, &g.csr(), &u, &e, &mut out).unwrap_err();
    assert!(matches!(err, spmm_core::Error::ShapeMismatch(_)));

    assert!(matches!(
        BcastInfo::from_feature_shapes(&[2, 3], &[3, 3]),
        Err(spmm_core::Error::Broadcast(_))
    ));
}
