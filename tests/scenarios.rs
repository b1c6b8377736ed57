//! End-to-end scenarios through the facade

use spmm::prelude::*;
use spmm::{sequential, SparseFormat, spmm_cmp_coo, spmm_cmp_csr, spmm_sum_coo, spmm_sum_csr};

/// Rows `[(col 0, edge 0), (col 1, edge 1)], [], [(col 0, edge 2)]`
fn scenario_csr() -> CsrMatrix<i64> {
    CsrMatrix::new(3, 3, vec![0, 2, 2, 3], vec![0, 1, 0], None)
}

fn column(values: &[f64]) -> DenseTensor<f64> {
    DenseTensor::from_vec(vec![values.len(), 1], values.to_vec()).unwrap()
}

#[test]
fn add_sum_over_csr() {
    let u = column(&[10.0, 20.0, 30.0]);
    let e = column(&[1.0, 1.0, 1.0]);
    let mut out = DenseTensor::zeros(&[3, 1]);
    spmm_sum_csr(&sequential(), Add, &scenario_csr(), &u, &e, &mut out).unwrap();
    assert_eq!(out.as_slice(), &[32.0, 0.0, 11.0]);
}

#[test]
fn copy_u_max_over_csr() {
    let u = column(&[10.0, 20.0, 30.0]);
    let mut out = DenseTensor::zeros(&[3, 1]);
    let mut argu = DenseTensor::<i64>::full(&[3, 1], 7);
    spmm_cmp_csr(
        &sequential(),
        CopyLhs,
        Max,
        &scenario_csr(),
        &u,
        &DenseTensor::empty(),
        &mut out,
        Some(&mut argu),
        None,
    )
    .unwrap();
    assert_eq!(out.as_slice(), &[20.0, f64::MIN, 10.0]);
    assert_eq!(argu.as_slice(), &[1, 0, 0]);
}

#[test]
fn scenarios_hold_for_the_coo_encoding() {
    let coo = scenario_csr().to_coo().transpose();
    let u = column(&[10.0, 20.0, 30.0]);
    let e = column(&[1.0, 1.0, 1.0]);

    let mut out = DenseTensor::zeros(&[3, 1]);
    spmm_sum_coo(&sequential(), Add, &coo, &u, &e, &mut out).unwrap();
    assert_eq!(out.as_slice(), &[32.0, 0.0, 11.0]);

    let mut argu = DenseTensor::<i64>::zeros(&[3, 1]);
    spmm_cmp_coo(
        &sequential(),
        CopyLhs,
        Max,
        &coo,
        &u,
        &DenseTensor::empty(),
        &mut out,
        Some(&mut argu),
        None,
    )
    .unwrap();
    assert_eq!(out.as_slice(), &[20.0, f64::MIN, 10.0]);
    assert_eq!(argu.as_slice(), &[1, 0, 0]);
}

#[test]
fn front_door_by_name() {
    let graph: SparseMatrix = scenario_csr().into();
    let u = column(&[10.0, 20.0, 30.0]);
    let e = column(&[1.0, 1.0, 1.0]);
    let mut out = DenseTensor::zeros(&[3, 1]);

    let spmm = Spmm::from_config(&SpmmConfig::default()).unwrap();
    let outcome = spmm
        .aggregate("add", "sum", &graph, &u, &e, &mut out, None, None)
        .unwrap();
    assert_eq!(out.as_slice(), &[32.0, 0.0, 11.0]);
    assert_eq!(outcome.format, SparseFormat::Csr);
    assert!(!outcome.broadcast);

    let err = spmm
        .aggregate("sub", "sum", &graph, &u, &e, &mut out, None, None)
        .unwrap_err();
    assert_eq!(err.to_string(), "Unsupported SpMM binary operator: sub");
}

#[test]
fn float32_and_narrow_indices() {
    let csr = CsrMatrix::<i32>::new(3, 3, vec![0, 2, 2, 3], vec![0, 1, 0], None);
    let u = DenseTensor::from_vec(vec![3, 1], vec![10.0f32, 20.0, 30.0]).unwrap();
    let mut out = DenseTensor::zeros(&[3, 1]);
    let mut argu = DenseTensor::<i32>::zeros(&[3, 1]);
    spmm_cmp_csr(
        &sequential(),
        CopyLhs,
        Min,
        &csr,
        &u,
        &DenseTensor::empty(),
        &mut out,
        Some(&mut argu),
        None,
    )
    .unwrap();
    assert_eq!(out.as_slice(), &[10.0, f32::MAX, 10.0]);
    assert_eq!(argu.as_slice(), &[0, 0, 0]);
}
