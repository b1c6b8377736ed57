//! Shared utilities for integration tests
#![allow(dead_code)]

pub use approx::assert_relative_eq;

use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use spmm_core::{BcastInfo, CooMatrix, CsrMatrix, DenseTensor};

pub const EPSILON: f64 = 1e-10;

/// Edge list `(src, dst)`; the edge id is the position in the list
#[derive(Clone, Debug)]
pub struct Graph {
    pub num_src: usize,
    pub num_dst: usize,
    pub edges: Vec<(usize, usize)>,
}

impl Graph {
    /// CSR with one row per destination and one column per source
    pub fn csr(&self) -> CsrMatrix<i64> {
        let by_dst: Vec<(usize, usize)> = self.edges.iter().map(|&(s, d)| (d, s)).collect();
        CsrMatrix::from_edges(self.num_dst, self.num_src, &by_dst).unwrap()
    }

    /// COO with `row = src`, `col = dst`, entries in input order
    pub fn coo(&self) -> CooMatrix<i64> {
        let row = self.edges.iter().map(|&(s, _)| s as i64).collect();
        let col = self.edges.iter().map(|&(_, d)| d as i64).collect();
        CooMatrix::new(self.num_src, self.num_dst, row, col, None)
    }

    pub fn nnz(&self) -> usize {
        self.edges.len()
    }

    /// Destinations with no incoming edge
    pub fn isolated_destinations(&self) -> Vec<usize> {
        (0..self.num_dst)
            .filter(|d| self.edges.iter().all(|&(_, dst)| dst != *d))
            .collect()
    }
}

/// Random multigraph with a fixed seed
pub fn random_graph(seed: u64, num_src: usize, num_dst: usize, nnz: usize) -> Graph {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let edges = (0..nnz)
        .map(|_| (rng.gen_range(0..num_src), rng.gen_range(0..num_dst)))
        .collect();
    Graph {
        num_src,
        num_dst,
        edges,
    }
}

/// Features uniformly drawn from `[-1, 1)`
pub fn random_features(seed: u64, shape: &[usize]) -> DenseTensor<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let len = shape.iter().product();
    let data = (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect();
    DenseTensor::from_vec(shape.to_vec(), data).unwrap()
}

/// Small random multigraphs, including ones without edges
pub fn graph_strategy() -> impl Strategy<Value = Graph> {
    (1usize..6, 1usize..6).prop_flat_map(|(num_src, num_dst)| {
        prop::collection::vec((0..num_src, 0..num_dst), 0..24).prop_map(move |edges| Graph {
            num_src,
            num_dst,
            edges,
        })
    })
}

/// Materialise the broadcast of one operand to the output feature shape
pub fn expand(feat: &DenseTensor<f64>, info: &BcastInfo, lhs: bool) -> DenseTensor<f64> {
    let table = info.offset_table();
    let row_len = if lhs { info.lhs_len() } else { info.rhs_len() };
    let mut data = Vec::with_capacity(feat.num_rows() * table.len());
    for r in 0..feat.num_rows() {
        for &(l, e) in &table {
            let k = if lhs { l } else { e };
            data.push(feat.as_slice()[r * row_len + k]);
        }
    }
    let mut shape = vec![feat.num_rows()];
    shape.extend_from_slice(info.out_shape());
    DenseTensor::from_vec(shape, data).unwrap()
}

/// Assert two vectors are equal within tolerance
pub fn assert_vectors_close(actual: &[f64], expected: &[f64], context: &str) {
    assert_eq!(actual.len(), expected.len(), "length mismatch for {context}");
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (a - e).abs() <= EPSILON * (1.0 + e.abs()) * 100.0,
            "{context}: index {i}: {a} != {e}"
        );
    }
}
