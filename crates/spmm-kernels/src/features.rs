//! Feature-offset maps shared by plain and broadcast kernels
//!
//! A kernel iterates output feature offsets `k` in `0..out_len()` and asks
//! the map for the matching offsets inside the left and right operand rows.

use spmm_core::BcastInfo;

pub trait FeatureMap: Sync {
    /// Scalars per output row
    fn out_len(&self) -> usize;

    /// Scalars per left operand row
    fn lhs_len(&self) -> usize;

    /// Scalars per right operand row
    fn rhs_len(&self) -> usize;

    /// `(lhs_offset, rhs_offset)` for output offset `k`
    fn offsets(&self, k: usize) -> (usize, usize);
}

/// All three rows share one layout
#[derive(Clone, Copy, Debug)]
pub struct Aligned {
    dim: usize,
}

impl Aligned {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl FeatureMap for Aligned {
    #[inline(always)]
    fn out_len(&self) -> usize {
        self.dim
    }

    #[inline(always)]
    fn lhs_len(&self) -> usize {
        self.dim
    }

    #[inline(always)]
    fn rhs_len(&self) -> usize {
        self.dim
    }

    #[inline(always)]
    fn offsets(&self, k: usize) -> (usize, usize) {
        (k, k)
    }
}

/// Offsets precomputed from a [`BcastInfo`]
#[derive(Clone, Debug)]
pub struct Broadcast {
    lhs_len: usize,
    rhs_len: usize,
    table: Vec<(usize, usize)>,
}

impl Broadcast {
    pub fn new(info: &BcastInfo) -> Self {
        Self {
            lhs_len: info.lhs_len(),
            rhs_len: info.rhs_len(),
            table: info.offset_table(),
        }
    }
}

impl FeatureMap for Broadcast {
    #[inline]
    fn out_len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    fn lhs_len(&self) -> usize {
        self.lhs_len
    }

    #[inline]
    fn rhs_len(&self) -> usize {
        self.rhs_len
    }

    #[inline]
    fn offsets(&self, k: usize) -> (usize, usize) {
        self.table[k]
    }
}

/// Read `feat[offset]` only when the operator uses that operand
#[inline(always)]
pub(crate) fn gather<T: Copy>(used: bool, feat: &[T], offset: usize) -> Option<T> {
    if used {
        Some(feat[offset])
    } else {
        None
    }
}
