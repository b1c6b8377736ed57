//! Disjoint per-row views over an output tensor and its argument buffers

use spmm_core::IndexType;

/// Mutable slices of one destination row
///
/// Argument slices are present only for operands the combine operator reads.
#[derive(Debug)]
pub(crate) struct RowSlots<'a, T, I> {
    pub out: &'a mut [T],
    pub argu: Option<&'a mut [I]>,
    pub arge: Option<&'a mut [I]>,
}

impl<T: Copy, I: IndexType> RowSlots<'_, T, I> {
    /// Fill the row with `identity` and zero the argument slices
    pub fn reset(&mut self, identity: T) {
        self.out.fill(identity);
        if let Some(argu) = self.argu.as_deref_mut() {
            argu.fill(I::zero());
        }
        if let Some(arge) = self.arge.as_deref_mut() {
            arge.fill(I::zero());
        }
    }

    /// Store `value` at feature `k` with its provenance
    #[inline]
    pub fn record(&mut self, k: usize, value: T, lhs_index: usize, edge_id: usize) {
        self.out[k] = value;
        if let Some(argu) = self.argu.as_deref_mut() {
            argu[k] = I::from_index(lhs_index);
        }
        if let Some(arge) = self.arge.as_deref_mut() {
            arge[k] = I::from_index(edge_id);
        }
    }
}

/// Split `out` and the argument buffers into `row_len`-long row views
///
/// `row_len` must be non-zero and every buffer a multiple of it.
pub(crate) fn split_rows<'a, T, I>(
    out: &'a mut [T],
    argu: Option<&'a mut [I]>,
    arge: Option<&'a mut [I]>,
    row_len: usize,
) -> Vec<RowSlots<'a, T, I>> {
    let mut argu_rows = argu.map(|a| a.chunks_mut(row_len));
    let mut arge_rows = arge.map(|a| a.chunks_mut(row_len));
    out.chunks_mut(row_len)
        .map(|out| RowSlots {
            out,
            argu: argu_rows.as_mut().and_then(Iterator::next),
            arge: arge_rows.as_mut().and_then(Iterator::next),
        })
        .collect()
}
