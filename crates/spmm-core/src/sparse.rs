//! Sparse adjacency descriptors
//!
//! Two layouts are supported:
//!
//! - [`CsrMatrix`]: compressed rows. Aggregation targets the row, the column
//!   index selects the left operand row.
//! - [`CooMatrix`]: coordinate list. Aggregation targets the column, the row
//!   index selects the left operand row.
//!
//! Both carry an optional edge-id permutation selecting the right operand
//! row; when absent, the edge id of an entry is its position in the arrays.

use crate::error::{Error, Result};
use crate::numeric::IndexType;
use std::ops::Range;

/// Compressed sparse row descriptor
#[derive(Clone, Debug, PartialEq)]
pub struct CsrMatrix<I: IndexType = i64> {
    pub num_rows: usize,
    pub num_cols: usize,
    /// Row offsets, length `num_rows + 1`
    pub indptr: Vec<I>,
    /// Column index per entry
    pub indices: Vec<I>,
    /// Optional edge-id permutation
    pub data: Option<Vec<I>>,
}

/// Coordinate-list descriptor (no ordering assumed)
#[derive(Clone, Debug, PartialEq)]
pub struct CooMatrix<I: IndexType = i64> {
    pub num_rows: usize,
    pub num_cols: usize,
    pub row: Vec<I>,
    pub col: Vec<I>,
    /// Optional edge-id permutation
    pub data: Option<Vec<I>>,
}

/// Layout-tagged sparse descriptor
#[derive(Clone, Debug, PartialEq)]
pub enum SparseMatrix<I: IndexType = i64> {
    Csr(CsrMatrix<I>),
    Coo(CooMatrix<I>),
}

/// Sparse storage layout
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SparseFormat {
    Csr,
    Coo,
}

impl SparseFormat {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Csr => "csr",
            Self::Coo => "coo",
        }
    }
}

impl<I: IndexType> CsrMatrix<I> {
    /// Assemble a CSR descriptor from raw arrays without validation
    pub fn new(
        num_rows: usize,
        num_cols: usize,
        indptr: Vec<I>,
        indices: Vec<I>,
        data: Option<Vec<I>>,
    ) -> Self {
        Self {
            num_rows,
            num_cols,
            indptr,
            indices,
            data,
        }
    }

    /// Build from `(row, col)` pairs
    ///
    /// Entries are grouped by row with a stable counting sort, so entries of a
    /// row keep their input order. The edge id of each entry is its position
    /// in `edges`, stored as the permutation array.
    pub fn from_edges(num_rows: usize, num_cols: usize, edges: &[(usize, usize)]) -> Result<Self> {
        let nnz = edges.len();
        check_construction_extents::<I>(nnz, num_rows, num_cols)?;
        let mut counts = vec![0usize; num_rows + 1];
        for (pos, &(r, c)) in edges.iter().enumerate() {
            if r >= num_rows {
                return Err(Error::index_out_of_bounds("csr", "row index", pos, num_rows));
            }
            if c >= num_cols {
                return Err(Error::index_out_of_bounds("csr", "column index", pos, num_cols));
            }
            counts[r + 1] += 1;
        }
        for r in 0..num_rows {
            counts[r + 1] += counts[r];
        }
        let indptr = counts.iter().map(|&o| I::from_index(o)).collect();

        let mut cursor = counts;
        let mut indices = vec![I::zero(); nnz];
        let mut data = vec![I::zero(); nnz];
        for (eid, &(r, c)) in edges.iter().enumerate() {
            let slot = cursor[r];
            indices[slot] = I::from_index(c);
            data[slot] = I::from_index(eid);
            cursor[r] += 1;
        }

        Ok(Self::new(num_rows, num_cols, indptr, indices, Some(data)))
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Entry positions of row `row` (requires a validated descriptor)
    #[inline]
    pub fn row_range(&self, row: usize) -> Range<usize> {
        self.indptr[row].index()..self.indptr[row + 1].index()
    }

    /// Edge id of the entry at `position`
    #[inline]
    pub fn edge_id(&self, position: usize) -> usize {
        edge_id(self.data.as_deref(), position)
    }

    /// Check the structural invariants: offsets, index bounds and edge ids
    pub fn validate(&self) -> Result<()> {
        const LAYOUT: &str = "csr";
        let nnz = self.nnz();
        if self.indptr.len() != self.num_rows + 1 {
            return Err(Error::malformed(
                LAYOUT,
                format!(
                    "row offsets have length {}, expected num_rows + 1 = {}",
                    self.indptr.len(),
                    self.num_rows + 1
                ),
            ));
        }
        check_fits::<I>(LAYOUT, nnz)?;

        let mut previous = 0usize;
        for (row, &offset) in self.indptr.iter().enumerate() {
            let offset = offset.try_index().ok_or_else(|| {
                Error::malformed(LAYOUT, format!("negative row offset at row {row}"))
            })?;
            if row == 0 && offset != 0 {
                return Err(Error::malformed(LAYOUT, "row offsets must start at 0"));
            }
            if offset < previous {
                return Err(Error::malformed(
                    LAYOUT,
                    format!("row offsets decrease at row {row}"),
                ));
            }
            previous = offset;
        }
        if previous != nnz {
            return Err(Error::malformed(
                LAYOUT,
                format!("last row offset {previous} differs from nnz {nnz}"),
            ));
        }

        check_indices(LAYOUT, "column index", &self.indices, self.num_cols)?;
        check_edge_ids(LAYOUT, self.data.as_deref(), nnz)
    }

    /// Same logical matrix in coordinate form, entries in row-major order
    pub fn to_coo(&self) -> CooMatrix<I> {
        let mut row = Vec::with_capacity(self.nnz());
        for r in 0..self.num_rows {
            let range = self.row_range(r);
            row.extend(std::iter::repeat(I::from_index(r)).take(range.len()));
        }
        CooMatrix::new(
            self.num_rows,
            self.num_cols,
            row,
            self.indices.clone(),
            self.data.clone(),
        )
    }
}

impl<I: IndexType> CooMatrix<I> {
    /// Assemble a COO descriptor from raw arrays without validation
    pub fn new(
        num_rows: usize,
        num_cols: usize,
        row: Vec<I>,
        col: Vec<I>,
        data: Option<Vec<I>>,
    ) -> Self {
        Self {
            num_rows,
            num_cols,
            row,
            col,
            data,
        }
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.row.len()
    }

    /// Edge id of the entry at `position`
    #[inline]
    pub fn edge_id(&self, position: usize) -> usize {
        edge_id(self.data.as_deref(), position)
    }

    /// Check array lengths, index bounds and edge ids
    pub fn validate(&self) -> Result<()> {
        const LAYOUT: &str = "coo";
        let nnz = self.nnz();
        if self.col.len() != nnz {
            return Err(Error::malformed(
                LAYOUT,
                format!(
                    "row array has {} entries but column array has {}",
                    nnz,
                    self.col.len()
                ),
            ));
        }
        check_fits::<I>(LAYOUT, nnz)?;
        check_indices(LAYOUT, "row index", &self.row, self.num_rows)?;
        check_indices(LAYOUT, "column index", &self.col, self.num_cols)?;
        check_edge_ids(LAYOUT, self.data.as_deref(), nnz)
    }

    /// Swap the roles of rows and columns; edge ids stay attached to entries
    pub fn transpose(&self) -> Self {
        Self::new(
            self.num_cols,
            self.num_rows,
            self.col.clone(),
            self.row.clone(),
            self.data.clone(),
        )
    }

    /// Same logical matrix in compressed-row form
    ///
    /// Edge ids are carried over (materialised when the COO had none), so
    /// the result addresses the same right-operand rows.
    pub fn to_csr(&self) -> Result<CsrMatrix<I>> {
        self.validate()?;
        let edges: Vec<(usize, usize)> = self
            .row
            .iter()
            .zip(&self.col)
            .map(|(r, c)| (r.index(), c.index()))
            .collect();
        let mut csr = CsrMatrix::<I>::from_edges(self.num_rows, self.num_cols, &edges)?;
        if let (Some(perm), Some(original)) = (csr.data.as_mut(), self.data.as_ref()) {
            for eid in perm.iter_mut() {
                *eid = original[eid.index()];
            }
        }
        Ok(csr)
    }
}

impl<I: IndexType> SparseMatrix<I> {
    pub fn format(&self) -> SparseFormat {
        match self {
            Self::Csr(_) => SparseFormat::Csr,
            Self::Coo(_) => SparseFormat::Coo,
        }
    }

    pub fn nnz(&self) -> usize {
        match self {
            Self::Csr(m) => m.nnz(),
            Self::Coo(m) => m.nnz(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Csr(m) => m.validate(),
            Self::Coo(m) => m.validate(),
        }
    }
}

impl<I: IndexType> From<CsrMatrix<I>> for SparseMatrix<I> {
    fn from(m: CsrMatrix<I>) -> Self {
        Self::Csr(m)
    }
}

impl<I: IndexType> From<CooMatrix<I>> for SparseMatrix<I> {
    fn from(m: CooMatrix<I>) -> Self {
        Self::Coo(m)
    }
}

#[inline]
fn edge_id<I: IndexType>(data: Option<&[I]>, position: usize) -> usize {
    match data {
        Some(ids) => ids[position].index(),
        None => position,
    }
}

/// Row offsets store `nnz` itself, so they need one more position than the
/// edge ids do
fn check_construction_extents<I: IndexType>(
    nnz: usize,
    num_rows: usize,
    num_cols: usize,
) -> Result<()> {
    if I::fits(nnz.saturating_add(1)) && I::fits(num_rows) && I::fits(num_cols) {
        Ok(())
    } else {
        Err(Error::malformed(
            "csr",
            format!("extent does not fit index type {}", I::NAME),
        ))
    }
}

fn check_fits<I: IndexType>(layout: &str, nnz: usize) -> Result<()> {
    if I::fits(nnz) {
        Ok(())
    } else {
        Err(Error::malformed(
            layout,
            format!("nnz {nnz} does not fit index type {}", I::NAME),
        ))
    }
}

fn check_indices<I: IndexType>(layout: &str, what: &str, indices: &[I], bound: usize) -> Result<()> {
    for (pos, &idx) in indices.iter().enumerate() {
        match idx.try_index() {
            Some(i) if i < bound => {}
            _ => return Err(Error::index_out_of_bounds(layout, what, pos, bound)),
        }
    }
    Ok(())
}

fn check_edge_ids<I: IndexType>(layout: &str, data: Option<&[I]>, nnz: usize) -> Result<()> {
    let Some(ids) = data else {
        return Ok(());
    };
    if ids.len() != nnz {
        return Err(Error::malformed(
            layout,
            format!("edge-id array has {} entries, expected nnz = {}", ids.len(), nnz),
        ));
    }
    let mut seen = vec![false; nnz];
    for (pos, &eid) in ids.iter().enumerate() {
        let e = match eid.try_index() {
            Some(e) if e < nnz => e,
            _ => return Err(Error::index_out_of_bounds(layout, "edge id", pos, nnz)),
        };
        if std::mem::replace(&mut seen[e], true) {
            return Err(Error::malformed(
                layout,
                format!("edge id {e} repeated at position {pos}"),
            ));
        }
    }
    Ok(())
}
