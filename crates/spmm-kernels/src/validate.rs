//! Entry checks on dense operands against the sparse descriptor

use crate::features::FeatureMap;
use spmm_core::{DenseTensor, Error, IndexType, Numeric, Result};

/// Leading-axis requirements derived from the sparse descriptor
#[derive(Clone, Copy, Debug)]
pub(crate) struct Extents {
    /// Rows the left operand must provide at least
    pub lhs_rows: usize,
    /// Rows the right operand must provide at least (one per edge id)
    pub rhs_rows: usize,
    /// Exact number of output rows
    pub out_rows: usize,
}

/// Check operand and output shapes before any write
pub(crate) fn check_dense<T: Numeric, M: FeatureMap>(
    map: &M,
    extents: Extents,
    use_lhs: bool,
    use_rhs: bool,
    ufeat: &DenseTensor<T>,
    efeat: &DenseTensor<T>,
    out: &DenseTensor<T>,
) -> Result<()> {
    if out.num_rows() != extents.out_rows {
        return Err(Error::size_mismatch(
            extents.out_rows,
            out.num_rows(),
            "output rows",
        ));
    }
    if out.feature_dim() != map.out_len() {
        return Err(Error::size_mismatch(
            map.out_len(),
            out.feature_dim(),
            "output feature length",
        ));
    }
    if use_lhs {
        check_operand("lhs", ufeat, extents.lhs_rows, map.lhs_len())?;
    }
    if use_rhs {
        check_operand("rhs", efeat, extents.rhs_rows, map.rhs_len())?;
    }
    Ok(())
}

fn check_operand<T: Numeric>(
    role: &str,
    feat: &DenseTensor<T>,
    min_rows: usize,
    row_len: usize,
) -> Result<()> {
    if feat.feature_dim() != row_len {
        return Err(Error::size_mismatch(
            row_len,
            feat.feature_dim(),
            &format!("{role} feature length"),
        ));
    }
    if feat.num_rows() < min_rows {
        return Err(Error::ShapeMismatch(format!(
            "{role} has {} rows, the sparse structure addresses {min_rows}",
            feat.num_rows()
        )));
    }
    Ok(())
}

/// Argument buffers of operands that are read must match the output shape
pub(crate) fn check_args<T: Numeric, I: IndexType>(
    out: &DenseTensor<T>,
    argu: Option<&DenseTensor<I>>,
    arge: Option<&DenseTensor<I>>,
    use_lhs: bool,
    use_rhs: bool,
) -> Result<()> {
    for (role, arg, used) in [("argu", argu, use_lhs), ("arge", arge, use_rhs)] {
        if let (true, Some(arg)) = (used, arg) {
            if arg.shape() != out.shape() {
                return Err(Error::ShapeMismatch(format!(
                    "{role} has shape {:?}, output has {:?}",
                    arg.shape(),
                    out.shape()
                )));
            }
        }
    }
    Ok(())
}
