//! Broadcast index mapping between output and operand feature blocks
//!
//! A [`BcastInfo`] describes the feature shapes (trailing axes only) of the
//! output and of both operands, all padded to the same rank. Operand axes are
//! either equal to the output axis or of size 1. [`BcastInfo::unravel_ravel`]
//! turns a flattened output feature offset into the flattened offsets of the
//! left and right operands.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Per-axis shape and stride metadata for a broadcast aggregation
///
/// Only constructed through [`BcastInfo::from_parts`] or
/// [`BcastInfo::from_feature_shapes`], so every mapped offset stays inside
/// its operand block. Deserialization goes through the same checks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BcastParts")]
pub struct BcastInfo {
    out_shape: Vec<usize>,
    out_stride: Vec<usize>,
    lhs_shape: Vec<usize>,
    lhs_stride: Vec<usize>,
    rhs_shape: Vec<usize>,
    rhs_stride: Vec<usize>,
}

/// Unchecked wire form of [`BcastInfo`]
#[derive(Deserialize)]
struct BcastParts {
    out_shape: Vec<usize>,
    out_stride: Vec<usize>,
    lhs_shape: Vec<usize>,
    lhs_stride: Vec<usize>,
    rhs_shape: Vec<usize>,
    rhs_stride: Vec<usize>,
}

impl TryFrom<BcastParts> for BcastInfo {
    type Error = Error;

    fn try_from(parts: BcastParts) -> Result<Self> {
        Self::from_parts(
            parts.out_shape,
            parts.out_stride,
            parts.lhs_shape,
            parts.lhs_stride,
            parts.rhs_shape,
            parts.rhs_stride,
        )
    }
}

/// Which operand shares the output layout
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FastPath {
    Lhs,
    Rhs,
    None,
}

/// Row-major strides of `shape`
pub fn contiguous_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1usize; shape.len()];
    for d in (0..shape.len().saturating_sub(1)).rev() {
        strides[d] = strides[d + 1] * shape[d + 1];
    }
    strides
}

/// Every offset reachable through `shape`/`stride` must be below the block length
fn check_operand(name: &str, shape: &[usize], stride: &[usize]) -> Result<()> {
    let len: usize = shape.iter().product();
    if len == 0 {
        return Ok(());
    }
    let mut max_offset = 0usize;
    for (d, (&extent, &step)) in shape.iter().zip(stride).enumerate() {
        if extent > 1 && step == 0 {
            return Err(Error::Broadcast(format!("{name} axis {d} has stride 0")));
        }
        max_offset = (extent - 1)
            .checked_mul(step)
            .and_then(|span| max_offset.checked_add(span))
            .ok_or_else(|| Error::Broadcast(format!("{name} strides overflow")))?;
    }
    if max_offset >= len {
        return Err(Error::Broadcast(format!(
            "{name} stride {stride:?} reaches offset {max_offset}, block holds {len}"
        )));
    }
    Ok(())
}

impl BcastInfo {
    /// Assemble a descriptor from explicit per-axis metadata
    ///
    /// # Errors
    /// `Broadcast` if
    /// - ranks differ
    /// - an operand axis is neither 1 nor the output extent
    /// - `out_stride` is not the row-major stride of `out_shape`
    /// - an operand axis of extent > 1 has stride 0
    /// - an operand's largest offset falls outside its block
    pub fn from_parts(
        out_shape: Vec<usize>,
        out_stride: Vec<usize>,
        lhs_shape: Vec<usize>,
        lhs_stride: Vec<usize>,
        rhs_shape: Vec<usize>,
        rhs_stride: Vec<usize>,
    ) -> Result<Self> {
        let ndim = out_shape.len();
        let ranks = [
            out_stride.len(),
            lhs_shape.len(),
            lhs_stride.len(),
            rhs_shape.len(),
            rhs_stride.len(),
        ];
        if ranks.iter().any(|&r| r != ndim) {
            return Err(Error::Broadcast(format!(
                "all shape/stride arrays must have rank {ndim}, got {ranks:?}"
            )));
        }
        for d in 0..ndim {
            for (name, sh) in [("lhs", lhs_shape[d]), ("rhs", rhs_shape[d])] {
                if sh != 1 && sh != out_shape[d] {
                    return Err(Error::Broadcast(format!(
                        "{name} axis {d} has extent {sh}, output has {}",
                        out_shape[d]
                    )));
                }
            }
        }
        if out_stride != contiguous_strides(&out_shape) {
            return Err(Error::Broadcast(format!(
                "output stride {out_stride:?} is not contiguous for shape {out_shape:?}"
            )));
        }
        check_operand("lhs", &lhs_shape, &lhs_stride)?;
        check_operand("rhs", &rhs_shape, &rhs_stride)?;
        Ok(Self {
            out_shape,
            out_stride,
            lhs_shape,
            lhs_stride,
            rhs_shape,
            rhs_stride,
        })
    }

    /// Infer the descriptor from the two operand feature shapes
    ///
    /// Shapes are right-aligned; missing leading axes count as size 1.
    pub fn from_feature_shapes(lhs: &[usize], rhs: &[usize]) -> Result<Self> {
        let ndim = lhs.len().max(rhs.len());
        let pad = |shape: &[usize]| -> Vec<usize> {
            let mut padded = vec![1usize; ndim - shape.len()];
            padded.extend_from_slice(shape);
            padded
        };
        let lhs_shape = pad(lhs);
        let rhs_shape = pad(rhs);

        let mut out_shape = Vec::with_capacity(ndim);
        for d in 0..ndim {
            let (l, r) = (lhs_shape[d], rhs_shape[d]);
            let o = if l == r || r == 1 {
                l
            } else if l == 1 {
                r
            } else {
                return Err(Error::Broadcast(format!(
                    "feature shapes {lhs:?} and {rhs:?} are incompatible at axis {d}"
                )));
            };
            out_shape.push(o);
        }

        let out_stride = contiguous_strides(&out_shape);
        let lhs_stride = contiguous_strides(&lhs_shape);
        let rhs_stride = contiguous_strides(&rhs_shape);
        Self::from_parts(out_shape, out_stride, lhs_shape, lhs_stride, rhs_shape, rhs_stride)
    }

    pub fn out_shape(&self) -> &[usize] {
        &self.out_shape
    }

    pub fn out_stride(&self) -> &[usize] {
        &self.out_stride
    }

    pub fn lhs_shape(&self) -> &[usize] {
        &self.lhs_shape
    }

    pub fn lhs_stride(&self) -> &[usize] {
        &self.lhs_stride
    }

    pub fn rhs_shape(&self) -> &[usize] {
        &self.rhs_shape
    }

    pub fn rhs_stride(&self) -> &[usize] {
        &self.rhs_stride
    }

    pub fn ndim(&self) -> usize {
        self.out_shape.len()
    }

    /// Scalars per output feature block
    pub fn out_len(&self) -> usize {
        self.out_shape.iter().product()
    }

    /// Scalars per left operand feature block
    pub fn lhs_len(&self) -> usize {
        self.lhs_shape.iter().product()
    }

    /// Scalars per right operand feature block
    pub fn rhs_len(&self) -> usize {
        self.rhs_shape.iter().product()
    }

    /// Whether the operand shapes actually differ
    pub fn is_broadcast(&self) -> bool {
        self.lhs_shape != self.rhs_shape
    }

    fn fast_path(&self) -> FastPath {
        if self.lhs_shape == self.out_shape && self.lhs_stride == self.out_stride {
            FastPath::Lhs
        } else if self.rhs_shape == self.out_shape && self.rhs_stride == self.out_stride {
            FastPath::Rhs
        } else {
            FastPath::None
        }
    }

    /// Flattened offset into one operand for output offset `idx`
    #[inline]
    fn ravel(&self, idx: usize, shape: &[usize], stride: &[usize]) -> usize {
        let mut offset = 0;
        for d in 0..self.ndim() {
            let i = (idx / self.out_stride[d]) % self.out_shape[d];
            // Equivalent to min(i, shape[d] - 1) * stride[d] for shape[d] in {1, out}
            if shape[d] > i {
                offset += i * stride[d];
            }
        }
        offset
    }

    /// Map output feature offset `idx` to `(lhs_offset, rhs_offset)`
    ///
    /// Takes the fast path when one operand shares the output layout: that
    /// operand's offset is `idx` itself and only the other is computed.
    pub fn unravel_ravel(&self, idx: usize) -> (usize, usize) {
        match self.fast_path() {
            FastPath::Lhs => (idx, self.ravel(idx, &self.rhs_shape, &self.rhs_stride)),
            FastPath::Rhs => (self.ravel(idx, &self.lhs_shape, &self.lhs_stride), idx),
            FastPath::None => self.unravel_ravel_general(idx),
        }
    }

    /// Map without any fast path; reference for [`BcastInfo::unravel_ravel`]
    pub fn unravel_ravel_general(&self, idx: usize) -> (usize, usize) {
        (
            self.ravel(idx, &self.lhs_shape, &self.lhs_stride),
            self.ravel(idx, &self.rhs_shape, &self.rhs_stride),
        )
    }

    /// Offset pairs for every output feature offset, in order
    pub fn offset_table(&self) -> Vec<(usize, usize)> {
        let path = self.fast_path();
        (0..self.out_len())
            .map(|idx| match path {
                FastPath::Lhs => (idx, self.ravel(idx, &self.rhs_shape, &self.rhs_stride)),
                FastPath::Rhs => (self.ravel(idx, &self.lhs_shape, &self.lhs_stride), idx),
                FastPath::None => self.unravel_ravel_general(idx),
            })
            .collect()
    }
}
