//! Combine operators and reduction comparators
//!
//! Operators are zero-sized types so each kernel is monomorphized for the
//! operator pair it runs with. The runtime-facing [`BinaryOpKind`] and
//! [`ReduceKind`] enums are parsed once from identifiers and mapped onto the
//! types through [`with_binary_op!`](crate::with_binary_op) and
//! [`with_comparator!`](crate::with_comparator).

use spmm_core::{Error, Numeric, Result};
use std::fmt;
use std::str::FromStr;

/// Element-wise combine of a left (source node) and right (edge) value
///
/// `USE_LHS` / `USE_RHS` declare which operands are read. Kernels pass
/// `None` for an unread operand and never touch its buffer.
pub trait BinaryOperator<T: Numeric>: Copy + Send + Sync + 'static {
    const NAME: &'static str;
    const USE_LHS: bool;
    const USE_RHS: bool;

    fn call(lhs: Option<T>, rhs: Option<T>) -> T;
}

/// Extremum reduction: identity plus strict replacement predicate
pub trait Comparator<T: Numeric>: Copy + Send + Sync + 'static {
    const NAME: &'static str;

    /// Value of a destination with no contributing entry
    fn identity() -> T;

    /// Whether `candidate` strictly beats `accum`
    fn replace(accum: T, candidate: T) -> bool;
}

/// `lhs + rhs`
#[derive(Clone, Copy, Debug, Default)]
pub struct Add;

/// `lhs * rhs`
#[derive(Clone, Copy, Debug, Default)]
pub struct Mul;

/// Left operand only (`copy_u`)
#[derive(Clone, Copy, Debug, Default)]
pub struct CopyLhs;

/// Right operand only (`copy_e`)
#[derive(Clone, Copy, Debug, Default)]
pub struct CopyRhs;

impl<T: Numeric> BinaryOperator<T> for Add {
    const NAME: &'static str = "add";
    const USE_LHS: bool = true;
    const USE_RHS: bool = true;

    #[inline(always)]
    fn call(lhs: Option<T>, rhs: Option<T>) -> T {
        lhs.unwrap_or_else(T::zero)
            .add_wrapping(rhs.unwrap_or_else(T::zero))
    }
}

impl<T: Numeric> BinaryOperator<T> for Mul {
    const NAME: &'static str = "mul";
    const USE_LHS: bool = true;
    const USE_RHS: bool = true;

    #[inline(always)]
    fn call(lhs: Option<T>, rhs: Option<T>) -> T {
        lhs.unwrap_or_else(T::one)
            .mul_wrapping(rhs.unwrap_or_else(T::one))
    }
}

impl<T: Numeric> BinaryOperator<T> for CopyLhs {
    const NAME: &'static str = "copy_u";
    const USE_LHS: bool = true;
    const USE_RHS: bool = false;

    #[inline(always)]
    fn call(lhs: Option<T>, _rhs: Option<T>) -> T {
        lhs.unwrap_or_else(T::zero)
    }
}

impl<T: Numeric> BinaryOperator<T> for CopyRhs {
    const NAME: &'static str = "copy_e";
    const USE_LHS: bool = false;
    const USE_RHS: bool = true;

    #[inline(always)]
    fn call(_lhs: Option<T>, rhs: Option<T>) -> T {
        rhs.unwrap_or_else(T::zero)
    }
}

/// Running maximum
#[derive(Clone, Copy, Debug, Default)]
pub struct Max;

/// Running minimum
#[derive(Clone, Copy, Debug, Default)]
pub struct Min;

impl<T: Numeric> Comparator<T> for Max {
    const NAME: &'static str = "max";

    #[inline(always)]
    fn identity() -> T {
        T::lowest()
    }

    #[inline(always)]
    fn replace(accum: T, candidate: T) -> bool {
        accum < candidate
    }
}

impl<T: Numeric> Comparator<T> for Min {
    const NAME: &'static str = "min";

    #[inline(always)]
    fn identity() -> T {
        T::highest()
    }

    #[inline(always)]
    fn replace(accum: T, candidate: T) -> bool {
        accum > candidate
    }
}

/// Combine operator identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOpKind {
    Add,
    Mul,
    CopyLhs,
    CopyRhs,
}

impl BinaryOpKind {
    pub const ALL: [BinaryOpKind; 4] = [Self::Add, Self::Mul, Self::CopyLhs, Self::CopyRhs];

    /// Identifier accepted by [`BinaryOpKind::parse`]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Mul => "mul",
            Self::CopyLhs => "copy_u",
            Self::CopyRhs => "copy_e",
        }
    }

    /// Resolve an identifier, failing with `UnsupportedOperator`
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "add" => Ok(Self::Add),
            "mul" => Ok(Self::Mul),
            "copy_u" => Ok(Self::CopyLhs),
            "copy_e" => Ok(Self::CopyRhs),
            other => Err(Error::UnsupportedOperator(other.to_string())),
        }
    }

    pub fn uses_lhs(&self) -> bool {
        !matches!(self, Self::CopyRhs)
    }

    pub fn uses_rhs(&self) -> bool {
        !matches!(self, Self::CopyLhs)
    }
}

impl FromStr for BinaryOpKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for BinaryOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reducer identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReduceKind {
    Sum,
    Max,
    Min,
}

impl ReduceKind {
    pub const ALL: [ReduceKind; 3] = [Self::Sum, Self::Max, Self::Min];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Max => "max",
            Self::Min => "min",
        }
    }

    /// Resolve an identifier, failing with `UnsupportedReducer`
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "sum" => Ok(Self::Sum),
            "max" => Ok(Self::Max),
            "min" => Ok(Self::Min),
            other => Err(Error::UnsupportedReducer(other.to_string())),
        }
    }

    /// Whether this reducer tracks argument indices
    pub fn is_extremum(&self) -> bool {
        matches!(self, Self::Max | Self::Min)
    }
}

impl FromStr for ReduceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ReduceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bind the operator type selected by a [`BinaryOpKind`] to `$op` and
/// evaluate `$body` once per variant
#[macro_export]
macro_rules! with_binary_op {
    ($kind:expr, $op:ident => $body:expr) => {
        match $kind {
            $crate::ops::BinaryOpKind::Add => {
                let $op = $crate::ops::Add;
                $body
            }
            $crate::ops::BinaryOpKind::Mul => {
                let $op = $crate::ops::Mul;
                $body
            }
            $crate::ops::BinaryOpKind::CopyLhs => {
                let $op = $crate::ops::CopyLhs;
                $body
            }
            $crate::ops::BinaryOpKind::CopyRhs => {
                let $op = $crate::ops::CopyRhs;
                $body
            }
        }
    };
}

/// Bind the comparator selected by a [`ReduceKind`] to `$cmp`
///
/// `sum` has no comparator and evaluates to `Err(UnsupportedReducer)`.
#[macro_export]
macro_rules! with_comparator {
    ($kind:expr, $cmp:ident => $body:expr) => {
        match $kind {
            $crate::ops::ReduceKind::Max => {
                let $cmp = $crate::ops::Max;
                $body
            }
            $crate::ops::ReduceKind::Min => {
                let $cmp = $crate::ops::Min;
                $body
            }
            $crate::ops::ReduceKind::Sum => Err($crate::Error::UnsupportedReducer(
                "sum is not an extremum reducer".to_string(),
            )),
        }
    };
}
