//! Element and index type traits for aggregation kernels
//!
//! Two trait families live here:
//!
//! - [`Numeric`] for feature scalars (f32, f64, i32, i64). Every element type
//!   names an [`AtomicAccumulator`] so edge-driven kernels can sum into shared
//!   destinations without locks.
//! - [`IndexType`] for sparse index arrays and argument buffers (i32, i64,
//!   u32, u64, usize).

use bytemuck::Pod;
use num_traits::{Num, PrimInt};
use std::fmt::Debug;
use std::sync::atomic::{AtomicI32, AtomicI64, AtomicU32, AtomicU64, Ordering};

/// Shared accumulation cell supporting concurrent addition
///
/// Relaxed ordering is sufficient: the fork-join barrier at the end of a
/// kernel publishes the final values before they are loaded.
pub trait AtomicAccumulator<T>: Send + Sync {
    /// Create a cell holding `value`
    fn new(value: T) -> Self;

    /// Atomically add `value` to the cell
    fn fetch_add(&self, value: T);

    /// Read the current value
    fn load(&self) -> T;
}

/// Lock-free f32 accumulator (compare-and-swap on the bit pattern)
#[derive(Debug)]
pub struct AtomicF32(AtomicU32);

impl AtomicAccumulator<f32> for AtomicF32 {
    fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    fn fetch_add(&self, value: f32) {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            let next = (f32::from_bits(current) + value).to_bits();
            match self
                .0
                .compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(observed) => current = observed,
            }
        }
    }

    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }
}

/// Lock-free f64 accumulator (compare-and-swap on the bit pattern)
#[derive(Debug)]
pub struct AtomicF64(AtomicU64);

impl AtomicAccumulator<f64> for AtomicF64 {
    fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    fn fetch_add(&self, value: f64) {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + value).to_bits();
            match self
                .0
                .compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(observed) => current = observed,
            }
        }
    }

    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }
}

impl AtomicAccumulator<i32> for AtomicI32 {
    fn new(value: i32) -> Self {
        AtomicI32::new(value)
    }

    fn fetch_add(&self, value: i32) {
        AtomicI32::fetch_add(self, value, Ordering::Relaxed);
    }

    fn load(&self) -> i32 {
        AtomicI32::load(self, Ordering::Relaxed)
    }
}

impl AtomicAccumulator<i64> for AtomicI64 {
    fn new(value: i64) -> Self {
        AtomicI64::new(value)
    }

    fn fetch_add(&self, value: i64) {
        AtomicI64::fetch_add(self, value, Ordering::Relaxed);
    }

    fn load(&self) -> i64 {
        AtomicI64::load(self, Ordering::Relaxed)
    }
}

/// Base trait for feature scalars that can be aggregated
pub trait Numeric: Pod + Num + Copy + PartialOrd + Debug + Send + Sync + 'static {
    /// Lock-free accumulation cell for this type
    type Atomic: AtomicAccumulator<Self>;

    /// Most negative representable value (identity of `max`)
    fn lowest() -> Self;

    /// Most positive representable value (identity of `min`)
    fn highest() -> Self;

    /// Addition used by every sum path; integers wrap on overflow like the
    /// atomic accumulators do
    fn add_wrapping(self, rhs: Self) -> Self;

    /// Multiplication used by the `mul` operator; integers wrap on overflow
    fn mul_wrapping(self, rhs: Self) -> Self;
}

impl Numeric for f64 {
    type Atomic = AtomicF64;

    fn lowest() -> Self {
        f64::MIN
    }

    fn highest() -> Self {
        f64::MAX
    }

    fn add_wrapping(self, rhs: Self) -> Self {
        self + rhs
    }

    fn mul_wrapping(self, rhs: Self) -> Self {
        self * rhs
    }
}

impl Numeric for f32 {
    type Atomic = AtomicF32;

    fn lowest() -> Self {
        f32::MIN
    }

    fn highest() -> Self {
        f32::MAX
    }

    fn add_wrapping(self, rhs: Self) -> Self {
        self + rhs
    }

    fn mul_wrapping(self, rhs: Self) -> Self {
        self * rhs
    }
}

impl Numeric for i32 {
    type Atomic = AtomicI32;

    fn lowest() -> Self {
        i32::MIN
    }

    fn highest() -> Self {
        i32::MAX
    }

    fn add_wrapping(self, rhs: Self) -> Self {
        i32::wrapping_add(self, rhs)
    }

    fn mul_wrapping(self, rhs: Self) -> Self {
        i32::wrapping_mul(self, rhs)
    }
}

impl Numeric for i64 {
    type Atomic = AtomicI64;

    fn lowest() -> Self {
        i64::MIN
    }

    fn highest() -> Self {
        i64::MAX
    }

    fn add_wrapping(self, rhs: Self) -> Self {
        i64::wrapping_add(self, rhs)
    }

    fn mul_wrapping(self, rhs: Self) -> Self {
        i64::wrapping_mul(self, rhs)
    }
}

/// Integer type used for sparse index arrays and argument buffers
pub trait IndexType: PrimInt + Pod + Debug + Send + Sync + 'static {
    /// Short name used in diagnostics
    const NAME: &'static str;

    /// Checked conversion to a buffer offset (`None` for negative values)
    fn try_index(self) -> Option<usize> {
        self.to_usize()
    }

    /// Conversion to a buffer offset for values already validated
    ///
    /// Negative values map to `usize::MAX`, so an unvalidated index fails
    /// the slice bounds check instead of aliasing a valid slot.
    #[inline]
    fn index(self) -> usize {
        self.to_usize().unwrap_or(usize::MAX)
    }

    /// Truncating conversion from a position; callers check
    /// [`IndexType::fits`] beforehand
    fn from_index(index: usize) -> Self;

    /// Whether `extent` positions `[0, extent)` are all representable
    fn fits(extent: usize) -> bool {
        extent == 0 || Self::max_value().to_usize().map_or(true, |max| extent - 1 <= max)
    }
}

macro_rules! impl_index_type {
    ($($ty:ty),*) => {
        $(
            impl IndexType for $ty {
                const NAME: &'static str = stringify!($ty);

                #[inline]
                fn from_index(index: usize) -> Self {
                    index as $ty
                }
            }
        )*
    };
}

impl_index_type!(i32, i64, u32, u64, usize);
