//! Execution engines for controlling computation strategy
//!
//! This module provides the execution engine abstraction that kernels use to
//! fan work out across rows or sparse entries. A kernel is written once
//! against [`ExecutionEngine`]; the engine decides whether the loop runs on
//! the calling thread or on a Rayon pool.
//!
//! # Design Philosophy
//!
//! - **Fork-Join**: Every loop returns only after all iterations completed
//! - **Disjoint Writes**: Mutable fan-out hands each iteration its own
//!   `&mut` item, so row-partitioned kernels need no synchronization
//! - **Thread Pool Integration**: Works with the global Rayon pool or a
//!   caller-provided one

#[cfg(feature = "parallel")]
use crate::Result;

/// Execution strategy for aggregation loops
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ExecutionStrategy {
    /// Process items sequentially
    Sequential,
    /// Process items in parallel
    Parallel,
    /// Automatically choose based on the machine
    Auto,
}

impl Default for ExecutionStrategy {
    fn default() -> Self {
        Self::Auto
    }
}

/// Grain-size policy of an engine
pub trait ExecutionMode {
    /// Minimum number of consecutive iterations handed to one task
    fn grain_size(n_items: usize, n_threads: usize) -> usize;
}

/// Trait for execution engines that control how loops are performed
pub trait ExecutionEngine: Clone + Send + Sync {
    /// Call `f(i)` for every `i` in `0..n`
    fn for_each_index<F>(&self, n: usize, f: F)
    where
        F: Fn(usize) + Sync + Send;

    /// Call `f(i, &mut items[i])` for every item
    fn for_each_mut<U, F>(&self, items: &mut [U], f: F)
    where
        U: Send,
        F: Fn(usize, &mut U) + Sync + Send;

    /// Call `f(i, chunk_i)` for every `chunk_size`-long chunk of `data`
    ///
    /// `chunk_size` must be non-zero.
    fn for_each_chunk_mut<U, F>(&self, data: &mut [U], chunk_size: usize, f: F)
    where
        U: Send,
        F: Fn(usize, &mut [U]) + Sync + Send;

    /// Get the execution strategy
    fn strategy(&self) -> ExecutionStrategy;

    /// Check if parallel execution is available
    fn is_parallel(&self) -> bool {
        matches!(
            self.strategy(),
            ExecutionStrategy::Parallel | ExecutionStrategy::Auto
        )
    }

    /// Get the number of threads available
    fn num_threads(&self) -> usize;
}

/// Sequential execution engine
///
/// Executes all loops in the current thread, in ascending index order.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialEngine;

impl SequentialEngine {
    pub fn new() -> Self {
        Self
    }
}

impl ExecutionMode for SequentialEngine {
    fn grain_size(n_items: usize, _n_threads: usize) -> usize {
        n_items.max(1)
    }
}

impl ExecutionEngine for SequentialEngine {
    fn for_each_index<F>(&self, n: usize, f: F)
    where
        F: Fn(usize) + Sync + Send,
    {
        (0..n).for_each(f)
    }

    fn for_each_mut<U, F>(&self, items: &mut [U], f: F)
    where
        U: Send,
        F: Fn(usize, &mut U) + Sync + Send,
    {
        for (i, item) in items.iter_mut().enumerate() {
            f(i, item);
        }
    }

    fn for_each_chunk_mut<U, F>(&self, data: &mut [U], chunk_size: usize, f: F)
    where
        U: Send,
        F: Fn(usize, &mut [U]) + Sync + Send,
    {
        for (i, chunk) in data.chunks_mut(chunk_size).enumerate() {
            f(i, chunk);
        }
    }

    fn strategy(&self) -> ExecutionStrategy {
        ExecutionStrategy::Sequential
    }

    fn num_threads(&self) -> usize {
        1
    }
}

/// Parallel execution engine using Rayon
///
/// Executes loops in parallel using Rayon's thread pool.
#[cfg(feature = "parallel")]
#[derive(Clone, Debug)]
pub struct ParallelEngine {
    thread_pool: Option<std::sync::Arc<rayon::ThreadPool>>,
    min_len: Option<usize>,
}

#[cfg(feature = "parallel")]
impl Default for ParallelEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "parallel")]
impl ParallelEngine {
    /// Create a new parallel engine with default thread pool
    pub fn new() -> Self {
        Self {
            thread_pool: None,
            min_len: None,
        }
    }

    /// Create a new parallel engine with a custom thread pool
    pub fn with_thread_pool(pool: std::sync::Arc<rayon::ThreadPool>) -> Self {
        Self {
            thread_pool: Some(pool),
            min_len: None,
        }
    }

    /// Create with a specific number of threads
    pub fn with_num_threads(num_threads: usize) -> Result<Self> {
        if num_threads == 0 {
            return Err(crate::Error::InvalidParameter(
                "num_threads must be positive".to_string(),
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .map_err(|e| crate::Error::Execution(format!("Failed to create thread pool: {e}")))?;

        Ok(Self {
            thread_pool: Some(std::sync::Arc::new(pool)),
            min_len: None,
        })
    }

    /// Override the grain size heuristic
    pub fn with_min_len(mut self, min_len: usize) -> Self {
        self.min_len = Some(min_len.max(1));
        self
    }

    fn install<R: Send>(&self, f: impl FnOnce() -> R + Send) -> R {
        match &self.thread_pool {
            Some(pool) => pool.install(f),
            None => f(),
        }
    }

    fn min_len_for(&self, n_items: usize) -> usize {
        self.min_len
            .unwrap_or_else(|| Self::grain_size(n_items, self.num_threads()))
    }
}

#[cfg(feature = "parallel")]
impl ExecutionMode for ParallelEngine {
    fn grain_size(n_items: usize, n_threads: usize) -> usize {
        let target_chunks = n_threads.max(1) * 6;
        let grain = n_items.div_ceil(target_chunks);
        grain.max(4).min(n_items.max(1))
    }
}

#[cfg(feature = "parallel")]
impl ExecutionEngine for ParallelEngine {
    fn for_each_index<F>(&self, n: usize, f: F)
    where
        F: Fn(usize) + Sync + Send,
    {
        use rayon::prelude::*;

        let min_len = self.min_len_for(n);
        self.install(|| (0..n).into_par_iter().with_min_len(min_len).for_each(f))
    }

    fn for_each_mut<U, F>(&self, items: &mut [U], f: F)
    where
        U: Send,
        F: Fn(usize, &mut U) + Sync + Send,
    {
        use rayon::prelude::*;

        let min_len = self.min_len_for(items.len());
        self.install(|| {
            items
                .par_iter_mut()
                .with_min_len(min_len)
                .enumerate()
                .for_each(|(i, item)| f(i, item))
        })
    }

    fn for_each_chunk_mut<U, F>(&self, data: &mut [U], chunk_size: usize, f: F)
    where
        U: Send,
        F: Fn(usize, &mut [U]) + Sync + Send,
    {
        use rayon::prelude::*;

        let min_len = self.min_len_for(data.len().div_ceil(chunk_size.max(1)));
        self.install(|| {
            data.par_chunks_mut(chunk_size)
                .with_min_len(min_len)
                .enumerate()
                .for_each(|(i, chunk)| f(i, chunk))
        })
    }

    fn strategy(&self) -> ExecutionStrategy {
        ExecutionStrategy::Parallel
    }

    fn num_threads(&self) -> usize {
        if let Some(pool) = &self.thread_pool {
            pool.current_num_threads()
        } else {
            rayon::current_num_threads()
        }
    }
}

/// Engine selected at runtime from configuration
#[derive(Clone, Debug)]
pub enum ConfiguredEngine {
    Sequential(SequentialEngine),
    #[cfg(feature = "parallel")]
    Parallel(ParallelEngine),
}

macro_rules! delegate {
    ($self:ident, $engine:ident => $body:expr) => {
        match $self {
            ConfiguredEngine::Sequential($engine) => $body,
            #[cfg(feature = "parallel")]
            ConfiguredEngine::Parallel($engine) => $body,
        }
    };
}

impl ExecutionEngine for ConfiguredEngine {
    fn for_each_index<F>(&self, n: usize, f: F)
    where
        F: Fn(usize) + Sync + Send,
    {
        delegate!(self, e => e.for_each_index(n, f))
    }

    fn for_each_mut<U, F>(&self, items: &mut [U], f: F)
    where
        U: Send,
        F: Fn(usize, &mut U) + Sync + Send,
    {
        delegate!(self, e => e.for_each_mut(items, f))
    }

    fn for_each_chunk_mut<U, F>(&self, data: &mut [U], chunk_size: usize, f: F)
    where
        U: Send,
        F: Fn(usize, &mut [U]) + Sync + Send,
    {
        delegate!(self, e => e.for_each_chunk_mut(data, chunk_size, f))
    }

    fn strategy(&self) -> ExecutionStrategy {
        delegate!(self, e => e.strategy())
    }

    fn num_threads(&self) -> usize {
        delegate!(self, e => e.num_threads())
    }
}

/// Create a sequential engine
pub fn sequential() -> SequentialEngine {
    SequentialEngine::new()
}

/// Create a parallel engine on the global Rayon pool
#[cfg(feature = "parallel")]
pub fn parallel() -> ParallelEngine {
    ParallelEngine::new()
}

/// Create an auto-selected engine based on available features
pub fn auto_engine() -> ConfiguredEngine {
    #[cfg(feature = "parallel")]
    {
        if num_cpus::get() > 1 {
            return ConfiguredEngine::Parallel(ParallelEngine::new());
        }
    }
    ConfiguredEngine::Sequential(SequentialEngine::new())
}
