//! Configuration for aggregation runs
//!
//! A [`SpmmConfig`] is plain data (serde-friendly) describing how kernels are
//! scheduled. [`SpmmConfig::build_engine`] turns it into a
//! [`ConfiguredEngine`].

use crate::error::{Error, Result};
use crate::execution::{ConfiguredEngine, ExecutionStrategy, SequentialEngine};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Scheduling configuration for aggregation kernels
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpmmConfig {
    /// Sequential, parallel, or machine-dependent
    pub strategy: ExecutionStrategy,
    /// Dedicated pool size; `None` uses the global Rayon pool
    pub num_threads: Option<usize>,
    /// Minimum rows or entries per parallel task; 0 keeps the heuristic
    pub min_parallel_len: usize,
}

impl Default for SpmmConfig {
    fn default() -> Self {
        Self {
            strategy: ExecutionStrategy::Auto,
            num_threads: None,
            min_parallel_len: 0,
        }
    }
}

impl SpmmConfig {
    /// Configuration that always runs on the calling thread
    pub fn sequential() -> Self {
        Self {
            strategy: ExecutionStrategy::Sequential,
            ..Self::default()
        }
    }

    /// Set the execution strategy
    pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Use a dedicated pool with `num_threads` workers
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Set the minimum task length
    pub fn with_min_parallel_len(mut self, min_len: usize) -> Self {
        self.min_parallel_len = min_len;
        self
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if self.num_threads == Some(0) {
            return Err(Error::InvalidParameter(
                "num_threads must be positive".to_string(),
            ));
        }
        if self.strategy == ExecutionStrategy::Parallel && !cfg!(feature = "parallel") {
            return Err(Error::InvalidParameter(
                "parallel strategy requires the `parallel` feature".to_string(),
            ));
        }
        Ok(())
    }

    /// Strategy after resolving `Auto` against the machine and features
    pub fn resolved_strategy(&self) -> ExecutionStrategy {
        match self.strategy {
            ExecutionStrategy::Auto => {
                let threads = self.num_threads.unwrap_or_else(num_cpus::get);
                if cfg!(feature = "parallel") && threads > 1 {
                    ExecutionStrategy::Parallel
                } else {
                    ExecutionStrategy::Sequential
                }
            }
            other => other,
        }
    }

    /// Build the engine described by this configuration
    pub fn build_engine(&self) -> Result<ConfiguredEngine> {
        self.validate()?;
        let strategy = self.resolved_strategy();
        debug!(?strategy, num_threads = ?self.num_threads, "building execution engine");
        match strategy {
            #[cfg(feature = "parallel")]
            ExecutionStrategy::Parallel => {
                use crate::execution::ParallelEngine;

                let mut engine = match self.num_threads {
                    Some(n) => ParallelEngine::with_num_threads(n)?,
                    None => ParallelEngine::new(),
                };
                if self.min_parallel_len > 0 {
                    engine = engine.with_min_len(self.min_parallel_len);
                }
                Ok(ConfiguredEngine::Parallel(engine))
            }
            _ => Ok(ConfiguredEngine::Sequential(SequentialEngine::new())),
        }
    }
}
