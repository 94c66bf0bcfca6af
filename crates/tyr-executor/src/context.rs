//! Execution context: session registries and the thread pool operators run on.

use rayon::ThreadPool;
use tyr_common::EngineConfig;
use tyr_expression::FunctionRegistry;

/// Execution context holding references to session state.
#[derive(Clone, Copy, Debug)]
pub struct ExecutionContext<'a> {
    pub registry: &'a FunctionRegistry,
    pub config: &'a EngineConfig,
    pool: Option<&'a ThreadPool>,
}

impl<'a> ExecutionContext<'a> {
    /// Context that runs parallel work on rayon's global pool.
    pub fn new(registry: &'a FunctionRegistry, config: &'a EngineConfig) -> Self {
        Self {
            registry,
            config,
            pool: None,
        }
    }

    /// Context that runs parallel work on a dedicated pool.
    pub fn with_pool(mut self, pool: &'a ThreadPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Run `op` inside this context's pool, so nested rayon iterators use it.
    pub fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}
