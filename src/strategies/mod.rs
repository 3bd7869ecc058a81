//! Strategy module containing the trait, registry and built-in variants
//!
//! Strategies are registered under a name and selected per placeholder by
//! metadata, falling back to the engine's configured default.

pub mod loop_fill;
pub mod traits;

use std::collections::HashMap;
use std::sync::Arc;

pub use loop_fill::LoopFillStrategy;
pub use traits::FillStrategy;

/// Named lookup table of fill strategies
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    strategies: HashMap<String, Arc<dyn FillStrategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Register a strategy under `name`, replacing any previous entry
    pub fn register(&mut self, name: &str, strategy: Arc<dyn FillStrategy>) {
        self.strategies.insert(name.to_string(), strategy);
    }

    /// Look up a strategy by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn FillStrategy>> {
        self.strategies.get(name).cloned()
    }

    /// Registered strategy names
    pub fn names(&self) -> Vec<&str> {
        self.strategies.keys().map(String::as_str).collect()
    }
}
