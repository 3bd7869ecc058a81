//! Engine configuration

/// Tunables for a single engine instance
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Strategy looked up when a placeholder names none in its metadata
    pub default_strategy: String,

    /// Upper bound on chained splits within one top-level solve;
    /// exceeding it fails the session with `TooManySplits`
    pub max_split_chain: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_strategy: "loop".to_string(),
            max_split_chain: 8,
        }
    }
}
