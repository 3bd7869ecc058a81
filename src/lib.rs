//! Playlist gap-filling engine for automated broadcast playout
//!
//! This library fills unscheduled gaps (placeholders) in a channel's
//! timeline with generated content so the total duration matches the time
//! available before the next scheduled program. Content selection is
//! pluggable: named strategies produce items and may split the timeline,
//! while the engine owns loading, duration accounting, splicing,
//! persistence and the single batched downstream notification. A keyed
//! deduplication gate guarantees at most one in-flight solve per logical
//! operation.

pub mod config;
pub mod core;
pub mod error;
pub mod services;
pub mod strategies;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::EngineConfig;
pub use crate::core::{solve_key, Engine, SolveGate, SolveReport, SolveSession};
pub use error::{EngineError, EngineResult};
pub use strategies::{FillStrategy, LoopFillStrategy, StrategyRegistry};
pub use traits::{Notifier, Storage};
