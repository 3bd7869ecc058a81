//! Scripted strategies and engine builders for tests

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gapfill::services::{MemoryStorage, RecordingNotifier};
use gapfill::types::{AssetId, Item, ItemDraft};
use gapfill::{
    Engine, EngineConfig, EngineError, EngineResult, FillStrategy, SolveSession, StrategyRegistry,
};
use tokio::sync::Mutex;

/// What one `fill` pass of a `ScriptedStrategy` does
#[derive(Clone, Debug, Default)]
pub struct PassScript {
    /// Assets to emit, in order
    pub emit: Vec<AssetId>,
    /// Timecode to split at after emitting
    pub split_at: Option<DateTime<Utc>>,
    /// Sleep before emitting, to keep a pass observably in flight
    pub delay_ms: u64,
}

/// Deterministic strategy that replays one script entry per solve pass.
///
/// Chained passes run sequentially, so a queue of scripts gives a test
/// full control over every pass of a split chain. Once the queue is
/// drained further passes emit nothing.
pub struct ScriptedStrategy {
    passes: Mutex<VecDeque<PassScript>>,
}

impl ScriptedStrategy {
    pub fn new(passes: Vec<PassScript>) -> Self {
        Self {
            passes: Mutex::new(passes.into()),
        }
    }
}

#[async_trait]
impl FillStrategy for ScriptedStrategy {
    async fn fill(&self, session: &mut SolveSession<'_>) -> EngineResult<()> {
        let script = self.passes.lock().await.pop_front().unwrap_or_default();

        if script.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(script.delay_ms)).await;
        }
        for asset in script.emit {
            session.emit(ItemDraft::from_asset(asset)).await?;
        }
        if let Some(split_at) = script.split_at {
            session.split(split_at).await?;
        }
        Ok(())
    }
}

/// Strategy that always splits at the midpoint of the remaining window,
/// driving an unbounded split chain into the configured cap
pub struct HalvingSplitStrategy;

#[async_trait]
impl FillStrategy for HalvingSplitStrategy {
    async fn fill(&self, session: &mut SolveSession<'_>) -> EngineResult<()> {
        let start = session.event().start;
        let next = session.next_event()?.start;
        session.split(start + (next - start) / 2).await
    }
}

/// Strategy that fails after emitting a few items, for discard tests
pub struct FailingStrategy {
    pub emit_before_failure: Vec<AssetId>,
}

#[async_trait]
impl FillStrategy for FailingStrategy {
    async fn fill(&self, session: &mut SolveSession<'_>) -> EngineResult<()> {
        for asset in &self.emit_before_failure {
            session.emit(ItemDraft::from_asset(*asset)).await?;
        }
        Err(EngineError::State {
            message: "scripted failure".to_string(),
        })
    }
}

/// Engine over in-memory collaborators, as the tests exercise it
pub type TestEngine = Engine<MemoryStorage, RecordingNotifier>;

/// Build a test engine with one strategy registered as the default
pub fn engine_with_strategy(
    storage: MemoryStorage,
    name: &str,
    strategy: Arc<dyn FillStrategy>,
) -> TestEngine {
    let _ = tracing_subscriber::fmt::try_init();

    let mut registry = StrategyRegistry::new();
    registry.register(name, strategy);

    let config = EngineConfig {
        default_strategy: name.to_string(),
        ..EngineConfig::default()
    };
    Engine::new(storage, RecordingNotifier::new(), registry, config)
}

/// Assert that `items` form a strict 1..N position run with no gaps or
/// duplicates
pub fn assert_strict_position_run(items: &[Item]) {
    let positions: Vec<u32> = items.iter().map(|item| item.position).collect();
    let expected: Vec<u32> = (1..=items.len() as u32).collect();
    assert_eq!(
        positions, expected,
        "bin positions must form a strict 1..N run"
    );
}
