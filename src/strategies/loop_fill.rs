//! Loop-fill strategy: repeat one filler asset across the gap
//!
//! The simplest useful strategy. It keeps emitting whole copies of a
//! configured filler asset until the accumulated duration covers the gap,
//! so the last copy may overshoot the boundary. Richer selection
//! heuristics live outside this crate; this variant is the reliable
//! fallback when nothing better is registered.

use async_trait::async_trait;

use super::traits::FillStrategy;
use crate::core::session::SolveSession;
use crate::error::{EngineError, EngineResult};
use crate::types::{AssetId, ItemDraft};

/// Fills a gap by looping a single filler asset
pub struct LoopFillStrategy {
    filler: AssetId,
}

impl LoopFillStrategy {
    /// Create a loop-fill strategy around the given filler asset
    pub fn new(filler: AssetId) -> Self {
        Self { filler }
    }
}

#[async_trait]
impl FillStrategy for LoopFillStrategy {
    async fn fill(&self, session: &mut SolveSession<'_>) -> EngineResult<()> {
        let needed = session.needed_duration()?;
        if needed <= 0.0 {
            return Ok(());
        }

        while session.current_duration() < needed {
            let added = session.emit(ItemDraft::from_asset(self.filler)).await?;
            if added <= 0.0 {
                return Err(EngineError::State {
                    message: format!("filler asset {} has non-positive duration", self.filler),
                });
            }
        }

        Ok(())
    }
}
