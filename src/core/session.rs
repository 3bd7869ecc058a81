//! Working state for one solve session
//!
//! A session is ephemeral: it lives for a single top-level solve including
//! every chained split, and is never persisted. Strategies receive it
//! mutably and interact with the timeline exclusively through it; direct
//! bin or event mutation stays inside the engine.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::core::accountant::DurationAccountant;
use crate::error::{EngineError, EngineResult};
use crate::traits::Storage;
use crate::types::{
    AssetId, Bin, BinId, Event, EventId, Item, ItemDraft, ItemId, PlaceholderContext,
};

/// A produced item with its duration already resolved, awaiting splice
#[derive(Clone, Debug)]
pub(crate) struct PendingItem {
    pub duration: f64,
    pub asset_id: Option<AssetId>,
    pub metadata: HashMap<String, Value>,
}

/// Mutable state threaded through one solve call chain
pub struct SolveSession<'a> {
    storage: &'a dyn Storage,
    event: Event,
    bin: Bin,
    placeholder: Item,
    bin_items: Vec<Item>,
    accountant: DurationAccountant,
    new_items: Vec<PendingItem>,
    affected_bins: HashSet<BinId>,
    follow_up: Option<ItemId>,
}

impl<'a> SolveSession<'a> {
    /// Start a session pass from a freshly loaded placeholder context.
    ///
    /// `affected_bins` carries over from earlier passes of the same chain
    /// so the final notification sees the union; the loaded bin is added
    /// to it here.
    pub(crate) fn new(
        storage: &'a dyn Storage,
        context: PlaceholderContext,
        bin_items: Vec<Item>,
        mut affected_bins: HashSet<BinId>,
    ) -> Self {
        affected_bins.insert(context.bin.id);

        Self {
            storage,
            event: context.event,
            bin: context.bin,
            placeholder: context.placeholder,
            bin_items,
            accountant: DurationAccountant::new(),
            new_items: Vec::new(),
            affected_bins,
            follow_up: None,
        }
    }

    /// The event owning the placeholder being solved
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// The bin owning the placeholder being solved
    pub fn bin(&self) -> &Bin {
        &self.bin
    }

    /// The placeholder item being solved
    pub fn placeholder(&self) -> &Item {
        &self.placeholder
    }

    /// Items of the working bin as prefetched at load time
    pub fn bin_items(&self) -> &[Item] {
        &self.bin_items
    }

    /// Cached next event on the channel
    pub fn next_event(&self) -> EngineResult<Event> {
        self.accountant.cached_next_event()
    }

    /// Cached needed duration in seconds
    pub fn needed_duration(&self) -> EngineResult<f64> {
        self.accountant.cached_needed()
    }

    /// Seconds of content accumulated in memory so far
    pub fn current_duration(&self) -> f64 {
        self.new_items.iter().map(|item| item.duration).sum()
    }

    /// Bin ids touched so far across the whole call chain
    pub fn affected_bins(&self) -> &HashSet<BinId> {
        &self.affected_bins
    }

    /// Set one metadata key on the owning event; the engine persists the
    /// event when committing the pass
    pub fn set_event_metadata(&mut self, key: &str, value: Value) {
        self.event.metadata.insert(key.to_string(), value);
    }

    /// Recompute the cached next event
    pub(crate) async fn recompute_next_event(&mut self, force: bool) -> EngineResult<Event> {
        self.accountant
            .next_event(self.storage, &self.event, force)
            .await
    }

    /// Recompute the cached needed duration
    pub(crate) async fn recompute_needed(&mut self, force: bool) -> EngineResult<f64> {
        let accumulated = self.current_duration();
        self.accountant
            .needed_duration(
                self.storage,
                &self.event,
                &self.bin_items,
                self.placeholder.id,
                accumulated,
                force,
            )
            .await
    }

    /// Append one produced item to the session, resolving its duration.
    ///
    /// Nothing is persisted here; the engine splices and persists the
    /// accumulated run once the strategy finishes. Returns the resolved
    /// duration so strategies can track what they just added.
    pub async fn emit(&mut self, draft: ItemDraft) -> EngineResult<f64> {
        let duration = match (draft.duration, draft.asset_id) {
            (Some(duration), _) => duration,
            (None, Some(asset_id)) => {
                self.accountant
                    .asset_duration(self.storage, asset_id)
                    .await?
            }
            (None, None) => {
                return Err(EngineError::State {
                    message: "item draft carries neither duration nor asset".to_string(),
                })
            }
        };

        debug!(bin = %self.bin.id, duration, "accumulated produced item");
        self.new_items.push(PendingItem {
            duration,
            asset_id: draft.asset_id,
            metadata: draft.metadata,
        });
        Ok(duration)
    }

    /// Carve the timeline at `at`, spawning a follow-up placeholder.
    ///
    /// Valid only strictly between the working event's start and the next
    /// event's start; anything else is logged and ignored, since strategies
    /// may propose bad timecodes as part of normal heuristic operation.
    ///
    /// On success a new bin, placeholder and event are created, the needed
    /// duration is recomputed against the new boundary, and the engine will
    /// re-enter for the follow-up placeholder after this pass commits.
    pub async fn split(&mut self, at: DateTime<Utc>) -> EngineResult<()> {
        let next = self.accountant.cached_next_event()?;
        if at <= self.event.start || at >= next.start {
            warn!(
                at = %at,
                event_start = %self.event.start,
                next_start = %next.start,
                "split timecode outside the open event window, ignoring"
            );
            return Ok(());
        }

        let new_bin = self
            .storage
            .insert_bin(Bin {
                id: BinId::new(),
                name: format!("{} (split)", self.bin.name),
            })
            .await?;

        // Follow-up placeholder keeps the original's metadata and duration
        // but gets fresh identity in the new bin, with no asset
        let follow_up = self
            .storage
            .insert_item(Item {
                id: ItemId::new(),
                bin_id: new_bin.id,
                position: 0,
                duration: self.placeholder.duration,
                asset_id: None,
                metadata: self.placeholder.metadata.clone(),
            })
            .await?;

        let split_event = self
            .storage
            .insert_event(Event {
                id: EventId::new(),
                channel_id: self.event.channel_id,
                start: at,
                title: format!("{} (split)", self.event.title),
                bin_id: new_bin.id,
                metadata: HashMap::new(),
            })
            .await?;

        info!(
            bin = %self.bin.id,
            new_bin = %new_bin.id,
            at = %at,
            "split timeline, follow-up placeholder spawned"
        );

        // The split event is now the session's timeline boundary
        self.accountant.set_next_event(split_event);
        self.recompute_needed(true).await?;

        self.affected_bins.insert(new_bin.id);
        self.follow_up = Some(follow_up.id);
        Ok(())
    }

    pub(crate) fn take_new_items(&mut self) -> Vec<PendingItem> {
        std::mem::take(&mut self.new_items)
    }

    pub(crate) fn follow_up(&self) -> Option<ItemId> {
        self.follow_up
    }

    pub(crate) fn take_affected_bins(self) -> HashSet<BinId> {
        self.affected_bins
    }
}
