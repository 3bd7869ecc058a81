//! In-memory storage implementation
//!
//! Backs the engine in tests and embedded deployments that bring their own
//! persistence elsewhere. Insert operations assign fresh ids, matching the
//! `Storage` contract. Events keep insertion order so the next-event
//! tie-break on identical starts is stable.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::error::EngineResult;
use crate::traits::{Notifier, Storage};
use crate::types::{
    Asset, AssetId, Bin, BinId, ChannelId, Event, EventId, Item, ItemId, PlaceholderContext,
};

#[derive(Default)]
struct Tables {
    events: Vec<Event>,
    bins: HashMap<BinId, Bin>,
    items: HashMap<ItemId, Item>,
    assets: HashMap<AssetId, Asset>,
}

/// `Storage` over plain in-process tables behind one async mutex
#[derive(Default)]
pub struct MemoryStorage {
    tables: Mutex<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an asset, assigning a fresh id
    pub async fn insert_asset(&self, mut asset: Asset) -> EngineResult<Asset> {
        let mut tables = self.tables.lock().await;
        asset.id = AssetId::new();
        tables.assets.insert(asset.id, asset.clone());
        Ok(asset)
    }

    /// Every stored event, in insertion order
    pub async fn all_events(&self) -> Vec<Event> {
        self.tables.lock().await.events.clone()
    }

    /// Fetch one event by id
    pub async fn event(&self, id: EventId) -> Option<Event> {
        self.tables
            .lock()
            .await
            .events
            .iter()
            .find(|event| event.id == id)
            .cloned()
    }

    /// Fetch one item by id
    pub async fn item(&self, id: ItemId) -> Option<Item> {
        self.tables.lock().await.items.get(&id).cloned()
    }

    /// Number of stored bins
    pub async fn bin_count(&self) -> usize {
        self.tables.lock().await.bins.len()
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn load_placeholder_context(
        &self,
        item: ItemId,
    ) -> EngineResult<Option<PlaceholderContext>> {
        let tables = self.tables.lock().await;

        let placeholder = match tables.items.get(&item) {
            Some(found) => found.clone(),
            None => return Ok(None),
        };
        let bin = match tables.bins.get(&placeholder.bin_id) {
            Some(found) => found.clone(),
            None => return Ok(None),
        };
        let event = match tables.events.iter().find(|event| event.bin_id == bin.id) {
            Some(found) => found.clone(),
            None => return Ok(None),
        };

        Ok(Some(PlaceholderContext {
            event,
            bin,
            placeholder,
        }))
    }

    async fn next_event_after(
        &self,
        channel: ChannelId,
        after: DateTime<Utc>,
    ) -> EngineResult<Option<Event>> {
        let tables = self.tables.lock().await;

        let mut earliest: Option<&Event> = None;
        for event in &tables.events {
            if event.channel_id != channel || event.start <= after {
                continue;
            }
            // Strictly-less comparison keeps the first-inserted event on
            // identical starts
            match earliest {
                Some(best) if event.start < best.start => earliest = Some(event),
                None => earliest = Some(event),
                _ => {}
            }
        }

        Ok(earliest.cloned())
    }

    async fn bin_items(&self, bin: BinId) -> EngineResult<Vec<Item>> {
        let tables = self.tables.lock().await;
        let mut items: Vec<Item> = tables
            .items
            .values()
            .filter(|item| item.bin_id == bin)
            .cloned()
            .collect();
        items.sort_by_key(|item| item.position);
        Ok(items)
    }

    async fn fetch_asset(&self, asset: AssetId) -> EngineResult<Option<Asset>> {
        Ok(self.tables.lock().await.assets.get(&asset).cloned())
    }

    async fn insert_item(&self, mut item: Item) -> EngineResult<Item> {
        let mut tables = self.tables.lock().await;
        item.id = ItemId::new();
        tables.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn insert_bin(&self, mut bin: Bin) -> EngineResult<Bin> {
        let mut tables = self.tables.lock().await;
        bin.id = BinId::new();
        tables.bins.insert(bin.id, bin.clone());
        Ok(bin)
    }

    async fn insert_event(&self, mut event: Event) -> EngineResult<Event> {
        let mut tables = self.tables.lock().await;
        event.id = EventId::new();
        tables.events.push(event.clone());
        Ok(event)
    }

    async fn update_item(&self, item: &Item) -> EngineResult<()> {
        let mut tables = self.tables.lock().await;
        tables.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn update_event(&self, event: &Event) -> EngineResult<()> {
        let mut tables = self.tables.lock().await;
        if let Some(stored) = tables.events.iter_mut().find(|stored| stored.id == event.id) {
            *stored = event.clone();
        }
        Ok(())
    }

    async fn delete_item(&self, item: ItemId) -> EngineResult<()> {
        self.tables.lock().await.items.remove(&item);
        Ok(())
    }
}

/// `Notifier` that records every refresh call, for tests and dry runs
#[derive(Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<HashSet<BinId>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All refresh calls observed so far
    pub async fn calls(&self) -> Vec<HashSet<BinId>> {
        self.calls.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn refresh(&self, bins: &HashSet<BinId>) -> EngineResult<()> {
        self.calls.lock().await.push(bins.clone());
        Ok(())
    }
}
