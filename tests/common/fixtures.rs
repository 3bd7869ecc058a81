//! Timeline seeding fixtures for engine tests
//!
//! Builds channels, events, bins, items and assets in a `MemoryStorage`
//! so every suite works from the same scenario shapes.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use gapfill::services::MemoryStorage;
use gapfill::types::{
    Asset, AssetId, Bin, BinId, ChannelId, Event, EventId, Item, ItemId,
};
use gapfill::Storage;

/// Timestamp `secs` seconds into the test timeline
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

pub async fn seed_bin(storage: &MemoryStorage, name: &str) -> Bin {
    storage
        .insert_bin(Bin {
            id: BinId::new(),
            name: name.to_string(),
        })
        .await
        .unwrap()
}

pub async fn seed_event(
    storage: &MemoryStorage,
    channel: ChannelId,
    start_secs: i64,
    title: &str,
    bin: BinId,
) -> Event {
    storage
        .insert_event(Event {
            id: EventId::new(),
            channel_id: channel,
            start: at(start_secs),
            title: title.to_string(),
            bin_id: bin,
            metadata: HashMap::new(),
        })
        .await
        .unwrap()
}

pub async fn seed_asset(storage: &MemoryStorage, duration: f64) -> Asset {
    storage
        .insert_asset(Asset {
            id: AssetId::new(),
            duration,
            metadata: HashMap::new(),
        })
        .await
        .unwrap()
}

pub async fn seed_placeholder(
    storage: &MemoryStorage,
    bin: BinId,
    position: u32,
    duration: f64,
) -> Item {
    storage
        .insert_item(Item {
            id: ItemId::new(),
            bin_id: bin,
            position,
            duration,
            asset_id: None,
            metadata: HashMap::new(),
        })
        .await
        .unwrap()
}

pub async fn seed_content_item(
    storage: &MemoryStorage,
    bin: BinId,
    position: u32,
    asset: AssetId,
) -> Item {
    storage
        .insert_item(Item {
            id: ItemId::new(),
            bin_id: bin,
            position,
            duration: 0.0,
            asset_id: Some(asset),
            metadata: HashMap::new(),
        })
        .await
        .unwrap()
}

/// A channel with one event at t=0 holding a single placeholder, and a
/// following event at `next_start_secs`
pub struct GapScenario {
    pub storage: MemoryStorage,
    pub channel: ChannelId,
    pub event: Event,
    pub bin: Bin,
    pub placeholder: Item,
    pub next_event: Event,
}

impl GapScenario {
    pub async fn build(next_start_secs: i64, placeholder_duration: f64) -> Self {
        let storage = MemoryStorage::new();
        let channel = ChannelId::new();

        let bin = seed_bin(&storage, "main").await;
        let event = seed_event(&storage, channel, 0, "morning block", bin.id).await;
        let placeholder = seed_placeholder(&storage, bin.id, 1, placeholder_duration).await;

        let next_bin = seed_bin(&storage, "next").await;
        let next_event =
            seed_event(&storage, channel, next_start_secs, "news", next_bin.id).await;

        Self {
            storage,
            channel,
            event,
            bin,
            placeholder,
            next_event,
        }
    }
}
