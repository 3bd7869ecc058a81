//! Core domain types for the playout timeline
//!
//! Channels own a sequence of scheduled events; every event points at one
//! bin, an ordered playlist segment of items. An item without an asset
//! reference is a placeholder: unfilled air time the engine is asked to
//! solve.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Number of seconds of virtual runway assumed when a channel has no
/// event scheduled after the one being solved.
pub const VIRTUAL_NEXT_EVENT_GAP_SECS: i64 = 3600;

/// Unique identifier for a broadcast channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(Uuid);

impl ChannelId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for ChannelId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a scheduled event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a bin (ordered playlist segment)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BinId(Uuid);

impl BinId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl fmt::Display for BinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a playlist item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a media asset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(Uuid);

impl AssetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A scheduled slot on a channel's timeline, pointing at one bin
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub channel_id: ChannelId,
    pub start: DateTime<Utc>,
    pub title: String,
    pub bin_id: BinId,
    pub metadata: HashMap<String, Value>,
}

impl Event {
    /// Synthesize the virtual next event used when the channel has nothing
    /// scheduled after `event`. Never persisted; it only bounds the gap.
    pub fn virtual_next(event: &Event) -> Self {
        Self {
            id: EventId::new(),
            channel_id: event.channel_id,
            start: event.start + Duration::seconds(VIRTUAL_NEXT_EVENT_GAP_SECS),
            title: "virtual".to_string(),
            bin_id: event.bin_id,
            metadata: HashMap::new(),
        }
    }
}

/// An ordered playlist segment; item ordering lives on the items themselves
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bin {
    pub id: BinId,
    pub name: String,
}

/// A single entry in a bin
///
/// Positions within one bin form a strict 1..N run. An item without an
/// asset reference is a placeholder.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub bin_id: BinId,
    pub position: u32,
    pub duration: f64,
    pub asset_id: Option<AssetId>,
    pub metadata: HashMap<String, Value>,
}

impl Item {
    pub fn is_placeholder(&self) -> bool {
        self.asset_id.is_none()
    }
}

/// Referenced media with an authoritative duration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub duration: f64,
    pub metadata: HashMap<String, Value>,
}

/// Item content produced by a strategy, before the engine assigns identity,
/// bin and position. When `duration` is absent the referenced asset's
/// duration is used.
#[derive(Clone, Debug, Default)]
pub struct ItemDraft {
    pub duration: Option<f64>,
    pub asset_id: Option<AssetId>,
    pub metadata: HashMap<String, Value>,
}

impl ItemDraft {
    /// Draft playing the given asset for its full duration
    pub fn from_asset(asset_id: AssetId) -> Self {
        Self {
            duration: None,
            asset_id: Some(asset_id),
            metadata: HashMap::new(),
        }
    }
}

/// The joined (event, bin, placeholder) triple a solve session starts from
#[derive(Clone, Debug)]
pub struct PlaceholderContext {
    pub event: Event,
    pub bin: Bin,
    pub placeholder: Item,
}
