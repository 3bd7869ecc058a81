//! Collaborator trait definitions with mockall annotations for testing
//!
//! The engine never talks to a database or playout device directly; it goes
//! through these seams. They are the injection points for production
//! implementations and for mocks in tests.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::error::EngineResult;
use crate::types::{
    Asset, AssetId, Bin, BinId, ChannelId, Event, Item, ItemId, PlaceholderContext,
};

/// Persistence abstraction over channels, events, bins, items and assets
///
/// Insert operations assign a fresh id and return the stored record.
/// A solve session suspends only at these calls and at the final
/// notification, so implementations are the unit of interleaving.
#[mockall::automock]
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// Resolve a placeholder item id into its owning event and bin in one
    /// joined read; `None` when the id resolves to nothing
    async fn load_placeholder_context(
        &self,
        item: ItemId,
    ) -> EngineResult<Option<PlaceholderContext>>;

    /// Earliest event on `channel` with start strictly greater than `after`.
    ///
    /// Events sharing an identical start have no defined winner; the first
    /// record the store returns is taken.
    async fn next_event_after(
        &self,
        channel: ChannelId,
        after: DateTime<Utc>,
    ) -> EngineResult<Option<Event>>;

    /// All items of a bin, ordered by position
    async fn bin_items(&self, bin: BinId) -> EngineResult<Vec<Item>>;

    /// Fetch an asset record by id
    async fn fetch_asset(&self, asset: AssetId) -> EngineResult<Option<Asset>>;

    /// Store a new item; the returned record carries the assigned id
    async fn insert_item(&self, item: Item) -> EngineResult<Item>;

    /// Store a new bin; the returned record carries the assigned id
    async fn insert_bin(&self, bin: Bin) -> EngineResult<Bin>;

    /// Store a new event; the returned record carries the assigned id
    async fn insert_event(&self, event: Event) -> EngineResult<Event>;

    /// Persist changes to an existing item
    async fn update_item(&self, item: &Item) -> EngineResult<()>;

    /// Persist changes to an existing event
    async fn update_event(&self, event: &Event) -> EngineResult<()>;

    /// Remove an item
    async fn delete_item(&self, item: ItemId) -> EngineResult<()>;
}

/// Downstream refresh notification, batched per top-level solve
///
/// Called exactly once per top-level session with the union of all bin ids
/// the session touched. Best-effort: the engine logs and swallows failures
/// since the content is already committed.
#[mockall::automock]
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn refresh(&self, bins: &HashSet<BinId>) -> EngineResult<()>;
}
