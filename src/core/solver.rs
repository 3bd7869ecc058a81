//! The solve engine: session loading, strategy orchestration, splicing
//!
//! `Engine` is the entry point of the crate. It loads a placeholder into a
//! session, hands the session to the configured fill strategy, splices
//! whatever the strategy produced into the bin, and keeps re-entering for
//! follow-up placeholders spawned by splits. The downstream refresh
//! notification fires exactly once per top-level call, with the union of
//! every bin id the chain touched.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::core::gate::{solve_key, SolveGate};
use crate::core::session::SolveSession;
use crate::error::{EngineError, EngineResult};
use crate::strategies::StrategyRegistry;
use crate::traits::{Notifier, Storage};
use crate::types::{BinId, Item, ItemId};

/// Outcome of one top-level solve, shared with deduplicated waiters
#[derive(Clone, Debug)]
pub struct SolveReport {
    /// Every bin id the call chain mutated or loaded
    pub affected_bins: HashSet<BinId>,
    /// Items spliced into bins across the whole chain
    pub items_added: usize,
    /// Splits performed across the whole chain
    pub splits: u32,
}

/// Playlist gap-filling engine over injected collaborators
pub struct Engine<S, N>
where
    S: Storage + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    storage: S,
    notifier: N,
    registry: StrategyRegistry,
    config: EngineConfig,
}

impl<S, N> Engine<S, N>
where
    S: Storage + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    /// Create a new engine with injected dependencies
    pub fn new(storage: S, notifier: N, registry: StrategyRegistry, config: EngineConfig) -> Self {
        Self {
            storage,
            notifier,
            registry,
            config,
        }
    }

    /// Access the underlying storage collaborator
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Access the underlying notification collaborator
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Solve one placeholder and every follow-up its strategy spawns.
    ///
    /// Chained splits are handled as sequential re-entry: each pass loads
    /// its placeholder into a fresh session carrying over the accumulated
    /// affected-bin set. The chain length is capped by
    /// `EngineConfig::max_split_chain`.
    ///
    /// Committed passes stay committed when a later pass fails; there is
    /// no rollback.
    pub async fn solve(&self, placeholder: ItemId) -> EngineResult<SolveReport> {
        let mut affected = HashSet::new();
        let mut current = placeholder;
        let mut items_added = 0usize;
        let mut splits = 0u32;

        loop {
            let mut session = self.load_session(current, affected).await?;
            let strategy_name = self.strategy_name(&session);
            let strategy = self
                .registry
                .get(&strategy_name)
                .ok_or(EngineError::UnknownStrategy {
                    name: strategy_name.clone(),
                })?;

            let needed = session.needed_duration()?;
            info!(
                placeholder = %current,
                strategy = %strategy_name,
                needed,
                "solving placeholder"
            );

            if let Err(source) = strategy.fill(&mut session).await {
                error!(
                    placeholder = %current,
                    strategy = %strategy_name,
                    error = %source,
                    "strategy failed, discarding accumulated items"
                );
                return Err(EngineError::Solve {
                    strategy: strategy_name,
                    placeholder: current,
                    source: Box::new(source),
                });
            }

            items_added += self.commit_pass(&mut session).await?;

            let follow_up = session.follow_up();
            affected = session.take_affected_bins();

            match follow_up {
                Some(next) => {
                    splits += 1;
                    if splits > self.config.max_split_chain {
                        return Err(EngineError::TooManySplits {
                            limit: self.config.max_split_chain,
                        });
                    }
                    current = next;
                }
                None => break,
            }
        }

        // Batched on purpose: one refresh per top-level call, never one
        // per pass. Failure is logged and swallowed since the content is
        // already committed.
        if let Err(e) = self.notifier.refresh(&affected).await {
            warn!(error = %e, "refresh notification failed");
        }

        info!(
            bins = affected.len(),
            items_added, splits, "solve chain finished"
        );
        Ok(SolveReport {
            affected_bins: affected,
            items_added,
            splits,
        })
    }

    /// `solve` wrapped by the deduplication gate, keyed by the
    /// placeholder's bin id so two externally-triggered solves for the
    /// same playlist segment never race.
    ///
    /// The placeholder is resolved to its bin before registering with the
    /// gate; concurrent calls for different placeholders of one bin share
    /// a single execution rather than splicing against stale snapshots of
    /// each other's work.
    pub async fn solve_gated(
        &self,
        gate: &SolveGate<SolveReport>,
        placeholder: ItemId,
    ) -> Result<SolveReport, Arc<EngineError>> {
        let context = self
            .storage
            .load_placeholder_context(placeholder)
            .await
            .map_err(Arc::new)?
            .ok_or_else(|| Arc::new(EngineError::Load { placeholder }))?;

        gate.run(&solve_key(context.bin.id), self.solve(placeholder))
            .await
    }

    /// Resolve a placeholder id into a fresh session pass.
    ///
    /// Fails with `Load` when the joined read yields nothing; nothing has
    /// been mutated at that point. On success the next event and needed
    /// duration are force-recomputed before the strategy sees the session.
    async fn load_session(
        &self,
        placeholder: ItemId,
        affected: HashSet<BinId>,
    ) -> EngineResult<SolveSession<'_>> {
        let context = self
            .storage
            .load_placeholder_context(placeholder)
            .await?
            .ok_or(EngineError::Load { placeholder })?;
        let bin_items = self.storage.bin_items(context.bin.id).await?;

        let mut session = SolveSession::new(&self.storage, context, bin_items, affected);
        session.recompute_next_event(true).await?;
        session.recompute_needed(true).await?;
        Ok(session)
    }

    /// Strategy named by the placeholder's metadata, else the configured
    /// default
    fn strategy_name(&self, session: &SolveSession<'_>) -> String {
        session
            .placeholder()
            .metadata
            .get("strategy")
            .and_then(Value::as_str)
            .unwrap_or(self.config.default_strategy.as_str())
            .to_string()
    }

    /// Splice the accumulated items into the bin and persist the pass.
    ///
    /// The placeholder row is deleted, the produced items take its slot in
    /// production order, and every position in the bin is rewritten as one
    /// strict 1..N run. Items are persisted without per-item notification;
    /// the batched refresh happens at finalization.
    async fn commit_pass(&self, session: &mut SolveSession<'_>) -> EngineResult<usize> {
        let pending = session.take_new_items();
        if pending.is_empty() {
            debug!(bin = %session.bin().id, "strategy produced nothing, zero-mutation pass");
            return Ok(0);
        }

        let bin_id = session.bin().id;
        let placeholder_id = session.placeholder().id;
        let items = session.bin_items().to_vec();

        let vacated = items
            .iter()
            .position(|item| item.id == placeholder_id)
            .ok_or_else(|| EngineError::State {
                message: format!("placeholder {placeholder_id} missing from bin {bin_id}"),
            })?;

        self.storage.delete_item(placeholder_id).await?;

        // One renumbering pass over (before, produced, after) keeps the
        // position run strict with no gap at the vacated slot
        let mut position = 0u32;
        for item in &items[..vacated] {
            position += 1;
            if item.position != position {
                let mut updated = item.clone();
                updated.position = position;
                self.storage.update_item(&updated).await?;
            }
        }

        let inserted = pending.len();
        for produced in pending {
            position += 1;
            self.storage
                .insert_item(Item {
                    id: ItemId::new(),
                    bin_id,
                    position,
                    duration: produced.duration,
                    asset_id: produced.asset_id,
                    metadata: produced.metadata,
                })
                .await?;
        }

        for item in &items[vacated + 1..] {
            position += 1;
            if item.position != position {
                let mut updated = item.clone();
                updated.position = position;
                self.storage.update_item(&updated).await?;
            }
        }

        // The strategy may have touched the event's metadata
        self.storage.update_event(session.event()).await?;

        debug!(bin = %bin_id, inserted, total = position, "pass committed");
        Ok(inserted)
    }
}
