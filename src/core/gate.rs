//! Keyed in-flight operation deduplication
//!
//! Guarantees at most one concurrent execution per logical key: the first
//! caller for a key runs the operation, later callers attach to its result.
//! The registry entry is removed the moment the operation completes, so
//! nothing is cached beyond the in-flight window and the next call starts
//! fresh work.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::types::BinId;

/// Failures are shared between the leader and every attached waiter
pub type GateResult<T> = Result<T, Arc<EngineError>>;

/// Deterministic gate key for solving within one bin.
///
/// Keyed by the playlist segment, not the placeholder: two solves racing
/// on different placeholders of the same bin would each splice against a
/// stale snapshot of the other's work. Keys are built from stable identity
/// and argument values only, never from addresses or callable identity, so
/// they survive process restarts and mean the same thing on every node.
pub fn solve_key(bin: BinId) -> String {
    format!("solve/{bin}")
}

/// Process-scoped registry of in-flight operations, one entry per key.
///
/// Construct one at startup and pass it by reference to every call site;
/// there is no hidden global instance.
pub struct SolveGate<T> {
    inflight: Mutex<HashMap<String, broadcast::Sender<GateResult<T>>>>,
}

impl<T> SolveGate<T>
where
    T: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Run `operation` under `key`, or attach to the execution already in
    /// flight for it.
    ///
    /// The check-then-act against the registry happens under a single
    /// mutex, so exactly one caller becomes the leader. The leader removes
    /// the entry before publishing its result; success and failure both
    /// reach every attached waiter.
    pub async fn run<F>(&self, key: &str, operation: F) -> GateResult<T>
    where
        F: Future<Output = EngineResult<T>> + Send,
    {
        let waiter = {
            let mut inflight = self.lock();
            match inflight.get(key) {
                Some(leader) => Some(leader.subscribe()),
                None => {
                    let (tx, _rx) = broadcast::channel(1);
                    inflight.insert(key.to_string(), tx);
                    None
                }
            }
        };

        if let Some(mut rx) = waiter {
            debug!(key, "attaching to in-flight operation");
            return match rx.recv().await {
                Ok(result) => result,
                // Leader dropped without publishing (cancelled mid-flight)
                Err(_) => Err(Arc::new(EngineError::State {
                    message: format!("in-flight operation '{key}' ended without a result"),
                })),
            };
        }

        debug!(key, "starting operation as leader");
        let result = operation.await.map_err(Arc::new);

        // Remove first so a caller arriving now starts fresh work instead
        // of attaching to a finished entry
        let leader = self.lock().remove(key);
        if let Some(tx) = leader {
            let _ = tx.send(result.clone());
        }

        result
    }

    /// Number of operations currently in flight
    pub fn in_flight(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, broadcast::Sender<GateResult<T>>>> {
        // A poisoned registry only means another caller panicked between
        // check and act; the map itself is still consistent
        self.inflight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T> Default for SolveGate<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
