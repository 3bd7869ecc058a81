//! Fill strategy trait definition
//!
//! Strategies decide *what* fills a gap; the engine owns everything else.

use async_trait::async_trait;

use crate::core::session::SolveSession;
use crate::error::EngineResult;

/// Pluggable content selection for one solve pass.
///
/// The strategy reads the session (placeholder, event, bin, next event,
/// needed and current duration), emits items through
/// [`SolveSession::emit`], and may carve the timeline once with
/// [`SolveSession::split`]. It alone decides when enough content has been
/// produced; the engine never truncates by duration. Emitting nothing is a
/// valid outcome and leaves the bin untouched.
///
/// Strategies must not persist anything themselves; all persistence flows
/// through the engine after `fill` returns.
#[async_trait]
pub trait FillStrategy: Send + Sync {
    async fn fill(&self, session: &mut SolveSession<'_>) -> EngineResult<()>;
}
