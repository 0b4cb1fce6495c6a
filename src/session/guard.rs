//! Serialization of multi-step stateful server operations.
//!
//! Some operations mutate ambient server-side context shared across the
//! whole session. The canonical example: switching the session's active
//! clan before editing that clan's membership list. A second concurrent
//! caller could otherwise observe or mutate the wrong clan. The lock here
//! protects that server-side context, not local memory, so there is exactly
//! one per logical session.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One-at-a-time executor for guarded operations.
///
/// Cheap to clone; clones share the same lock. Queued callers are served in
/// FIFO order (the tokio mutex is fair). An error or panic inside the
/// guarded closure propagates to that caller only and releases the lock for
/// the next.
///
/// # Example
///
/// ```ignore
/// use bellhop::session::ActionSerializer;
///
/// let guard = ActionSerializer::new();
/// let roster = guard
///     .run_exclusive(|| async {
///         switch_clan(42).await;
///         fetch_roster().await
///     })
///     .await;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ActionSerializer {
    lock: Arc<Mutex<()>>,
}

impl ActionSerializer {
    /// Create a new serializer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with the session-wide guard held.
    ///
    /// The closure is only invoked once the lock is acquired, so work
    /// inside it never interleaves with another guarded operation.
    pub async fn run_exclusive<F, Fut, T>(&self, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _guard = self.lock.lock().await;
        f().await
    }
}
