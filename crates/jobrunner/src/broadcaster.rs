use tokio::sync::Notify;

/// One-to-many, value-less wakeup.
///
/// `Broadcaster` signals a *transition* ("something changed, go re-check
/// the state you care about"), not a value and not a count — a waiter that
/// misses a broadcast and then calls `wait()` again simply waits for the
/// next one. Built on [`tokio::sync::Notify`], whose `notify_waiters()`
/// wakes every task currently parked in `wait()` rather than just one, which
/// is what a fan-out of tailing readers needs: every reader present at
/// broadcast time must observe the new data, not just the next one to poll.
///
/// The `key` parameter spec.md lists alongside `wait`/`broadcast` (to allow
/// coalescing distinct wakeup groups under one broadcaster) carries no
/// behavior here: a job has exactly one wait-group, so `wait_for(())` is
/// provided only so callers that modeled it that way have somewhere to put
/// the unit key.
#[derive(Debug, Default)]
pub struct Broadcaster(Notify);

impl Broadcaster {
    /// Creates a broadcaster with no pending notification.
    #[must_use]
    pub fn new() -> Self {
        Self(Notify::new())
    }

    /// Waits for the next broadcast. Cancel-safe: dropping the future before
    /// it resolves does not consume a notification.
    pub async fn wait(&self) {
        self.0.notified().await;
    }

    /// Equivalent to [`Broadcaster::wait`]; the key is accepted for parity
    /// with the source design's `wait(key)` but has no effect.
    pub async fn wait_for(&self, _key: ()) {
        self.wait().await;
    }

    /// Wakes every task currently parked in [`Broadcaster::wait`].
    pub fn broadcast(&self) {
        self.0.notify_waiters();
    }
}
