//! Shutdown coordination for the proxy.
//!
//! The server lifecycle is a one-way state machine:
//!
//! ```text
//! Starting → Listening → Draining → Stopped
//! ```
//!
//! `Listening → Draining` is driven by the signal task calling
//! [`Shutdown::trigger`]; the server owns every other transition.

use std::sync::Arc;

use tokio::sync::watch;

/// Server lifecycle state. Ordered by progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    /// Configuration loaded, no listener yet.
    Starting,
    /// Accepting connections.
    Listening,
    /// No longer accepting; in-flight requests are finishing.
    Draining,
    /// Serving loop has returned.
    Stopped,
}

/// Coordinator for graceful shutdown.
///
/// Cheap to clone; all clones observe the same state.
#[derive(Debug, Clone)]
pub struct Shutdown {
    state: Arc<watch::Sender<LifecycleState>>,
}

impl Shutdown {
    /// Create a new shutdown coordinator in `Starting`.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(LifecycleState::Starting);
        Self { state: Arc::new(tx) }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Watch lifecycle transitions.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Request a graceful shutdown. Returns false if one was already underway.
    pub fn trigger(&self) -> bool {
        self.advance(LifecycleState::Draining)
    }

    /// Resolves once shutdown has been requested.
    pub async fn draining(&self) {
        let mut rx = self.state.subscribe();
        // the sender lives in `self`, so this only returns on a state change
        let _ = rx.wait_for(|state| *state >= LifecycleState::Draining).await;
    }

    pub(crate) fn mark_listening(&self) -> bool {
        self.advance(LifecycleState::Listening)
    }

    pub(crate) fn mark_stopped(&self) -> bool {
        self.advance(LifecycleState::Stopped)
    }

    /// Move forward to `next`; never backwards.
    fn advance(&self, next: LifecycleState) -> bool {
        let moved = self.state.send_if_modified(|state| {
            if *state < next {
                *state = next;
                true
            } else {
                false
            }
        });
        if moved {
            tracing::debug!(state = ?next, "lifecycle transition");
        }
        moved
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn transitions_only_move_forward() {
        let shutdown = Shutdown::new();
        assert_eq!(shutdown.state(), LifecycleState::Starting);

        assert!(shutdown.mark_listening());
        assert_eq!(shutdown.state(), LifecycleState::Listening);

        assert!(shutdown.trigger());
        assert!(!shutdown.trigger(), "second trigger is a no-op");
        assert!(!shutdown.mark_listening());
        assert_eq!(shutdown.state(), LifecycleState::Draining);

        assert!(shutdown.mark_stopped());
        assert_eq!(shutdown.state(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn draining_resolves_after_trigger() {
        let shutdown = Shutdown::new();
        shutdown.mark_listening();

        let waiter = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { shutdown.draining().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("draining() did not resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn draining_resolves_immediately_if_already_triggered() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        tokio::time::timeout(Duration::from_millis(100), shutdown.draining())
            .await
            .expect("draining() should not block");
    }
}
