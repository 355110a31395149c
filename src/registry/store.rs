//! Room registry implementation
//!
//! The central shared state: which screen names are taken and which
//! connections receive broadcasts.

use std::collections::{HashMap, HashSet};

use tokio::sync::{mpsc, Mutex};

use crate::protocol::constants::MAX_NAME_LEN;
use crate::protocol::Message;

/// Outbound handle for one accepted connection
///
/// Messages sent here are drained by the owning connection task and
/// written to its socket. Sending to a sink whose connection has gone
/// away fails without blocking; the registry never owns the connection.
pub type Sink = mpsc::UnboundedSender<Message>;

/// The two sets guarded together
///
/// Names and sinks live under one lock because the room invariant spans
/// both: every accepted client contributes exactly one name and one sink,
/// removed together on disconnect.
#[derive(Debug, Default)]
struct RoomInner {
    /// Screen names currently in use
    names: HashSet<String>,
    /// Broadcast sinks, keyed by session ID
    sinks: HashMap<u64, Sink>,
}

/// Shared registry for a single chat room
///
/// All handlers hold an `Arc<RoomRegistry>`; every mutation and the
/// broadcast snapshot serialize through the one mutex.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    inner: Mutex<RoomInner>,
}

impl RoomRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically check-and-insert a screen name
    ///
    /// Returns `false` without mutating if the name is already taken,
    /// blank after trimming, or longer than [`MAX_NAME_LEN`]. Malformed
    /// candidates are rejections, not errors; the handler re-prompts
    /// either way. Bounding the name keeps relayed broadcast lines within
    /// the frame limit.
    pub async fn try_register(&self, name: &str) -> bool {
        if name.trim().is_empty() || name.len() > MAX_NAME_LEN {
            return false;
        }

        let mut inner = self.inner.lock().await;
        let inserted = inner.names.insert(name.to_string());

        if inserted {
            tracing::debug!(name = %name, clients = inner.names.len(), "Name registered");
        } else {
            tracing::debug!(name = %name, "Name rejected: already taken");
        }

        inserted
    }

    /// Remove a screen name; no-op if it was never registered
    pub async fn unregister(&self, name: &str) {
        let mut inner = self.inner.lock().await;
        if inner.names.remove(name) {
            tracing::debug!(name = %name, clients = inner.names.len(), "Name unregistered");
        }
    }

    /// Add a connection's broadcast sink
    pub async fn add_sink(&self, session_id: u64, sink: Sink) {
        let mut inner = self.inner.lock().await;
        inner.sinks.insert(session_id, sink);
        tracing::debug!(session_id = session_id, sinks = inner.sinks.len(), "Sink added");
    }

    /// Remove a connection's broadcast sink; no-op if it was never added
    pub async fn remove_sink(&self, session_id: u64) {
        let mut inner = self.inner.lock().await;
        if inner.sinks.remove(&session_id).is_some() {
            tracing::debug!(
                session_id = session_id,
                sinks = inner.sinks.len(),
                "Sink removed"
            );
        }
    }

    /// Fan a message out to every registered sink
    ///
    /// Takes a point-in-time snapshot of the sink set under the lock, then
    /// delivers outside it. A sink whose connection task has gone away is
    /// skipped; delivery to the remaining sinks continues and the registry
    /// itself is never mutated here (the dead connection's own handler
    /// cleans up). Returns the number of sinks that accepted the message.
    pub async fn broadcast(&self, message: Message) -> usize {
        let snapshot: Vec<(u64, Sink)> = {
            let inner = self.inner.lock().await;
            inner
                .sinks
                .iter()
                .map(|(id, sink)| (*id, sink.clone()))
                .collect()
        };

        let mut delivered = 0;
        for (session_id, sink) in snapshot {
            if sink.send(message.clone()).is_ok() {
                delivered += 1;
            } else {
                tracing::debug!(session_id = session_id, "Sink unavailable, skipping");
            }
        }

        delivered
    }

    /// Whether a name is currently registered
    pub async fn is_registered(&self, name: &str) -> bool {
        self.inner.lock().await.names.contains(name)
    }

    /// Number of registered screen names
    pub async fn name_count(&self) -> usize {
        self.inner.lock().await.names.len()
    }

    /// Number of active sinks
    pub async fn sink_count(&self) -> usize {
        self.inner.lock().await.sinks.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_try_register_distinct_names() {
        let registry = RoomRegistry::new();

        assert!(registry.try_register("Alice").await);
        assert!(registry.try_register("Bob").await);
        assert_eq!(registry.name_count().await, 2);
    }

    #[tokio::test]
    async fn test_try_register_duplicate_rejected() {
        let registry = RoomRegistry::new();

        assert!(registry.try_register("Alice").await);
        assert!(!registry.try_register("Alice").await);
        assert_eq!(registry.name_count().await, 1);
    }

    #[tokio::test]
    async fn test_try_register_blank_rejected() {
        let registry = RoomRegistry::new();

        assert!(!registry.try_register("").await);
        assert!(!registry.try_register("   ").await);
        assert_eq!(registry.name_count().await, 0);
    }

    #[tokio::test]
    async fn test_try_register_overlong_name_rejected() {
        let registry = RoomRegistry::new();

        assert!(!registry.try_register(&"x".repeat(MAX_NAME_LEN + 1)).await);
        assert_eq!(registry.name_count().await, 0);

        // The boundary itself is fine
        assert!(registry.try_register(&"x".repeat(MAX_NAME_LEN)).await);
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_registration_single_winner() {
        let registry = Arc::new(RoomRegistry::new());

        let mut handles = Vec::new();
        for _ in 0..32 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(
                async move { registry.try_register("Alice").await },
            ));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(registry.name_count().await, 1);
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let registry = RoomRegistry::new();

        assert!(registry.try_register("Alice").await);
        registry.unregister("Alice").await;
        registry.unregister("Alice").await;

        assert_eq!(registry.name_count().await, 0);
        // Name is reusable after unregister
        assert!(registry.try_register("Alice").await);
    }

    #[tokio::test]
    async fn test_remove_sink_is_idempotent() {
        let registry = RoomRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        registry.add_sink(1, tx).await;
        registry.remove_sink(1).await;
        registry.remove_sink(1).await;
        registry.remove_sink(99).await;

        assert_eq!(registry.sink_count().await, 0);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_sinks() {
        let registry = RoomRegistry::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        registry.add_sink(1, tx1).await;
        registry.add_sink(2, tx2).await;

        let delivered = registry.broadcast(Message::text("hello")).await;

        assert_eq!(delivered, 2);
        assert_eq!(rx1.recv().await.unwrap(), Message::text("hello"));
        assert_eq!(rx2.recv().await.unwrap(), Message::text("hello"));
    }

    #[tokio::test]
    async fn test_broadcast_skips_dead_sink_without_aborting() {
        let registry = RoomRegistry::new();
        let (tx1, rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        registry.add_sink(1, tx1).await;
        registry.add_sink(2, tx2).await;

        // First recipient's connection task is gone
        drop(rx1);

        let delivered = registry.broadcast(Message::record(7, "x")).await;

        assert_eq!(delivered, 1);
        assert_eq!(rx2.recv().await.unwrap(), Message::record(7, "x"));

        // The broadcaster never mutates the registry; cleanup belongs to
        // the dead connection's own handler
        assert_eq!(registry.sink_count().await, 2);
    }

    #[tokio::test]
    async fn test_name_and_sink_counts_track_together() {
        let registry = RoomRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        assert!(registry.try_register("Alice").await);
        registry.add_sink(1, tx).await;
        assert_eq!(registry.name_count().await, registry.sink_count().await);

        registry.unregister("Alice").await;
        registry.remove_sink(1).await;
        assert_eq!(registry.name_count().await, 0);
        assert_eq!(registry.sink_count().await, 0);
    }
}
