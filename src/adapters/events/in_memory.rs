//! In-memory event feed implementation for testing.
//!
//! Provides synchronous, deterministic delivery for unit tests: batches are
//! handed to sinks on the caller's thread.
//!
//! # Security Note
//!
//! This adapter is for **testing only** and should not be used in production.
//! It uses `.expect()` on lock operations which will panic if locks are poisoned.
//! Production code should use the broadcast feed adapter.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, Weak};

use crate::domain::foundation::{FeedError, SessionId, SubscriptionId};
use crate::domain::session::EventEnvelope;
use crate::ports::{EventFeed, EventSink, FeedFilter, Subscription};

struct Subscriber {
    id: SubscriptionId,
    filter: FeedFilter,
    sink: Arc<dyn EventSink>,
    active: Arc<AtomicBool>,
}

#[derive(Default)]
struct Registry {
    subscribers: RwLock<Vec<Subscriber>>,
    delivered: RwLock<Vec<(SessionId, Vec<EventEnvelope>)>>,
    unsubscribe_calls: AtomicUsize,
}

impl Registry {
    fn remove(&self, id: SubscriptionId) {
        self.subscribers
            .write()
            .expect("InMemoryEventFeed: subscribers write lock poisoned")
            .retain(|s| s.id != id);
    }

    /// Snapshot of matching live sinks, taken so callbacks run without the lock.
    fn matching(&self, session_id: SessionId) -> Vec<(Arc<dyn EventSink>, Arc<AtomicBool>)> {
        self.subscribers
            .read()
            .expect("InMemoryEventFeed: subscribers lock poisoned")
            .iter()
            .filter(|s| s.filter.matches(session_id) && s.active.load(Ordering::SeqCst))
            .map(|s| (Arc::clone(&s.sink), Arc::clone(&s.active)))
            .collect()
    }
}

/// In-memory event feed for testing.
///
/// Features:
/// - Synchronous delivery (deterministic for tests)
/// - Batch capture for assertions
/// - Unsubscribe accounting
///
/// # Panics
///
/// Methods may panic if internal locks are poisoned. This is acceptable
/// for test code but this adapter should NOT be used in production.
///
/// # Example
///
/// ```ignore
/// let feed = Arc::new(InMemoryEventFeed::new());
/// let handle = SessionMonitor::new(feed.clone()).start(SessionId::new(1))?;
///
/// feed.deliver(SessionId::new(1), vec![envelope]);
/// assert_eq!(feed.subscriber_count(), 1);
/// ```
#[derive(Default)]
pub struct InMemoryEventFeed {
    registry: Arc<Registry>,
}

impl InMemoryEventFeed {
    /// Creates a new feed with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers a batch to every live subscriber of `session_id`.
    ///
    /// Empty batches are dropped, matching the feed contract.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn deliver(&self, session_id: SessionId, batch: Vec<EventEnvelope>) {
        if batch.is_empty() {
            tracing::debug!(session_id = %session_id, "Dropping empty batch");
            return;
        }

        self.registry
            .delivered
            .write()
            .expect("InMemoryEventFeed: delivered write lock poisoned")
            .push((session_id, batch.clone()));

        for (sink, active) in self.registry.matching(session_id) {
            if active.load(Ordering::SeqCst) {
                sink.on_batch(batch.clone());
            }
        }
    }

    /// Reports an error to every live subscriber of `session_id`.
    pub fn fail(&self, session_id: SessionId, error: FeedError) {
        for (sink, active) in self.registry.matching(session_id) {
            if active.load(Ordering::SeqCst) {
                sink.on_error(error.clone());
            }
        }
    }

    /// Stops every subscription from the feed side.
    ///
    /// Handles stay valid; a later `unsubscribe` on them is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn shutdown(&self) {
        let mut subscribers = self
            .registry
            .subscribers
            .write()
            .expect("InMemoryEventFeed: subscribers write lock poisoned");
        for subscriber in subscribers.iter() {
            subscriber.active.store(false, Ordering::SeqCst);
        }
        subscribers.clear();
    }

    // === Test Helpers ===

    /// Returns the number of live subscriptions.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn subscriber_count(&self) -> usize {
        self.registry
            .subscribers
            .read()
            .expect("InMemoryEventFeed: subscribers lock poisoned")
            .len()
    }

    /// Checks if any live subscription selects `session_id`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn is_subscribed(&self, session_id: SessionId) -> bool {
        !self.registry.matching(session_id).is_empty()
    }

    /// Returns how many unsubscribe calls actually released a subscription.
    pub fn unsubscribe_calls(&self) -> usize {
        self.registry.unsubscribe_calls.load(Ordering::SeqCst)
    }

    /// Returns all delivered batches (for test assertions).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn delivered_batches(&self) -> Vec<(SessionId, Vec<EventEnvelope>)> {
        self.registry
            .delivered
            .read()
            .expect("InMemoryEventFeed: delivered lock poisoned")
            .clone()
    }
}

impl EventFeed for InMemoryEventFeed {
    fn subscribe(
        &self,
        filter: FeedFilter,
        sink: Arc<dyn EventSink>,
    ) -> Result<Box<dyn Subscription>, FeedError> {
        let id = SubscriptionId::new();
        let active = Arc::new(AtomicBool::new(true));

        tracing::debug!(
            subscription_id = %id,
            session_id = %filter.session_id(),
            sink = sink.name(),
            "Subscribing to in-memory feed"
        );

        self.registry
            .subscribers
            .write()
            .expect("InMemoryEventFeed: subscribers write lock poisoned")
            .push(Subscriber {
                id,
                filter,
                sink,
                active: Arc::clone(&active),
            });

        Ok(Box::new(InMemorySubscription {
            id,
            active,
            registry: Arc::downgrade(&self.registry),
        }))
    }
}

struct InMemorySubscription {
    id: SubscriptionId,
    active: Arc<AtomicBool>,
    registry: Weak<Registry>,
}

impl Subscription for InMemorySubscription {
    fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
            registry.unsubscribe_calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn id(&self) -> SubscriptionId {
        self.id
    }
}
