//! Broadcast event feed with one room per session.
//!
//! Producers publish batches to a session's room; every subscription to that
//! session owns a forwarding task that hands messages to its sink one at a
//! time, in publish order.
//!
//! # Architecture
//!
//! ```text
//! Room: session-12     Room: session-40
//! ├── subscription-a   └── subscription-d
//! └── subscription-b
//! ```
//!
//! A batch published for session 12 reaches subscriptions a and b only.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::{broadcast, watch};

use crate::config::FeedConfig;
use crate::domain::foundation::{FeedError, SessionId, SubscriptionId};
use crate::domain::session::EventEnvelope;
use crate::ports::{EventFeed, EventSink, FeedFilter, Subscription};

/// Message carried through a session room.
#[derive(Debug, Clone)]
enum FeedMessage {
    Batch(Vec<EventEnvelope>),
    Error(FeedError),
}

type Rooms = RwLock<HashMap<SessionId, broadcast::Sender<FeedMessage>>>;

/// Event feed backed by tokio broadcast channels.
///
/// # Thread Safety
///
/// Uses `RwLock` for the room registry since publishes (reads) vastly
/// outnumber subscribes and room cleanup (writes).
pub struct BroadcastEventFeed {
    rooms: Arc<Rooms>,

    /// Channel capacity for each room's broadcast channel.
    channel_capacity: usize,
}

impl BroadcastEventFeed {
    /// Create a feed with the given per-room channel capacity.
    ///
    /// Subscribers that fall more than `channel_capacity` messages behind
    /// lose the oldest ones and are told so through their error channel.
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            channel_capacity: channel_capacity.max(1),
        }
    }

    /// Create a feed from configuration.
    pub fn from_config(config: &FeedConfig) -> Self {
        Self::new(config.channel_capacity)
    }

    /// Publish a batch to every subscription of `session_id`.
    ///
    /// Returns the number of subscriptions the batch was queued for.
    /// Empty batches and rooms without subscribers are no-ops.
    pub fn publish_batch(&self, session_id: SessionId, batch: Vec<EventEnvelope>) -> usize {
        if batch.is_empty() {
            return 0;
        }
        self.send(session_id, FeedMessage::Batch(batch))
    }

    /// Report an error to every subscription of `session_id`.
    pub fn publish_error(&self, session_id: SessionId, error: FeedError) -> usize {
        self.send(session_id, FeedMessage::Error(error))
    }

    /// Close a session's room.
    ///
    /// Queued messages are still delivered; afterwards each subscription
    /// receives `FeedError::Closed` and stops.
    pub fn close_session(&self, session_id: SessionId) {
        let removed = self
            .rooms
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&session_id);
        if removed.is_some() {
            tracing::debug!(session_id = %session_id, "Closed feed room");
        }
    }

    /// Get count of live subscriptions for a session.
    pub fn subscriber_count(&self, session_id: SessionId) -> usize {
        self.rooms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&session_id)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }

    /// Get all session ids with an open room.
    pub fn active_rooms(&self) -> Vec<SessionId> {
        self.rooms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    fn send(&self, session_id: SessionId, message: FeedMessage) -> usize {
        let rooms = self.rooms.read().unwrap_or_else(PoisonError::into_inner);
        match rooms.get(&session_id) {
            // No receivers is OK
            Some(sender) => sender.send(message).unwrap_or(0),
            None => 0,
        }
    }
}

impl EventFeed for BroadcastEventFeed {
    fn subscribe(
        &self,
        filter: FeedFilter,
        sink: Arc<dyn EventSink>,
    ) -> Result<Box<dyn Subscription>, FeedError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| FeedError::NoRuntime)?;

        let session_id = filter.session_id();
        let receiver = {
            let mut rooms = self.rooms.write().unwrap_or_else(PoisonError::into_inner);
            rooms
                .entry(session_id)
                .or_insert_with(|| broadcast::channel(self.channel_capacity).0)
                .subscribe()
        };

        let id = SubscriptionId::new();
        let active = Arc::new(AtomicBool::new(true));
        let (stop_tx, stop_rx) = watch::channel(false);

        tracing::debug!(
            subscription_id = %id,
            session_id = %session_id,
            sink = sink.name(),
            "Subscribing to broadcast feed"
        );

        runtime.spawn(forward(Forwarder {
            id,
            session_id,
            receiver,
            stop: stop_rx,
            sink,
            active: Arc::clone(&active),
            rooms: Arc::clone(&self.rooms),
        }));

        Ok(Box::new(BroadcastSubscription {
            id,
            active,
            stop: stop_tx,
        }))
    }
}

impl Default for BroadcastEventFeed {
    fn default() -> Self {
        Self::from_config(&FeedConfig::default())
    }
}

struct Forwarder {
    id: SubscriptionId,
    session_id: SessionId,
    receiver: broadcast::Receiver<FeedMessage>,
    stop: watch::Receiver<bool>,
    sink: Arc<dyn EventSink>,
    active: Arc<AtomicBool>,
    rooms: Arc<Rooms>,
}

/// Delivers room messages to one sink until unsubscribed or the room closes.
async fn forward(mut fwd: Forwarder) {
    loop {
        let message = tokio::select! {
            biased;
            _ = fwd.stop.changed() => break,
            message = fwd.receiver.recv() => message,
        };

        // Unsubscribe may have happened inside the previous callback.
        if !fwd.active.load(Ordering::SeqCst) {
            break;
        }

        match message {
            Ok(FeedMessage::Batch(batch)) => fwd.sink.on_batch(batch),
            Ok(FeedMessage::Error(error)) => fwd.sink.on_error(error),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(
                    subscription_id = %fwd.id,
                    session_id = %fwd.session_id,
                    skipped,
                    "Subscriber lagged behind feed"
                );
                fwd.sink.on_error(FeedError::Lagged { skipped });
            }
            Err(broadcast::error::RecvError::Closed) => {
                fwd.active.store(false, Ordering::SeqCst);
                fwd.sink.on_error(FeedError::Closed);
                break;
            }
        }
    }

    let Forwarder {
        id,
        session_id,
        receiver,
        rooms,
        ..
    } = fwd;
    drop(receiver);

    // Clean up the room once its last subscriber is gone
    let mut rooms = rooms.write().unwrap_or_else(PoisonError::into_inner);
    if rooms
        .get(&session_id)
        .is_some_and(|sender| sender.receiver_count() == 0)
    {
        rooms.remove(&session_id);
    }
    tracing::debug!(subscription_id = %id, session_id = %session_id, "Feed subscription ended");
}

struct BroadcastSubscription {
    id: SubscriptionId,
    active: Arc<AtomicBool>,
    stop: watch::Sender<bool>,
}

impl Subscription for BroadcastSubscription {
    fn unsubscribe(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            // The forwarding task may already have exited; nothing to stop then.
            let _ = self.stop.send(true);
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl Drop for BroadcastSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
