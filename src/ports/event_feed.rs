//! EventFeed port - Interface for subscribing to a filtered session event feed.
//!
//! The feed pushes ordered batches of events to a sink and reports transport
//! failures on a separate error channel. It knows nothing about what the sink
//! does with the events.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::foundation::{FeedError, SessionId, SubscriptionId};
use crate::domain::session::EventEnvelope;

/// Comparison applied by a [`FieldFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterMode {
    #[serde(rename = "=")]
    Equals,
}

/// Predicate over one numeric event field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub value: u64,
    pub mode: FilterMode,
}

impl FieldFilter {
    /// Returns true if `candidate` satisfies the predicate.
    pub fn matches(&self, candidate: u64) -> bool {
        match self.mode {
            FilterMode::Equals => candidate == self.value,
        }
    }
}

/// Filter restricting a feed to the events of one session.
///
/// Serializes as `{"session": {"value": <id>, "mode": "="}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedFilter {
    pub session: FieldFilter,
}

impl FeedFilter {
    /// Creates an equality filter on the session id.
    pub fn session(session_id: SessionId) -> Self {
        Self {
            session: FieldFilter {
                value: session_id.value(),
                mode: FilterMode::Equals,
            },
        }
    }

    /// Returns the session id the filter selects.
    pub fn session_id(&self) -> SessionId {
        SessionId::new(self.session.value)
    }

    /// Returns true if events of `session_id` pass the filter.
    pub fn matches(&self, session_id: SessionId) -> bool {
        self.session.matches(session_id.value())
    }
}

/// Receiver of feed callbacks.
///
/// A feed invokes the callbacks of one subscription serially, never
/// concurrently. Implementations may unsubscribe from inside `on_batch`.
pub trait EventSink: Send + Sync {
    /// Receives a non-empty, ordered batch of events.
    fn on_batch(&self, batch: Vec<EventEnvelope>);

    /// Receives a transport or protocol failure.
    fn on_error(&self, error: FeedError);

    /// Sink name for logging.
    fn name(&self) -> &'static str;
}

/// Handle to an active subscription.
///
/// `unsubscribe` is idempotent: only the first call has any effect. Once it
/// returns no new delivery starts, but a callback already in progress on
/// another thread may still reach the sink.
pub trait Subscription: Send + Sync {
    fn unsubscribe(&self);

    /// Returns false once unsubscribed or once the feed stopped the subscription.
    fn is_active(&self) -> bool;

    fn id(&self) -> SubscriptionId;
}

/// Port for subscribing to session events.
pub trait EventFeed: Send + Sync {
    /// Starts delivering events matching `filter` to `sink`.
    ///
    /// # Errors
    ///
    /// Returns `FeedError` if the feed cannot accept the subscription.
    fn subscribe(
        &self,
        filter: FeedFilter,
        sink: Arc<dyn EventSink>,
    ) -> Result<Box<dyn Subscription>, FeedError>;
}
