//! SessionMonitor - Keeps a live summary of one session's event stream.
//!
//! Subscribes to the event feed with a session filter, folds every delivered
//! batch into the summary in order, and releases the subscription exactly
//! once: when `SessionClosed` is folded, when the handle is disposed, or when
//! the handle is dropped, whichever happens first.
//!
//! ## Teardown
//!
//! The fold reports termination instead of unsubscribing itself. The sink
//! checks that flag after each event and releases the stored subscription
//! before returning from the callback that carried the terminal event.
//! Events after `SessionClosed` in the same batch are dropped.
//!
//! Disposal marks the state before unsubscribing, so a callback the feed
//! had already started when `dispose()` ran cannot change the summary.

use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::foundation::{DomainError, FeedError, SessionId};
use crate::domain::session::{fold, EventEnvelope, EventValidator, SessionMetrics, Summary};
use crate::ports::{Clock, EventFeed, EventSink, FeedFilter, Subscription};

use super::snapshot::SessionSnapshot;

/// Starts monitors against one event feed.
pub struct SessionMonitor {
    feed: Arc<dyn EventFeed>,
}

impl SessionMonitor {
    pub fn new(feed: Arc<dyn EventFeed>) -> Self {
        Self { feed }
    }

    /// Begins observing `session_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` with a feed error code if the feed refuses the
    /// subscription.
    pub fn start(&self, session_id: SessionId) -> Result<MonitorHandle, DomainError> {
        let core = Arc::new(MonitorCore::new(session_id));

        let subscription = self
            .feed
            .subscribe(FeedFilter::session(session_id), core.clone())
            .map_err(|e| {
                tracing::error!(session_id = %session_id, error = %e, "Failed to subscribe to event feed");
                DomainError::from(e).with_detail("session_id", session_id.to_string())
            })?;

        core.attach(subscription);
        tracing::info!(session_id = %session_id, "Started monitoring session");

        Ok(MonitorHandle { core })
    }
}

/// Owning handle to a running monitor.
///
/// Dropping the handle disposes it.
pub struct MonitorHandle {
    core: Arc<MonitorCore>,
}

impl MonitorHandle {
    pub fn session_id(&self) -> SessionId {
        self.core.session_id
    }

    /// Returns the latest folded summary.
    pub fn current_summary(&self) -> Summary {
        self.core.lock_state().summary.clone()
    }

    /// Returns true once the session reached a terminal status.
    pub fn is_terminated(&self) -> bool {
        self.core.lock_state().terminated
    }

    /// Returns true while the feed subscription is held and live.
    pub fn is_subscribed(&self) -> bool {
        self.core
            .lock_subscription()
            .as_ref()
            .is_some_and(|s| s.is_active())
    }

    /// Summary plus derived metrics as of `clock.now()`.
    pub fn snapshot(&self, clock: &dyn Clock) -> SessionSnapshot {
        let summary = self.current_summary();
        let metrics = SessionMetrics::compute(&summary, clock.now());
        SessionSnapshot::new(self.core.session_id, &summary, &metrics)
    }

    /// Stops the subscription. Safe to call any number of times.
    ///
    /// Once this returns the summary no longer changes.
    pub fn dispose(&self) {
        self.core.lock_state().disposed = true;
        if self.core.release() {
            tracing::debug!(session_id = %self.core.session_id, "Monitor disposed");
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

struct MonitorState {
    summary: Summary,
    terminated: bool,
    disposed: bool,
}

/// Shared between the handle and the feed, which sees it as an `EventSink`.
struct MonitorCore {
    session_id: SessionId,
    state: Mutex<MonitorState>,
    subscription: Mutex<Option<Box<dyn Subscription>>>,
    validator: EventValidator,
}

impl MonitorCore {
    fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            state: Mutex::new(MonitorState {
                summary: Summary::new(),
                terminated: false,
                disposed: false,
            }),
            subscription: Mutex::new(None),
            validator: EventValidator::new(),
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_subscription(&self) -> std::sync::MutexGuard<'_, Option<Box<dyn Subscription>>> {
        self.subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores the subscription returned by the feed.
    ///
    /// A terminal event can arrive before `subscribe` returns; in that case
    /// the subscription is released right away instead of stored.
    fn attach(&self, subscription: Box<dyn Subscription>) {
        let mut slot = self.lock_subscription();
        if self.lock_state().terminated {
            drop(slot);
            subscription.unsubscribe();
            tracing::debug!(session_id = %self.session_id, "Session ended during subscribe");
            return;
        }
        *slot = Some(subscription);
    }

    /// Releases the subscription if still held. Returns true if this call did.
    fn release(&self) -> bool {
        let taken = self.lock_subscription().take();
        match taken {
            Some(subscription) => {
                subscription.unsubscribe();
                tracing::debug!(
                    session_id = %self.session_id,
                    subscription_id = %subscription.id(),
                    "Unsubscribed from event feed"
                );
                true
            }
            None => false,
        }
    }
}

impl EventSink for MonitorCore {
    fn on_batch(&self, batch: Vec<EventEnvelope>) {
        let terminated = {
            let mut state = self.lock_state();
            if state.disposed {
                tracing::debug!(
                    session_id = %self.session_id,
                    events = batch.len(),
                    "Ignoring batch delivered after dispose"
                );
                return;
            }
            if state.terminated {
                tracing::warn!(
                    session_id = %self.session_id,
                    events = batch.len(),
                    "Ignoring batch delivered after session terminated"
                );
                return;
            }

            let mut summary = std::mem::take(&mut state.summary);
            let mut terminated = false;
            for (index, envelope) in batch.iter().enumerate() {
                if let Err(anomaly) = self.validator.check(&summary, envelope) {
                    tracing::warn!(
                        session_id = %self.session_id,
                        event_type = envelope.event_type(),
                        %anomaly,
                        "Unexpected event in session stream"
                    );
                }

                let folded = fold(summary, envelope);
                summary = folded.summary;

                if folded.terminate {
                    let ignored = batch.len() - index - 1;
                    if ignored > 0 {
                        tracing::warn!(
                            session_id = %self.session_id,
                            ignored,
                            "Ignoring events delivered after SessionClosed"
                        );
                    }
                    terminated = true;
                    break;
                }
            }

            if terminated {
                tracing::info!(
                    session_id = %self.session_id,
                    status = ?summary.status(),
                    tasks_finished = summary.tasks_finished,
                    tasks_count = summary.tasks_count,
                    "Session reached terminal status"
                );
            }
            state.summary = summary;
            state.terminated = terminated;
            terminated
        };

        if terminated {
            self.release();
        }
    }

    fn on_error(&self, error: FeedError) {
        let mut state = self.lock_state();
        if state.disposed {
            tracing::debug!(session_id = %self.session_id, error = %error, "Ignoring feed error after dispose");
            return;
        }
        tracing::warn!(
            session_id = %self.session_id,
            terminated = state.terminated,
            error = %error,
            "Event feed reported an error"
        );
        state.summary.error = Some(error);
    }

    fn name(&self) -> &'static str {
        "SessionMonitor"
    }
}

#[cfg(test)]
#[path = "session_monitor_test.rs"]
mod session_monitor_test;
