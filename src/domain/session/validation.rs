//! Anomaly detection ahead of the fold step.
//!
//! The feed is trusted to deliver well-formed, ordered events, so the fold
//! never rejects input. `EventValidator` reports the cases where that trust
//! was misplaced so the caller can log them; the event is folded regardless.

use thiserror::Error;

use super::events::{EventEnvelope, SessionEvent};
use super::summary::Summary;

/// An event that does not fit the summary it is about to be folded into.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventAnomaly {
    #[error("{event_type} received after the session terminated")]
    AfterTermination { event_type: &'static str },

    #[error("SessionClosed received before SessionNew")]
    CloseBeforeOpen,

    #[error("SessionNew received for a session that is already open")]
    DuplicateOpen,

    #[error("TaskFinished received with no running task")]
    FinishWithoutRunningTask,

    #[error("TaskFinished exceeds the {submitted} submitted tasks")]
    FinishedExceedsSubmitted { submitted: u64 },
}

/// Checks events against the current summary without changing it.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventValidator;

impl EventValidator {
    pub fn new() -> Self {
        Self
    }

    /// Returns the first anomaly the event would trigger, if any.
    pub fn check(&self, summary: &Summary, envelope: &EventEnvelope) -> Result<(), EventAnomaly> {
        if summary.is_terminal() {
            return Err(EventAnomaly::AfterTermination {
                event_type: envelope.event_type(),
            });
        }

        match &envelope.event {
            SessionEvent::TaskFinished => {
                if summary.tasks_running == 0 {
                    return Err(EventAnomaly::FinishWithoutRunningTask);
                }
                if summary.tasks_finished >= summary.tasks_count {
                    return Err(EventAnomaly::FinishedExceedsSubmitted {
                        submitted: summary.tasks_count,
                    });
                }
            }
            SessionEvent::SessionNew { .. } if summary.session.is_some() => {
                return Err(EventAnomaly::DuplicateOpen);
            }
            SessionEvent::SessionClosed { .. } if summary.session.is_none() => {
                return Err(EventAnomaly::CloseBeforeOpen);
            }
            _ => {}
        }

        Ok(())
    }
}
