//! The fold step: one event applied to a summary.
//!
//! `fold` is a pure transition `(Summary, &EventEnvelope) -> Folded`. It never
//! touches the feed; instead it reports `terminate = true` when it has just
//! applied the terminal `SessionClosed` event, and the caller tears down the
//! subscription.
//!
//! # Transitions
//!
//! | Event | Effect |
//! |-------|--------|
//! | `TaskStarted` | `tasks_running += 1` |
//! | `TaskFinished` | `tasks_running -= 1`, `tasks_finished += 1` |
//! | `ClientSubmit` | `submit_count += 1`, `tasks_count += len(tasks)`, `objs_count += len(dataobjs)` |
//! | `SessionNew` | session record replaced by a fresh open one |
//! | `SessionClosed` | finished, status, message set; `tasks_running = 0`; terminate |
//!
//! Once the summary is terminal every further event is a no-op.

use crate::domain::foundation::{SessionStatus, StateMachine};

use super::events::{EventEnvelope, SessionEvent};
use super::summary::{SessionInfo, Summary};

/// Result of folding one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Folded {
    pub summary: Summary,

    /// Set only by the step that applied `SessionClosed`.
    pub terminate: bool,
}

impl Folded {
    fn continue_with(summary: Summary) -> Self {
        Self {
            summary,
            terminate: false,
        }
    }
}

/// Applies one event to the summary.
pub fn fold(mut summary: Summary, envelope: &EventEnvelope) -> Folded {
    if summary.is_terminal() {
        return Folded::continue_with(summary);
    }

    match &envelope.event {
        SessionEvent::TaskStarted => {
            summary.tasks_running += 1;
        }
        SessionEvent::TaskFinished => {
            summary.tasks_running = summary.tasks_running.saturating_sub(1);
            summary.tasks_finished += 1;
        }
        SessionEvent::ClientSubmit { tasks, dataobjs } => {
            summary.submit_count += 1;
            summary.tasks_count += tasks.len() as u64;
            summary.objs_count += dataobjs.len() as u64;
        }
        SessionEvent::SessionNew { client, spec } => {
            summary.session = Some(SessionInfo::opened(
                client.clone(),
                envelope.time,
                spec.clone(),
            ));
        }
        SessionEvent::SessionClosed { reason, message } => {
            let session = summary.session.get_or_insert_with(|| {
                SessionInfo::opened(String::new(), envelope.time, Default::default())
            });
            session.finished = Some(envelope.time);
            // Terminal summaries return early, so the transition starts from Open.
            let target = SessionStatus::from_close_reason(reason.as_deref());
            session.status = session.status.transition_to(target).unwrap_or(target);
            session.message = message.clone().unwrap_or_default();
            summary.tasks_running = 0;

            return Folded {
                summary,
                terminate: true,
            };
        }
        SessionEvent::Other => {}
    }

    Folded::continue_with(summary)
}

#[cfg(test)]
#[path = "reducer_test.rs"]
mod reducer_test;
