//! Summary read model folded from a session's event stream.

use serde::Serialize;

use crate::domain::foundation::{FeedError, SessionStatus, StateMachine, Timestamp};

use super::events::SessionSpec;

/// The session record, present once `SessionNew` has been observed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    /// Id of the submitting client.
    pub client: String,

    /// When the session was opened.
    pub created: Timestamp,

    /// When the session was closed; set only on termination.
    pub finished: Option<Timestamp>,

    pub status: SessionStatus,

    /// Close message, empty until termination.
    pub message: String,

    pub spec: SessionSpec,
}

impl SessionInfo {
    /// Creates an open session record.
    pub fn opened(client: impl Into<String>, created: Timestamp, spec: SessionSpec) -> Self {
        Self {
            client: client.into(),
            created,
            finished: None,
            status: SessionStatus::Open,
            message: String::new(),
            spec,
        }
    }
}

/// Aggregated view of one session.
///
/// Counters only grow, except `tasks_running` which follows tasks in
/// flight and is forced to zero when the session terminates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub session: Option<SessionInfo>,
    pub submit_count: u64,
    pub tasks_count: u64,
    pub tasks_running: u64,
    pub tasks_finished: u64,
    pub objs_count: u64,

    /// Last error reported by the feed, independent of session state.
    pub error: Option<FeedError>,
}

impl Summary {
    /// Creates the empty summary shown before any event arrives.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session status, if the session is known.
    pub fn status(&self) -> Option<SessionStatus> {
        self.session.as_ref().map(|s| s.status)
    }

    /// Returns true once a terminal status has been folded in.
    pub fn is_terminal(&self) -> bool {
        self.status().is_some_and(|s| s.is_terminal())
    }
}
