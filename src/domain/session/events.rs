//! Session domain events as delivered by the event feed.
//!
//! Every event arrives wrapped in an [`EventEnvelope`] carrying the server
//! time it occurred at. The event body is tagged by its `type` field:
//!
//! - `TaskStarted` - A task began executing on a worker
//! - `TaskFinished` - A task completed
//! - `ClientSubmit` - The client submitted a batch of tasks and data objects
//! - `SessionNew` - The session was opened
//! - `SessionClosed` - The session ended (terminal)
//!
//! Any other `type` deserializes to [`SessionEvent::Other`] and is ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::foundation::Timestamp;

/// Transport envelope for one session event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// When the event occurred on the server.
    pub time: Timestamp,

    /// The type-tagged event body.
    pub event: SessionEvent,
}

impl EventEnvelope {
    /// Wraps an event with its occurrence time.
    pub fn new(time: Timestamp, event: SessionEvent) -> Self {
        Self { time, event }
    }

    /// Returns the wire name of the wrapped event type.
    pub fn event_type(&self) -> &'static str {
        self.event.event_type()
    }
}

/// Session lifecycle and progress events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    TaskStarted,

    TaskFinished,

    /// Only the lengths of `tasks` and `dataobjs` are consumed.
    ClientSubmit {
        #[serde(default)]
        tasks: Vec<JsonValue>,
        #[serde(default)]
        dataobjs: Vec<JsonValue>,
    },

    SessionNew {
        client: String,
        #[serde(default)]
        spec: SessionSpec,
    },

    SessionClosed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        /// Null and missing both mean no message.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    #[serde(other)]
    Other,
}

impl SessionEvent {
    /// Returns the wire name of this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::TaskStarted => "TaskStarted",
            SessionEvent::TaskFinished => "TaskFinished",
            SessionEvent::ClientSubmit { .. } => "ClientSubmit",
            SessionEvent::SessionNew { .. } => "SessionNew",
            SessionEvent::SessionClosed { .. } => "SessionClosed",
            SessionEvent::Other => "Other",
        }
    }
}

/// Opaque session specification sent by the client.
///
/// Kept verbatim for display; the only field the monitor reads is the
/// optional `name` used as the session title.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionSpec(JsonValue);

impl SessionSpec {
    /// Wraps a raw specification payload.
    pub fn new(value: JsonValue) -> Self {
        Self(value)
    }

    /// Returns the session name if the payload carries a string `name`.
    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(JsonValue::as_str)
    }
}
