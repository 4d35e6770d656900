//! SessionStatus enum for tracking the lifecycle of an observed session.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::StateMachine;

/// Lifecycle status of a compute session.
///
/// A session starts `Open` and ends in exactly one of the three terminal
/// statuses when the server reports it closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SessionStatus {
    #[default]
    Open,
    Closed,
    Error,
    ServerLost,
}

impl SessionStatus {
    /// Maps the `reason` of a close event to a terminal status.
    ///
    /// Only `"Error"` and `"ServerLost"` are distinguished; every other
    /// reason, including a missing one, is an ordinary close.
    pub fn from_close_reason(reason: Option<&str>) -> Self {
        match reason {
            Some("Error") => SessionStatus::Error,
            Some("ServerLost") => SessionStatus::ServerLost,
            _ => SessionStatus::Closed,
        }
    }
}

impl StateMachine for SessionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SessionStatus::*;
        matches!(
            (self, target),
            (Open, Closed) | (Open, Error) | (Open, ServerLost)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SessionStatus::*;
        match self {
            Open => vec![Closed, Error, ServerLost],
            Closed | Error | ServerLost => vec![],
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Open => "Open",
            SessionStatus::Closed => "Closed",
            SessionStatus::Error => "Error",
            SessionStatus::ServerLost => "Server lost",
        };
        write!(f, "{}", s)
    }
}
