//! Errors reported by an event feed through its error channel.

use thiserror::Error;

use super::{DomainError, ErrorCode};

/// Transport or protocol failure reported by the event feed.
///
/// Feed errors are values, not control flow: the monitor stores the most
/// recent one next to the summary and keeps the last known state visible.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("Feed transport failed: {0}")]
    Transport(String),

    #[error("Feed protocol violation: {0}")]
    Protocol(String),

    #[error("Subscriber lagged behind the feed, {skipped} batches dropped")]
    Lagged { skipped: u64 },

    #[error("Feed closed")]
    Closed,

    #[error("No async runtime available to drive the feed")]
    NoRuntime,
}

impl FeedError {
    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        FeedError::Transport(message.into())
    }

    /// Creates a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        FeedError::Protocol(message.into())
    }
}

impl From<FeedError> for DomainError {
    fn from(err: FeedError) -> Self {
        let code = match err {
            FeedError::Closed | FeedError::NoRuntime => ErrorCode::FeedUnavailable,
            FeedError::Transport(_) | FeedError::Protocol(_) | FeedError::Lagged { .. } => {
                ErrorCode::FeedTransport
            }
        };
        DomainError::new(code, err.to_string())
    }
}
