//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, enums, and error types
//! that form the vocabulary of the session monitor domain.

mod errors;
mod feed_error;
mod ids;
mod progress;
mod session_status;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use feed_error::FeedError;
pub use ids::{SessionId, SubscriptionId};
pub use progress::Progress;
pub use session_status::SessionStatus;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
