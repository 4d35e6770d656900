//! Session domain module.
//!
//! Folds the event stream of one compute session into a [`Summary`].
//! The fold is pure; subscription handling lives in the application layer.
//!
//! # Events
//!
//! - `TaskStarted` / `TaskFinished` - Task execution progress
//! - `ClientSubmit` - Tasks and data objects submitted by the client
//! - `SessionNew` - Session opened
//! - `SessionClosed` - Session ended (terminal)

mod events;
mod metrics;
mod reducer;
mod summary;
mod validation;

pub use events::{EventEnvelope, SessionEvent, SessionSpec};
pub use metrics::SessionMetrics;
pub use reducer::{fold, Folded};
pub use summary::{SessionInfo, Summary};
pub use validation::{EventAnomaly, EventValidator};
