//! Application layer - Drives the domain fold against an event feed.
//!
//! The domain reducer is pure; this layer owns the subscription lifecycle
//! and the shared summary the UI reads.

mod session_monitor;
mod snapshot;

pub use session_monitor::{MonitorHandle, SessionMonitor};
pub use snapshot::SessionSnapshot;
