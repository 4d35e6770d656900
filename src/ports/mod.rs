//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Feed Ports
//!
//! - `EventFeed` - Subscribe to a session's event stream
//! - `EventSink` - Receiver of feed batches and errors
//! - `Subscription` - Idempotent unsubscribe handle
//!
//! ## Time
//!
//! - `Clock` - Current time for live durations

mod clock;
mod event_feed;

pub use clock::Clock;
pub use event_feed::{EventFeed, EventSink, FeedFilter, FieldFilter, FilterMode, Subscription};
pub use crate::domain::foundation::FeedError;
