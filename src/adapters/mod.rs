//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `events` - Event feed implementations (in-memory, broadcast)
//! - `clock` - System and fixed clocks

pub mod clock;
pub mod events;

pub use clock::{FixedClock, SystemClock};
pub use events::{BroadcastEventFeed, InMemoryEventFeed};
