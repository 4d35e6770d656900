//! Event feed adapters.
//!
//! Adapters implement the `EventFeed` port for different environments:
//!
//! - `InMemoryEventFeed` - Synchronous, in-process feed for testing
//! - `BroadcastEventFeed` - Tokio broadcast rooms, one per session

mod broadcast;
mod in_memory;

pub use broadcast::BroadcastEventFeed;
pub use in_memory::InMemoryEventFeed;
