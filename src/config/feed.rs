//! Event feed configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Largest per-session buffer accepted by validation.
pub const MAX_CHANNEL_CAPACITY: usize = 65_536;

/// Event feed configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FeedConfig {
    /// Messages buffered per session before slow subscribers lag
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl FeedConfig {
    /// Validate feed configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.channel_capacity == 0 || self.channel_capacity > MAX_CHANNEL_CAPACITY {
            return Err(ValidationError::InvalidChannelCapacity(self.channel_capacity));
        }
        Ok(())
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize {
    128
}
