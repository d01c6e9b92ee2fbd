use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    /// Upper bound for a single persistence call made by the chat service.
    #[serde(default = "crate::config::defaults::default_persistence_timeout_ms")]
    pub persistence_timeout_ms: u64,
    /// Buffered `MessageAppended` events before a slow relay starts lagging.
    #[serde(default = "crate::config::defaults::default_event_bus_capacity")]
    pub event_bus_capacity: usize,
    #[serde(default = "crate::config::defaults::default_message_max_length")]
    pub message_max_length: usize,
    #[serde(default = "crate::config::defaults::default_max_page_size")]
    pub max_page_size: i64,
}

impl ChatConfig {
    pub const fn persistence_timeout(&self) -> Duration {
        Duration::from_millis(self.persistence_timeout_ms)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            persistence_timeout_ms: crate::config::defaults::default_persistence_timeout_ms(),
            event_bus_capacity: crate::config::defaults::default_event_bus_capacity(),
            message_max_length: crate::config::defaults::default_message_max_length(),
            max_page_size: crate::config::defaults::default_max_page_size(),
        }
    }
}
