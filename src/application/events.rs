//! In-process notifications emitted by the chat core.
//!
//! Subscribers (the realtime relay) observe committed writes; publishing never
//! blocks and never fails the write that triggered it.

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::Message;

#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    MessageAppended {
        message: Message,
        participant_ids: [Uuid; 2],
    },
}

pub struct ChatEvents {
    sender: broadcast::Sender<ChatEvent>,
}

impl ChatEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.sender.subscribe()
    }

    /// Returns how many subscribers the event reached. Events published with
    /// no subscriber are dropped.
    pub fn publish(&self, event: ChatEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

impl Clone for ChatEvents {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl std::fmt::Debug for ChatEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatEvents")
            .field("subscriber_count", &self.sender.receiver_count())
            .finish()
    }
}
