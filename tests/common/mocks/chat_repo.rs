use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use marketplace_chat::domain::{next_message_timestamp, Conversation, Message};
use marketplace_chat::error::{AppError, AppResult};
use marketplace_chat::infrastructure::repositories::{ChatRepository, MessagePage};
use uuid::Uuid;

#[derive(Default)]
pub struct MockChatRepo {
    pub conversations: Mutex<Vec<Conversation>>,
    pub messages: Mutex<Vec<Message>>,
    pub delay: Mutex<Option<Duration>>,
    pub append_stalls: Mutex<HashMap<String, Duration>>,
    pub created_count: AtomicUsize,
}

impl MockChatRepo {
    /// Every call sleeps for `delay` before touching state.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().expect("delay mutex poisoned") = Some(delay);
    }

    /// Appending a message with exactly `content` sleeps for `delay` before
    /// taking the conversation lock.
    pub fn stall_append(&self, content: &str, delay: Duration) {
        self.append_stalls
            .lock()
            .expect("stall mutex poisoned")
            .insert(content.to_string(), delay);
    }

    pub fn insert_conversation(&self, conversation: Conversation) {
        self.conversations
            .lock()
            .expect("conversations mutex poisoned")
            .push(conversation);
    }

    pub fn conversation(&self, id: Uuid) -> Option<Conversation> {
        self.conversations
            .lock()
            .expect("conversations mutex poisoned")
            .iter()
            .find(|conversation| conversation.id == id)
            .cloned()
    }

    pub fn conversation_count(&self) -> usize {
        self.conversations
            .lock()
            .expect("conversations mutex poisoned")
            .len()
    }

    pub fn message_count(&self) -> usize {
        self.messages.lock().expect("messages mutex poisoned").len()
    }

    async fn wait(&self) {
        let delay = *self.delay.lock().expect("delay mutex poisoned");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ChatRepository for MockChatRepo {
    async fn find_conversation(&self, id: Uuid) -> AppResult<Option<Conversation>> {
        self.wait().await;
        Ok(self.conversation(id))
    }

    async fn get_or_create_conversation(
        &self,
        candidate: &Conversation,
    ) -> AppResult<(Conversation, bool)> {
        self.wait().await;
        let mut conversations = self
            .conversations
            .lock()
            .expect("conversations mutex poisoned");

        if let Some(existing) = conversations.iter().find(|conversation| {
            conversation.participant_low == candidate.participant_low
                && conversation.participant_high == candidate.participant_high
                && conversation.listing_id == candidate.listing_id
        }) {
            return Ok((existing.clone(), false));
        }

        conversations.push(candidate.clone());
        self.created_count.fetch_add(1, Ordering::SeqCst);
        Ok((candidate.clone(), true))
    }

    async fn find_user_conversations(&self, user_id: Uuid) -> AppResult<Vec<Conversation>> {
        self.wait().await;
        let mut conversations: Vec<Conversation> = self
            .conversations
            .lock()
            .expect("conversations mutex poisoned")
            .iter()
            .filter(|conversation| conversation.is_participant(user_id))
            .cloned()
            .collect();
        conversations.sort_by(|left, right| {
            right
                .last_message_at
                .cmp(&left.last_message_at)
                .then(right.created_at.cmp(&left.created_at))
        });
        Ok(conversations)
    }

    async fn find_message(
        &self,
        conversation_id: Uuid,
        message_id: Uuid,
    ) -> AppResult<Option<Message>> {
        self.wait().await;
        Ok(self
            .messages
            .lock()
            .expect("messages mutex poisoned")
            .iter()
            .find(|message| message.id == message_id && message.conversation_id == conversation_id)
            .cloned())
    }

    async fn find_messages(
        &self,
        conversation_id: Uuid,
        page: MessagePage,
    ) -> AppResult<Vec<Message>> {
        self.wait().await;
        let mut messages: Vec<Message> = self
            .messages
            .lock()
            .expect("messages mutex poisoned")
            .iter()
            .filter(|message| message.conversation_id == conversation_id)
            .filter(|message| {
                page.after.map_or(true, |cursor| {
                    (message.created_at, message.id) > (cursor.created_at, cursor.id)
                })
            })
            .cloned()
            .collect();
        messages.sort_by(|left, right| {
            (left.created_at, left.id).cmp(&(right.created_at, right.id))
        });
        if let Some(limit) = page.limit {
            messages.truncate(usize::try_from(limit).unwrap_or(0));
        }
        Ok(messages)
    }

    async fn append_message(&self, message: &Message) -> AppResult<Message> {
        self.wait().await;
        let stall = self
            .append_stalls
            .lock()
            .expect("stall mutex poisoned")
            .get(&message.content)
            .copied();
        if let Some(stall) = stall {
            tokio::time::sleep(stall).await;
        }

        let mut conversations = self
            .conversations
            .lock()
            .expect("conversations mutex poisoned");
        let conversation = conversations
            .iter_mut()
            .find(|conversation| conversation.id == message.conversation_id)
            .ok_or_else(|| AppError::NotFound("conversation not found".to_string()))?;

        let stored = Message {
            created_at: next_message_timestamp(conversation.last_message_at, Utc::now()),
            ..message.clone()
        };
        if conversation
            .last_message_at
            .map_or(true, |last| last <= stored.created_at)
        {
            conversation.last_message = Some(stored.content.clone());
            conversation.last_message_at = Some(stored.created_at);
        }
        self.messages
            .lock()
            .expect("messages mutex poisoned")
            .push(stored.clone());
        Ok(stored)
    }
}
