use crate::domain::{Conversation, ListingSummary, Message};
use crate::error::AppResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// Position of a message in a conversation's `(created_at, id)` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageCursor {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

impl From<&Message> for MessageCursor {
    fn from(message: &Message) -> Self {
        Self {
            created_at: message.created_at,
            id: message.id,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessagePage {
    pub after: Option<MessageCursor>,
    pub limit: Option<i64>,
}

#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn find_conversation(&self, id: Uuid) -> AppResult<Option<Conversation>>;

    /// Inserts `candidate` unless a conversation with the same pair and
    /// listing exists. Returns the stored row and whether this call created it.
    async fn get_or_create_conversation(
        &self,
        candidate: &Conversation,
    ) -> AppResult<(Conversation, bool)>;

    async fn find_user_conversations(&self, user_id: Uuid) -> AppResult<Vec<Conversation>>;

    async fn find_message(
        &self,
        conversation_id: Uuid,
        message_id: Uuid,
    ) -> AppResult<Option<Message>>;

    async fn find_messages(
        &self,
        conversation_id: Uuid,
        page: MessagePage,
    ) -> AppResult<Vec<Message>>;

    /// Stores `message` and refreshes the conversation's last-message fields
    /// in one transaction. Holds the conversation lock while assigning the
    /// stored `created_at`, so a message committed later never sorts before
    /// one already returned. Callers must use the returned message.
    async fn append_message(&self, message: &Message) -> AppResult<Message>;
}

#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn find_listing(&self, id: Uuid) -> AppResult<Option<ListingSummary>>;

    async fn find_listings(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, ListingSummary>> {
        let mut listings = HashMap::with_capacity(ids.len());
        for id in ids {
            if let Some(listing) = self.find_listing(*id).await? {
                listings.insert(*id, listing);
            }
        }
        Ok(listings)
    }
}

#[async_trait]
pub trait RatingRepository: Send + Sync {
    async fn has_rated(&self, rater_id: Uuid, seller_id: Uuid, listing_id: Uuid)
        -> AppResult<bool>;
}
