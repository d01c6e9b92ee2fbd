use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{Conversation, ListingSummary, Message, RatingState};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    pub user_id1: Uuid,
    pub user_id2: Uuid,
    #[serde(default)]
    pub listing_id: Option<Uuid>,
}

/// Body of `POST /chat/conversations/{id}/messages`. The context fields are
/// optional and only checked against the conversation when present. The
/// length cap comes from `chat.message_max_length` and is checked by the
/// service.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    pub sender_id: Option<Uuid>,
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: String,
    #[serde(default)]
    pub seller_id: Option<Uuid>,
    #[serde(default)]
    pub listing_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MessageListQuery {
    pub after: Option<Uuid>,
    /// Capped by `chat.max_page_size` in the service.
    #[validate(range(min = 1, message = "limit must be at least 1"))]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            content: message.content,
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub id: Uuid,
    pub participant_ids: Vec<Uuid>,
    pub listing_id: Option<Uuid>,
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Conversation> for ConversationResponse {
    fn from(conversation: Conversation) -> Self {
        Self {
            id: conversation.id,
            participant_ids: conversation.participant_ids().to_vec(),
            listing_id: conversation.listing_id,
            last_message: conversation.last_message,
            last_message_at: conversation.last_message_at,
            created_at: conversation.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListingSummaryResponse {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub title: String,
    pub status: String,
}

impl From<ListingSummary> for ListingSummaryResponse {
    fn from(listing: ListingSummary) -> Self {
        Self {
            id: listing.id,
            seller_id: listing.seller_id,
            title: listing.title,
            status: listing.status,
        }
    }
}

/// Entry of a user's conversation list, seen from that user's side.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummaryResponse {
    #[serde(flatten)]
    pub conversation: ConversationResponse,
    pub other_participant_id: Uuid,
    pub listing: Option<ListingSummaryResponse>,
    pub rating_state: RatingState,
}
