use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::api::dtos::{
    ConversationResponse, ConversationSummaryResponse, CreateConversationRequest,
    MessageListQuery, MessageResponse, SendMessageRequest,
};
use crate::application::events::{ChatEvent, ChatEvents};
use crate::config::ChatConfig;
use crate::domain::{Conversation, ListingSummary, Message, ParticipantPair, RatingState};
use crate::error::{AppError, AppResult};
use crate::infrastructure::repositories::{
    ChatRepository, ListingRepository, MessageCursor, MessagePage, RatingRepository,
};

const NOT_A_PARTICIPANT: &str = "You are not a participant in this conversation";

#[derive(Clone)]
pub struct ChatService {
    chat_repo: Arc<dyn ChatRepository>,
    listing_repo: Arc<dyn ListingRepository>,
    rating_repo: Arc<dyn RatingRepository>,
    events: ChatEvents,
    config: ChatConfig,
}

impl ChatService {
    pub fn new(
        chat_repo: Arc<dyn ChatRepository>,
        listing_repo: Arc<dyn ListingRepository>,
        rating_repo: Arc<dyn RatingRepository>,
        events: ChatEvents,
        config: ChatConfig,
    ) -> Self {
        Self {
            chat_repo,
            listing_repo,
            rating_repo,
            events,
            config,
        }
    }

    pub fn events(&self) -> &ChatEvents {
        &self.events
    }

    /// Resolves the conversation between `user_a` and `user_b` about
    /// `listing_id`, creating it on first contact. Argument order is
    /// irrelevant and concurrent callers converge on one row.
    pub async fn get_or_create(
        &self,
        user_a: Uuid,
        user_b: Uuid,
        listing_id: Option<Uuid>,
    ) -> AppResult<Conversation> {
        let pair = ParticipantPair::new(user_a, user_b)?;

        if let Some(listing_id) = listing_id {
            self.bounded("listing lookup", self.listing_repo.find_listing(listing_id))
                .await?
                .ok_or_else(|| AppError::NotFound("listing not found".to_string()))?;
        }

        let candidate = Conversation::new(pair, listing_id);
        let (conversation, created) = self
            .bounded(
                "conversation upsert",
                self.chat_repo.get_or_create_conversation(&candidate),
            )
            .await?;

        if created {
            info!(
                conversation_id = %conversation.id,
                listing_id = ?conversation.listing_id,
                "conversation created"
            );
        }

        Ok(conversation)
    }

    /// Conversations `user_id` takes part in, most recently active first, each
    /// annotated with whether the user may rate the listing's seller.
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<ConversationSummaryResponse>> {
        let mut conversations = self
            .bounded(
                "conversation listing",
                self.chat_repo.find_user_conversations(user_id),
            )
            .await?;

        let mut seen = HashSet::with_capacity(conversations.len());
        conversations.retain(|conversation| {
            conversation.is_participant(user_id) && seen.insert(conversation.id)
        });
        conversations.sort_by(|left, right| {
            right
                .last_message_at
                .cmp(&left.last_message_at)
                .then(right.created_at.cmp(&left.created_at))
        });

        let mut listing_ids = Vec::new();
        let mut seen_listings = HashSet::new();
        for listing_id in conversations.iter().filter_map(|c| c.listing_id) {
            if seen_listings.insert(listing_id) {
                listing_ids.push(listing_id);
            }
        }

        let listings = if listing_ids.is_empty() {
            HashMap::new()
        } else {
            self.bounded("listing lookup", self.listing_repo.find_listings(&listing_ids))
                .await?
        };

        let mut rated: HashMap<Uuid, bool> = HashMap::with_capacity(listings.len());
        for listing in listings.values() {
            if listing.seller_id == user_id {
                continue;
            }
            let has_rated = self
                .bounded(
                    "rating lookup",
                    self.rating_repo
                        .has_rated(user_id, listing.seller_id, listing.id),
                )
                .await?;
            rated.insert(listing.id, has_rated);
        }

        Ok(conversations
            .into_iter()
            .filter_map(|conversation| {
                let other_participant_id = conversation.other_participant(user_id)?;
                let listing: Option<&ListingSummary> = conversation
                    .listing_id
                    .and_then(|listing_id| listings.get(&listing_id));
                let has_rated = listing
                    .and_then(|listing| rated.get(&listing.id).copied())
                    .unwrap_or(false);
                let rating_state = RatingState::resolve(user_id, listing, has_rated);

                Some(ConversationSummaryResponse {
                    listing: listing.cloned().map(Into::into),
                    other_participant_id,
                    rating_state,
                    conversation: conversation.into(),
                })
            })
            .collect())
    }

    /// Appends `content` from `sender_id` and refreshes the conversation's
    /// last-message fields. Connected participants are notified after commit.
    pub async fn append(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: String,
    ) -> AppResult<Message> {
        let conversation = self.find_conversation(conversation_id).await?;
        self.append_to(&conversation, sender_id, content).await
    }

    /// Messages of `conversation_id` in ascending `(created_at, id)` order.
    pub async fn list(
        &self,
        conversation_id: Uuid,
        after: Option<Uuid>,
        limit: Option<i64>,
    ) -> AppResult<Vec<Message>> {
        let conversation = self.find_conversation(conversation_id).await?;
        self.messages_of(&conversation, after, limit).await
    }

    pub async fn create_conversation(
        &self,
        caller_id: Uuid,
        request: CreateConversationRequest,
    ) -> AppResult<ConversationResponse> {
        request.validate()?;

        if caller_id != request.user_id1 && caller_id != request.user_id2 {
            return Err(AppError::Forbidden(
                "You can only open conversations you take part in".to_string(),
            ));
        }

        let conversation = self
            .get_or_create(request.user_id1, request.user_id2, request.listing_id)
            .await?;
        Ok(conversation.into())
    }

    pub async fn get_conversation(
        &self,
        caller_id: Uuid,
        conversation_id: Uuid,
    ) -> AppResult<ConversationResponse> {
        let conversation = self.ensure_participant(caller_id, conversation_id).await?;
        Ok(conversation.into())
    }

    pub async fn list_conversations(
        &self,
        caller_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Vec<ConversationSummaryResponse>> {
        if caller_id != user_id {
            return Err(AppError::Forbidden(
                "You can only list your own conversations".to_string(),
            ));
        }

        self.list_for_user(user_id).await
    }

    pub async fn list_messages(
        &self,
        caller_id: Uuid,
        conversation_id: Uuid,
        query: MessageListQuery,
    ) -> AppResult<Vec<MessageResponse>> {
        query.validate()?;

        let conversation = self.ensure_participant(caller_id, conversation_id).await?;
        let messages = self
            .messages_of(&conversation, query.after, query.limit)
            .await?;
        Ok(messages.into_iter().map(Into::into).collect())
    }

    pub async fn send_message(
        &self,
        caller_id: Uuid,
        conversation_id: Uuid,
        request: SendMessageRequest,
    ) -> AppResult<MessageResponse> {
        request.validate()?;

        if request.sender_id.is_some_and(|sender_id| sender_id != caller_id) {
            return Err(AppError::Forbidden(
                "senderId must match the authenticated user".to_string(),
            ));
        }

        let conversation = self.ensure_participant(caller_id, conversation_id).await?;

        if let Some(seller_id) = request.seller_id {
            if !conversation.is_participant(seller_id) {
                return Err(AppError::validation_error(
                    "sellerId is not a participant in this conversation",
                ));
            }
        }
        if let Some(listing_id) = request.listing_id {
            if conversation.listing_id != Some(listing_id) {
                return Err(AppError::validation_error(
                    "listingId does not match this conversation",
                ));
            }
        }

        let message = self
            .append_to(&conversation, caller_id, request.content)
            .await?;
        Ok(message.into())
    }

    /// Socket send path: writes into `conversation_id` when given, otherwise
    /// into the conversation with `receiver_id` about `listing_id`.
    pub async fn send_direct(
        &self,
        caller_id: Uuid,
        receiver_id: Option<Uuid>,
        listing_id: Option<Uuid>,
        conversation_id: Option<Uuid>,
        content: String,
    ) -> AppResult<MessageResponse> {
        let conversation = match (conversation_id, receiver_id) {
            (Some(conversation_id), _) => {
                let conversation = self.ensure_participant(caller_id, conversation_id).await?;
                if receiver_id.is_some_and(|receiver_id| !conversation.is_participant(receiver_id))
                {
                    return Err(AppError::validation_error(
                        "receiverId is not a participant in this conversation",
                    ));
                }
                conversation
            }
            (None, Some(receiver_id)) => {
                self.get_or_create(caller_id, receiver_id, listing_id)
                    .await?
            }
            (None, None) => {
                return Err(AppError::validation_error(
                    "receiverId or conversationId is required",
                ))
            }
        };

        let message = self.append_to(&conversation, caller_id, content).await?;
        Ok(message.into())
    }

    pub async fn ensure_participant(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
    ) -> AppResult<Conversation> {
        let conversation = self.find_conversation(conversation_id).await?;
        if !conversation.is_participant(user_id) {
            return Err(AppError::Forbidden(NOT_A_PARTICIPANT.to_string()));
        }
        Ok(conversation)
    }

    async fn find_conversation(&self, conversation_id: Uuid) -> AppResult<Conversation> {
        self.bounded(
            "conversation lookup",
            self.chat_repo.find_conversation(conversation_id),
        )
        .await?
        .ok_or_else(|| AppError::NotFound("conversation not found".to_string()))
    }

    async fn append_to(
        &self,
        conversation: &Conversation,
        sender_id: Uuid,
        content: String,
    ) -> AppResult<Message> {
        if !conversation.is_participant(sender_id) {
            return Err(AppError::Forbidden(NOT_A_PARTICIPANT.to_string()));
        }
        if content.trim().is_empty() {
            return Err(AppError::validation_error("content must not be empty"));
        }
        if content.chars().count() > self.config.message_max_length {
            return Err(AppError::validation_error(format!(
                "content must be at most {} characters",
                self.config.message_max_length
            )));
        }

        let message = Message::new(conversation.id, sender_id, content);
        let created = self
            .bounded("message append", self.chat_repo.append_message(&message))
            .await?;

        info!(
            conversation_id = %created.conversation_id,
            message_id = %created.id,
            sender_id = %created.sender_id,
            "message appended"
        );

        self.events.publish(ChatEvent::MessageAppended {
            message: created.clone(),
            participant_ids: conversation.participant_ids(),
        });

        Ok(created)
    }

    async fn messages_of(
        &self,
        conversation: &Conversation,
        after: Option<Uuid>,
        limit: Option<i64>,
    ) -> AppResult<Vec<Message>> {
        if let Some(limit) = limit {
            if limit < 1 || limit > self.config.max_page_size {
                return Err(AppError::validation_error(format!(
                    "limit must be between 1 and {}",
                    self.config.max_page_size
                )));
            }
        }

        let after = match after {
            Some(message_id) => {
                let cursor = self
                    .bounded(
                        "message lookup",
                        self.chat_repo.find_message(conversation.id, message_id),
                    )
                    .await?
                    .ok_or_else(|| {
                        AppError::validation_error(
                            "after must reference a message in this conversation",
                        )
                    })?;
                Some(MessageCursor::from(&cursor))
            }
            None => None,
        };

        self.bounded(
            "message listing",
            self.chat_repo
                .find_messages(conversation.id, MessagePage { after, limit }),
        )
        .await
    }

    async fn bounded<T, F>(&self, operation: &'static str, future: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        match tokio::time::timeout(self.config.persistence_timeout(), future).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    operation,
                    timeout_ms = self.config.persistence_timeout_ms,
                    "persistence call timed out"
                );
                Err(AppError::Timeout { operation })
            }
        }
    }
}
