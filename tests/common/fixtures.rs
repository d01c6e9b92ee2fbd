use std::sync::Arc;

use marketplace_chat::application::{ChatEvents, ChatService};
use marketplace_chat::config::ChatConfig;
use marketplace_chat::domain::{Conversation, ListingSummary, ParticipantPair};
use uuid::Uuid;

use super::mocks::{MockChatRepo, MockListingRepo, MockRatingRepo};
use super::test_chat_config;

/// Chat service over in-memory repositories, with handles to each repository.
pub struct ChatHarness {
    pub chat_repo: Arc<MockChatRepo>,
    pub listing_repo: Arc<MockListingRepo>,
    pub rating_repo: Arc<MockRatingRepo>,
    pub events: ChatEvents,
    pub service: Arc<ChatService>,
}

impl ChatHarness {
    pub fn new() -> Self {
        Self::with_config(test_chat_config())
    }

    pub fn with_config(config: ChatConfig) -> Self {
        let chat_repo = Arc::new(MockChatRepo::default());
        let listing_repo = Arc::new(MockListingRepo::default());
        let rating_repo = Arc::new(MockRatingRepo::default());
        let events = ChatEvents::new(config.event_bus_capacity);
        let service = Arc::new(ChatService::new(
            chat_repo.clone(),
            listing_repo.clone(),
            rating_repo.clone(),
            events.clone(),
            config,
        ));

        Self {
            chat_repo,
            listing_repo,
            rating_repo,
            events,
            service,
        }
    }

    /// Registers an active listing owned by `seller_id`.
    pub fn listing(&self, seller_id: Uuid) -> ListingSummary {
        let listing = test_listing(seller_id);
        self.listing_repo.insert(listing.clone());
        listing
    }

    /// Stores a conversation directly, bypassing the service.
    pub fn seed_conversation(&self, a: Uuid, b: Uuid, listing_id: Option<Uuid>) -> Conversation {
        let pair = ParticipantPair::new(a, b).expect("participants should differ");
        let conversation = Conversation::new(pair, listing_id);
        self.chat_repo.insert_conversation(conversation.clone());
        conversation
    }
}

pub fn test_listing(seller_id: Uuid) -> ListingSummary {
    ListingSummary {
        id: Uuid::new_v4(),
        seller_id,
        title: "Organic chemistry textbook".to_string(),
        status: "active".to_string(),
    }
}
