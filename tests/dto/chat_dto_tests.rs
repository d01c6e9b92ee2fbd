use chrono::Utc;
use marketplace_chat::api::dtos::{
    ConversationResponse, ConversationSummaryResponse, CreateConversationRequest,
    ListingSummaryResponse, MessageListQuery, MessageResponse, SendMessageRequest,
};
use marketplace_chat::domain::{Conversation, Message, ParticipantPair, RatingState};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

#[test]
fn create_conversation_request_reads_camel_case_fields() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let listing_id = Uuid::new_v4();

    let request: CreateConversationRequest = serde_json::from_value(json!({
        "userId1": a,
        "userId2": b,
        "listingId": listing_id,
    }))
    .expect("request should deserialize");

    assert_eq!(request.user_id1, a);
    assert_eq!(request.user_id2, b);
    assert_eq!(request.listing_id, Some(listing_id));
}

#[test]
fn create_conversation_request_listing_is_optional() {
    let request: CreateConversationRequest = serde_json::from_value(json!({
        "userId1": Uuid::new_v4(),
        "userId2": Uuid::new_v4(),
    }))
    .expect("request should deserialize");

    assert!(request.listing_id.is_none());
}

fn send_request(content: String) -> SendMessageRequest {
    SendMessageRequest {
        sender_id: None,
        content,
        seller_id: None,
        listing_id: None,
    }
}

#[test]
fn send_message_request_leaves_length_cap_to_service() {
    assert!(send_request("a".repeat(5000)).validate().is_ok());
    assert!(send_request("a".repeat(5001)).validate().is_ok());

    let errors = send_request(String::new())
        .validate()
        .expect_err("empty content should fail");
    assert!(errors.field_errors().contains_key("content"));
}

#[test]
fn send_message_request_requires_content() {
    let result = serde_json::from_value::<SendMessageRequest>(json!({
        "senderId": Uuid::new_v4(),
    }));

    assert!(result.is_err());
}

#[test]
fn message_list_query_only_rejects_non_positive_limits() {
    let large = MessageListQuery {
        after: None,
        limit: Some(501),
    };
    let zero = MessageListQuery {
        after: None,
        limit: Some(0),
    };

    assert!(large.validate().is_ok());
    assert!(MessageListQuery::default().validate().is_ok());
    assert!(zero.validate().is_err());
}

#[test]
fn message_response_serializes_camel_case() {
    let message = Message::new(Uuid::new_v4(), Uuid::new_v4(), "hello".to_string());
    let value = serde_json::to_value(MessageResponse::from(message.clone()))
        .expect("response should serialize");

    assert_eq!(value["conversationId"], json!(message.conversation_id));
    assert_eq!(value["senderId"], json!(message.sender_id));
    assert_eq!(value["content"], "hello");
    assert!(value.get("conversation_id").is_none());
}

#[test]
fn conversation_summary_flattens_conversation_fields() {
    let viewer = Uuid::new_v4();
    let seller = Uuid::new_v4();
    let listing_id = Uuid::new_v4();
    let mut conversation = Conversation::new(
        ParticipantPair::new(viewer, seller).expect("participants differ"),
        Some(listing_id),
    );
    conversation.last_message = Some("deal".to_string());
    conversation.last_message_at = Some(Utc::now());

    let summary = ConversationSummaryResponse {
        conversation: ConversationResponse::from(conversation.clone()),
        other_participant_id: seller,
        listing: Some(ListingSummaryResponse {
            id: listing_id,
            seller_id: seller,
            title: "Desk lamp".to_string(),
            status: "active".to_string(),
        }),
        rating_state: RatingState::AlreadyRated,
    };
    let value = serde_json::to_value(&summary).expect("summary should serialize");

    assert_eq!(value["id"], json!(conversation.id));
    assert_eq!(value["lastMessage"], "deal");
    assert_eq!(value["otherParticipantId"], json!(seller));
    assert_eq!(value["ratingState"], "already_rated");
    assert_eq!(value["participantIds"].as_array().map(Vec::len), Some(2));
    assert!(value.get("conversation").is_none());
}
