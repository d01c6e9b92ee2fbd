use actix_rt::test;
use marketplace_chat::api::dtos::CreateConversationRequest;
use marketplace_chat::error::AppError;
use uuid::Uuid;

use crate::common::fixtures::ChatHarness;

#[test]
async fn get_or_create_is_order_independent() {
    let harness = ChatHarness::new();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let first = harness
        .service
        .get_or_create(alice, bob, None)
        .await
        .expect("conversation should be created");
    let second = harness
        .service
        .get_or_create(bob, alice, None)
        .await
        .expect("conversation should be found");

    assert_eq!(first.id, second.id);
    assert_eq!(harness.chat_repo.conversation_count(), 1);
    let mut expected = [alice, bob];
    expected.sort();
    assert_eq!(first.participant_ids(), expected);
}

#[test]
async fn get_or_create_rejects_self_conversation() {
    let harness = ChatHarness::new();
    let alice = Uuid::new_v4();

    let result = harness.service.get_or_create(alice, alice, None).await;

    assert!(matches!(result, Err(AppError::ValidationError { .. })));
    assert_eq!(harness.chat_repo.conversation_count(), 0);
}

#[test]
async fn get_or_create_requires_existing_listing() {
    let harness = ChatHarness::new();

    let result = harness
        .service
        .get_or_create(Uuid::new_v4(), Uuid::new_v4(), Some(Uuid::new_v4()))
        .await;

    assert!(matches!(result, Err(AppError::NotFound(message)) if message == "listing not found"));
    assert_eq!(harness.chat_repo.conversation_count(), 0);
}

#[test]
async fn general_and_listing_conversations_are_distinct() {
    let harness = ChatHarness::new();
    let buyer = Uuid::new_v4();
    let seller = Uuid::new_v4();
    let listing = harness.listing(seller);

    let general = harness
        .service
        .get_or_create(buyer, seller, None)
        .await
        .expect("general conversation");
    let scoped = harness
        .service
        .get_or_create(buyer, seller, Some(listing.id))
        .await
        .expect("listing conversation");
    let scoped_again = harness
        .service
        .get_or_create(seller, buyer, Some(listing.id))
        .await
        .expect("listing conversation again");

    assert_ne!(general.id, scoped.id);
    assert_eq!(scoped.id, scoped_again.id);
    assert_eq!(scoped.listing_id, Some(listing.id));
    assert_eq!(harness.chat_repo.conversation_count(), 2);
}

#[test]
async fn create_conversation_requires_caller_to_participate() {
    let harness = ChatHarness::new();
    let request = CreateConversationRequest {
        user_id1: Uuid::new_v4(),
        user_id2: Uuid::new_v4(),
        listing_id: None,
    };

    let result = harness
        .service
        .create_conversation(Uuid::new_v4(), request)
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert_eq!(harness.chat_repo.conversation_count(), 0);
}

#[test]
async fn create_conversation_returns_both_participants() {
    let harness = ChatHarness::new();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let response = harness
        .service
        .create_conversation(
            bob,
            CreateConversationRequest {
                user_id1: alice,
                user_id2: bob,
                listing_id: None,
            },
        )
        .await
        .expect("conversation should be created");

    assert!(response.participant_ids.contains(&alice));
    assert!(response.participant_ids.contains(&bob));
    assert!(response.last_message.is_none());
}

#[test]
async fn get_conversation_hides_foreign_conversations() {
    let harness = ChatHarness::new();
    let conversation = harness.seed_conversation(Uuid::new_v4(), Uuid::new_v4(), None);

    let forbidden = harness
        .service
        .get_conversation(Uuid::new_v4(), conversation.id)
        .await;
    let missing = harness
        .service
        .get_conversation(conversation.participant_low, Uuid::new_v4())
        .await;

    assert!(matches!(forbidden, Err(AppError::Forbidden(_))));
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[test]
async fn list_for_user_is_empty_without_conversations() {
    let harness = ChatHarness::new();

    let conversations = harness
        .service
        .list_for_user(Uuid::new_v4())
        .await
        .expect("listing should succeed");

    assert!(conversations.is_empty());
}

#[test]
async fn list_for_user_orders_by_latest_activity() {
    let harness = ChatHarness::new();
    let me = Uuid::new_v4();
    let quiet = Uuid::new_v4();
    let chatty = Uuid::new_v4();
    let newest_empty = Uuid::new_v4();

    let quiet_conversation = harness
        .service
        .get_or_create(me, quiet, None)
        .await
        .expect("quiet conversation");
    let chatty_conversation = harness
        .service
        .get_or_create(me, chatty, None)
        .await
        .expect("chatty conversation");
    harness
        .service
        .append(quiet_conversation.id, quiet, "first".to_string())
        .await
        .expect("append should succeed");
    harness
        .service
        .append(chatty_conversation.id, me, "second".to_string())
        .await
        .expect("append should succeed");
    let empty_conversation = harness
        .service
        .get_or_create(newest_empty, me, None)
        .await
        .expect("empty conversation");
    harness.seed_conversation(quiet, chatty, None);

    let conversations = harness
        .service
        .list_for_user(me)
        .await
        .expect("listing should succeed");

    let ids: Vec<Uuid> = conversations.iter().map(|c| c.conversation.id).collect();
    assert_eq!(
        ids,
        vec![
            chatty_conversation.id,
            quiet_conversation.id,
            empty_conversation.id
        ]
    );
    assert_eq!(conversations[0].other_participant_id, chatty);
    assert_eq!(conversations[0].conversation.last_message.as_deref(), Some("second"));
    assert_eq!(conversations[2].other_participant_id, newest_empty);
}

#[test]
async fn list_conversations_only_for_caller() {
    let harness = ChatHarness::new();
    let me = Uuid::new_v4();

    let result = harness
        .service
        .list_conversations(me, Uuid::new_v4())
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}
