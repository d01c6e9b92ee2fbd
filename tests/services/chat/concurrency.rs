use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::time::Duration;

use actix_rt::test;
use uuid::Uuid;

use crate::common::fixtures::ChatHarness;

#[test]
async fn concurrent_get_or_create_converges_on_one_conversation() {
    let harness = ChatHarness::new();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let listing_id = harness.listing(bob).id;

    let mut handles = Vec::new();
    for index in 0..16 {
        let service = harness.service.clone();
        let (a, b) = if index % 2 == 0 { (alice, bob) } else { (bob, alice) };
        handles.push(tokio::spawn(async move {
            service.get_or_create(a, b, Some(listing_id)).await
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        let conversation = handle
            .await
            .expect("task should not panic")
            .expect("get_or_create should succeed");
        ids.insert(conversation.id);
    }

    assert_eq!(ids.len(), 1);
    assert_eq!(harness.chat_repo.conversation_count(), 1);
    assert_eq!(harness.chat_repo.created_count.load(Ordering::SeqCst), 1);
}

#[test]
async fn concurrent_appends_are_all_kept_in_order() {
    let harness = ChatHarness::new();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let conversation = harness.seed_conversation(alice, bob, None);

    let mut handles = Vec::new();
    for index in 0..20 {
        let service = harness.service.clone();
        let sender = if index % 2 == 0 { alice } else { bob };
        let conversation_id = conversation.id;
        handles.push(tokio::spawn(async move {
            service
                .append(conversation_id, sender, format!("message {index}"))
                .await
        }));
    }
    for handle in handles {
        handle
            .await
            .expect("task should not panic")
            .expect("append should succeed");
    }

    let messages = harness
        .service
        .list(conversation.id, None, None)
        .await
        .expect("list should succeed");

    assert_eq!(messages.len(), 20);
    assert!(messages
        .windows(2)
        .all(|pair| (pair[0].created_at, pair[0].id) < (pair[1].created_at, pair[1].id)));
    let latest = messages.last().expect("messages should not be empty");
    let stored = harness
        .chat_repo
        .conversation(conversation.id)
        .expect("conversation should exist");
    assert_eq!(stored.last_message_at, Some(latest.created_at));
    assert_eq!(stored.last_message, Some(latest.content.clone()));
}

#[test]
async fn slow_append_never_lands_before_a_message_already_returned() {
    let harness = ChatHarness::new();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let conversation = harness.seed_conversation(alice, bob, None);
    harness
        .chat_repo
        .stall_append("slow", Duration::from_millis(200));

    let service = harness.service.clone();
    let conversation_id = conversation.id;
    let slow = tokio::spawn(async move {
        service
            .append(conversation_id, alice, "slow".to_string())
            .await
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    let fast = harness
        .service
        .append(conversation.id, bob, "fast".to_string())
        .await
        .expect("fast append should succeed");
    let seen = harness
        .service
        .list(conversation.id, None, None)
        .await
        .expect("list should succeed");
    assert_eq!(
        seen.iter().map(|m| m.content.as_str()).collect::<Vec<_>>(),
        vec!["fast"]
    );

    let slow = slow
        .await
        .expect("task should not panic")
        .expect("slow append should succeed");
    assert!(slow.created_at > fast.created_at);

    let after_fast = harness
        .service
        .list(conversation.id, Some(fast.id), None)
        .await
        .expect("cursor page should succeed");
    assert_eq!(
        after_fast.iter().map(|m| m.id).collect::<Vec<_>>(),
        vec![slow.id]
    );

    let all = harness
        .service
        .list(conversation.id, None, None)
        .await
        .expect("list should succeed");
    assert_eq!(
        all.iter().map(|m| m.content.as_str()).collect::<Vec<_>>(),
        vec!["fast", "slow"]
    );
    let stored = harness
        .chat_repo
        .conversation(conversation.id)
        .expect("conversation should exist");
    assert_eq!(stored.last_message.as_deref(), Some("slow"));
    assert_eq!(stored.last_message_at, Some(slow.created_at));
}
