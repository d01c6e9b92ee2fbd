use std::time::Duration;

use actix_rt::test;
use actix_web::http::StatusCode;
use actix_web::ResponseError;
use marketplace_chat::config::ChatConfig;
use marketplace_chat::error::AppError;
use uuid::Uuid;

use crate::common::fixtures::ChatHarness;
use crate::common::test_chat_config;

fn slow_harness() -> ChatHarness {
    let harness = ChatHarness::with_config(ChatConfig {
        persistence_timeout_ms: 20,
        ..test_chat_config()
    });
    harness.chat_repo.set_delay(Duration::from_millis(250));
    harness
}

#[test]
async fn slow_upsert_surfaces_timeout() {
    let harness = slow_harness();

    let result = harness
        .service
        .get_or_create(Uuid::new_v4(), Uuid::new_v4(), None)
        .await;

    assert!(matches!(
        result,
        Err(AppError::Timeout { operation: "conversation upsert" })
    ));
}

#[test]
async fn slow_lookup_fails_append_with_gateway_timeout() {
    let harness = slow_harness();
    let alice = Uuid::new_v4();
    let conversation = harness.seed_conversation(alice, Uuid::new_v4(), None);

    let error = harness
        .service
        .append(conversation.id, alice, "hi".to_string())
        .await
        .expect_err("append should time out");

    assert!(matches!(error, AppError::Timeout { operation: "conversation lookup" }));
    assert_eq!(error.status_code(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(error.error_code(), "TIMEOUT");
    assert_eq!(harness.chat_repo.message_count(), 0);
}

#[test]
async fn slow_listing_surfaces_timeout() {
    let harness = slow_harness();

    let result = harness.service.list_for_user(Uuid::new_v4()).await;

    assert!(matches!(result, Err(AppError::Timeout { .. })));
}
