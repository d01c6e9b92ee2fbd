use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WsClientEnvelope {
    #[serde(rename = "type")]
    pub message_type: String,
    pub payload: Option<Value>,
}

/// `join`/`leave` accept either a bare user id or `{"userId": ...}`.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(untagged)]
pub enum WsUserPayload {
    Bare(Uuid),
    Object {
        #[serde(rename = "userId")]
        user_id: Uuid,
    },
}

impl WsUserPayload {
    pub const fn user_id(self) -> Uuid {
        match self {
            Self::Bare(user_id) | Self::Object { user_id } => user_id,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WsConversationPayload {
    pub conversation_id: Uuid,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WsSendMessagePayload {
    #[serde(default)]
    pub sender_id: Option<Uuid>,
    #[serde(default)]
    pub receiver_id: Option<Uuid>,
    pub content: String,
    #[serde(default)]
    pub listing_id: Option<Uuid>,
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
}

pub(super) fn parse_ws_envelope(text: &str) -> AppResult<WsClientEnvelope> {
    serde_json::from_str(text)
        .map_err(|_| AppError::BadRequest("invalid websocket message".to_string()))
}

pub(super) fn parse_payload<T>(payload: Option<Value>, kind: &str) -> AppResult<T>
where
    T: for<'de> Deserialize<'de>,
{
    let payload =
        payload.ok_or_else(|| AppError::BadRequest(format!("missing {kind} payload")))?;
    serde_json::from_value(payload)
        .map_err(|_| AppError::BadRequest(format!("invalid {kind} payload")))
}

pub fn server_event(kind: &str, payload: impl Serialize) -> String {
    json!({ "type": kind, "payload": payload }).to_string()
}

pub fn error_event(code: &str) -> String {
    server_event("error", json!({ "code": code }))
}

pub fn pong_event() -> String {
    json!({ "type": "pong" }).to_string()
}
