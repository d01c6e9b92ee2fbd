use std::sync::Arc;

use uuid::Uuid;

use crate::application::ChatService;
use crate::error::{AppError, AppResult};

use super::hub::{ConnectionId, Room, WsConnectionHub};
use super::messages::{
    error_event, parse_payload, parse_ws_envelope, pong_event, server_event,
    WsConversationPayload, WsSendMessagePayload, WsUserPayload,
};

/// Per-socket state shared by the event handlers.
pub(super) struct WsContext {
    pub chat_service: Arc<ChatService>,
    pub hub: WsConnectionHub,
    pub connection_id: ConnectionId,
    pub user_id: Uuid,
}

pub(super) async fn handle_text_message(
    session: &mut actix_ws::Session,
    ctx: &WsContext,
    text: &str,
) -> AppResult<()> {
    let envelope = parse_ws_envelope(text)?;

    match envelope.message_type.as_str() {
        "ping" => send(session, pong_event()).await?,
        "join" => {
            let room = own_user_room(ctx, parse_payload(envelope.payload, "join")?)?;
            ctx.hub.join(ctx.connection_id, room);
        }
        "leave" => {
            let room = own_user_room(ctx, parse_payload(envelope.payload, "leave")?)?;
            ctx.hub.leave(ctx.connection_id, room);
        }
        "join_conversation" => {
            let parsed: WsConversationPayload =
                parse_payload(envelope.payload, "join_conversation")?;
            ctx.chat_service
                .ensure_participant(ctx.user_id, parsed.conversation_id)
                .await?;
            ctx.hub
                .join(ctx.connection_id, Room::Conversation(parsed.conversation_id));
        }
        "leave_conversation" => {
            let parsed: WsConversationPayload =
                parse_payload(envelope.payload, "leave_conversation")?;
            ctx.hub
                .leave(ctx.connection_id, Room::Conversation(parsed.conversation_id));
        }
        "send_message" => {
            let parsed: WsSendMessagePayload = parse_payload(envelope.payload, "send_message")?;
            if parsed.sender_id.is_some_and(|sender_id| sender_id != ctx.user_id) {
                return Err(AppError::Forbidden(
                    "senderId must match the authenticated user".to_string(),
                ));
            }

            // Delivery to the rooms happens in the relay once the write commits.
            let saved = ctx
                .chat_service
                .send_direct(
                    ctx.user_id,
                    parsed.receiver_id,
                    parsed.listing_id,
                    parsed.conversation_id,
                    parsed.content,
                )
                .await?;
            send(session, server_event("message_sent", saved)).await?;
        }
        _ => send(session, error_event("UNSUPPORTED_TYPE")).await?,
    }

    Ok(())
}

fn own_user_room(ctx: &WsContext, payload: WsUserPayload) -> AppResult<Room> {
    let user_id = payload.user_id();
    if user_id != ctx.user_id {
        return Err(AppError::Forbidden(
            "a connection may only join its own user room".to_string(),
        ));
    }
    Ok(Room::User(user_id))
}

async fn send(session: &mut actix_ws::Session, payload: String) -> AppResult<()> {
    session
        .text(payload)
        .await
        .map_err(|_| AppError::InternalError(anyhow::anyhow!("websocket session closed")))
}

/// Error event code reported to the client, or `None` when the socket should
/// be closed instead.
pub(super) fn error_code_for(error: &AppError) -> Option<&'static str> {
    match error {
        AppError::BadRequest(_) | AppError::ValidationError { .. } => Some("BAD_MESSAGE"),
        AppError::Forbidden(_)
        | AppError::Unauthorized
        | AppError::TokenExpired
        | AppError::InvalidToken => Some("FORBIDDEN"),
        AppError::NotFound(_) => Some("NOT_FOUND"),
        AppError::ServiceUnavailable { .. }
        | AppError::Timeout { .. }
        | AppError::DatabaseError(_)
        | AppError::Conflict(_) => Some("UNAVAILABLE"),
        AppError::InternalError(_) => None,
    }
}
