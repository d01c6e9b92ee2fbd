use std::time::Duration;

use actix_web::http::header::{HeaderValue, SEC_WEBSOCKET_PROTOCOL};
use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::debug;

use crate::api::routes::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::bearer_token;
use crate::utils::jwt::validate_token;

mod handlers;
mod hub;
mod messages;
pub mod relay;

use self::handlers::{error_code_for, handle_text_message, WsContext};
use self::messages::error_event;

pub use self::hub::{ConnectionId, Room, WsConnectionHub};
pub use self::messages::{
    WsClientEnvelope, WsConversationPayload, WsSendMessagePayload, WsUserPayload,
};
pub use self::relay::spawn_relay;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const IDLE_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Where the socket's access token came from; subprotocol tokens require the
/// server to echo the `bearer` protocol back.
#[derive(Debug, PartialEq, Eq)]
enum TokenSource {
    Query,
    Header,
    Protocol,
    Cookie,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/ws", web::get().to(ws_upgrade));
}

async fn ws_upgrade(
    request: HttpRequest,
    payload: web::Payload,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    if state.app_environment == "production" && !is_secure_ws_request(&request) {
        return Err(AppError::BadRequest(
            "wss is required in production".to_string(),
        ));
    }

    let (token, source) =
        extract_ws_token(&request, &state.auth.session_cookie_name).ok_or(AppError::Unauthorized)?;
    let claims = validate_token(&token, &state.auth).inspect_err(|_| {
        state.metrics.record_auth_failure();
    })?;
    let user_id = claims.sub;

    let (mut response, session, stream) = actix_ws::handle(&request, payload)
        .map_err(|_| AppError::BadRequest("invalid websocket upgrade".to_string()))?;
    if source == TokenSource::Protocol {
        response
            .headers_mut()
            .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static("bearer"));
    }

    let hub = state.ws_hub.clone();
    let (connection_id, outbound_rx) = hub.register(user_id);
    let ctx = WsContext {
        chat_service: state.chat_service.clone(),
        hub: hub.clone(),
        connection_id,
        user_id,
    };
    let metrics = state.metrics.clone();
    metrics.ws_connected();
    debug!(user_id = %user_id, connection_id, "websocket connected");

    actix_web::rt::spawn(async move {
        ws_loop(session, stream, outbound_rx, ctx).await;
        hub.unregister(connection_id);
        metrics.ws_disconnected();
        debug!(user_id = %user_id, connection_id, "websocket disconnected");
    });

    Ok(response)
}

fn extract_ws_token(request: &HttpRequest, cookie_name: &str) -> Option<(String, TokenSource)> {
    if let Ok(query) = web::Query::<TokenQuery>::from_query(request.query_string()) {
        if let Some(token) = query.into_inner().token.filter(|token| !token.is_empty()) {
            return Some((token, TokenSource::Query));
        }
    }

    if let Some(token) = bearer_token(request) {
        return Some((token, TokenSource::Header));
    }

    if let Some(token) = protocol_token(request) {
        return Some((token, TokenSource::Protocol));
    }

    request
        .cookie(cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .map(|token| (token, TokenSource::Cookie))
}

fn protocol_token(request: &HttpRequest) -> Option<String> {
    let protocol = request
        .headers()
        .get(SEC_WEBSOCKET_PROTOCOL)
        .and_then(|value| value.to_str().ok())?;
    let mut parts = protocol.split(',');
    let first = parts.next()?.trim();
    let second = parts.next()?.trim();
    (first.eq_ignore_ascii_case("bearer") && !second.is_empty()).then(|| second.to_string())
}

fn is_secure_ws_request(request: &HttpRequest) -> bool {
    if request.connection_info().scheme() == "https" {
        return true;
    }

    request
        .headers()
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|proto| proto.eq_ignore_ascii_case("https"))
}

async fn ws_loop(
    mut session: actix_ws::Session,
    mut stream: actix_ws::MessageStream,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    ctx: WsContext,
) {
    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    let mut last_seen = tokio::time::Instant::now();

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                if last_seen.elapsed() > IDLE_TIMEOUT {
                    let _ = session.close(None).await;
                    break;
                }
                if session.ping(b"ping").await.is_err() {
                    break;
                }
            }
            maybe_message = stream.next() => {
                let Some(Ok(message)) = maybe_message else {
                    break;
                };

                match message {
                    actix_ws::Message::Ping(bytes) => {
                        last_seen = tokio::time::Instant::now();
                        if session.pong(&bytes).await.is_err() {
                            break;
                        }
                    }
                    actix_ws::Message::Pong(_) => {
                        last_seen = tokio::time::Instant::now();
                    }
                    actix_ws::Message::Text(text) => {
                        last_seen = tokio::time::Instant::now();
                        if let Err(error) = handle_text_message(&mut session, &ctx, &text).await {
                            let Some(code) = error_code_for(&error) else {
                                break;
                            };
                            debug!(
                                user_id = %ctx.user_id,
                                code,
                                error = %error,
                                "websocket event rejected"
                            );
                            if session.text(error_event(code)).await.is_err() {
                                break;
                            }
                        }
                    }
                    actix_ws::Message::Close(reason) => {
                        let _ = session.close(reason).await;
                        break;
                    }
                    actix_ws::Message::Binary(_) => {
                        last_seen = tokio::time::Instant::now();
                        if session.text(error_event("UNSUPPORTED_BINARY")).await.is_err() {
                            break;
                        }
                    }
                    _ => {}
                }
            }
            maybe_outbound = outbound_rx.recv() => {
                let Some(payload) = maybe_outbound else {
                    break;
                };
                if session.text(payload).await.is_err() {
                    break;
                }
            }
        }
    }
}
