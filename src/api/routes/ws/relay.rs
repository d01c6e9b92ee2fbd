use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::api::dtos::MessageResponse;
use crate::application::{ChatEvent, ChatEvents};
use crate::observability::AppMetrics;

use super::hub::{Room, WsConnectionHub};
use super::messages::server_event;

/// Subscribes to chat events and pushes each appended message to the sockets
/// joined to a participant's user room or to the conversation room.
pub fn spawn_relay(
    events: &ChatEvents,
    hub: WsConnectionHub,
    metrics: Arc<AppMetrics>,
) -> actix_web::rt::task::JoinHandle<()> {
    let receiver = events.subscribe();
    actix_web::rt::spawn(run_relay(receiver, hub, metrics))
}

pub async fn run_relay(
    mut receiver: broadcast::Receiver<ChatEvent>,
    hub: WsConnectionHub,
    metrics: Arc<AppMetrics>,
) {
    loop {
        match receiver.recv().await {
            Ok(event) => {
                let delivered = relay_event(&hub, event);
                metrics.record_relayed_message(delivered);
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "realtime relay lagged; clients will resync from history");
                metrics.record_relay_lag(skipped);
            }
            Err(RecvError::Closed) => {
                info!("chat event bus closed; realtime relay stopping");
                break;
            }
        }
    }
}

pub fn relay_event(hub: &WsConnectionHub, event: ChatEvent) -> usize {
    match event {
        ChatEvent::MessageAppended {
            message,
            participant_ids,
        } => {
            let rooms = [
                Room::User(participant_ids[0]),
                Room::User(participant_ids[1]),
                Room::Conversation(message.conversation_id),
            ];
            let conversation_id = message.conversation_id;
            let message_id = message.id;
            let payload = server_event("receive_message", MessageResponse::from(message));
            let delivered = hub.deliver(&rooms, &payload);
            debug!(
                conversation_id = %conversation_id,
                message_id = %message_id,
                delivered,
                "message relayed"
            );
            delivered
        }
    }
}
