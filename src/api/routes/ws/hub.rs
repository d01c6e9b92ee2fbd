use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

pub type ConnectionId = u64;

/// Delivery target a connection can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    User(Uuid),
    Conversation(Uuid),
}

struct Connection {
    user_id: Uuid,
    sender: mpsc::UnboundedSender<String>,
    rooms: HashSet<Room>,
}

#[derive(Default)]
struct HubState {
    next_id: ConnectionId,
    connections: HashMap<ConnectionId, Connection>,
    rooms: HashMap<Room, HashSet<ConnectionId>>,
}

impl HubState {
    fn remove_connection(&mut self, id: ConnectionId) -> Option<Connection> {
        let connection = self.connections.remove(&id)?;
        for room in &connection.rooms {
            if let Some(members) = self.rooms.get_mut(room) {
                members.remove(&id);
                if members.is_empty() {
                    self.rooms.remove(room);
                }
            }
        }
        Some(connection)
    }
}

/// Registry of live sockets and their room memberships.
#[derive(Clone, Default)]
pub struct WsConnectionHub {
    state: Arc<RwLock<HubState>>,
}

impl WsConnectionHub {
    fn read_state(&self) -> RwLockReadGuard<'_, HubState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, HubState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, user_id: Uuid) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut state = self.write_state();
        state.next_id += 1;
        let id = state.next_id;
        state.connections.insert(
            id,
            Connection {
                user_id,
                sender,
                rooms: HashSet::new(),
            },
        );
        (id, receiver)
    }

    pub fn unregister(&self, id: ConnectionId) {
        self.write_state().remove_connection(id);
    }

    /// Returns `false` when the connection is gone.
    pub fn join(&self, id: ConnectionId, room: Room) -> bool {
        let mut state = self.write_state();
        let Some(connection) = state.connections.get_mut(&id) else {
            return false;
        };
        connection.rooms.insert(room);
        state.rooms.entry(room).or_default().insert(id);
        true
    }

    pub fn leave(&self, id: ConnectionId, room: Room) -> bool {
        let mut state = self.write_state();
        let Some(connection) = state.connections.get_mut(&id) else {
            return false;
        };
        let was_member = connection.rooms.remove(&room);
        if let Some(members) = state.rooms.get_mut(&room) {
            members.remove(&id);
            if members.is_empty() {
                state.rooms.remove(&room);
            }
        }
        was_member
    }

    /// Sends `payload` once to every connection in any of `rooms` and returns
    /// how many connections accepted it. Connections whose receiver is gone
    /// are dropped.
    pub fn deliver(&self, rooms: &[Room], payload: &str) -> usize {
        let targets: Vec<(ConnectionId, mpsc::UnboundedSender<String>)> = {
            let state = self.read_state();
            let mut seen = HashSet::new();
            rooms
                .iter()
                .filter_map(|room| state.rooms.get(room))
                .flatten()
                .filter(|id| seen.insert(**id))
                .filter_map(|id| {
                    state
                        .connections
                        .get(id)
                        .map(|connection| (*id, connection.sender.clone()))
                })
                .collect()
        };

        let mut delivered = 0;
        let mut closed = Vec::new();
        for (id, sender) in targets {
            if sender.send(payload.to_string()).is_ok() {
                delivered += 1;
            } else {
                closed.push(id);
            }
        }

        if !closed.is_empty() {
            let mut state = self.write_state();
            for id in closed {
                if let Some(connection) = state.remove_connection(id) {
                    debug!(
                        connection_id = id,
                        user_id = %connection.user_id,
                        "pruned closed websocket connection"
                    );
                }
            }
        }

        delivered
    }
}
