mod chat_service;
pub mod events;

pub use chat_service::ChatService;
pub use events::{ChatEvent, ChatEvents};
