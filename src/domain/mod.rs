pub mod chat;
pub mod errors;

pub use chat::{
    next_message_timestamp, Conversation, ListingSummary, Message, ParticipantPair, RatingState,
};
pub use errors::DomainError;
