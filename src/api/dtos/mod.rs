pub mod chat_dto;

pub use chat_dto::*;
