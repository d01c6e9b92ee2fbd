mod chat_repository;
mod listing_repository;
mod rating_repository;
mod traits;

pub use chat_repository::ChatRepositoryImpl;
pub use listing_repository::ListingRepositoryImpl;
pub use rating_repository::RatingRepositoryImpl;
pub use traits::{ChatRepository, ListingRepository, MessageCursor, MessagePage, RatingRepository};
