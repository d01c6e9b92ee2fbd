#[allow(dead_code, unused_imports)]
pub mod chat_repo;

#[allow(unused_imports)]
pub use chat_repo::MockChatRepo;
#[allow(unused_imports)]
pub use listing_repo::MockListingRepo;
#[allow(unused_imports)]
pub use rating_repo::MockRatingRepo;
