use super::traits::ListingRepository;
use crate::domain::ListingSummary;
use crate::error::AppResult;
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

/// Read-only view over the marketplace `listings` table.
pub struct ListingRepositoryImpl {
    pool: PgPool,
}

impl ListingRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListingRepository for ListingRepositoryImpl {
    async fn find_listing(&self, id: Uuid) -> AppResult<Option<ListingSummary>> {
        let listing = sqlx::query_as::<_, ListingSummary>(
            "SELECT id, seller_id, title, status FROM listings WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(listing)
    }

    async fn find_listings(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, ListingSummary>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let listings = sqlx::query_as::<_, ListingSummary>(
            "SELECT id, seller_id, title, status FROM listings WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(listings
            .into_iter()
            .map(|listing| (listing.id, listing))
            .collect())
    }
}
