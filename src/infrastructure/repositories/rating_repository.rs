use super::traits::RatingRepository;
use crate::error::AppResult;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

pub struct RatingRepositoryImpl {
    pool: PgPool,
}

impl RatingRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RatingRepository for RatingRepositoryImpl {
    async fn has_rated(
        &self,
        rater_id: Uuid,
        seller_id: Uuid,
        listing_id: Uuid,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM ratings
                WHERE rater_id = $1 AND seller_id = $2 AND listing_id = $3
            )
            "#,
        )
        .bind(rater_id)
        .bind(seller_id)
        .bind(listing_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}
