use super::traits::{ChatRepository, MessagePage};
use crate::domain::{next_message_timestamp, Conversation, Message};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const CONVERSATION_COLUMNS: &str =
    "id, participant_low, participant_high, listing_id, last_message, last_message_at, created_at";

pub struct ChatRepositoryImpl {
    pool: PgPool,
}

impl ChatRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatRepository for ChatRepositoryImpl {
    async fn find_conversation(&self, id: Uuid) -> AppResult<Option<Conversation>> {
        let conversation = sqlx::query_as::<_, Conversation>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(conversation)
    }

    async fn get_or_create_conversation(
        &self,
        candidate: &Conversation,
    ) -> AppResult<(Conversation, bool)> {
        let inserted = sqlx::query_as::<_, Conversation>(&format!(
            r#"
            INSERT INTO conversations (id, participant_low, participant_high, listing_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (
                participant_low,
                participant_high,
                (COALESCE(listing_id, '00000000-0000-0000-0000-000000000000'::uuid))
            ) DO NOTHING
            RETURNING {CONVERSATION_COLUMNS}
            "#
        ))
        .bind(candidate.id)
        .bind(candidate.participant_low)
        .bind(candidate.participant_high)
        .bind(candidate.listing_id)
        .bind(candidate.created_at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(conversation) = inserted {
            return Ok((conversation, true));
        }

        // The losing side of a concurrent insert lands here; the winner's row
        // is committed once ON CONFLICT has observed it.
        let existing = sqlx::query_as::<_, Conversation>(&format!(
            r#"
            SELECT {CONVERSATION_COLUMNS}
            FROM conversations
            WHERE participant_low = $1
              AND participant_high = $2
              AND listing_id IS NOT DISTINCT FROM $3
            "#
        ))
        .bind(candidate.participant_low)
        .bind(candidate.participant_high)
        .bind(candidate.listing_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((existing, false))
    }

    async fn find_user_conversations(&self, user_id: Uuid) -> AppResult<Vec<Conversation>> {
        let conversations = sqlx::query_as::<_, Conversation>(&format!(
            r#"
            SELECT {CONVERSATION_COLUMNS}
            FROM conversations
            WHERE participant_low = $1 OR participant_high = $1
            ORDER BY last_message_at DESC NULLS LAST, created_at DESC, id DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(conversations)
    }

    async fn find_message(
        &self,
        conversation_id: Uuid,
        message_id: Uuid,
    ) -> AppResult<Option<Message>> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, sender_id, content, created_at
            FROM messages
            WHERE conversation_id = $1 AND id = $2
            "#,
        )
        .bind(conversation_id)
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(message)
    }

    async fn find_messages(
        &self,
        conversation_id: Uuid,
        page: MessagePage,
    ) -> AppResult<Vec<Message>> {
        let (after_created_at, after_id) = match page.after {
            Some(cursor) => (Some(cursor.created_at), Some(cursor.id)),
            None => (None, None),
        };

        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, sender_id, content, created_at
            FROM messages
            WHERE conversation_id = $1
              AND ($2::timestamptz IS NULL OR (created_at, id) > ($2, $3))
            ORDER BY created_at ASC, id ASC
            LIMIT $4
            "#,
        )
        .bind(conversation_id)
        .bind(after_created_at)
        .bind(after_id)
        .bind(page.limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    async fn append_message(&self, message: &Message) -> AppResult<Message> {
        let mut tx = self.pool.begin().await?;

        // Appends to one conversation serialize on its row lock, so the
        // timestamp taken below follows commit order.
        let previous = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
            "SELECT last_message_at FROM conversations WHERE id = $1 FOR UPDATE",
        )
        .bind(message.conversation_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("conversation not found".to_string()))?;

        let created = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (id, conversation_id, sender_id, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, conversation_id, sender_id, content, created_at
            "#,
        )
        .bind(message.id)
        .bind(message.conversation_id)
        .bind(message.sender_id)
        .bind(&message.content)
        .bind(next_message_timestamp(previous, Utc::now()))
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE conversations
            SET last_message = $2, last_message_at = $3
            WHERE id = $1 AND (last_message_at IS NULL OR last_message_at <= $3)
            "#,
        )
        .bind(created.conversation_id)
        .bind(&created.content)
        .bind(created.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }
}
