use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::errors::DomainError;

/// Unordered pair of conversation participants, stored low/high so that
/// `(a, b)` and `(b, a)` resolve to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParticipantPair {
    low: Uuid,
    high: Uuid,
}

impl ParticipantPair {
    pub fn new(user_a: Uuid, user_b: Uuid) -> Result<Self, DomainError> {
        if user_a == user_b {
            return Err(DomainError::ValidationError(
                "a user cannot start a conversation with themselves".to_string(),
            ));
        }

        let (low, high) = if user_a < user_b {
            (user_a, user_b)
        } else {
            (user_b, user_a)
        };
        Ok(Self { low, high })
    }

    pub const fn low(&self) -> Uuid {
        self.low
    }

    pub const fn high(&self) -> Uuid {
        self.high
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Conversation {
    pub id: Uuid,
    pub participant_low: Uuid,
    pub participant_high: Uuid,
    pub listing_id: Option<Uuid>,
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(pair: ParticipantPair, listing_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            participant_low: pair.low(),
            participant_high: pair.high(),
            listing_id,
            last_message: None,
            last_message_at: None,
            created_at: Utc::now(),
        }
    }

    pub const fn participant_ids(&self) -> [Uuid; 2] {
        [self.participant_low, self.participant_high]
    }

    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.participant_low == user_id || self.participant_high == user_id
    }

    pub fn other_participant(&self, user_id: Uuid) -> Option<Uuid> {
        if self.participant_low == user_id {
            Some(self.participant_high)
        } else if self.participant_high == user_id {
            Some(self.participant_low)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Builds an unsaved message. `created_at` is provisional: the repository
    /// replaces it with [`next_message_timestamp`] while holding the
    /// conversation lock.
    pub fn new(conversation_id: Uuid, sender_id: Uuid, content: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            conversation_id,
            sender_id,
            content,
            created_at: Utc::now(),
        }
    }
}

/// Ordering timestamp for a message appended after one stamped `previous`.
/// Uses `now` at database precision, bumped past `previous` when the clock
/// has not moved, so timestamps within a conversation strictly increase.
pub fn next_message_timestamp(
    previous: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let now = now.trunc_subsecs(6);
    match previous {
        Some(previous) if previous >= now => previous + Duration::microseconds(1),
        _ => now,
    }
}

/// Listing fields the chat core reads from the listing directory.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct ListingSummary {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub title: String,
    pub status: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RatingState {
    NotApplicable,
    Eligible,
    AlreadyRated,
}

impl RatingState {
    /// `viewer_id` may rate the seller of `listing` unless they are the seller
    /// or have already rated them for this listing.
    pub fn resolve(viewer_id: Uuid, listing: Option<&ListingSummary>, has_rated: bool) -> Self {
        match listing {
            None => Self::NotApplicable,
            Some(listing) if listing.seller_id == viewer_id => Self::NotApplicable,
            Some(_) if has_rated => Self::AlreadyRated,
            Some(_) => Self::Eligible,
        }
    }
}
