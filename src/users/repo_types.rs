use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// Chat user, created on the first message from an unseen Telegram id.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,                    // surrogate key
    pub telegram_id: i64,           // platform id, unique
    pub first_name: String,         // display name at creation time
    pub created_at: OffsetDateTime,
}
