use sqlx::SqlitePool;
use time::OffsetDateTime;

use crate::error::StorageError;
use crate::users::repo_types::User;

impl User {
    /// Find a user by Telegram id.
    pub async fn find_by_platform_id(
        db: &SqlitePool,
        telegram_id: i64,
    ) -> Result<Option<User>, StorageError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, telegram_id, first_name, created_at
            FROM users
            WHERE telegram_id = ?1
            "#,
        )
        .bind(telegram_id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Insert a new user. A concurrent insert of the same platform id surfaces
    /// as `DuplicateUser`.
    pub async fn create(
        db: &SqlitePool,
        telegram_id: i64,
        first_name: &str,
    ) -> Result<User, StorageError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (telegram_id, first_name, created_at)
            VALUES (?1, ?2, ?3)
            RETURNING id, telegram_id, first_name, created_at
            "#,
        )
        .bind(telegram_id)
        .bind(first_name)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StorageError::DuplicateUser(telegram_id)
            }
            other => StorageError::Database(other),
        })?;
        Ok(user)
    }

    pub async fn all(db: &SqlitePool) -> Result<Vec<User>, StorageError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, telegram_id, first_name, created_at
            FROM users
            ORDER BY id ASC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(users)
    }
}
