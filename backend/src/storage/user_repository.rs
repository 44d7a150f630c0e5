use sqlx::Row;

use crate::db::DbConnection;
use crate::domain::models::User;
use crate::error::AppResult;

/// Repository for the user rows this service reads and writes:
/// id and stored timezone only.
#[derive(Clone)]
pub struct UserRepository {
    db: DbConnection,
}

impl UserRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn get_user(&self, user_id: &str) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT id, timezone FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;

        match row {
            Some(r) => Ok(Some(User {
                id: r.try_get("id")?,
                timezone: r.try_get("timezone")?,
            })),
            None => Ok(None),
        }
    }

    pub async fn upsert_timezone(&self, user_id: &str, timezone: &str) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO users (id, timezone) VALUES (?, ?)
             ON CONFLICT(id) DO UPDATE SET timezone = excluded.timezone",
        )
        .bind(user_id)
        .bind(timezone)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }
}
