use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::db::DbConnection;
use crate::domain::models::{Habit, HabitOrigin};
use crate::error::{AppError, AppResult};

/// Repository for habit definitions
#[derive(Clone)]
pub struct HabitRepository {
    db: DbConnection,
}

impl HabitRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn store_habit(&self, habit: &Habit) -> AppResult<()> {
        let available_units = serde_json::to_string(&habit.available_units)
            .map_err(|e| AppError::database(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO habits
                (id, user_id, name, origin, category, icon, unit, available_units,
                 target_amount, increment_amount, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&habit.id)
        .bind(&habit.user_id)
        .bind(&habit.name)
        .bind(habit.origin.as_str())
        .bind(&habit.category)
        .bind(&habit.icon)
        .bind(&habit.unit)
        .bind(available_units)
        .bind(habit.target_amount)
        .bind(habit.increment_amount)
        .bind(habit.is_active)
        .bind(habit.created_at.to_rfc3339())
        .bind(habit.updated_at.to_rfc3339())
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Fetch a habit regardless of active flag (history stays reachable
    /// for deactivated habits)
    pub async fn get_habit(&self, user_id: &str, habit_id: &str) -> AppResult<Option<Habit>> {
        let row = sqlx::query("SELECT * FROM habits WHERE id = ? AND user_id = ?")
            .bind(habit_id)
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.map(row_to_habit).transpose()
    }

    pub async fn get_active_habit(
        &self,
        user_id: &str,
        habit_id: &str,
    ) -> AppResult<Option<Habit>> {
        let row =
            sqlx::query("SELECT * FROM habits WHERE id = ? AND user_id = ? AND is_active = 1")
                .bind(habit_id)
                .bind(user_id)
                .fetch_optional(self.db.pool())
                .await?;

        row.map(row_to_habit).transpose()
    }

    pub async fn list_active_habits(&self, user_id: &str) -> AppResult<Vec<Habit>> {
        let rows = sqlx::query(
            "SELECT * FROM habits WHERE user_id = ? AND is_active = 1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(row_to_habit).collect()
    }

    /// Check the unique (user, name) invariant among active habits
    pub async fn active_name_exists(
        &self,
        user_id: &str,
        name: &str,
        exclude_id: Option<&str>,
    ) -> AppResult<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM habits
             WHERE user_id = ? AND name = ? AND is_active = 1 AND id != ?",
        )
        .bind(user_id)
        .bind(name)
        .bind(exclude_id.unwrap_or(""))
        .fetch_one(self.db.pool())
        .await?;

        let count: i64 = row.try_get("n")?;
        Ok(count > 0)
    }

    pub async fn update_habit(&self, habit: &Habit) -> AppResult<()> {
        let available_units = serde_json::to_string(&habit.available_units)
            .map_err(|e| AppError::database(e.to_string()))?;

        sqlx::query(
            r#"
            UPDATE habits SET
                name = ?, category = ?, icon = ?, unit = ?, available_units = ?,
                target_amount = ?, increment_amount = ?, is_active = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&habit.name)
        .bind(&habit.category)
        .bind(&habit.icon)
        .bind(&habit.unit)
        .bind(available_units)
        .bind(habit.target_amount)
        .bind(habit.increment_amount)
        .bind(habit.is_active)
        .bind(habit.updated_at.to_rfc3339())
        .bind(&habit.id)
        .bind(&habit.user_id)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Hard-delete a habit together with its ledger entries.
    /// Returns false when no habit row matched.
    pub async fn delete_habit_with_logs(&self, user_id: &str, habit_id: &str) -> AppResult<bool> {
        let mut tx = self.db.pool().begin().await?;

        sqlx::query("DELETE FROM habit_logs WHERE habit_id = ? AND user_id = ?")
            .bind(habit_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM habits WHERE id = ? AND user_id = ?")
            .bind(habit_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_habit(row: SqliteRow) -> AppResult<Habit> {
    let origin: String = row.try_get("origin")?;
    let available_units: String = row.try_get("available_units")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Habit {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        origin: HabitOrigin::from_str(&origin).map_err(AppError::database)?,
        category: row.try_get("category")?,
        icon: row.try_get("icon")?,
        unit: row.try_get("unit")?,
        available_units: serde_json::from_str(&available_units)
            .map_err(|e| AppError::database(e.to_string()))?,
        target_amount: row.try_get("target_amount")?,
        increment_amount: row.try_get("increment_amount")?,
        is_active: row.try_get("is_active")?,
        created_at: super::parse_instant(&created_at)?,
        updated_at: super::parse_instant(&updated_at)?,
    })
}
