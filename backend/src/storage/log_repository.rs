use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::db::DbConnection;
use crate::domain::day_window::DayWindow;
use crate::domain::models::{Habit, HabitLog};
use crate::error::AppResult;

/// Repository for progress ledger entries
#[derive(Clone)]
pub struct LogRepository {
    db: DbConnection,
}

impl LogRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Atomically create-or-increment the ledger entry for one (habit, day).
    ///
    /// A single upsert statement carries both the insert and the
    /// `value + increment` arithmetic, so concurrent increments serialize in
    /// the database instead of clobbering each other. The completed flag is
    /// recomputed from the post-increment value in the same statement.
    pub async fn increment(
        &self,
        habit: &Habit,
        window_start: DateTime<Utc>,
    ) -> AppResult<HabitLog> {
        let now = Utc::now().to_rfc3339();

        let row = sqlx::query(
            r#"
            INSERT INTO habit_logs
                (id, habit_id, user_id, date, value, completed, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(habit_id, date) DO UPDATE SET
                value = habit_logs.value + excluded.value,
                completed = (habit_logs.value + excluded.value) >= ?,
                updated_at = excluded.updated_at
            RETURNING id, habit_id, user_id, date, value, completed, created_at, updated_at
            "#,
        )
        .bind(HabitLog::generate_id())
        .bind(&habit.id)
        .bind(&habit.user_id)
        .bind(window_start.to_rfc3339())
        .bind(habit.increment_amount)
        .bind(habit.increment_amount >= habit.target_amount)
        .bind(&now)
        .bind(&now)
        .bind(habit.target_amount)
        .fetch_one(self.db.pool())
        .await?;

        row_to_log(row)
    }

    /// Delete the entry inside `window`, if any. Returns whether a row went.
    pub async fn delete_in_window(
        &self,
        habit_id: &str,
        user_id: &str,
        window: DayWindow,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM habit_logs
             WHERE habit_id = ? AND user_id = ? AND date >= ? AND date < ?",
        )
        .bind(habit_id)
        .bind(user_id)
        .bind(window.start.to_rfc3339())
        .bind(window.end.to_rfc3339())
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_in_window(
        &self,
        habit_id: &str,
        user_id: &str,
        window: DayWindow,
    ) -> AppResult<Option<HabitLog>> {
        let row = sqlx::query(
            "SELECT * FROM habit_logs
             WHERE habit_id = ? AND user_id = ? AND date >= ? AND date < ?",
        )
        .bind(habit_id)
        .bind(user_id)
        .bind(window.start.to_rfc3339())
        .bind(window.end.to_rfc3339())
        .fetch_optional(self.db.pool())
        .await?;

        row.map(row_to_log).transpose()
    }

    /// All of a user's entries in `[start, end)`, across habits, oldest first
    pub async fn list_for_user_in_range(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<HabitLog>> {
        let rows = sqlx::query(
            "SELECT * FROM habit_logs
             WHERE user_id = ? AND date >= ? AND date < ?
             ORDER BY date ASC",
        )
        .bind(user_id)
        .bind(start.to_rfc3339())
        .bind(end.to_rfc3339())
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(row_to_log).collect()
    }

    /// One habit's entries in `[start, end)`, oldest first
    pub async fn list_for_habit_in_range(
        &self,
        habit_id: &str,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<HabitLog>> {
        let rows = sqlx::query(
            "SELECT * FROM habit_logs
             WHERE habit_id = ? AND user_id = ? AND date >= ? AND date < ?
             ORDER BY date ASC",
        )
        .bind(habit_id)
        .bind(user_id)
        .bind(start.to_rfc3339())
        .bind(end.to_rfc3339())
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(row_to_log).collect()
    }
}

fn row_to_log(row: SqliteRow) -> AppResult<HabitLog> {
    let date: String = row.try_get("date")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(HabitLog {
        id: row.try_get("id")?,
        habit_id: row.try_get("habit_id")?,
        user_id: row.try_get("user_id")?,
        date: super::parse_instant(&date)?,
        value: row.try_get("value")?,
        completed: row.try_get("completed")?,
        created_at: super::parse_instant(&created_at)?,
        updated_at: super::parse_instant(&updated_at)?,
    })
}
