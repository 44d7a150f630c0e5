use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::db::DbConnection;
use crate::domain::models::{Goal, GoalKind, GoalMetric};
use crate::error::{AppError, AppResult};

/// Repository for goal definitions. Progress is never stored here; only
/// the definition rows live in the database.
#[derive(Clone)]
pub struct GoalRepository {
    db: DbConnection,
}

impl GoalRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn store_goal(&self, goal: &Goal) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO goals
                (id, user_id, goal_type, habit_id, repeat_target, metric, target_value, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&goal.id)
        .bind(&goal.user_id)
        .bind(goal.kind.as_str())
        .bind(&goal.habit_id)
        .bind(goal.repeat.map(|r| r as i64))
        .bind(goal.metric.map(|m| m.as_str()))
        .bind(goal.value)
        .bind(goal.created_at.to_rfc3339())
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    pub async fn list_goals(&self, user_id: &str) -> AppResult<Vec<Goal>> {
        let rows = sqlx::query("SELECT * FROM goals WHERE user_id = ? ORDER BY created_at ASC")
            .bind(user_id)
            .fetch_all(self.db.pool())
            .await?;

        rows.into_iter().map(row_to_goal).collect()
    }

    pub async fn delete_goal(&self, user_id: &str, goal_id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM goals WHERE id = ? AND user_id = ?")
            .bind(goal_id)
            .bind(user_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_goal(row: SqliteRow) -> AppResult<Goal> {
    let kind: String = row.try_get("goal_type")?;
    let metric: Option<String> = row.try_get("metric")?;
    let repeat: Option<i64> = row.try_get("repeat_target")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(Goal {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        kind: GoalKind::from_str(&kind).map_err(AppError::database)?,
        habit_id: row.try_get("habit_id")?,
        repeat: repeat.map(|r| r as u32),
        metric: metric
            .as_deref()
            .map(GoalMetric::from_str)
            .transpose()
            .map_err(AppError::database)?,
        value: row.try_get("target_value")?,
        created_at: super::parse_instant(&created_at)?,
    })
}
