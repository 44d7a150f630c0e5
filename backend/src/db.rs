//! Database connection management and schema bootstrap.

use std::sync::Arc;

use anyhow::Result;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};

/// DbConnection manages the SQLite pool shared by all repositories
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection, creating the database and schema
    /// if they do not exist yet
    pub async fn new(url: &str) -> Result<Self> {
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?
        }

        let pool = SqlitePool::connect(url).await?;
        Self::setup_schema(&pool).await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Initialize a test database with a unique name
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);

        Self::new(&db_url).await
    }

    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                timezone TEXT
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS habits (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                origin TEXT NOT NULL,
                category TEXT NOT NULL,
                icon TEXT NOT NULL,
                unit TEXT NOT NULL,
                available_units TEXT NOT NULL,
                target_amount REAL NOT NULL,
                increment_amount REAL NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_habits_user ON habits(user_id, is_active);")
            .execute(pool)
            .await?;

        // One row per (habit, local day); `date` is the UTC instant of that
        // day's local midnight, so the unique index is the upsert target.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS habit_logs (
                id TEXT PRIMARY KEY,
                habit_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                value REAL NOT NULL DEFAULT 0,
                completed INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(habit_id, date)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_habit_logs_user_date ON habit_logs(user_id, date);",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS goals (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                goal_type TEXT NOT NULL,
                habit_id TEXT,
                repeat_target INTEGER,
                metric TEXT,
                target_value REAL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Get the underlying SQLite pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_setup_is_idempotent() {
        let db = DbConnection::init_test().await.expect("init test db");

        // Running the bootstrap a second time must not fail
        DbConnection::setup_schema(db.pool())
            .await
            .expect("second setup_schema run");
    }

    #[tokio::test]
    async fn test_unique_habit_day_pair() {
        let db = DbConnection::init_test().await.expect("init test db");

        sqlx::query(
            "INSERT INTO habit_logs (id, habit_id, user_id, date, value, completed, created_at, updated_at)
             VALUES ('log::1', 'habit::a', 'user-1', '2024-03-09T21:00:00+00:00', 1, 0, 'x', 'x')",
        )
        .execute(db.pool())
        .await
        .expect("first insert");

        let dup = sqlx::query(
            "INSERT INTO habit_logs (id, habit_id, user_id, date, value, completed, created_at, updated_at)
             VALUES ('log::2', 'habit::a', 'user-1', '2024-03-09T21:00:00+00:00', 1, 0, 'x', 'x')",
        )
        .execute(db.pool())
        .await;

        assert!(
            dup.is_err(),
            "second row for the same (habit, day) must be rejected"
        );
    }
}
