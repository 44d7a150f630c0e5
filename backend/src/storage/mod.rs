//! Storage repositories: one per entity, all backed by the shared SQLite
//! pool. Repositories translate between rows and domain models and keep
//! every query scoped by user id.

mod goal_repository;
mod habit_repository;
mod log_repository;
mod user_repository;

pub use goal_repository::GoalRepository;
pub use habit_repository::HabitRepository;
pub use log_repository::LogRepository;
pub use user_repository::UserRepository;

use chrono::{DateTime, Utc};

use crate::error::{AppError, AppResult};

/// Parse an RFC 3339 TEXT column back into a UTC instant
pub(crate) fn parse_instant(raw: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::database(format!("bad timestamp '{}': {}", raw, e)))
}
