use chrono::{DateTime, Utc};

/// One progress ledger row: the accumulated value for a (habit, local day)
/// pair. `date` is the UTC instant of that day's local midnight, never a
/// local-time string.
#[derive(Debug, Clone, PartialEq)]
pub struct HabitLog {
    pub id: String,
    pub habit_id: String,
    pub user_id: String,
    pub date: DateTime<Utc>,
    pub value: f64,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HabitLog {
    pub fn generate_id() -> String {
        format!("log::{}", uuid::Uuid::new_v4())
    }

    /// Progress fraction against a target, capped at 1
    pub fn progress(&self, target_amount: f64) -> f64 {
        (self.value / target_amount).min(1.0)
    }

    pub fn to_dto(&self, target_amount: f64) -> shared::HabitLogDto {
        shared::HabitLogDto {
            id: self.id.clone(),
            value: self.value,
            completed: self.completed,
            date: self.date.to_rfc3339(),
            progress: self.progress(target_amount),
        }
    }
}
