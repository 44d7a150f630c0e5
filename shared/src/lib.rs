//! Shared wire types exchanged between the habit tracker backend and its
//! clients. Everything here is plain serde data; business rules live in the
//! backend's domain layer.

use serde::{Deserialize, Serialize};

/// A tracked habit definition as exposed over the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitDto {
    /// Habit ID in format: "habit::<uuid>"
    pub id: String,
    pub name: String,
    /// Where the definition came from: "preset" or "custom"
    pub origin: String,
    pub category: String,
    pub icon: String,
    /// Unit the daily target is measured in (e.g. "glasses", "minutes")
    pub unit: String,
    /// Alternate units the habit may be switched to
    pub available_units: Vec<String>,
    /// Daily goal amount, always > 0
    pub target_amount: f64,
    /// Amount added per increment action, always > 0
    pub increment_amount: f64,
    pub is_active: bool,
    /// RFC 3339 creation timestamp
    pub created_at: String,
}

/// Compact habit reference embedded in snapshot responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitRef {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub unit: String,
    pub target_amount: f64,
}

/// Request to create a habit, either from a preset or from scratch.
///
/// When `preset` is set, any field left as `None` is filled from the
/// preset template; explicit fields override the template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateHabitRequest {
    /// ID of a built-in preset to start from
    pub preset: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub icon: Option<String>,
    pub unit: Option<String>,
    pub available_units: Option<Vec<String>>,
    pub target_amount: Option<f64>,
    pub increment_amount: Option<f64>,
}

/// Request to update a habit definition. Only provided fields change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateHabitRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub icon: Option<String>,
    pub unit: Option<String>,
    pub available_units: Option<Vec<String>>,
    pub target_amount: Option<f64>,
    pub increment_amount: Option<f64>,
    pub is_active: Option<bool>,
}

/// A built-in habit template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetHabitDto {
    pub id: String,
    pub name: String,
    pub category: String,
    pub icon: String,
    pub unit: String,
    pub available_units: Vec<String>,
    pub target_amount: f64,
    pub increment_amount: f64,
}

/// Response after incrementing today's progress for a habit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncrementResponse {
    pub habit_id: String,
    /// Accumulated value for today after this increment
    pub new_value: f64,
    pub target_amount: f64,
    /// min(new_value / target_amount, 1)
    pub progress: f64,
    pub completed: bool,
    pub unit: String,
    /// The step that was just added
    pub incremented_by: f64,
}

/// One persisted ledger entry as exposed over the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitLogDto {
    pub id: String,
    pub value: f64,
    pub completed: bool,
    /// UTC instant of the local-day start this entry belongs to (RFC 3339)
    pub date: String,
    pub progress: f64,
}

/// Aggregate counts for one local day across all of a user's habits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    /// The local day this summary describes (YYYY-MM-DD)
    pub date: String,
    pub total_habits: u32,
    pub completed_habits: u32,
    pub in_progress_habits: u32,
    pub not_started_habits: u32,
    /// Rounded percent: completed / (completed + in_progress)
    pub completion_rate: u32,
}

/// One habit's progress within a daily snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySnapshotEntry {
    pub habit: HabitRef,
    /// The day's ledger entry, if one exists (absence means value 0)
    pub log: Option<HabitLogDto>,
    pub progress: f64,
    pub completed: bool,
}

/// Response for the logs-by-date endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySnapshotResponse {
    pub summary: DailySummary,
    pub habits: Vec<DailySnapshotEntry>,
}

/// One evaluated day in a habit's progress history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayProgress {
    /// Local day (YYYY-MM-DD)
    pub date: String,
    pub value: f64,
    pub target_amount: f64,
    pub progress: f64,
    pub completed: bool,
    pub unit: String,
}

/// Statistics over an evaluated date range for one habit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressStatistics {
    pub completed_days: u32,
    pub total_days: u32,
    /// Rounded percent: completed_days / total_days
    pub completion_rate: u32,
    /// Consecutive completed days ending at the most recent evaluated day
    pub current_streak: u32,
    /// Mean ledger value over days that have an entry
    pub average_value: f64,
}

/// Response for the habit progress endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitProgressResponse {
    pub habit: HabitDto,
    pub progress: Vec<DayProgress>,
    pub statistics: ProgressStatistics,
}

/// Request to create a goal. Required fields depend on `goal_type`:
/// "complete" needs `habit_id` + `repeat`, "reach" needs `metric` +
/// `value`, "maintain" needs nothing extra.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateGoalRequest {
    pub goal_type: String,
    pub habit_id: Option<String>,
    pub repeat: Option<u32>,
    /// "streak" or "rate"
    pub metric: Option<String>,
    pub value: Option<f64>,
}

/// A goal together with its progress, recomputed on every read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalDto {
    /// Goal ID in format: "goal::<uuid>"
    pub id: String,
    pub goal_type: String,
    pub habit_id: Option<String>,
    pub repeat: Option<u32>,
    pub metric: Option<String>,
    pub value: Option<f64>,
    pub created_at: String,
    /// Fraction in 0..=1 against the current month's aggregates
    pub progress: f64,
    pub completed: bool,
}

/// Response listing a user's goals with computed progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalListResponse {
    pub goals: Vec<GoalDto>,
}

/// Request to store the caller's IANA timezone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateTimezoneRequest {
    pub timezone: String,
}

/// Response after a timezone update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user_id: String,
    pub timezone: String,
}

/// Error body returned for every failed request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
