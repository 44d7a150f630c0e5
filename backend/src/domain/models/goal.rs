use chrono::{DateTime, Utc};

/// The kind of target a goal expresses over habit history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalKind {
    /// Complete a specific habit N times within the month
    Complete,
    /// Reach a streak length or completion-rate percentage
    Reach,
    /// Sustain a near-100% completion rate
    Maintain,
}

impl GoalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalKind::Complete => "complete",
            GoalKind::Reach => "reach",
            GoalKind::Maintain => "maintain",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "complete" => Ok(GoalKind::Complete),
            "reach" => Ok(GoalKind::Reach),
            "maintain" => Ok(GoalKind::Maintain),
            _ => Err(format!("Invalid goal type: {}", s)),
        }
    }
}

/// Which aggregate a `reach` goal measures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalMetric {
    Streak,
    Rate,
}

impl GoalMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalMetric::Streak => "streak",
            GoalMetric::Rate => "rate",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "streak" => Ok(GoalMetric::Streak),
            "rate" => Ok(GoalMetric::Rate),
            _ => Err(format!("Invalid goal metric: {}", s)),
        }
    }
}

/// A user-defined target over habit history. Progress is never persisted;
/// it is recomputed from current aggregates on every read.
#[derive(Debug, Clone, PartialEq)]
pub struct Goal {
    pub id: String,
    pub user_id: String,
    pub kind: GoalKind,
    /// Habit the goal refers to (`complete` goals only)
    pub habit_id: Option<String>,
    /// How many completed days the habit needs (`complete` goals only)
    pub repeat: Option<u32>,
    /// Aggregate measured by `reach` goals
    pub metric: Option<GoalMetric>,
    /// Target value for `reach` goals (days for streak, percent for rate)
    pub value: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Goal {
    pub fn generate_id() -> String {
        format!("goal::{}", uuid::Uuid::new_v4())
    }

    pub fn to_dto(&self, progress: f64, completed: bool) -> shared::GoalDto {
        shared::GoalDto {
            id: self.id.clone(),
            goal_type: self.kind.as_str().to_string(),
            habit_id: self.habit_id.clone(),
            repeat: self.repeat,
            metric: self.metric.map(|m| m.as_str().to_string()),
            value: self.value,
            created_at: self.created_at.to_rfc3339(),
            progress,
            completed,
        }
    }
}
