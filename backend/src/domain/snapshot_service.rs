//! Daily snapshot builder: joins a user's active habits against one local
//! day's ledger entries. Snapshots are derived on every request and never
//! persisted.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::info;

use crate::domain::day_window::{self, DayWindow};
use crate::domain::models::{Habit, HabitLog};
use crate::domain::timezone::TimezoneService;
use crate::error::AppResult;
use crate::storage::{HabitRepository, LogRepository};

/// One habit's progress inside a daily snapshot
#[derive(Debug, Clone)]
pub struct SnapshotEntry {
    pub habit_id: String,
    pub value: f64,
    pub progress: f64,
    pub completed: bool,
    pub log: Option<HabitLog>,
}

/// Derived per-day progress view across all of a user's habits
#[derive(Debug, Clone)]
pub struct DailySnapshot {
    pub date: NaiveDate,
    pub total_habits: u32,
    pub completed_habits: u32,
    pub in_progress_habits: u32,
    pub not_started_habits: u32,
    pub entries: Vec<SnapshotEntry>,
}

impl DailySnapshot {
    /// completed / (completed + in_progress) as a 0..=1 fraction.
    /// Not-started habits are deliberately outside the denominator.
    pub fn completion_rate(&self) -> f64 {
        let denominator = self.completed_habits + self.in_progress_habits;
        if denominator == 0 {
            0.0
        } else {
            self.completed_habits as f64 / denominator as f64
        }
    }

    pub fn completion_rate_percent(&self) -> u32 {
        (self.completion_rate() * 100.0).round() as u32
    }

    /// Whether this day counts as completed for range statistics
    pub fn is_completed_day(&self) -> bool {
        self.completed_habits > 0 && self.completion_rate() > 0.0
    }

    pub fn entry_for(&self, habit_id: &str) -> Option<&SnapshotEntry> {
        self.entries.iter().find(|e| e.habit_id == habit_id)
    }
}

/// Join habits against one day's ledger entries.
///
/// Habits created after the queried day are skipped so historical rates are
/// not distorted by definitions that did not exist yet. A missing ledger row
/// and a row with value 0 produce identical entries.
pub fn build_snapshot(
    date: NaiveDate,
    window: DayWindow,
    habits: &[Habit],
    logs: &[HabitLog],
) -> DailySnapshot {
    let logs_by_habit: HashMap<&str, &HabitLog> =
        logs.iter().map(|log| (log.habit_id.as_str(), log)).collect();

    let mut snapshot = DailySnapshot {
        date,
        total_habits: 0,
        completed_habits: 0,
        in_progress_habits: 0,
        not_started_habits: 0,
        entries: Vec::new(),
    };

    for habit in habits {
        if habit.created_at >= window.end {
            continue;
        }

        let log = logs_by_habit.get(habit.id.as_str()).copied();
        let value = log.map(|l| l.value).unwrap_or(0.0);
        let completed = log.map(|l| l.completed).unwrap_or(false);
        let progress = (value / habit.target_amount).min(1.0);

        snapshot.total_habits += 1;
        if completed {
            snapshot.completed_habits += 1;
        } else if value > 0.0 {
            snapshot.in_progress_habits += 1;
        } else {
            snapshot.not_started_habits += 1;
        }

        snapshot.entries.push(SnapshotEntry {
            habit_id: habit.id.clone(),
            value,
            progress,
            completed,
            log: log.cloned(),
        });
    }

    snapshot
}

/// Service producing daily snapshots for the logs-by-date endpoint
#[derive(Clone)]
pub struct SnapshotService {
    habits: HabitRepository,
    logs: LogRepository,
    timezone: TimezoneService,
}

impl SnapshotService {
    pub fn new(habits: HabitRepository, logs: LogRepository, timezone: TimezoneService) -> Self {
        Self {
            habits,
            logs,
            timezone,
        }
    }

    /// Build the snapshot for one local day. `date_param` accepts
    /// YYYY-MM-DD or RFC 3339; omitted means today in the user's timezone.
    pub async fn logs_by_date(
        &self,
        user_id: &str,
        date_param: Option<&str>,
    ) -> AppResult<shared::DailySnapshotResponse> {
        let tz = self.timezone.resolve(user_id).await;
        let date = match date_param {
            Some(raw) => day_window::parse_date_param(raw, tz)?,
            None => day_window::local_today(tz),
        };
        let window = day_window::day_window(date, tz)?;

        info!(user_id, %date, "building daily snapshot");

        let habits = self.habits.list_active_habits(user_id).await?;
        let logs = self
            .logs
            .list_for_user_in_range(user_id, window.start, window.end)
            .await?;

        let snapshot = build_snapshot(date, window, &habits, &logs);
        Ok(to_response(&snapshot, &habits))
    }
}

fn to_response(snapshot: &DailySnapshot, habits: &[Habit]) -> shared::DailySnapshotResponse {
    let habits_by_id: HashMap<&str, &Habit> =
        habits.iter().map(|h| (h.id.as_str(), h)).collect();

    let entries = snapshot
        .entries
        .iter()
        .filter_map(|entry| {
            let habit = habits_by_id.get(entry.habit_id.as_str())?;
            Some(shared::DailySnapshotEntry {
                habit: habit.to_ref(),
                log: entry.log.as_ref().map(|l| l.to_dto(habit.target_amount)),
                progress: entry.progress,
                completed: entry.completed,
            })
        })
        .collect();

    shared::DailySnapshotResponse {
        summary: shared::DailySummary {
            date: snapshot.date.format("%Y-%m-%d").to_string(),
            total_habits: snapshot.total_habits,
            completed_habits: snapshot.completed_habits,
            in_progress_habits: snapshot.in_progress_habits,
            not_started_habits: snapshot.not_started_habits,
            completion_rate: snapshot.completion_rate_percent(),
        },
        habits: entries,
    }
}
