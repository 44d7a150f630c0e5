//! Range aggregation over the progress ledger.
//!
//! Walks a date range one local day at a time, reusing the daily snapshot
//! builder for each day. The ledger is read once for the whole range and
//! bucketed per local day in memory, so the per-day output is exactly what
//! day-by-day queries would produce without issuing one query per day.
//! Days after "today" in the user's timezone are never evaluated.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::info;

use crate::domain::day_window;
use crate::domain::models::HabitLog;
use crate::domain::snapshot_service::{build_snapshot, DailySnapshot};
use crate::domain::timezone::TimezoneService;
use crate::error::{AppError, AppResult};
use crate::storage::{HabitRepository, LogRepository};

/// Aggregate statistics over an evaluated range
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeStats {
    /// Days that produced a snapshot with at least one habit
    pub total_days: u32,
    /// Days with at least one completed habit and a non-zero rate
    pub completed_days: u32,
    /// Rounded percent: completed_days / total_days
    pub completion_rate: u32,
    /// Consecutive completed days ending at the most recent evaluated day
    pub current_streak: u32,
}

/// Per-day snapshots plus range statistics
#[derive(Debug, Clone)]
pub struct RangeAggregate {
    pub days: Vec<DailySnapshot>,
    pub stats: RangeStats,
}

impl RangeAggregate {
    /// Distinct evaluated days on which `habit_id` was completed
    pub fn completed_day_count_for(&self, habit_id: &str) -> u32 {
        self.days
            .iter()
            .filter(|day| {
                day.entry_for(habit_id)
                    .map(|entry| entry.completed)
                    .unwrap_or(false)
            })
            .count() as u32
    }
}

/// The inclusive calendar bounds of one month
pub fn month_range(year: i32, month: u32) -> AppResult<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::validation(format!("invalid month {}-{}", year, month)))?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let last = next_month
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| AppError::validation(format!("invalid month {}-{}", year, month)))?;

    Ok((first, last))
}

#[derive(Clone)]
pub struct ProgressService {
    habits: HabitRepository,
    logs: LogRepository,
    timezone: TimezoneService,
}

impl ProgressService {
    pub fn new(habits: HabitRepository, logs: LogRepository, timezone: TimezoneService) -> Self {
        Self {
            habits,
            logs,
            timezone,
        }
    }

    /// Aggregate all of a user's habits over `[start, end]` (inclusive,
    /// clamped to today in the user's timezone).
    pub async fn aggregate_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<RangeAggregate> {
        if start > end {
            return Err(AppError::validation("start date is after end date"));
        }

        let tz = self.timezone.resolve(user_id).await;
        let today = day_window::local_today(tz);
        let end = end.min(today);
        if end < start {
            return Ok(RangeAggregate {
                days: Vec::new(),
                stats: RangeStats::default(),
            });
        }

        info!(user_id, %start, %end, "aggregating range");

        let habits = self.habits.list_active_habits(user_id).await?;
        let range_start = day_window::day_window(start, tz)?.start;
        let range_end = day_window::day_window(end, tz)?.end;
        let logs = self
            .logs
            .list_for_user_in_range(user_id, range_start, range_end)
            .await?;
        let by_day = bucket_by_local_day(&logs, tz);

        let mut days = Vec::new();
        let mut day = start;
        while day <= end {
            let window = day_window::day_window(day, tz)?;
            let day_logs = by_day.get(&day).map(Vec::as_slice).unwrap_or(&[]);
            days.push(build_snapshot(day, window, &habits, day_logs));

            day = day
                .succ_opt()
                .ok_or_else(|| AppError::validation("date out of supported range"))?;
        }

        let stats = range_stats(&days);
        Ok(RangeAggregate { days, stats })
    }

    /// One habit's day-by-day history and statistics over `[start, end]`
    pub async fn habit_progress(
        &self,
        user_id: &str,
        habit_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<shared::HabitProgressResponse> {
        if start > end {
            return Err(AppError::validation("start date is after end date"));
        }

        let habit = self
            .habits
            .get_habit(user_id, habit_id)
            .await?
            .ok_or_else(|| AppError::not_found("habit"))?;

        let tz = self.timezone.resolve(user_id).await;
        let today = day_window::local_today(tz);
        let end_eval = end.min(today);

        let mut progress = Vec::new();
        let mut completed_days = 0u32;
        let mut total_days = 0u32;
        let mut streak = 0u32;
        let mut logged_days = 0u32;
        let mut logged_total = 0.0;

        if end_eval >= start {
            let range_start = day_window::day_window(start, tz)?.start;
            let range_end = day_window::day_window(end_eval, tz)?.end;
            let logs = self
                .logs
                .list_for_habit_in_range(habit_id, user_id, range_start, range_end)
                .await?;
            let by_day = bucket_by_local_day(&logs, tz);

            let mut day = start;
            while day <= end_eval {
                let window = day_window::day_window(day, tz)?;
                if habit.created_at >= window.end {
                    day = day
                        .succ_opt()
                        .ok_or_else(|| AppError::validation("date out of supported range"))?;
                    continue;
                }

                let log = by_day.get(&day).and_then(|entries| entries.first());
                let value = log.map(|l| l.value).unwrap_or(0.0);
                let completed = log.map(|l| l.completed).unwrap_or(false);

                total_days += 1;
                if completed {
                    completed_days += 1;
                    streak += 1;
                } else {
                    streak = 0;
                }
                if let Some(l) = log {
                    logged_days += 1;
                    logged_total += l.value;
                }

                progress.push(shared::DayProgress {
                    date: day.format("%Y-%m-%d").to_string(),
                    value,
                    target_amount: habit.target_amount,
                    progress: (value / habit.target_amount).min(1.0),
                    completed,
                    unit: habit.unit.clone(),
                });

                day = day
                    .succ_opt()
                    .ok_or_else(|| AppError::validation("date out of supported range"))?;
            }
        }

        let statistics = shared::ProgressStatistics {
            completed_days,
            total_days,
            completion_rate: rate_percent(completed_days, total_days),
            current_streak: streak,
            average_value: if logged_days > 0 {
                logged_total / logged_days as f64
            } else {
                0.0
            },
        };

        Ok(shared::HabitProgressResponse {
            habit: habit.to_dto(),
            progress,
            statistics,
        })
    }
}

/// Group ledger entries by the local calendar day their window starts on
fn bucket_by_local_day(logs: &[HabitLog], tz: chrono_tz::Tz) -> HashMap<NaiveDate, Vec<HabitLog>> {
    let mut by_day: HashMap<NaiveDate, Vec<HabitLog>> = HashMap::new();
    for log in logs {
        let day = log.date.with_timezone(&tz).date_naive();
        by_day.entry(day).or_default().push(log.clone());
    }
    by_day
}

fn range_stats(days: &[DailySnapshot]) -> RangeStats {
    let mut stats = RangeStats::default();

    for day in days {
        if day.total_habits > 0 {
            stats.total_days += 1;
        }
        if day.is_completed_day() {
            stats.completed_days += 1;
        }
    }

    // The streak only ever extends while unbroken: walking backward from
    // the most recent day, the first non-completed day ends the count.
    for day in days.iter().rev() {
        if day.is_completed_day() {
            stats.current_streak += 1;
        } else {
            break;
        }
    }

    stats.completion_rate = rate_percent(stats.completed_days, stats.total_days);
    stats
}

fn rate_percent(completed: u32, total: u32) -> u32 {
    if total == 0 {
        0
    } else {
        (100.0 * completed as f64 / total as f64).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;
    use crate::domain::models::{Habit, HabitOrigin};
    use crate::storage::UserRepository;
    use chrono::{TimeZone, Utc};
    use chrono_tz::Europe::Istanbul;

    struct Fixture {
        service: ProgressService,
        habits: HabitRepository,
        logs: LogRepository,
    }

    async fn setup() -> Fixture {
        let db = DbConnection::init_test().await.expect("init test db");
        let habits = HabitRepository::new(db.clone());
        let logs = LogRepository::new(db.clone());
        let timezone = TimezoneService::new(UserRepository::new(db), Istanbul);
        Fixture {
            service: ProgressService::new(habits.clone(), logs.clone(), timezone),
            habits,
            logs,
        }
    }

    fn one_shot_habit(id: &str) -> Habit {
        // target == increment, so a single increment completes the day
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Habit {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            name: format!("habit {}", id),
            origin: HabitOrigin::Custom,
            category: "health".to_string(),
            icon: "star".to_string(),
            unit: "times".to_string(),
            available_units: vec!["times".to_string()],
            target_amount: 1.0,
            increment_amount: 1.0,
            is_active: true,
            created_at: created,
            updated_at: created,
        }
    }

    async fn complete_on(fixture: &Fixture, habit: &Habit, date: NaiveDate) {
        let window = day_window::day_window(date, Istanbul).unwrap();
        fixture
            .logs
            .increment(habit, window.start)
            .await
            .expect("write ledger entry");
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_range_bounds() {
        assert_eq!(
            month_range(2024, 4).unwrap(),
            (date(2024, 4, 1), date(2024, 4, 30))
        );
        assert_eq!(
            month_range(2024, 2).unwrap(),
            (date(2024, 2, 1), date(2024, 2, 29))
        );
        assert_eq!(
            month_range(2023, 12).unwrap(),
            (date(2023, 12, 1), date(2023, 12, 31))
        );
        assert!(month_range(2024, 13).is_err());
    }

    #[tokio::test]
    async fn test_thirty_day_month_ten_completed_is_33() {
        let fixture = setup().await;
        let habit = one_shot_habit("habit::a");
        fixture.habits.store_habit(&habit).await.expect("store");

        for day in 1..=10 {
            complete_on(&fixture, &habit, date(2024, 4, day)).await;
        }

        let aggregate = fixture
            .service
            .aggregate_range("user-1", date(2024, 4, 1), date(2024, 4, 30))
            .await
            .expect("aggregate");

        assert_eq!(aggregate.stats.total_days, 30);
        assert_eq!(aggregate.stats.completed_days, 10);
        assert_eq!(aggregate.stats.completion_rate, 33);
        // April 30 was not completed, so no trailing streak
        assert_eq!(aggregate.stats.current_streak, 0);
    }

    #[tokio::test]
    async fn test_streak_counts_trailing_days_only() {
        let fixture = setup().await;
        let habit = one_shot_habit("habit::a");
        fixture.habits.store_habit(&habit).await.expect("store");

        // Completed 27th, then a gap on the 28th, then 29th and 30th
        for day in [27, 29, 30] {
            complete_on(&fixture, &habit, date(2024, 4, day)).await;
        }

        let aggregate = fixture
            .service
            .aggregate_range("user-1", date(2024, 4, 1), date(2024, 4, 30))
            .await
            .expect("aggregate");

        assert_eq!(aggregate.stats.completed_days, 3);
        assert_eq!(aggregate.stats.current_streak, 2);
    }

    #[tokio::test]
    async fn test_future_days_are_not_evaluated() {
        let fixture = setup().await;
        let habit = one_shot_habit("habit::a");
        fixture.habits.store_habit(&habit).await.expect("store");

        let today = day_window::local_today(Istanbul);
        complete_on(&fixture, &habit, today).await;

        let aggregate = fixture
            .service
            .aggregate_range("user-1", today, today + chrono::Duration::days(5))
            .await
            .expect("aggregate");

        assert_eq!(aggregate.days.len(), 1);
        assert_eq!(aggregate.stats.total_days, 1);
        assert_eq!(aggregate.stats.current_streak, 1);
        assert_eq!(aggregate.stats.completion_rate, 100);
    }

    #[tokio::test]
    async fn test_empty_range_in_the_future() {
        let fixture = setup().await;
        let habit = one_shot_habit("habit::a");
        fixture.habits.store_habit(&habit).await.expect("store");

        let tomorrow = day_window::local_today(Istanbul) + chrono::Duration::days(1);
        let aggregate = fixture
            .service
            .aggregate_range("user-1", tomorrow, tomorrow)
            .await
            .expect("aggregate");

        assert!(aggregate.days.is_empty());
        assert_eq!(aggregate.stats, RangeStats::default());
    }

    #[tokio::test]
    async fn test_completed_day_count_per_habit() {
        let fixture = setup().await;
        let first = one_shot_habit("habit::a");
        let second = one_shot_habit("habit::b");
        fixture.habits.store_habit(&first).await.expect("store");
        fixture.habits.store_habit(&second).await.expect("store");

        for day in [3, 4, 5] {
            complete_on(&fixture, &first, date(2024, 4, day)).await;
        }
        complete_on(&fixture, &second, date(2024, 4, 3)).await;

        let aggregate = fixture
            .service
            .aggregate_range("user-1", date(2024, 4, 1), date(2024, 4, 30))
            .await
            .expect("aggregate");

        assert_eq!(aggregate.completed_day_count_for("habit::a"), 3);
        assert_eq!(aggregate.completed_day_count_for("habit::b"), 1);
        assert_eq!(aggregate.completed_day_count_for("habit::c"), 0);
    }

    #[tokio::test]
    async fn test_habit_progress_history() {
        let fixture = setup().await;
        let habit = one_shot_habit("habit::a");
        fixture.habits.store_habit(&habit).await.expect("store");

        for day in [1, 2, 3, 5] {
            complete_on(&fixture, &habit, date(2024, 4, day)).await;
        }

        let response = fixture
            .service
            .habit_progress("user-1", "habit::a", date(2024, 4, 1), date(2024, 4, 5))
            .await
            .expect("habit progress");

        assert_eq!(response.progress.len(), 5);
        assert_eq!(response.progress[0].date, "2024-04-01");
        assert!(response.progress[0].completed);
        assert!(!response.progress[3].completed);
        assert_eq!(response.progress[3].value, 0.0);

        assert_eq!(response.statistics.total_days, 5);
        assert_eq!(response.statistics.completed_days, 4);
        assert_eq!(response.statistics.completion_rate, 80);
        // Day 4 broke the run; only day 5 counts
        assert_eq!(response.statistics.current_streak, 1);
        assert_eq!(response.statistics.average_value, 1.0);
    }

    #[tokio::test]
    async fn test_habit_progress_unknown_habit() {
        let fixture = setup().await;

        let result = fixture
            .service
            .habit_progress("user-1", "habit::missing", date(2024, 4, 1), date(2024, 4, 5))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_days_before_creation_are_skipped() {
        let fixture = setup().await;
        let mut habit = one_shot_habit("habit::a");
        habit.created_at = day_window::day_window(date(2024, 4, 3), Istanbul)
            .unwrap()
            .start;
        fixture.habits.store_habit(&habit).await.expect("store");

        let response = fixture
            .service
            .habit_progress("user-1", "habit::a", date(2024, 4, 1), date(2024, 4, 5))
            .await
            .expect("habit progress");

        // April 1 and 2 predate the habit
        assert_eq!(response.progress.len(), 3);
        assert_eq!(response.progress[0].date, "2024-04-03");
        assert_eq!(response.statistics.total_days, 3);
    }
}
