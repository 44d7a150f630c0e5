//! Goal management and progress evaluation.
//!
//! Goals are definitions only; their progress is recomputed against the
//! current month's aggregates on every read, so goal state can never drift
//! away from the ledger.

use chrono::{Datelike, Utc};
use tracing::info;

use crate::domain::day_window;
use crate::domain::models::{Goal, GoalKind, GoalMetric};
use crate::domain::progress_service::{month_range, ProgressService, RangeAggregate};
use crate::domain::timezone::TimezoneService;
use crate::error::{AppError, AppResult};
use crate::storage::{GoalRepository, HabitRepository};

#[derive(Clone)]
pub struct GoalService {
    goals: GoalRepository,
    habits: HabitRepository,
    progress: ProgressService,
    timezone: TimezoneService,
}

impl GoalService {
    pub fn new(
        goals: GoalRepository,
        habits: HabitRepository,
        progress: ProgressService,
        timezone: TimezoneService,
    ) -> Self {
        Self {
            goals,
            habits,
            progress,
            timezone,
        }
    }

    /// Validate and store a goal, returning it with its progress against
    /// the current month
    pub async fn create_goal(
        &self,
        user_id: &str,
        request: shared::CreateGoalRequest,
    ) -> AppResult<shared::GoalDto> {
        info!(user_id, "creating goal: {:?}", request);

        let kind = GoalKind::from_str(&request.goal_type).map_err(AppError::validation)?;

        let goal = match kind {
            GoalKind::Complete => {
                let habit_id = request
                    .habit_id
                    .ok_or_else(|| AppError::validation("complete goals need a habit_id"))?;
                let repeat = request
                    .repeat
                    .ok_or_else(|| AppError::validation("complete goals need a repeat count"))?;
                if repeat == 0 {
                    return Err(AppError::validation("repeat must be greater than zero"));
                }
                // The habit must exist, be active and belong to the caller
                self.habits
                    .get_active_habit(user_id, &habit_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("habit"))?;

                Goal {
                    id: Goal::generate_id(),
                    user_id: user_id.to_string(),
                    kind,
                    habit_id: Some(habit_id),
                    repeat: Some(repeat),
                    metric: None,
                    value: None,
                    created_at: Utc::now(),
                }
            }
            GoalKind::Reach => {
                let metric_raw = request
                    .metric
                    .ok_or_else(|| AppError::validation("reach goals need a metric"))?;
                let metric = GoalMetric::from_str(&metric_raw).map_err(AppError::validation)?;
                let value = request
                    .value
                    .ok_or_else(|| AppError::validation("reach goals need a target value"))?;
                if !(value > 0.0) {
                    return Err(AppError::validation("target value must be greater than zero"));
                }

                Goal {
                    id: Goal::generate_id(),
                    user_id: user_id.to_string(),
                    kind,
                    habit_id: None,
                    repeat: None,
                    metric: Some(metric),
                    value: Some(value),
                    created_at: Utc::now(),
                }
            }
            GoalKind::Maintain => Goal {
                id: Goal::generate_id(),
                user_id: user_id.to_string(),
                kind,
                habit_id: None,
                repeat: None,
                metric: None,
                value: None,
                created_at: Utc::now(),
            },
        };

        self.goals.store_goal(&goal).await?;
        info!(user_id, goal_id = %goal.id, "goal created");

        let aggregate = self.current_month_aggregate(user_id).await?;
        let progress = evaluate(&goal, &aggregate);
        Ok(goal.to_dto(progress, progress >= 1.0))
    }

    /// List goals with progress computed against the current month
    pub async fn list_goals(&self, user_id: &str) -> AppResult<shared::GoalListResponse> {
        let goals = self.goals.list_goals(user_id).await?;
        if goals.is_empty() {
            return Ok(shared::GoalListResponse { goals: Vec::new() });
        }

        let aggregate = self.current_month_aggregate(user_id).await?;
        let goals = goals
            .iter()
            .map(|goal| {
                let progress = evaluate(goal, &aggregate);
                goal.to_dto(progress, progress >= 1.0)
            })
            .collect();

        Ok(shared::GoalListResponse { goals })
    }

    pub async fn delete_goal(&self, user_id: &str, goal_id: &str) -> AppResult<()> {
        info!(user_id, goal_id, "deleting goal");

        let deleted = self.goals.delete_goal(user_id, goal_id).await?;
        if !deleted {
            return Err(AppError::not_found("goal"));
        }

        Ok(())
    }

    async fn current_month_aggregate(&self, user_id: &str) -> AppResult<RangeAggregate> {
        let tz = self.timezone.resolve(user_id).await;
        let today = day_window::local_today(tz);
        let (start, end) = month_range(today.year(), today.month())?;

        self.progress.aggregate_range(user_id, start, end).await
    }
}

/// Map a goal definition onto range aggregates, yielding a 0..=1 fraction.
///
/// `reach`/`rate` compares percent to percent; `maintain` is the raw
/// aggregate completion rate with no stored target.
pub fn evaluate(goal: &Goal, aggregate: &RangeAggregate) -> f64 {
    match goal.kind {
        GoalKind::Complete => {
            let repeat = goal.repeat.unwrap_or(0);
            if repeat == 0 {
                return 0.0;
            }
            let habit_id = goal.habit_id.as_deref().unwrap_or("");
            let completed = aggregate.completed_day_count_for(habit_id);
            (completed as f64 / repeat as f64).min(1.0)
        }
        GoalKind::Reach => match (goal.metric, goal.value) {
            (Some(GoalMetric::Streak), Some(value)) if value > 0.0 => {
                (aggregate.stats.current_streak as f64 / value).min(1.0)
            }
            (Some(GoalMetric::Rate), Some(value)) if value > 0.0 => {
                (aggregate.stats.completion_rate as f64 / value).min(1.0)
            }
            _ => 0.0,
        },
        GoalKind::Maintain => aggregate.stats.completion_rate as f64 / 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;
    use crate::domain::models::{Habit, HabitOrigin};
    use crate::domain::progress_service::RangeStats;
    use crate::domain::snapshot_service::{DailySnapshot, SnapshotEntry};
    use crate::storage::{LogRepository, UserRepository};
    use chrono::{NaiveDate, TimeZone};
    use chrono_tz::Europe::Istanbul;

    fn snapshot_with(habit_id: &str, completed: bool, day: u32) -> DailySnapshot {
        DailySnapshot {
            date: NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
            total_habits: 1,
            completed_habits: if completed { 1 } else { 0 },
            in_progress_habits: 0,
            not_started_habits: if completed { 0 } else { 1 },
            entries: vec![SnapshotEntry {
                habit_id: habit_id.to_string(),
                value: if completed { 1.0 } else { 0.0 },
                progress: if completed { 1.0 } else { 0.0 },
                completed,
                log: None,
            }],
        }
    }

    fn aggregate_with(completed_days: &[u32], stats: RangeStats) -> RangeAggregate {
        let days = (1..=30)
            .map(|day| snapshot_with("habit::a", completed_days.contains(&day), day))
            .collect();
        RangeAggregate { days, stats }
    }

    fn complete_goal(repeat: u32) -> Goal {
        Goal {
            id: Goal::generate_id(),
            user_id: "user-1".to_string(),
            kind: GoalKind::Complete,
            habit_id: Some("habit::a".to_string()),
            repeat: Some(repeat),
            metric: None,
            value: None,
            created_at: Utc::now(),
        }
    }

    fn reach_goal(metric: GoalMetric, value: f64) -> Goal {
        Goal {
            id: Goal::generate_id(),
            user_id: "user-1".to_string(),
            kind: GoalKind::Reach,
            habit_id: None,
            repeat: None,
            metric: Some(metric),
            value: Some(value),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_complete_three_of_five_is_point_six() {
        let aggregate = aggregate_with(&[3, 9, 17], RangeStats::default());

        assert_eq!(evaluate(&complete_goal(5), &aggregate), 0.6);
    }

    #[test]
    fn test_complete_progress_caps_at_one() {
        let aggregate = aggregate_with(&[1, 2, 3, 4, 5, 6], RangeStats::default());

        assert_eq!(evaluate(&complete_goal(5), &aggregate), 1.0);
    }

    #[test]
    fn test_reach_rate_monotonic_and_capped() {
        let goal = reach_goal(GoalMetric::Rate, 50.0);

        let mut previous = -1.0;
        for rate in [0, 10, 25, 50, 80, 100] {
            let aggregate = aggregate_with(
                &[],
                RangeStats {
                    completion_rate: rate,
                    ..RangeStats::default()
                },
            );
            let progress = evaluate(&goal, &aggregate);
            assert!(progress >= previous, "progress regressed at rate {}", rate);
            assert!(progress <= 1.0);
            previous = progress;
        }

        let over = aggregate_with(
            &[],
            RangeStats {
                completion_rate: 100,
                ..RangeStats::default()
            },
        );
        assert_eq!(evaluate(&goal, &over), 1.0);
    }

    #[test]
    fn test_reach_streak() {
        let goal = reach_goal(GoalMetric::Streak, 7.0);
        let aggregate = aggregate_with(
            &[],
            RangeStats {
                current_streak: 3,
                ..RangeStats::default()
            },
        );

        let progress = evaluate(&goal, &aggregate);
        assert!((progress - 3.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_maintain_is_raw_rate() {
        let goal = Goal {
            id: Goal::generate_id(),
            user_id: "user-1".to_string(),
            kind: GoalKind::Maintain,
            habit_id: None,
            repeat: None,
            metric: None,
            value: None,
            created_at: Utc::now(),
        };
        let aggregate = aggregate_with(
            &[],
            RangeStats {
                completion_rate: 80,
                ..RangeStats::default()
            },
        );

        assert_eq!(evaluate(&goal, &aggregate), 0.8);
    }

    struct Fixture {
        service: GoalService,
        habits: HabitRepository,
        logs: LogRepository,
    }

    async fn setup() -> Fixture {
        let db = DbConnection::init_test().await.expect("init test db");
        let habits = HabitRepository::new(db.clone());
        let logs = LogRepository::new(db.clone());
        let timezone = TimezoneService::new(UserRepository::new(db.clone()), Istanbul);
        let progress = ProgressService::new(habits.clone(), logs.clone(), timezone.clone());
        Fixture {
            service: GoalService::new(
                GoalRepository::new(db),
                habits.clone(),
                progress,
                timezone,
            ),
            habits,
            logs,
        }
    }

    fn one_shot_habit(id: &str) -> Habit {
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

    fn complete_request(habit_id: &str, repeat: u32) -> shared::CreateGoalRequest {
        shared::CreateGoalRequest {
            goal_type: "complete".to_string(),
            habit_id: Some(habit_id.to_string()),
            repeat: Some(repeat),
            metric: None,
            value: None,
        }
    }

    #[tokio::test]
    async fn test_validation_table() {
        let fixture = setup().await;

        // Unknown type
        let result = fixture
            .service
            .create_goal(
                "user-1",
                shared::CreateGoalRequest {
                    goal_type: "become".to_string(),
                    habit_id: None,
                    repeat: None,
                    metric: None,
                    value: None,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation { .. })));

        // complete: missing habit, zero repeat, unknown habit
        let result = fixture
            .service
            .create_goal(
                "user-1",
                shared::CreateGoalRequest {
                    goal_type: "complete".to_string(),
                    habit_id: None,
                    repeat: Some(5),
                    metric: None,
                    value: None,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation { .. })));

        let result = fixture
            .service
            .create_goal("user-1", complete_request("habit::a", 0))
            .await;
        assert!(matches!(result, Err(AppError::Validation { .. })));

        let result = fixture
            .service
            .create_goal("user-1", complete_request("habit::ghost", 5))
            .await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));

        // reach: bad metric, non-positive value
        let result = fixture
            .service
            .create_goal(
                "user-1",
                shared::CreateGoalRequest {
                    goal_type: "reach".to_string(),
                    habit_id: None,
                    repeat: None,
                    metric: Some("altitude".to_string()),
                    value: Some(5.0),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation { .. })));

        let result = fixture
            .service
            .create_goal(
                "user-1",
                shared::CreateGoalRequest {
                    goal_type: "reach".to_string(),
                    habit_id: None,
                    repeat: None,
                    metric: Some("rate".to_string()),
                    value: Some(0.0),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation { .. })));

        // maintain needs nothing
        let result = fixture
            .service
            .create_goal(
                "user-1",
                shared::CreateGoalRequest {
                    goal_type: "maintain".to_string(),
                    habit_id: None,
                    repeat: None,
                    metric: None,
                    value: None,
                },
            )
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_goal_progress_from_ledger() {
        let fixture = setup().await;
        let habit = one_shot_habit("habit::a");
        fixture.habits.store_habit(&habit).await.expect("store");

        // One completed day this month (today)
        let today = day_window::local_today(Istanbul);
        let window = day_window::day_window(today, Istanbul).unwrap();
        fixture.logs.increment(&habit, window.start).await.expect("inc");

        let goal = fixture
            .service
            .create_goal("user-1", complete_request("habit::a", 5))
            .await
            .expect("create goal");

        assert_eq!(goal.progress, 0.2);
        assert!(!goal.completed);

        let listed = fixture.service.list_goals("user-1").await.expect("list");
        assert_eq!(listed.goals.len(), 1);
        assert_eq!(listed.goals[0].progress, 0.2);
    }

    #[tokio::test]
    async fn test_delete_goal() {
        let fixture = setup().await;
        let habit = one_shot_habit("habit::a");
        fixture.habits.store_habit(&habit).await.expect("store");

        let goal = fixture
            .service
            .create_goal("user-1", complete_request("habit::a", 3))
            .await
            .expect("create goal");

        fixture
            .service
            .delete_goal("user-1", &goal.id)
            .await
            .expect("delete");

        let result = fixture.service.delete_goal("user-1", &goal.id).await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));

        let listed = fixture.service.list_goals("user-1").await.expect("list");
        assert!(listed.goals.is_empty());
    }
}
