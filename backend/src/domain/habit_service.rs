//! Habit definitions and the progress ledger.
//!
//! Owns habit CRUD (with the unique-name-per-user invariant) and the two
//! ledger mutations: the daily increment and the today-only reset that
//! fires when a habit's unit, target or increment step changes.

use chrono::Utc;
use tracing::info;

use crate::domain::day_window;
use crate::domain::models::{Habit, HabitOrigin};
use crate::domain::presets;
use crate::domain::timezone::TimezoneService;
use crate::error::{AppError, AppResult};
use crate::storage::{HabitRepository, LogRepository};

#[derive(Clone)]
pub struct HabitService {
    habits: HabitRepository,
    logs: LogRepository,
    timezone: TimezoneService,
}

impl HabitService {
    pub fn new(habits: HabitRepository, logs: LogRepository, timezone: TimezoneService) -> Self {
        Self {
            habits,
            logs,
            timezone,
        }
    }

    /// Create a habit from a preset template or from scratch. Explicit
    /// fields override the preset's values.
    pub async fn create_habit(
        &self,
        user_id: &str,
        request: shared::CreateHabitRequest,
    ) -> AppResult<shared::HabitDto> {
        info!(user_id, "creating habit: {:?}", request);

        let preset = match request.preset.as_deref() {
            Some(id) => Some(
                presets::find_preset(id).ok_or_else(|| AppError::not_found("preset"))?,
            ),
            None => None,
        };
        let origin = if preset.is_some() {
            HabitOrigin::Preset
        } else {
            HabitOrigin::Custom
        };

        let name = request
            .name
            .or_else(|| preset.map(|p| p.name.to_string()))
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::validation("habit name is required"))?;
        let unit = request
            .unit
            .or_else(|| preset.map(|p| p.unit.to_string()))
            .ok_or_else(|| AppError::validation("habit unit is required"))?;
        let target_amount = request
            .target_amount
            .or(preset.map(|p| p.target_amount))
            .ok_or_else(|| AppError::validation("target amount is required"))?;
        let increment_amount = request
            .increment_amount
            .or(preset.map(|p| p.increment_amount))
            .ok_or_else(|| AppError::validation("increment amount is required"))?;
        validate_amounts(target_amount, increment_amount)?;

        let category = request
            .category
            .or_else(|| preset.map(|p| p.category.to_string()))
            .unwrap_or_else(|| "general".to_string());
        let icon = request
            .icon
            .or_else(|| preset.map(|p| p.icon.to_string()))
            .unwrap_or_else(|| "circle".to_string());
        let available_units = request
            .available_units
            .or_else(|| {
                preset.map(|p| p.available_units.iter().map(|u| u.to_string()).collect())
            })
            .unwrap_or_else(|| vec![unit.clone()]);

        if self.habits.active_name_exists(user_id, &name, None).await? {
            return Err(AppError::conflict(format!(
                "a habit named '{}' already exists",
                name
            )));
        }

        let now = Utc::now();
        let habit = Habit {
            id: Habit::generate_id(),
            user_id: user_id.to_string(),
            name,
            origin,
            category,
            icon,
            unit,
            available_units,
            target_amount,
            increment_amount,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.habits.store_habit(&habit).await?;
        info!(user_id, habit_id = %habit.id, "habit created");

        Ok(habit.to_dto())
    }

    pub async fn list_habits(&self, user_id: &str) -> AppResult<Vec<shared::HabitDto>> {
        let habits = self.habits.list_active_habits(user_id).await?;
        Ok(habits.iter().map(Habit::to_dto).collect())
    }

    /// Update a habit definition. Changing the unit, target amount or
    /// increment step resets today's ledger entry: accumulated progress
    /// under the old configuration is meaningless for the day in flight.
    /// Entries for prior days are never touched.
    pub async fn update_habit(
        &self,
        user_id: &str,
        habit_id: &str,
        request: shared::UpdateHabitRequest,
    ) -> AppResult<shared::HabitDto> {
        info!(user_id, habit_id, "updating habit: {:?}", request);

        let mut habit = self
            .habits
            .get_active_habit(user_id, habit_id)
            .await?
            .ok_or_else(|| AppError::not_found("habit"))?;

        if let Some(name) = request.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(AppError::validation("habit name cannot be empty"));
            }
            if name != habit.name
                && self
                    .habits
                    .active_name_exists(user_id, &name, Some(habit_id))
                    .await?
            {
                return Err(AppError::conflict(format!(
                    "a habit named '{}' already exists",
                    name
                )));
            }
            habit.name = name;
        }
        if let Some(category) = request.category {
            habit.category = category;
        }
        if let Some(icon) = request.icon {
            habit.icon = icon;
        }
        if let Some(available_units) = request.available_units {
            habit.available_units = available_units;
        }

        let mut resets_today = false;
        if let Some(unit) = request.unit {
            if unit != habit.unit {
                habit.unit = unit;
                resets_today = true;
            }
        }
        if let Some(target_amount) = request.target_amount {
            if target_amount != habit.target_amount {
                habit.target_amount = target_amount;
                resets_today = true;
            }
        }
        if let Some(increment_amount) = request.increment_amount {
            if increment_amount != habit.increment_amount {
                habit.increment_amount = increment_amount;
                resets_today = true;
            }
        }
        validate_amounts(habit.target_amount, habit.increment_amount)?;

        if let Some(is_active) = request.is_active {
            habit.is_active = is_active;
        }

        habit.updated_at = Utc::now();
        self.habits.update_habit(&habit).await?;

        if resets_today {
            self.reset_today(&habit).await?;
        }

        Ok(habit.to_dto())
    }

    /// Hard-delete a habit and all of its ledger entries
    pub async fn delete_habit(&self, user_id: &str, habit_id: &str) -> AppResult<()> {
        info!(user_id, habit_id, "deleting habit");

        let deleted = self.habits.delete_habit_with_logs(user_id, habit_id).await?;
        if !deleted {
            return Err(AppError::not_found("habit"));
        }

        Ok(())
    }

    /// Add one increment step to today's ledger entry, creating it if this
    /// is the first increment of the day. The upsert is a single atomic
    /// statement; rapid double-taps both land.
    pub async fn increment(
        &self,
        user_id: &str,
        habit_id: &str,
    ) -> AppResult<shared::IncrementResponse> {
        let habit = self
            .habits
            .get_active_habit(user_id, habit_id)
            .await?
            .ok_or_else(|| AppError::not_found("habit"))?;

        let tz = self.timezone.resolve(user_id).await;
        let today = day_window::local_today(tz);
        let window = day_window::day_window(today, tz)?;

        let log = self.logs.increment(&habit, window.start).await?;

        info!(
            user_id,
            habit_id,
            value = log.value,
            completed = log.completed,
            "habit incremented"
        );

        Ok(shared::IncrementResponse {
            habit_id: habit.id.clone(),
            new_value: log.value,
            target_amount: habit.target_amount,
            progress: log.progress(habit.target_amount),
            completed: log.completed,
            unit: habit.unit.clone(),
            incremented_by: habit.increment_amount,
        })
    }

    /// Drop today's ledger entry for a habit, if one exists
    async fn reset_today(&self, habit: &Habit) -> AppResult<()> {
        let tz = self.timezone.resolve(&habit.user_id).await;
        let today = day_window::local_today(tz);
        let window = day_window::day_window(today, tz)?;

        let removed = self
            .logs
            .delete_in_window(&habit.id, &habit.user_id, window)
            .await?;
        if removed {
            info!(habit_id = %habit.id, "today's progress reset after definition change");
        }

        Ok(())
    }
}

fn validate_amounts(target_amount: f64, increment_amount: f64) -> AppResult<()> {
    if !(target_amount > 0.0) {
        return Err(AppError::validation("target amount must be greater than zero"));
    }
    if !(increment_amount > 0.0) {
        return Err(AppError::validation(
            "increment amount must be greater than zero",
        ));
    }
    Ok(())
}
