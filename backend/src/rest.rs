//! REST handlers and routing.
//!
//! Authentication lives outside this service; callers arrive with an
//! `x-user-id` header and the [`AuthUser`] extractor turns its absence into
//! an Unauthorized response before any handler runs. Every handler returns
//! `AppResult`, so failures map to status codes in one place.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use crate::domain::day_window::parse_date_param;
use crate::domain::goal_service::GoalService;
use crate::domain::habit_service::HabitService;
use crate::domain::presets;
use crate::domain::progress_service::{month_range, ProgressService};
use crate::domain::snapshot_service::SnapshotService;
use crate::domain::timezone::TimezoneService;
use crate::error::{AppError, AppResult};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub habits: HabitService,
    pub snapshots: SnapshotService,
    pub progress: ProgressService,
    pub goals: GoalService,
    pub timezone: TimezoneService,
}

impl AppState {
    pub fn new(
        habits: HabitService,
        snapshots: SnapshotService,
        progress: ProgressService,
        goals: GoalService,
        timezone: TimezoneService,
    ) -> Self {
        Self {
            habits,
            snapshots,
            progress,
            goals,
            timezone,
        }
    }
}

/// The authenticated caller, as established by the auth layer in front of
/// this service
pub struct AuthUser(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .filter(|id| !id.is_empty())
            .map(|id| AuthUser(id.to_string()))
            .ok_or(AppError::Unauthorized)
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/habits", post(create_habit).get(list_habits))
        .route("/habits/presets", get(list_presets))
        .route("/habits/logs-by-date", get(logs_by_date))
        .route("/habits/:id", put(update_habit).delete(delete_habit))
        .route("/habits/:id/increment", post(increment_habit))
        .route("/habits/:id/progress", get(habit_progress))
        .route("/goals", post(create_goal).get(list_goals))
        .route("/goals/:id", delete(delete_goal))
        .route("/profile/timezone", put(update_timezone));

    Router::new().nest("/api", api).with_state(state)
}

async fn create_habit(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<shared::CreateHabitRequest>,
) -> AppResult<(StatusCode, Json<shared::HabitDto>)> {
    info!("POST /api/habits");

    let habit = state.habits.create_habit(&user_id, request).await?;
    Ok((StatusCode::CREATED, Json(habit)))
}

async fn list_habits(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<shared::HabitDto>>> {
    info!("GET /api/habits");

    let habits = state.habits.list_habits(&user_id).await?;
    Ok(Json(habits))
}

async fn list_presets() -> Json<Vec<shared::PresetHabitDto>> {
    Json(presets::PRESETS.iter().map(|p| p.to_dto()).collect())
}

async fn update_habit(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(habit_id): Path<String>,
    Json(request): Json<shared::UpdateHabitRequest>,
) -> AppResult<Json<shared::HabitDto>> {
    info!("PUT /api/habits/{}", habit_id);

    let habit = state
        .habits
        .update_habit(&user_id, &habit_id, request)
        .await?;
    Ok(Json(habit))
}

async fn delete_habit(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(habit_id): Path<String>,
) -> AppResult<StatusCode> {
    info!("DELETE /api/habits/{}", habit_id);

    state.habits.delete_habit(&user_id, &habit_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn increment_habit(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(habit_id): Path<String>,
) -> AppResult<Json<shared::IncrementResponse>> {
    info!("POST /api/habits/{}/increment", habit_id);

    let response = state.habits.increment(&user_id, &habit_id).await?;
    Ok(Json(response))
}

#[derive(Deserialize, Debug)]
struct LogsByDateQuery {
    date: Option<String>,
}

async fn logs_by_date(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<LogsByDateQuery>,
) -> AppResult<Json<shared::DailySnapshotResponse>> {
    info!("GET /api/habits/logs-by-date - query: {:?}", query);

    let snapshot = state
        .snapshots
        .logs_by_date(&user_id, query.date.as_deref())
        .await?;
    Ok(Json(snapshot))
}

#[derive(Deserialize, Debug)]
struct ProgressQuery {
    year: Option<i32>,
    month: Option<u32>,
    start_date: Option<String>,
    end_date: Option<String>,
}

async fn habit_progress(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(habit_id): Path<String>,
    Query(query): Query<ProgressQuery>,
) -> AppResult<Json<shared::HabitProgressResponse>> {
    info!("GET /api/habits/{}/progress - query: {:?}", habit_id, query);

    let (start, end) = match (query.year, query.month, &query.start_date, &query.end_date) {
        (Some(year), Some(month), _, _) => month_range(year, month)?,
        (_, _, Some(start_raw), Some(end_raw)) => {
            let tz = state.timezone.resolve(&user_id).await;
            (
                parse_date_param(start_raw, tz)?,
                parse_date_param(end_raw, tz)?,
            )
        }
        _ => {
            return Err(AppError::validation(
                "provide either year and month, or start_date and end_date",
            ))
        }
    };

    let response = state
        .progress
        .habit_progress(&user_id, &habit_id, start, end)
        .await?;
    Ok(Json(response))
}

async fn create_goal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<shared::CreateGoalRequest>,
) -> AppResult<(StatusCode, Json<shared::GoalDto>)> {
    info!("POST /api/goals");

    let goal = state.goals.create_goal(&user_id, request).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

async fn list_goals(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<shared::GoalListResponse>> {
    info!("GET /api/goals");

    let goals = state.goals.list_goals(&user_id).await?;
    Ok(Json(goals))
}

async fn delete_goal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(goal_id): Path<String>,
) -> AppResult<StatusCode> {
    info!("DELETE /api/goals/{}", goal_id);

    state.goals.delete_goal(&user_id, &goal_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_timezone(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<shared::UpdateTimezoneRequest>,
) -> AppResult<Json<shared::ProfileResponse>> {
    info!("PUT /api/profile/timezone");

    let tz = state
        .timezone
        .set_timezone(&user_id, &request.timezone)
        .await?;
    Ok(Json(shared::ProfileResponse {
        user_id,
        timezone: tz.name().to_string(),
    }))
}
