use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod db;
mod domain;
mod error;
mod rest;
mod storage;

use config::Config;
use db::DbConnection;
use domain::goal_service::GoalService;
use domain::habit_service::HabitService;
use domain::progress_service::ProgressService;
use domain::snapshot_service::SnapshotService;
use domain::timezone::TimezoneService;
use storage::{GoalRepository, HabitRepository, LogRepository, UserRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    info!("Setting up database");
    let db = DbConnection::new(&config.database_url).await?;

    let habit_repo = HabitRepository::new(db.clone());
    let log_repo = LogRepository::new(db.clone());
    let timezone = TimezoneService::new(UserRepository::new(db.clone()), config.default_timezone);
    let progress = ProgressService::new(habit_repo.clone(), log_repo.clone(), timezone.clone());

    let state = rest::AppState::new(
        HabitService::new(habit_repo.clone(), log_repo.clone(), timezone.clone()),
        SnapshotService::new(habit_repo.clone(), log_repo.clone(), timezone.clone()),
        progress.clone(),
        GoalService::new(GoalRepository::new(db), habit_repo, progress, timezone.clone()),
        timezone,
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let app = rest::router(state).layer(cors);

    info!("Starting server on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
