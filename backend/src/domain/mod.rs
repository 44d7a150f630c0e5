pub mod day_window;
pub mod goal_service;
pub mod habit_service;
pub mod models;
pub mod presets;
pub mod progress_service;
pub mod snapshot_service;
pub mod timezone;
