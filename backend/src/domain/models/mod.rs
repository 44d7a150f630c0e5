pub mod goal;
pub mod habit;
pub mod habit_log;
pub mod user;

pub use goal::{Goal, GoalKind, GoalMetric};
pub use habit::{Habit, HabitOrigin};
pub use habit_log::HabitLog;
pub use user::User;
