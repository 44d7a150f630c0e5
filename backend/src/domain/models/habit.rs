use chrono::{DateTime, Utc};

/// Where a habit definition came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HabitOrigin {
    Preset,
    Custom,
}

impl HabitOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            HabitOrigin::Preset => "preset",
            HabitOrigin::Custom => "custom",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "preset" => Ok(HabitOrigin::Preset),
            "custom" => Ok(HabitOrigin::Custom),
            _ => Err(format!("Invalid habit origin: {}", s)),
        }
    }
}

/// A tracked activity definition owned by one user.
///
/// `target_amount` and `increment_amount` are validated to be > 0 before a
/// habit is ever stored; the ledger relies on that.
#[derive(Debug, Clone, PartialEq)]
pub struct Habit {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub origin: HabitOrigin,
    pub category: String,
    pub icon: String,
    pub unit: String,
    pub available_units: Vec<String>,
    pub target_amount: f64,
    pub increment_amount: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Habit {
    pub fn generate_id() -> String {
        format!("habit::{}", uuid::Uuid::new_v4())
    }

    pub fn to_dto(&self) -> shared::HabitDto {
        shared::HabitDto {
            id: self.id.clone(),
            name: self.name.clone(),
            origin: self.origin.as_str().to_string(),
            category: self.category.clone(),
            icon: self.icon.clone(),
            unit: self.unit.clone(),
            available_units: self.available_units.clone(),
            target_amount: self.target_amount,
            increment_amount: self.increment_amount,
            is_active: self.is_active,
            created_at: self.created_at.to_rfc3339(),
        }
    }

    pub fn to_ref(&self) -> shared::HabitRef {
        shared::HabitRef {
            id: self.id.clone(),
            name: self.name.clone(),
            icon: self.icon.clone(),
            unit: self.unit.clone(),
            target_amount: self.target_amount,
        }
    }
}
