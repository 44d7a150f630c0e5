//! Built-in habit templates users can start from instead of defining a
//! habit field by field.

use once_cell::sync::Lazy;

#[derive(Debug, Clone)]
pub struct HabitPreset {
    pub id: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub icon: &'static str,
    pub unit: &'static str,
    pub available_units: &'static [&'static str],
    pub target_amount: f64,
    pub increment_amount: f64,
}

pub static PRESETS: Lazy<Vec<HabitPreset>> = Lazy::new(|| {
    vec![
        HabitPreset {
            id: "drink-water",
            name: "Drink Water",
            category: "health",
            icon: "water-drop",
            unit: "glasses",
            available_units: &["glasses", "ml", "l"],
            target_amount: 8.0,
            increment_amount: 1.0,
        },
        HabitPreset {
            id: "walk",
            name: "Walk",
            category: "fitness",
            icon: "footsteps",
            unit: "steps",
            available_units: &["steps", "km"],
            target_amount: 6000.0,
            increment_amount: 500.0,
        },
        HabitPreset {
            id: "read",
            name: "Read",
            category: "mind",
            icon: "book",
            unit: "minutes",
            available_units: &["minutes", "pages"],
            target_amount: 30.0,
            increment_amount: 10.0,
        },
        HabitPreset {
            id: "meditate",
            name: "Meditate",
            category: "mind",
            icon: "lotus",
            unit: "minutes",
            available_units: &["minutes"],
            target_amount: 10.0,
            increment_amount: 5.0,
        },
        HabitPreset {
            id: "workout",
            name: "Workout",
            category: "fitness",
            icon: "dumbbell",
            unit: "minutes",
            available_units: &["minutes"],
            target_amount: 45.0,
            increment_amount: 15.0,
        },
        HabitPreset {
            id: "sleep",
            name: "Sleep",
            category: "health",
            icon: "moon",
            unit: "hours",
            available_units: &["hours"],
            target_amount: 8.0,
            increment_amount: 1.0,
        },
    ]
});

pub fn find_preset(id: &str) -> Option<&'static HabitPreset> {
    PRESETS.iter().find(|p| p.id == id)
}

impl HabitPreset {
    pub fn to_dto(&self) -> shared::PresetHabitDto {
        shared::PresetHabitDto {
            id: self.id.to_string(),
            name: self.name.to_string(),
            category: self.category.to_string(),
            icon: self.icon.to_string(),
            unit: self.unit.to_string(),
            available_units: self.available_units.iter().map(|u| u.to_string()).collect(),
            target_amount: self.target_amount,
            increment_amount: self.increment_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_well_formed() {
        assert!(!PRESETS.is_empty());
        for preset in PRESETS.iter() {
            assert!(preset.target_amount > 0.0, "{} target", preset.id);
            assert!(preset.increment_amount > 0.0, "{} increment", preset.id);
            assert!(
                preset.available_units.contains(&preset.unit),
                "{} default unit must be selectable",
                preset.id
            );
        }
    }

    #[test]
    fn test_find_preset() {
        assert!(find_preset("drink-water").is_some());
        assert!(find_preset("juggle").is_none());
    }
}
