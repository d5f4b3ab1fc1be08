//! Dietary preferences model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Known allergens offered by the allergy picker
pub const ALLERGIES: [&str; 10] = [
    "Nuts", "Dairy", "Eggs", "Soy", "Wheat", "Fish", "Shellfish", "Sesame", "Peanuts", "Corn",
];

/// Dietary goal options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietaryGoal {
    Vegan,
    Vegetarian,
    GlutenFree,
    Halal,
}

impl DietaryGoal {
    pub const ALL: [Self; 4] = [Self::Vegan, Self::Vegetarian, Self::GlutenFree, Self::Halal];

    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Vegan => "vegan",
            Self::Vegetarian => "vegetarian",
            Self::GlutenFree => "gluten_free",
            Self::Halal => "halal",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Vegan => "Vegan",
            Self::Vegetarian => "Vegetarian",
            Self::GlutenFree => "Gluten Free",
            Self::Halal => "Halal",
        }
    }
}

impl fmt::Display for DietaryGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DietaryGoal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|goal| goal.id() == wanted)
            .ok_or_else(|| Error::InvalidInput(format!("unknown dietary goal '{}'", s.trim())))
    }
}

/// Spice tolerance, 1 (Mild) through 4 (Extra Hot)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SpiceLevel(u8);

impl SpiceLevel {
    pub const MILD: Self = Self(1);
    pub const MEDIUM: Self = Self(2);
    pub const HOT: Self = Self(3);
    pub const EXTRA_HOT: Self = Self(4);

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self.0 {
            1 => "Mild",
            2 => "Medium",
            3 => "Hot",
            _ => "Extra Hot",
        }
    }
}

impl Default for SpiceLevel {
    fn default() -> Self {
        Self::MEDIUM
    }
}

impl TryFrom<u8> for SpiceLevel {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (1..=4).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidInput(format!(
                "spice level must be between 1 and 4, got {value}"
            )))
        }
    }
}

impl From<SpiceLevel> for u8 {
    fn from(value: SpiceLevel) -> Self {
        value.0
    }
}

/// Saved dietary preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DietaryPreferences {
    #[serde(default)]
    pub goals: Vec<DietaryGoal>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub spice_level: SpiceLevel,
}

impl DietaryPreferences {
    /// Select a goal, or deselect it when already selected
    pub fn toggle_goal(&mut self, goal: DietaryGoal) {
        if let Some(index) = self.goals.iter().position(|selected| *selected == goal) {
            self.goals.remove(index);
        } else {
            self.goals.push(goal);
        }
    }

    /// Add an allergy from the catalog; adding twice is a no-op
    pub fn add_allergy(&mut self, allergy: &str) -> Result<(), Error> {
        let canonical = canonical_allergy(allergy)
            .ok_or_else(|| Error::InvalidInput(format!("unknown allergy '{}'", allergy.trim())))?;
        if !self.allergies.iter().any(|selected| selected == canonical) {
            self.allergies.push(canonical.to_string());
        }
        Ok(())
    }

    pub fn remove_allergy(&mut self, allergy: &str) {
        self.allergies
            .retain(|selected| !selected.eq_ignore_ascii_case(allergy.trim()));
    }

    /// Catalog allergies matching `query` that are not selected yet
    #[must_use]
    pub fn search_allergies(&self, query: &str) -> Vec<&'static str> {
        let query = query.trim().to_lowercase();
        ALLERGIES
            .into_iter()
            .filter(|allergy| allergy.to_lowercase().contains(&query))
            .filter(|allergy| !self.allergies.iter().any(|selected| selected == allergy))
            .collect()
    }
}

fn canonical_allergy(value: &str) -> Option<&'static str> {
    let value = value.trim();
    ALLERGIES
        .into_iter()
        .find(|allergy| allergy.eq_ignore_ascii_case(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferences_default() {
        let prefs = DietaryPreferences::default();
        assert!(prefs.goals.is_empty());
        assert_eq!(prefs.spice_level, SpiceLevel::MEDIUM);
        assert_eq!(prefs.spice_level.label(), "Medium");
    }

    #[test]
    fn test_toggle_goal() {
        let mut prefs = DietaryPreferences::default();
        prefs.toggle_goal(DietaryGoal::Vegan);
        prefs.toggle_goal(DietaryGoal::Halal);
        assert_eq!(prefs.goals, vec![DietaryGoal::Vegan, DietaryGoal::Halal]);

        prefs.toggle_goal(DietaryGoal::Vegan);
        assert_eq!(prefs.goals, vec![DietaryGoal::Halal]);
    }

    #[test]
    fn test_goal_parse() {
        assert_eq!(
            "gluten-free".parse::<DietaryGoal>().unwrap(),
            DietaryGoal::GlutenFree
        );
        assert!("keto".parse::<DietaryGoal>().is_err());
    }

    #[test]
    fn test_add_allergy_is_idempotent_and_canonical() {
        let mut prefs = DietaryPreferences::default();
        prefs.add_allergy("nuts").unwrap();
        prefs.add_allergy("NUTS").unwrap();
        assert_eq!(prefs.allergies, vec!["Nuts".to_string()]);
        assert!(prefs.add_allergy("gravel").is_err());

        prefs.remove_allergy("nuts");
        assert!(prefs.allergies.is_empty());
    }

    #[test]
    fn test_search_allergies_excludes_selected() {
        let mut prefs = DietaryPreferences::default();
        prefs.add_allergy("Peanuts").unwrap();
        let results = prefs.search_allergies("nut");
        assert_eq!(results, vec!["Nuts"]);
    }

    #[test]
    fn test_spice_level_bounds() {
        assert!(SpiceLevel::try_from(0).is_err());
        assert!(SpiceLevel::try_from(5).is_err());
        assert_eq!(SpiceLevel::try_from(4).unwrap().label(), "Extra Hot");
        assert!(serde_json::from_str::<SpiceLevel>("9").is_err());
    }
}
