use std::str::FromStr;

use bitematch_core::models::{DietaryGoal, DietaryPreferences, SpiceLevel};

use crate::cli::PrefsCommands;
use crate::commands::common::CliContext;
use crate::error::CliError;

pub async fn run_prefs(ctx: &CliContext, command: PrefsCommands) -> Result<(), CliError> {
    match command {
        PrefsCommands::Show { json } => {
            let preferences = ctx.db.load_preferences().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&preferences)?);
            } else {
                for line in format_preferences(&preferences) {
                    println!("{line}");
                }
            }
            Ok(())
        }
        PrefsCommands::Set {
            goals,
            allergies,
            remove_allergies,
            spice,
        } => {
            let mut preferences = ctx.db.load_preferences().await?;
            apply_changes(&mut preferences, &goals, &allergies, &remove_allergies, spice)?;
            ctx.db.save_preferences(&preferences).await?;
            println!("Preferences saved");
            for line in format_preferences(&preferences) {
                println!("{line}");
            }
            Ok(())
        }
        PrefsCommands::Allergies { query } => {
            let preferences = ctx.db.load_preferences().await?;
            let found = preferences.search_allergies(&query);
            if found.is_empty() {
                println!("No allergies match '{}'", query.trim());
            }
            for allergy in found {
                println!("{allergy}");
            }
            Ok(())
        }
    }
}

/// Apply toggles, additions, removals and spice level in that order
pub fn apply_changes(
    preferences: &mut DietaryPreferences,
    goals: &[String],
    allergies: &[String],
    remove_allergies: &[String],
    spice: Option<u8>,
) -> Result<(), CliError> {
    for goal in goals {
        preferences.toggle_goal(DietaryGoal::from_str(goal)?);
    }
    for allergy in allergies {
        preferences.add_allergy(allergy)?;
    }
    for allergy in remove_allergies {
        preferences.remove_allergy(allergy);
    }
    if let Some(level) = spice {
        preferences.spice_level = SpiceLevel::try_from(level)?;
    }
    Ok(())
}

pub fn format_preferences(preferences: &DietaryPreferences) -> Vec<String> {
    let goals = if preferences.goals.is_empty() {
        "none".to_string()
    } else {
        preferences
            .goals
            .iter()
            .map(|goal| goal.label())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let allergies = if preferences.allergies.is_empty() {
        "none".to_string()
    } else {
        preferences.allergies.join(", ")
    };

    vec![
        format!("Goals:      {goals}"),
        format!("Allergies:  {allergies}"),
        format!(
            "Spice:      {} ({}/4)",
            preferences.spice_level.label(),
            preferences.spice_level.value()
        ),
    ]
}
