use bitematch_core::config::AppConfig;

use crate::cli::ConfigCommands;
use crate::config_profiles::{normalize_text_option, CliProfile, CliProfilesConfig};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            firebase_api_key,
            firebase_project_id,
            places_api_key,
            api_mode,
            no_activate,
        } => {
            let explicit = CliProfile {
                firebase_api_key,
                firebase_project_id,
                places_api_key,
                api_mode: api_mode.map(Into::into),
            };
            run_config_init(profile.as_deref().or(global_profile), explicit, no_activate)
        }
    }
}

pub fn run_config_init(
    profile_name: Option<&str>,
    explicit: CliProfile,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let existing = config.profile(&profile_name).cloned().unwrap_or_default();
    let env = AppConfig::from_env()?;

    *config.profile_mut_or_default(&profile_name) = merge_profile(explicit, env, existing);

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let profile = config
        .profile(&profile_name)
        .ok_or_else(|| CliError::Config("Failed to persist profile".to_string()))?;
    let missing_fields = profile.missing_fields();
    if missing_fields.is_empty() {
        println!(
            "Profile '{profile_name}' is ready. Run `bitematch discover --lat <LAT> --lng <LNG>` to start swiping."
        );
    } else {
        println!(
            "Profile '{}' is missing: {}",
            profile_name,
            missing_fields.join(", ")
        );
    }

    Ok(())
}

/// Explicit flags win, then environment values, then what the profile already had
pub fn merge_profile(explicit: CliProfile, env: AppConfig, existing: CliProfile) -> CliProfile {
    CliProfile {
        firebase_api_key: normalize_text_option(explicit.firebase_api_key)
            .or(env.firebase_api_key)
            .or(existing.firebase_api_key),
        firebase_project_id: normalize_text_option(explicit.firebase_project_id)
            .or(env.firebase_project_id)
            .or(existing.firebase_project_id),
        places_api_key: normalize_text_option(explicit.places_api_key)
            .or(env.places_api_key)
            .or(existing.places_api_key),
        api_mode: explicit.api_mode.or(env.api_mode).or(existing.api_mode),
    }
}
