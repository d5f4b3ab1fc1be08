//! BiteMatch CLI - Swipe through nearby restaurants from the terminal
//!
//! Discover places around a location, like or pass on them, and keep the
//! matches synced with a BiteMatch account.

mod auth;
mod cli;
mod commands;
mod config_profiles;
mod error;
#[cfg(test)]
mod tests;

use bitematch_core::Outcome;
use clap::Parser;

use crate::cli::{Cli, Commands, SyncCommands};
use crate::commands::auth_cmd::run_auth;
use crate::commands::common::{resolve_db_path, CliContext};
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::discover::run_discover;
use crate::commands::export::run_export;
use crate::commands::feedback::{run_feedback, run_help_center};
use crate::commands::matches::{run_directions, run_matches, run_unmatch};
use crate::commands::prefs::run_prefs;
use crate::commands::profile::run_profile;
use crate::commands::swipe::{run_decide, run_swipe};
use crate::commands::sync::{run_reset, run_sync, run_sync_status};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "bitematch=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Run `bitematch discover --lat <LAT> --lng <LNG>` to load restaurants, or `bitematch --help`.");
        return Ok(());
    };

    // Commands that never touch the local store
    let command = match command {
        Commands::Completions { shell, output } => {
            return run_completions(shell, output.as_deref());
        }
        Commands::Config { command } => return run_config(command, cli.profile.as_deref()),
        Commands::HelpCenter { query } => {
            run_help_center(query.as_deref());
            return Ok(());
        }
        other => other,
    };

    let db_path = resolve_db_path(cli.db_path)?;
    let ctx = CliContext::load(cli.profile.as_deref(), &db_path).await?;

    match command {
        Commands::Discover {
            lat,
            lng,
            new_search,
            json,
        } => run_discover(&ctx, lat.zip(lng), new_search, json).await,
        Commands::Swipe { id, dx, width } => run_swipe(&ctx, &id, dx, width).await,
        Commands::Like { id } => run_decide(&ctx, &id, Outcome::Liked).await,
        Commands::Pass { id } => run_decide(&ctx, &id, Outcome::Disliked).await,
        Commands::Matches { limit, json } => run_matches(&ctx, limit, json).await,
        Commands::Unmatch { id } => run_unmatch(&ctx, &id).await,
        Commands::Directions { id } => run_directions(&ctx, &id).await,
        Commands::Sync { command } => match command {
            Some(SyncCommands::Status { json }) => run_sync_status(&ctx, json).await,
            None => run_sync(&ctx).await,
        },
        Commands::Reset { yes } => run_reset(&ctx, yes).await,
        Commands::Auth { command } => run_auth(&ctx, command).await,
        Commands::Profile { command } => run_profile(&ctx, command).await,
        Commands::Prefs { command } => run_prefs(&ctx, command).await,
        Commands::Feedback {
            rating,
            areas,
            comment,
        } => run_feedback(&ctx, rating, &areas, comment).await,
        Commands::Export { format, output } => run_export(&ctx, format, output.as_deref()).await,
        Commands::Completions { .. } | Commands::Config { .. } | Commands::HelpCenter { .. } => {
            Ok(())
        }
    }
}
