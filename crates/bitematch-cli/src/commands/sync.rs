use bitematch_core::sync::{FlushReport, FlushSkip};
use bitematch_core::SyncState;
use serde::Serialize;

use crate::auth::load_stored_session;
use crate::commands::common::{
    confirm, format_timestamp, save_discovery_cache, CliContext, DiscoveryCache,
};
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct SyncStatusItem {
    pub profile: String,
    pub pending: usize,
    pub oldest_pending_at: Option<String>,
    pub signed_in_as: Option<String>,
    pub state: String,
}

pub async fn run_sync(ctx: &CliContext) -> Result<(), CliError> {
    let Some((account, user)) = ctx.connect().await? else {
        return Err(CliError::FirebaseNotConfigured);
    };

    let report = account.sync().flush(user.as_ref()).await?;
    for line in format_flush_report(&report, account.sync().state()) {
        println!("{line}");
    }
    Ok(())
}

pub fn format_flush_report(report: &FlushReport, state: SyncState) -> Vec<String> {
    match report.skipped {
        Some(FlushSkip::NoUser) => {
            return vec!["Not signed in; swipes stay queued on this device.".to_string()];
        }
        Some(FlushSkip::EmptyQueue) => return vec!["Everything is synced.".to_string()],
        Some(FlushSkip::InFlight) => return vec!["A sync is already running.".to_string()],
        None => {}
    }

    let mut lines = vec![format!(
        "Synced {} of {} queued swipes ({state})",
        report.synced, report.attempted
    )];
    for id in &report.failed {
        lines.push(format!("  will retry: {id}"));
    }
    lines
}

/// State shown by `sync status`, which runs no flush and so never knows of a failed one
pub fn status_label(signed_in: bool, pending: usize) -> String {
    match (signed_in, pending) {
        (false, _) => SyncState::Offline.to_string(),
        (true, 0) => SyncState::Synced.to_string(),
        (true, _) => "pending".to_string(),
    }
}

pub async fn run_sync_status(ctx: &CliContext, as_json: bool) -> Result<(), CliError> {
    let pending = ctx.db.pending_entries().await?;
    let session = if ctx.config.firebase_api_key.is_some() {
        load_stored_session(&ctx.profile_name).map_err(|error| CliError::Auth(error.to_string()))?
    } else {
        None
    };

    let state = status_label(session.is_some(), pending.len());
    let status = SyncStatusItem {
        profile: ctx.profile_name.clone(),
        pending: pending.len(),
        oldest_pending_at: pending.first().map(|entry| format_timestamp(entry.decided_at)),
        signed_in_as: session.map(|stored| stored.user.display_label().to_string()),
        state,
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Profile:  {}", status.profile);
    println!(
        "Account:  {}",
        status.signed_in_as.as_deref().unwrap_or("not signed in")
    );
    println!("Pending:  {}", status.pending);
    if let Some(oldest) = &status.oldest_pending_at {
        println!("Oldest:   {oldest}");
    }
    println!("State:    {}", status.state);
    Ok(())
}

pub async fn run_reset(ctx: &CliContext, confirmed: bool) -> Result<(), CliError> {
    if !confirmed && !confirm("Clear all matches, swipe history and queued swipes on this device?")? {
        return Err(CliError::Aborted);
    }

    ctx.db.clear_store().await?;
    save_discovery_cache(&ctx.db, &DiscoveryCache::default()).await?;
    println!("Local data cleared");
    Ok(())
}
