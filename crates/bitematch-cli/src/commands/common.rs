use std::env;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bitematch_core::account::AccountService;
use bitematch_core::config::{ApiMode, AppConfig};
use bitematch_core::photo::photo_uri;
use bitematch_core::places::{Coordinates, DiscoveryState};
use bitematch_core::remote::{FirestoreStore, UserContext};
use bitematch_core::services::DatabaseService;
use bitematch_core::{Candidate, CandidateId, Decision, Match, Outcome, SyncEngine};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::{auth_client_for_profile, CliAuthClient};
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

pub type CliAccount = AccountService<CliAuthClient, FirestoreStore>;

const DISCOVERY_CACHE_KEY: &str = "discovery_cache";

/// Candidates loaded by the last `discover`, kept so later commands can swipe them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryCache {
    #[serde(default)]
    pub state: DiscoveryState,
    #[serde(default)]
    pub location: Option<Coordinates>,
}

#[derive(Debug, Serialize)]
pub struct CandidateListItem {
    pub id: String,
    pub name: String,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u32>,
    pub price: String,
    pub address: Option<String>,
    pub photo_url: String,
}

#[derive(Debug, Serialize)]
pub struct MatchListItem {
    pub id: String,
    pub name: String,
    pub rating: Option<f64>,
    pub price: String,
    pub address: Option<String>,
    pub matched_at: i64,
    pub relative_time: String,
}

/// Resolved profile, configuration and local store for one command
pub struct CliContext {
    pub profile_name: String,
    pub config: AppConfig,
    pub db: DatabaseService,
}

impl CliContext {
    pub async fn load(profile: Option<&str>, db_path: &Path) -> Result<Self, CliError> {
        let profiles = CliProfilesConfig::load().map_err(CliError::Config)?;
        let profile_name = profiles.resolve_profile_name(profile);
        let env_config = AppConfig::from_env()?;
        let config = match profiles.profile(&profile_name) {
            Some(stored) => stored.app_config(env_config),
            None => env_config,
        };

        Ok(Self {
            profile_name,
            config,
            db: open_database(db_path).await?,
        })
    }

    /// Account service, or `None` when Firebase is not configured
    pub fn account(&self) -> Result<Option<CliAccount>, CliError> {
        let (Some(_), Some(project_id)) = (
            self.config.firebase_api_key.as_deref(),
            self.config.firebase_project_id.as_deref(),
        ) else {
            return Ok(None);
        };

        let auth = auth_client_for_profile(&self.profile_name, &self.config)
            .map_err(|error| CliError::Auth(error.to_string()))?
            .ok_or(CliError::FirebaseNotConfigured)?;
        let remote = FirestoreStore::new(project_id).map_err(bitematch_core::Error::from)?;
        let sync = SyncEngine::new(self.db.clone(), Arc::new(remote));
        Ok(Some(AccountService::new(auth, sync)))
    }

    pub fn require_account(&self) -> Result<CliAccount, CliError> {
        self.account()?.ok_or(CliError::FirebaseNotConfigured)
    }

    /// Signed-in user for remote writes, starting a guest session when needed.
    ///
    /// Auth problems are logged and treated as offline.
    pub async fn connect(&self) -> Result<Option<(CliAccount, Option<UserContext>)>, CliError> {
        let Some(account) = self.account()? else {
            return Ok(None);
        };

        let user = match account.user_context().await {
            Ok(Some(user)) => Some(user),
            Ok(None) => account
                .start()
                .await?
                .map(|session| session.user_context()),
            Err(error) => {
                tracing::warn!("Continuing offline: {}", error);
                None
            }
        };
        Ok(Some((account, user)))
    }
}

/// Record a decision locally, then push the queue when signed in
pub async fn record_and_sync(
    ctx: &CliContext,
    candidate: &Candidate,
    outcome: Outcome,
) -> Result<Decision, CliError> {
    let decision = ctx.db.record_decision(candidate, outcome).await?;

    let mut cache = load_discovery_cache(&ctx.db).await?;
    cache
        .state
        .candidates
        .retain(|cached| cached.id != candidate.id);
    save_discovery_cache(&ctx.db, &cache).await?;

    if let Some((account, user)) = ctx.connect().await? {
        let report = account.sync().flush(user.as_ref()).await?;
        if !report.is_clean() {
            println!(
                "{} swipe(s) could not be synced and will be retried",
                report.failed.len()
            );
        }
    }
    Ok(decision)
}

pub fn normalize_candidate_id(id: &str) -> Result<CandidateId, CliError> {
    CandidateId::new(id).map_err(|_| CliError::EmptyCandidateId)
}

pub async fn load_discovery_cache(db: &DatabaseService) -> Result<DiscoveryCache, CliError> {
    let Some(raw) = db.get_setting(DISCOVERY_CACHE_KEY).await? else {
        return Ok(DiscoveryCache::default());
    };
    match serde_json::from_str(&raw) {
        Ok(cache) => Ok(cache),
        Err(error) => {
            tracing::warn!("Ignoring unreadable discovery cache: {}", error);
            Ok(DiscoveryCache::default())
        }
    }
}

pub async fn save_discovery_cache(
    db: &DatabaseService,
    cache: &DiscoveryCache,
) -> Result<(), CliError> {
    let raw = serde_json::to_string(cache)?;
    db.set_setting(DISCOVERY_CACHE_KEY, &raw).await?;
    Ok(())
}

/// A loaded, not yet swiped candidate
pub async fn find_swipeable_candidate(
    db: &DatabaseService,
    id: &str,
) -> Result<Candidate, CliError> {
    let id = normalize_candidate_id(id)?;
    if db.get_decision(&id).await?.is_some() {
        return Err(CliError::AlreadySwiped(id.to_string()));
    }

    let cache = load_discovery_cache(db).await?;
    cache
        .state
        .candidates
        .into_iter()
        .find(|candidate| candidate.id == id)
        .ok_or_else(|| CliError::CandidateNotFound(id.to_string()))
}

pub async fn find_match(db: &DatabaseService, id: &str) -> Result<Match, CliError> {
    let id = normalize_candidate_id(id)?;
    db.get_match(&id)
        .await?
        .ok_or_else(|| CliError::MatchNotFound(id.to_string()))
}

pub async fn list_all_matches(db: &DatabaseService) -> Result<Vec<Match>, CliError> {
    const PAGE_SIZE: usize = 500;

    let mut matches = Vec::new();
    let mut offset = 0usize;

    loop {
        let batch = db.list_matches(PAGE_SIZE, offset).await?;
        let count = batch.len();
        matches.extend(batch);

        if count < PAGE_SIZE {
            break;
        }
        offset += count;
    }

    Ok(matches)
}

pub fn format_rating(candidate: &Candidate) -> String {
    match (candidate.rating, candidate.user_ratings_total) {
        (Some(rating), Some(total)) => format!("{rating:.1} ({total})"),
        (Some(rating), None) => format!("{rating:.1}"),
        _ => "-".to_string(),
    }
}

pub fn format_candidate_lines(candidates: &[Candidate]) -> Vec<String> {
    candidates
        .iter()
        .map(|candidate| {
            let name = truncate(&candidate.name, 28);
            let address = candidate.address.as_deref().unwrap_or("");
            format!(
                "{:<28}  {name:<28}  {:<10}  {:<4}  {address}",
                truncate(candidate.id.as_str(), 28),
                format_rating(candidate),
                candidate.price_label()
            )
        })
        .collect()
}

pub fn candidate_to_list_item(candidate: &Candidate, places_api_key: &str) -> CandidateListItem {
    CandidateListItem {
        id: candidate.id.to_string(),
        name: candidate.name.clone(),
        rating: candidate.rating,
        user_ratings_total: candidate.user_ratings_total,
        price: candidate.price_label(),
        address: candidate.address.clone(),
        photo_url: photo_uri(candidate.photo_reference.as_deref(), places_api_key),
    }
}

pub fn format_match_lines(matches: &[Match]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    matches
        .iter()
        .map(|item| {
            let candidate = &item.candidate;
            format!(
                "{:<28}  {:<28}  {:<4}  {}",
                truncate(candidate.id.as_str(), 28),
                truncate(&candidate.name, 28),
                candidate.price_label(),
                format_relative_time(item.matched_at, now_ms)
            )
        })
        .collect()
}

pub fn match_to_list_item(item: &Match) -> MatchListItem {
    let now_ms = Utc::now().timestamp_millis();
    MatchListItem {
        id: item.candidate.id.to_string(),
        name: item.candidate.name.clone(),
        rating: item.candidate.rating,
        price: item.candidate.price_label(),
        address: item.candidate.address.clone(),
        matched_at: item.matched_at,
        relative_time: format_relative_time(item.matched_at, now_ms),
    }
}

pub fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = value.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

/// Ask a yes/no question on the terminal; non-interactive input declines
pub fn confirm(prompt: &str) -> Result<bool, CliError> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        return Ok(false);
    }

    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    stdin.lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

pub const fn mode_label(mode: ApiMode) -> &'static str {
    match mode {
        ApiMode::Mock => "mock data",
        ApiMode::Real => "Places API",
    }
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_db_path.or_else(|| env::var_os("BITEMATCH_DB_PATH").map(PathBuf::from))
    {
        return Ok(path);
    }
    default_db_path()
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("bitematch").join("bitematch.db"))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".to_string()))
}

pub async fn open_database(path: &Path) -> Result<DatabaseService, CliError> {
    Ok(DatabaseService::open_path(path.to_path_buf()).await?)
}
