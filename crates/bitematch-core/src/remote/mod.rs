//! Per-user cloud document store
//!
//! Each user owns two collections keyed by candidate id: `interactions`
//! (swipe history) and `matches` (denormalized liked candidates). Writes are
//! single-document upserts; removals delete the match/interaction pair in one
//! batch.

mod firestore;
mod memory;

use std::future::Future;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{Candidate, CandidateId, Decision, Match, Outcome};

pub use firestore::FirestoreStore;
pub use memory::MemoryRemoteStore;

/// Most recent matches fetched when hydrating
pub const INITIAL_MATCH_LIMIT: usize = 50;

/// Most recent interactions fetched when hydrating
pub const INITIAL_INTERACTION_LIMIT: usize = 100;

/// Authenticated user the remote calls act on behalf of
#[derive(Clone, PartialEq, Eq)]
pub struct UserContext {
    pub uid: String,
    pub id_token: String,
}

impl UserContext {
    pub fn new(uid: impl Into<String>, id_token: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            id_token: id_token.into(),
        }
    }
}

impl std::fmt::Debug for UserContext {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("UserContext")
            .field("uid", &self.uid)
            .field("id_token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Invalid remote store configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Remote store HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote store API error: {0}")]
    Api(String),
    #[error("Invalid remote document: {0}")]
    InvalidPayload(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// History pulled from the remote store at sign-in
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteSnapshot {
    pub matches: Vec<Match>,
    pub interactions: Vec<Decision>,
}

/// Operations the sync engine and account flows need from the cloud
pub trait RemoteStore: Send + Sync {
    /// Upsert the interaction document for a candidate
    fn save_interaction(
        &self,
        user: &UserContext,
        candidate_id: &CandidateId,
        outcome: Outcome,
    ) -> impl Future<Output = RemoteResult<()>> + Send;

    /// Upsert the denormalized match document
    fn save_match(
        &self,
        user: &UserContext,
        candidate: &Candidate,
    ) -> impl Future<Output = RemoteResult<()>> + Send;

    /// Delete the match and interaction documents in one batch
    fn delete_match(
        &self,
        user: &UserContext,
        candidate_id: &CandidateId,
    ) -> impl Future<Output = RemoteResult<()>> + Send;

    /// Newest matches and interactions for hydrating a fresh device
    fn fetch_initial_data(
        &self,
        user: &UserContext,
    ) -> impl Future<Output = RemoteResult<RemoteSnapshot>> + Send;

    /// Delete every match, interaction and the user document
    fn purge_user_data(&self, user: &UserContext) -> impl Future<Output = RemoteResult<()>> + Send;
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
    status: Option<String>,
}

/// Extract the Google API error message from a response body
pub(crate) fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(ApiErrorBody {
        error: Some(detail),
    }) = serde_json::from_str::<ApiErrorBody>(body)
    {
        if let Some(message) = detail.message.or(detail.status) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}
