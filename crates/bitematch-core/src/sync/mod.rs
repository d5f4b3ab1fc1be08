//! Local-first sync of swipe decisions to the remote store
//!
//! Decisions are written locally first and appended to a persisted queue.
//! [`SyncEngine::flush`] replays that queue against a [`RemoteStore`] once a
//! user is signed in. Only one flush runs at a time; entries whose writes
//! fail stay queued for the next flush.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use crate::error::Result;
use crate::models::{Candidate, CandidateId, Decision, Outcome, SyncQueueEntry};
use crate::remote::{RemoteResult, RemoteStore, UserContext};
use crate::services::DatabaseService;
use crate::state::SyncState;

/// Why a flush did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushSkip {
    NoUser,
    EmptyQueue,
    InFlight,
}

/// Result of one flush
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub attempted: usize,
    pub synced: usize,
    /// Candidates whose entries stay queued
    pub failed: Vec<CandidateId>,
    pub skipped: Option<FlushSkip>,
}

impl FlushReport {
    const fn skipped(reason: FlushSkip) -> Self {
        Self {
            attempted: 0,
            synced: 0,
            failed: Vec::new(),
            skipped: Some(reason),
        }
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Outcome of removing a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnmatchReport {
    pub removed_locally: bool,
    pub removed_remotely: bool,
}

/// Clears the in-flight flag however the flush ends.
///
/// A flush that exits while still `Syncing` bailed out early and is marked `Error`.
struct FlightGuard<'a> {
    in_flight: &'a AtomicBool,
    state: &'a Mutex<SyncState>,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if *state == SyncState::Syncing {
            tracing::warn!("Flush stopped before finishing; remaining entries stay queued");
            *state = SyncState::Error;
        }
        drop(state);
        self.in_flight.store(false, Ordering::Release);
    }
}

/// Queue owner and flush driver
pub struct SyncEngine<R> {
    db: DatabaseService,
    remote: Arc<R>,
    in_flight: Arc<AtomicBool>,
    state: Arc<Mutex<SyncState>>,
}

impl<R> Clone for SyncEngine<R> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            remote: Arc::clone(&self.remote),
            in_flight: Arc::clone(&self.in_flight),
            state: Arc::clone(&self.state),
        }
    }
}

impl<R: RemoteStore> SyncEngine<R> {
    pub fn new(db: DatabaseService, remote: Arc<R>) -> Self {
        Self {
            db,
            remote,
            in_flight: Arc::new(AtomicBool::new(false)),
            state: Arc::new(Mutex::new(SyncState::default())),
        }
    }

    #[must_use]
    pub const fn database(&self) -> &DatabaseService {
        &self.db
    }

    #[must_use]
    pub fn remote(&self) -> &R {
        &self.remote
    }

    #[must_use]
    pub fn state(&self) -> SyncState {
        *self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn set_state(&self, state: SyncState) {
        *self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = state;
    }

    #[must_use]
    pub fn is_flushing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Record a decision locally and queue it for the remote store
    pub async fn record(&self, candidate: &Candidate, outcome: Outcome) -> Result<Decision> {
        self.db.record_decision(candidate, outcome).await
    }

    pub async fn pending_count(&self) -> Result<usize> {
        self.db.pending_count().await
    }

    /// Replay the queue against the remote store
    pub async fn flush(&self, user: Option<&UserContext>) -> Result<FlushReport> {
        let Some(user) = user else {
            self.set_state(SyncState::Offline);
            return Ok(FlushReport::skipped(FlushSkip::NoUser));
        };

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Flush already in progress; skipping");
            return Ok(FlushReport::skipped(FlushSkip::InFlight));
        }
        let _guard = FlightGuard {
            in_flight: &self.in_flight,
            state: &self.state,
        };

        let entries = self.db.pending_entries().await?;
        if entries.is_empty() {
            self.set_state(SyncState::Synced);
            return Ok(FlushReport::skipped(FlushSkip::EmptyQueue));
        }

        self.set_state(SyncState::Syncing);
        let mut report = FlushReport {
            attempted: entries.len(),
            ..FlushReport::default()
        };
        // Later entries for a failed candidate wait so writes land in order
        let mut blocked: HashSet<CandidateId> = HashSet::new();

        for entry in entries {
            if blocked.contains(&entry.candidate_id) {
                continue;
            }

            match self.push_entry(user, &entry).await {
                Ok(()) => {
                    self.db.remove_entries(&[entry.seq]).await?;
                    report.synced += 1;
                }
                Err(error) => {
                    tracing::warn!(
                        "Failed to sync {} for {}: {}",
                        entry.outcome,
                        entry.candidate_id,
                        error
                    );
                    blocked.insert(entry.candidate_id.clone());
                    report.failed.push(entry.candidate_id);
                }
            }
        }

        if report.is_clean() {
            self.set_state(SyncState::Synced);
            tracing::info!("Synced {} queued decisions", report.synced);
        } else {
            self.set_state(SyncState::Error);
            tracing::info!(
                "Synced {} of {} queued decisions; {} left for the next flush",
                report.synced,
                report.attempted,
                report.attempted - report.synced
            );
        }
        Ok(report)
    }

    async fn push_entry(&self, user: &UserContext, entry: &SyncQueueEntry) -> RemoteResult<()> {
        self.remote
            .save_interaction(user, &entry.candidate_id, entry.outcome)
            .await?;

        if entry.outcome.is_like() {
            match &entry.candidate {
                Some(candidate) => self.remote.save_match(user, candidate).await?,
                None => tracing::warn!(
                    "Like for {} has no stored payload; match not mirrored",
                    entry.candidate_id
                ),
            }
        }
        Ok(())
    }

    /// Remove a match locally, then delete the remote pair when signed in
    pub async fn unmatch(
        &self,
        candidate_id: &CandidateId,
        user: Option<&UserContext>,
    ) -> Result<UnmatchReport> {
        let removed_locally = self.db.remove_match(candidate_id).await?;

        let removed_remotely = match user {
            Some(user) => match self.remote.delete_match(user, candidate_id).await {
                Ok(()) => true,
                Err(error) => {
                    tracing::warn!("Failed to delete remote match {candidate_id}: {error}");
                    false
                }
            },
            None => false,
        };

        Ok(UnmatchReport {
            removed_locally,
            removed_remotely,
        })
    }
}

impl<R: RemoteStore + 'static> SyncEngine<R> {
    /// Fire-and-forget flush on the tokio runtime
    pub fn spawn_flush(&self, user: Option<UserContext>) -> JoinHandle<Result<FlushReport>> {
        let engine = self.clone();
        tokio::spawn(async move { engine.flush(user.as_ref()).await })
    }
}
