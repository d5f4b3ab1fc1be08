//! In-process `RemoteStore` used by tests and offline demos

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use super::{
    RemoteError, RemoteResult, RemoteSnapshot, RemoteStore, UserContext,
    INITIAL_INTERACTION_LIMIT, INITIAL_MATCH_LIMIT,
};
use crate::models::{Candidate, CandidateId, Decision, Match, Outcome};
use crate::util::unix_millis_now;

#[derive(Default)]
struct Collections {
    interactions: BTreeMap<(String, CandidateId), Decision>,
    matches: BTreeMap<(String, CandidateId), Match>,
    failing: HashSet<CandidateId>,
}

/// Remote store kept in memory, with failure injection
#[derive(Clone)]
pub struct MemoryRemoteStore {
    collections: Arc<Mutex<Collections>>,
    unavailable: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
    paused: Arc<watch::Sender<bool>>,
    parked: Arc<AtomicUsize>,
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemoteStore {
    #[must_use]
    pub fn new() -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            collections: Arc::new(Mutex::new(Collections::default())),
            unavailable: Arc::new(AtomicBool::new(false)),
            writes: Arc::new(AtomicUsize::new(0)),
            paused: Arc::new(paused),
            parked: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Collections> {
        self.collections
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Make every write for this candidate fail
    pub fn fail_for(&self, candidate_id: &CandidateId) {
        self.lock().failing.insert(candidate_id.clone());
    }

    pub fn clear_failures(&self) {
        self.lock().failing.clear();
    }

    /// Make every call fail, as if the network were down
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Hold every call until `resume` is called
    pub fn pause(&self) {
        self.paused.send_replace(true);
    }

    pub fn resume(&self) {
        self.paused.send_replace(false);
    }

    /// Calls currently held by `pause`
    #[must_use]
    pub fn parked_calls(&self) -> usize {
        self.parked.load(Ordering::SeqCst)
    }

    /// Number of successful document writes
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn seed_match(&self, uid: &str, candidate: Candidate, matched_at: i64) {
        let key = (uid.to_string(), candidate.id.clone());
        self.lock().matches.insert(
            key,
            Match {
                candidate,
                matched_at,
            },
        );
    }

    pub fn seed_interaction(&self, uid: &str, decision: Decision) {
        let key = (uid.to_string(), decision.candidate_id.clone());
        self.lock().interactions.insert(key, decision);
    }

    /// Stored interactions for a user
    #[must_use]
    pub fn interactions(&self, uid: &str) -> Vec<Decision> {
        self.lock()
            .interactions
            .iter()
            .filter(|((owner, _), _)| owner == uid)
            .map(|(_, decision)| decision.clone())
            .collect()
    }

    /// Stored matches for a user
    #[must_use]
    pub fn matches(&self, uid: &str) -> Vec<Match> {
        self.lock()
            .matches
            .iter()
            .filter(|((owner, _), _)| owner == uid)
            .map(|(_, stored)| stored.clone())
            .collect()
    }

    async fn gate(&self, candidate_id: Option<&CandidateId>) -> RemoteResult<()> {
        let mut paused = self.paused.subscribe();
        if *paused.borrow_and_update() {
            self.parked.fetch_add(1, Ordering::SeqCst);
            // The sender lives in self, so the channel cannot close here
            let _ = paused.wait_for(|held| !*held).await;
            self.parked.fetch_sub(1, Ordering::SeqCst);
        }

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RemoteError::Api("remote store unavailable (503)".to_string()));
        }
        if let Some(id) = candidate_id {
            if self.lock().failing.contains(id) {
                return Err(RemoteError::Api(format!("write rejected for {id} (500)")));
            }
        }
        Ok(())
    }
}

impl RemoteStore for MemoryRemoteStore {
    async fn save_interaction(
        &self,
        user: &UserContext,
        candidate_id: &CandidateId,
        outcome: Outcome,
    ) -> RemoteResult<()> {
        self.gate(Some(candidate_id)).await?;
        let decision = Decision {
            candidate_id: candidate_id.clone(),
            outcome,
            decided_at: unix_millis_now(),
        };
        self.lock()
            .interactions
            .insert((user.uid.clone(), candidate_id.clone()), decision);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn save_match(&self, user: &UserContext, candidate: &Candidate) -> RemoteResult<()> {
        self.gate(Some(&candidate.id)).await?;
        self.seed_match(&user.uid, candidate.clone(), unix_millis_now());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_match(&self, user: &UserContext, candidate_id: &CandidateId) -> RemoteResult<()> {
        self.gate(Some(candidate_id)).await?;
        let key = (user.uid.clone(), candidate_id.clone());
        let mut collections = self.lock();
        collections.matches.remove(&key);
        collections.interactions.remove(&key);
        Ok(())
    }

    async fn fetch_initial_data(&self, user: &UserContext) -> RemoteResult<RemoteSnapshot> {
        self.gate(None).await?;

        let mut matches = self.matches(&user.uid);
        matches.sort_by(|a, b| b.matched_at.cmp(&a.matched_at));
        matches.truncate(INITIAL_MATCH_LIMIT);

        let mut interactions = self.interactions(&user.uid);
        interactions.sort_by(|a, b| b.decided_at.cmp(&a.decided_at));
        interactions.truncate(INITIAL_INTERACTION_LIMIT);

        Ok(RemoteSnapshot {
            matches,
            interactions,
        })
    }

    async fn purge_user_data(&self, user: &UserContext) -> RemoteResult<()> {
        self.gate(None).await?;
        let mut collections = self.lock();
        collections.matches.retain(|(owner, _), _| owner != &user.uid);
        collections
            .interactions
            .retain(|(owner, _), _| owner != &user.uid);
        Ok(())
    }
}
