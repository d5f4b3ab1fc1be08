//! Shared database service wrapper used across clients.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::{
    Database, FeedbackRepository, LibSqlFeedbackRepository, LibSqlSettingsRepository,
    LibSqlSwipeRepository, SettingsRepository, SwipeRepository,
};
use crate::models::{
    Candidate, CandidateId, Decision, DietaryPreferences, Feedback, Match, Outcome, SyncQueueEntry,
};
use crate::Result;

/// Thread-safe service for DB and repository operations.
#[derive(Clone)]
pub struct DatabaseService {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl DatabaseService {
    /// Open a database service at the given filesystem path.
    ///
    /// A file that is not a database is moved aside and a fresh store is created.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = match Database::open(&db_path).await {
            Ok(db) => db,
            Err(error) if Self::is_corrupted_db_error(&error) => {
                tracing::warn!(
                    "Local store at {} is unreadable: {}. Moving it aside and starting fresh.",
                    db_path.display(),
                    error
                );
                Self::quarantine_corrupted_db_files(&db_path)?;
                Database::open(&db_path).await?
            }
            Err(error) => return Err(error),
        };

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory database service (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    /// Filesystem location of the store, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn is_corrupted_db_error(error: &crate::Error) -> bool {
        let message = error.to_string().to_ascii_lowercase();
        message.contains("file is not a database") || message.contains("database disk image is malformed")
    }

    fn quarantine_corrupted_db_files(db_path: &Path) -> Result<()> {
        if db_path.exists() {
            let timestamp = chrono::Utc::now().timestamp_millis();
            let base_name = db_path
                .file_name()
                .map_or_else(|| "bitematch.db".into(), |name| name.to_string_lossy());
            let backup_path = db_path.with_file_name(format!("{base_name}.corrupt-{timestamp}"));

            std::fs::rename(db_path, &backup_path)?;
            tracing::warn!(
                "Moved corrupted local DB file from {} to {}",
                db_path.display(),
                backup_path.display()
            );
        }

        let Some(parent) = db_path.parent() else {
            return Ok(());
        };
        let Some(base_name) = db_path.file_name().and_then(|name| name.to_str()) else {
            return Ok(());
        };
        // WAL and shared-memory sidecars belong to the old file
        let sidecars = [format!("{base_name}-wal"), format!("{base_name}-shm")];

        for sidecar in sidecars {
            let path = parent.join(sidecar);
            if path.is_file() {
                std::fs::remove_file(&path)?;
                tracing::warn!("Removed stale sidecar file {}", path.display());
            }
        }

        Ok(())
    }

    /// Record a swipe decision.
    pub async fn record_decision(&self, candidate: &Candidate, outcome: Outcome) -> Result<Decision> {
        let db = self.db.lock().await;
        let repo = LibSqlSwipeRepository::new(db.connection());
        repo.record_decision(candidate, outcome).await
    }

    /// Fetch the decision for a candidate.
    pub async fn get_decision(&self, id: &CandidateId) -> Result<Option<Decision>> {
        let db = self.db.lock().await;
        let repo = LibSqlSwipeRepository::new(db.connection());
        repo.get_decision(id).await
    }

    /// Ids of every swiped candidate.
    pub async fn swiped_ids(&self) -> Result<HashSet<CandidateId>> {
        let db = self.db.lock().await;
        let repo = LibSqlSwipeRepository::new(db.connection());
        repo.swiped_ids().await
    }

    /// List matches newest-first.
    pub async fn list_matches(&self, limit: usize, offset: usize) -> Result<Vec<Match>> {
        let db = self.db.lock().await;
        let repo = LibSqlSwipeRepository::new(db.connection());
        repo.list_matches(limit, offset).await
    }

    /// Fetch a match by candidate id.
    pub async fn get_match(&self, id: &CandidateId) -> Result<Option<Match>> {
        let db = self.db.lock().await;
        let repo = LibSqlSwipeRepository::new(db.connection());
        repo.get_match(id).await
    }

    /// Remove a match locally.
    pub async fn remove_match(&self, id: &CandidateId) -> Result<bool> {
        let db = self.db.lock().await;
        let repo = LibSqlSwipeRepository::new(db.connection());
        repo.remove_match(id).await
    }

    /// Pending sync queue entries in append order.
    pub async fn pending_entries(&self) -> Result<Vec<SyncQueueEntry>> {
        let db = self.db.lock().await;
        let repo = LibSqlSwipeRepository::new(db.connection());
        repo.pending_entries().await
    }

    /// Number of pending sync queue entries.
    pub async fn pending_count(&self) -> Result<usize> {
        let db = self.db.lock().await;
        let repo = LibSqlSwipeRepository::new(db.connection());
        repo.pending_count().await
    }

    /// Drop flushed queue entries.
    pub async fn remove_entries(&self, seqs: &[i64]) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlSwipeRepository::new(db.connection());
        repo.remove_entries(seqs).await
    }

    /// Merge remote history into the local store.
    pub async fn hydrate(&self, matches: &[Match], decisions: &[Decision]) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlSwipeRepository::new(db.connection());
        repo.hydrate(matches, decisions).await
    }

    /// Clear matches, swiped-set and queue.
    pub async fn clear_store(&self) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlSwipeRepository::new(db.connection());
        repo.clear().await?;
        tracing::info!("Cleared local swipe store");
        Ok(())
    }

    /// Load dietary preferences.
    pub async fn load_preferences(&self) -> Result<DietaryPreferences> {
        let db = self.db.lock().await;
        let repo = LibSqlSettingsRepository::new(db.connection());
        repo.load_preferences().await
    }

    /// Save dietary preferences.
    pub async fn save_preferences(&self, preferences: &DietaryPreferences) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlSettingsRepository::new(db.connection());
        repo.save_preferences(preferences).await
    }

    /// Read a raw settings value.
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let db = self.db.lock().await;
        let repo = LibSqlSettingsRepository::new(db.connection());
        repo.get(key).await
    }

    /// Write a raw settings value.
    pub async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlSettingsRepository::new(db.connection());
        repo.set(key, value).await
    }

    /// Store a feedback submission.
    pub async fn save_feedback(&self, feedback: &Feedback) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlFeedbackRepository::new(db.connection());
        repo.save(feedback).await
    }

    /// List feedback submissions newest-first.
    pub async fn list_feedback(&self, limit: usize) -> Result<Vec<Feedback>> {
        let db = self.db.lock().await;
        let repo = LibSqlFeedbackRepository::new(db.connection());
        repo.list(limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn in_memory_like_and_list_roundtrip() {
        let service = DatabaseService::open_in_memory().await.unwrap();
        let candidate = Candidate::new(CandidateId::new("1").unwrap(), "Burger Haven");

        service
            .record_decision(&candidate, Outcome::Liked)
            .await
            .unwrap();
        let matches = service.list_matches(10, 0).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].candidate.name, "Burger Haven");
        assert_eq!(service.pending_count().await.unwrap(), 1);
    }

    #[test]
    fn detects_corrupted_db_errors() {
        assert!(DatabaseService::is_corrupted_db_error(
            &crate::Error::Database("SQLite failure: file is not a database".to_string())
        ));
        assert!(!DatabaseService::is_corrupted_db_error(
            &crate::Error::InvalidInput("candidate id cannot be empty".to_string())
        ));
    }

    #[test]
    fn quarantine_moves_db_and_removes_sidecars() {
        let test_dir = tempfile::tempdir().unwrap();
        let db_path = test_dir.path().join("bitematch.db");
        let wal_path = test_dir.path().join("bitematch.db-wal");
        let shm_path = test_dir.path().join("bitematch.db-shm");

        std::fs::write(&db_path, b"bad-db").unwrap();
        std::fs::write(&wal_path, b"wal").unwrap();
        std::fs::write(&shm_path, b"shm").unwrap();

        DatabaseService::quarantine_corrupted_db_files(&db_path).unwrap();

        assert!(!db_path.exists());
        assert!(!wal_path.exists());
        assert!(!shm_path.exists());

        let found_backup = std::fs::read_dir(test_dir.path())
            .unwrap()
            .filter_map(std::result::Result::ok)
            .any(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with("bitematch.db.corrupt-")
            });
        assert!(found_backup);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn open_path_recovers_from_garbage_file() {
        let test_dir = tempfile::tempdir().unwrap();
        let db_path = test_dir.path().join("bitematch.db");
        std::fs::write(&db_path, vec![0x42; 8192]).unwrap();

        let service = DatabaseService::open_path(&db_path).await.unwrap();
        assert_eq!(service.pending_count().await.unwrap(), 0);
        assert_eq!(service.path(), Some(db_path.as_path()));
    }
}
