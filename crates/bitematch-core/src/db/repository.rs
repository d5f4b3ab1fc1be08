//! Swipe history, match and sync queue repository

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::models::{Candidate, CandidateId, Decision, Match, Outcome, SyncQueueEntry};
use crate::util::unix_millis_now;
use libsql::{Connection, Row, Value};

/// Trait for local swipe storage operations (async)
#[allow(async_fn_in_trait)]
pub trait SwipeRepository {
    /// Record a decision, update the liked-set and append a queue entry
    async fn record_decision(&self, candidate: &Candidate, outcome: Outcome) -> Result<Decision>;

    /// Get the decision recorded for a candidate
    async fn get_decision(&self, id: &CandidateId) -> Result<Option<Decision>>;

    /// Ids of every candidate that has a decision
    async fn swiped_ids(&self) -> Result<HashSet<CandidateId>>;

    /// List matches, newest first
    async fn list_matches(&self, limit: usize, offset: usize) -> Result<Vec<Match>>;

    /// Get a single match
    async fn get_match(&self, id: &CandidateId) -> Result<Option<Match>>;

    /// Remove a match together with its decision and any queued entries
    async fn remove_match(&self, id: &CandidateId) -> Result<bool>;

    /// Pending queue entries in append order
    async fn pending_entries(&self) -> Result<Vec<SyncQueueEntry>>;

    /// Number of pending queue entries
    async fn pending_count(&self) -> Result<usize>;

    /// Drop queue entries that were written remotely
    async fn remove_entries(&self, seqs: &[i64]) -> Result<()>;

    /// Merge remotely stored history without overriding local decisions
    async fn hydrate(&self, matches: &[Match], decisions: &[Decision]) -> Result<()>;

    /// Reset matches, swiped-set and queue
    async fn clear(&self) -> Result<()>;
}

/// libSQL implementation of `SwipeRepository`
pub struct LibSqlSwipeRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlSwipeRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Execute statements atomically
    async fn execute_all(&self, statements: Vec<(&str, Vec<Value>)>) -> Result<()> {
        self.conn.execute("BEGIN TRANSACTION", ()).await?;

        for (sql, params) in statements {
            if let Err(e) = self.conn.execute(sql, params).await {
                self.conn.execute("ROLLBACK", ()).await.ok();
                return Err(e.into());
            }
        }

        if let Err(e) = self.conn.execute("COMMIT", ()).await {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
        Ok(())
    }

    fn parse_decision(row: &Row) -> Result<Decision> {
        let id: String = row.get(0)?;
        let outcome: String = row.get(1)?;
        Ok(Decision {
            candidate_id: CandidateId::new(id)?,
            outcome: parse_outcome(&outcome)?,
            decided_at: row.get(2)?,
        })
    }

    fn parse_match(row: &Row) -> Result<Match> {
        let payload: String = row.get(0)?;
        Ok(Match {
            candidate: serde_json::from_str(&payload)?,
            matched_at: row.get(1)?,
        })
    }

    fn parse_entry(row: &Row) -> Result<SyncQueueEntry> {
        let id: String = row.get(1)?;
        let outcome: String = row.get(2)?;
        let candidate = match row.get_value(4)? {
            Value::Text(payload) => Some(serde_json::from_str::<Candidate>(&payload)?),
            _ => None,
        };
        Ok(SyncQueueEntry {
            seq: row.get(0)?,
            candidate_id: CandidateId::new(id)?,
            outcome: parse_outcome(&outcome)?,
            decided_at: row.get(3)?,
            candidate,
        })
    }
}

fn parse_outcome(raw: &str) -> Result<Outcome> {
    raw.parse()
        .map_err(|_| Error::Database(format!("invalid stored outcome '{raw}'")))
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

#[allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/OFFSET
const fn integer(value: usize) -> Value {
    Value::Integer(value as i64)
}

impl SwipeRepository for LibSqlSwipeRepository<'_> {
    async fn record_decision(&self, candidate: &Candidate, outcome: Outcome) -> Result<Decision> {
        let decision = Decision {
            candidate_id: candidate.id.clone(),
            outcome,
            decided_at: unix_millis_now(),
        };
        let id = candidate.id.as_str();

        let mut statements = vec![(
            "INSERT INTO decisions (candidate_id, outcome, decided_at) VALUES (?, ?, ?)
             ON CONFLICT(candidate_id) DO UPDATE SET outcome = excluded.outcome, decided_at = excluded.decided_at",
            vec![
                text(id),
                text(outcome.as_str()),
                Value::Integer(decision.decided_at),
            ],
        )];

        let payload = if outcome.is_like() {
            let payload = serde_json::to_string(candidate)?;
            statements.push((
                "INSERT INTO matches (candidate_id, name, payload, matched_at) VALUES (?, ?, ?, ?)
                 ON CONFLICT(candidate_id) DO UPDATE SET name = excluded.name, payload = excluded.payload",
                vec![
                    text(id),
                    text(&candidate.name),
                    text(&payload),
                    Value::Integer(decision.decided_at),
                ],
            ));
            Value::Text(payload)
        } else {
            statements.push(("DELETE FROM matches WHERE candidate_id = ?", vec![text(id)]));
            Value::Null
        };

        statements.push((
            "INSERT INTO sync_queue (candidate_id, outcome, decided_at, payload) VALUES (?, ?, ?, ?)",
            vec![
                text(id),
                text(outcome.as_str()),
                Value::Integer(decision.decided_at),
                payload,
            ],
        ));

        self.execute_all(statements).await?;
        tracing::debug!("Recorded {} for {}", outcome, candidate.id);
        Ok(decision)
    }

    async fn get_decision(&self, id: &CandidateId) -> Result<Option<Decision>> {
        let mut rows = self
            .conn
            .query(
                "SELECT candidate_id, outcome, decided_at FROM decisions WHERE candidate_id = ?",
                [id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_decision(&row)?)),
            None => Ok(None),
        }
    }

    async fn swiped_ids(&self) -> Result<HashSet<CandidateId>> {
        let mut rows = self
            .conn
            .query("SELECT candidate_id FROM decisions", ())
            .await?;

        let mut ids = HashSet::new();
        while let Some(row) = rows.next().await? {
            let id: String = row.get(0)?;
            ids.insert(CandidateId::new(id)?);
        }
        Ok(ids)
    }

    async fn list_matches(&self, limit: usize, offset: usize) -> Result<Vec<Match>> {
        let mut rows = self
            .conn
            .query(
                "SELECT payload, matched_at FROM matches
                 ORDER BY matched_at DESC, candidate_id ASC
                 LIMIT ? OFFSET ?",
                vec![integer(limit), integer(offset)],
            )
            .await?;

        let mut matches = Vec::new();
        while let Some(row) = rows.next().await? {
            matches.push(Self::parse_match(&row)?);
        }
        Ok(matches)
    }

    async fn get_match(&self, id: &CandidateId) -> Result<Option<Match>> {
        let mut rows = self
            .conn
            .query(
                "SELECT payload, matched_at FROM matches WHERE candidate_id = ?",
                [id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_match(&row)?)),
            None => Ok(None),
        }
    }

    async fn remove_match(&self, id: &CandidateId) -> Result<bool> {
        let existed = self.get_match(id).await?.is_some();
        self.execute_all(vec![
            ("DELETE FROM matches WHERE candidate_id = ?", vec![text(id.as_str())]),
            ("DELETE FROM decisions WHERE candidate_id = ?", vec![text(id.as_str())]),
            ("DELETE FROM sync_queue WHERE candidate_id = ?", vec![text(id.as_str())]),
        ])
        .await?;
        Ok(existed)
    }

    async fn pending_entries(&self) -> Result<Vec<SyncQueueEntry>> {
        let mut rows = self
            .conn
            .query(
                "SELECT seq, candidate_id, outcome, decided_at, payload FROM sync_queue ORDER BY seq ASC",
                (),
            )
            .await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(Self::parse_entry(&row)?);
        }
        Ok(entries)
    }

    async fn pending_count(&self) -> Result<usize> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM sync_queue", ())
            .await?;

        let count: i64 = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => 0,
        };
        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn remove_entries(&self, seqs: &[i64]) -> Result<()> {
        if seqs.is_empty() {
            return Ok(());
        }
        let statements = seqs
            .iter()
            .map(|seq| ("DELETE FROM sync_queue WHERE seq = ?", vec![Value::Integer(*seq)]))
            .collect();
        self.execute_all(statements).await
    }

    async fn hydrate(&self, matches: &[Match], decisions: &[Decision]) -> Result<()> {
        let mut statements = Vec::with_capacity(matches.len() + decisions.len());

        for decision in decisions {
            statements.push((
                "INSERT OR IGNORE INTO decisions (candidate_id, outcome, decided_at) VALUES (?, ?, ?)",
                vec![
                    text(decision.candidate_id.as_str()),
                    text(decision.outcome.as_str()),
                    Value::Integer(decision.decided_at),
                ],
            ));
        }

        for remote_match in matches {
            let candidate = &remote_match.candidate;
            // A local dislike recorded after the remote like wins
            statements.push((
                "INSERT OR IGNORE INTO matches (candidate_id, name, payload, matched_at)
                 SELECT ?1, ?2, ?3, ?4
                 WHERE NOT EXISTS (
                     SELECT 1 FROM decisions WHERE candidate_id = ?1 AND outcome = 'dislike'
                 )",
                vec![
                    text(candidate.id.as_str()),
                    text(&candidate.name),
                    text(&serde_json::to_string(candidate)?),
                    Value::Integer(remote_match.matched_at),
                ],
            ));
            statements.push((
                "INSERT OR IGNORE INTO decisions (candidate_id, outcome, decided_at) VALUES (?, 'like', ?)",
                vec![
                    text(candidate.id.as_str()),
                    Value::Integer(remote_match.matched_at),
                ],
            ));
        }

        self.execute_all(statements).await?;
        tracing::debug!(
            "Hydrated {} matches and {} decisions from remote",
            matches.len(),
            decisions.len()
        );
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.execute_all(vec![
            ("DELETE FROM matches", Vec::new()),
            ("DELETE FROM decisions", Vec::new()),
            ("DELETE FROM sync_queue", Vec::new()),
        ])
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::PriceLevel;
    use pretty_assertions::assert_eq;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn candidate(id: &str, name: &str) -> Candidate {
        let mut candidate = Candidate::new(CandidateId::new(id).unwrap(), name);
        candidate.rating = Some(4.5);
        candidate.price_level = PriceLevel::new(2);
        candidate
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_like_creates_match_and_queue_entry() {
        let db = setup().await;
        let repo = LibSqlSwipeRepository::new(db.connection());

        let burger = candidate("1", "Burger Haven");
        repo.record_decision(&burger, Outcome::Liked).await.unwrap();

        let matches = repo.list_matches(10, 0).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].candidate, burger);

        let entries = repo.pending_entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].outcome, Outcome::Liked);
        assert_eq!(entries[0].candidate.as_ref(), Some(&burger));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_dislike_has_no_match_or_payload() {
        let db = setup().await;
        let repo = LibSqlSwipeRepository::new(db.connection());

        repo.record_decision(&candidate("2", "Sushi Zen"), Outcome::Disliked)
            .await
            .unwrap();

        assert!(repo.list_matches(10, 0).await.unwrap().is_empty());
        let entries = repo.pending_entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].candidate.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_reswipe_last_write_wins() {
        let db = setup().await;
        let repo = LibSqlSwipeRepository::new(db.connection());
        let pizza = candidate("3", "Pizza Palace");

        repo.record_decision(&pizza, Outcome::Liked).await.unwrap();
        repo.record_decision(&pizza, Outcome::Disliked).await.unwrap();

        let decision = repo.get_decision(&pizza.id).await.unwrap().unwrap();
        assert_eq!(decision.outcome, Outcome::Disliked);
        assert!(repo.get_match(&pizza.id).await.unwrap().is_none());
        assert_eq!(repo.swiped_ids().await.unwrap().len(), 1);
        // Both writes still need to reach the remote store in order
        assert_eq!(repo.pending_count().await.unwrap(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_remove_entries_keeps_others() {
        let db = setup().await;
        let repo = LibSqlSwipeRepository::new(db.connection());

        repo.record_decision(&candidate("1", "A"), Outcome::Liked)
            .await
            .unwrap();
        repo.record_decision(&candidate("2", "B"), Outcome::Disliked)
            .await
            .unwrap();

        let entries = repo.pending_entries().await.unwrap();
        assert!(entries[0].seq < entries[1].seq);

        repo.remove_entries(&[entries[0].seq]).await.unwrap();
        let remaining = repo.pending_entries().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].candidate_id.as_str(), "2");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_remove_match_drops_decision_and_queue() {
        let db = setup().await;
        let repo = LibSqlSwipeRepository::new(db.connection());
        let burger = candidate("1", "Burger Haven");

        repo.record_decision(&burger, Outcome::Liked).await.unwrap();
        assert!(repo.remove_match(&burger.id).await.unwrap());
        assert!(!repo.remove_match(&burger.id).await.unwrap());

        assert!(repo.swiped_ids().await.unwrap().is_empty());
        assert_eq!(repo.pending_count().await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_hydrate_keeps_local_decisions() {
        let db = setup().await;
        let repo = LibSqlSwipeRepository::new(db.connection());
        let burger = candidate("1", "Burger Haven");
        let sushi = candidate("2", "Sushi Zen");

        repo.record_decision(&burger, Outcome::Disliked)
            .await
            .unwrap();

        let remote_matches = vec![
            Match {
                candidate: burger.clone(),
                matched_at: 10,
            },
            Match {
                candidate: sushi.clone(),
                matched_at: 20,
            },
        ];
        repo.hydrate(&remote_matches, &[]).await.unwrap();

        let burger_decision = repo.get_decision(&burger.id).await.unwrap().unwrap();
        assert_eq!(burger_decision.outcome, Outcome::Disliked);
        assert!(repo.get_match(&burger.id).await.unwrap().is_none());

        let sushi_match = repo.get_match(&sushi.id).await.unwrap().unwrap();
        assert_eq!(sushi_match.matched_at, 20);
        assert_eq!(repo.swiped_ids().await.unwrap().len(), 2);
        // Hydration never queues writes back to the remote store
        assert_eq!(repo.pending_count().await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_clear_resets_everything() {
        let db = setup().await;
        let repo = LibSqlSwipeRepository::new(db.connection());

        repo.record_decision(&candidate("1", "A"), Outcome::Liked)
            .await
            .unwrap();
        repo.record_decision(&candidate("2", "B"), Outcome::Disliked)
            .await
            .unwrap();

        repo.clear().await.unwrap();

        assert!(repo.list_matches(10, 0).await.unwrap().is_empty());
        assert!(repo.swiped_ids().await.unwrap().is_empty());
        assert_eq!(repo.pending_count().await.unwrap(), 0);
    }
}
