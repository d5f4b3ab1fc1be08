//! Database migrations

use crate::error::Result;
use libsql::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        migrate_v1(conn).await?;
    }
    if version < 2 {
        migrate_v2(conn).await?;
    }

    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Migration to version 1: swipe history, matches and the sync queue
async fn migrate_v1(conn: &Connection) -> Result<()> {
    let statements = [
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        // One row per candidate; re-swiping overwrites
        "CREATE TABLE IF NOT EXISTS decisions (
            candidate_id TEXT PRIMARY KEY,
            outcome TEXT NOT NULL CHECK (outcome IN ('like', 'dislike')),
            decided_at INTEGER NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_decisions_decided ON decisions(decided_at DESC)",
        // Denormalized candidate payload for offline display
        "CREATE TABLE IF NOT EXISTS matches (
            candidate_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            payload TEXT NOT NULL,
            matched_at INTEGER NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_matches_matched ON matches(matched_at DESC)",
        "CREATE TABLE IF NOT EXISTS sync_queue (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            candidate_id TEXT NOT NULL,
            outcome TEXT NOT NULL CHECK (outcome IN ('like', 'dislike')),
            decided_at INTEGER NOT NULL,
            payload TEXT
        )",
        "CREATE INDEX IF NOT EXISTS idx_sync_queue_candidate ON sync_queue(candidate_id)",
        // Settings table (local only)
        "CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        "INSERT INTO schema_version (version) VALUES (1)",
    ];

    apply(conn, 1, &statements).await
}

/// Migration to version 2: locally kept feedback submissions
async fn migrate_v2(conn: &Connection) -> Result<()> {
    let statements = [
        "CREATE TABLE IF NOT EXISTS feedback (
            id TEXT PRIMARY KEY,
            mood INTEGER NOT NULL CHECK (mood BETWEEN 1 AND 5),
            areas TEXT NOT NULL,
            comment TEXT,
            created_at INTEGER NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_feedback_created ON feedback(created_at DESC)",
        "INSERT INTO schema_version (version) VALUES (2)",
    ];

    apply(conn, 2, &statements).await
}

/// Run one migration's statements inside a transaction
async fn apply(conn: &Connection, version: i32, statements: &[&str]) -> Result<()> {
    // libsql doesn't have execute_batch for parameterless DDL lists
    conn.execute("BEGIN TRANSACTION", ()).await?;

    for stmt in statements {
        if let Err(e) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    tracing::info!("Migrated database to version {version} (latest {CURRENT_VERSION})");
    Ok(())
}
