// src/seen_store.rs
//! Durable record of job identity keys processed in prior runs.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, warn};

/// Append-only store of previously processed postings. Backed by SQLite;
/// falls back to an in-memory set for the run when the database cannot be
/// opened, so an unavailable store degrades to "everything unseen" instead
/// of aborting.
pub struct SeenJobStore {
    backend: Backend,
}

enum Backend {
    Sqlite(SqlitePool),
    Memory(Mutex<HashMap<String, DateTime<Utc>>>),
}

impl SeenJobStore {
    /// Open the store at the given path, creating the database and schema
    /// on first use.
    pub async fn open(path: &Path) -> Self {
        match Self::connect(path).await {
            Ok(pool) => Self {
                backend: Backend::Sqlite(pool),
            },
            Err(e) => {
                warn!(
                    "Seen-job store unavailable at {} ({e:#}); continuing with an empty in-memory store",
                    path.display()
                );
                Self::in_memory()
            }
        }
    }

    /// Store that lives only for the current run.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Mutex::new(HashMap::new())),
        }
    }

    async fn connect(path: &Path) -> Result<SqlitePool> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        let database_url = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&database_url)
            .await
            .with_context(|| format!("Failed to connect to database: {}", path.display()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS seen_jobs (
                key TEXT PRIMARY KEY,
                first_seen TEXT NOT NULL
            );
            "#,
        )
        .execute(&pool)
        .await
        .context("Failed to run seen_jobs migration")?;

        info!("Seen-job store ready: {}", path.display());
        Ok(pool)
    }

    /// True iff a posting with this key was recorded in any prior run or
    /// earlier in the current one.
    pub async fn contains(&self, key: &str) -> Result<bool> {
        match &self.backend {
            Backend::Sqlite(pool) => {
                let row: Option<(i64,)> =
                    sqlx::query_as("SELECT 1 FROM seen_jobs WHERE key = ? LIMIT 1")
                        .bind(key)
                        .fetch_optional(pool)
                        .await
                        .context("Failed to query seen_jobs")?;
                Ok(row.is_some())
            }
            Backend::Memory(map) => Ok(map.lock().expect("seen store lock").contains_key(key)),
        }
    }

    /// Record a key. Idempotent: the first-seen timestamp of an
    /// already-present key is never overwritten.
    pub async fn record(&self, key: &str, first_seen: DateTime<Utc>) -> Result<()> {
        match &self.backend {
            Backend::Sqlite(pool) => {
                sqlx::query("INSERT OR IGNORE INTO seen_jobs (key, first_seen) VALUES (?, ?)")
                    .bind(key)
                    .bind(first_seen.to_rfc3339())
                    .execute(pool)
                    .await
                    .context("Failed to insert into seen_jobs")?;
                Ok(())
            }
            Backend::Memory(map) => {
                map.lock()
                    .expect("seen store lock")
                    .entry(key.to_string())
                    .or_insert(first_seen);
                Ok(())
            }
        }
    }

    /// First-seen timestamp for a key, if recorded.
    pub async fn first_seen(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        match &self.backend {
            Backend::Sqlite(pool) => {
                let row: Option<(String,)> =
                    sqlx::query_as("SELECT first_seen FROM seen_jobs WHERE key = ?")
                        .bind(key)
                        .fetch_optional(pool)
                        .await
                        .context("Failed to query seen_jobs")?;
                row.map(|(raw,)| {
                    DateTime::parse_from_rfc3339(&raw)
                        .map(|dt| dt.with_timezone(&Utc))
                        .with_context(|| format!("Corrupt first_seen timestamp: {raw}"))
                })
                .transpose()
            }
            Backend::Memory(map) => Ok(map.lock().expect("seen store lock").get(key).copied()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[tokio::test]
    async fn test_memory_read_your_writes() {
        let store = SeenJobStore::in_memory();
        assert!(!store.contains("https://x/1").await.unwrap());

        store.record("https://x/1", ts(1_700_000_000)).await.unwrap();
        assert!(store.contains("https://x/1").await.unwrap());
        assert!(!store.contains("https://x/2").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_record_is_idempotent() {
        let store = SeenJobStore::in_memory();
        store.record("k", ts(100)).await.unwrap();
        store.record("k", ts(200)).await.unwrap();

        assert_eq!(store.first_seen("k").await.unwrap(), Some(ts(100)));
    }

    #[tokio::test]
    async fn test_sqlite_round_trip_and_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("seen.db");

        let store = SeenJobStore::open(&db_path).await;
        store.record("https://x/1", ts(100)).await.unwrap();
        store.record("https://x/1", ts(200)).await.unwrap();
        assert!(store.contains("https://x/1").await.unwrap());
        assert_eq!(store.first_seen("https://x/1").await.unwrap(), Some(ts(100)));
        drop(store);

        // Keys survive a reopen
        let store = SeenJobStore::open(&db_path).await;
        assert!(store.contains("https://x/1").await.unwrap());
        assert!(!store.contains("https://x/2").await.unwrap());
    }
}
