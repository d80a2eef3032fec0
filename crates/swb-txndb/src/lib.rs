// SPDX-License-Identifier: MIT OR Apache-2.0
//! swb-txndb
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! The transaction database (spec §4.9): one append-only, newline-
//! delimited JSON record per finished transaction, hydrated into memory
//! on open so queries (`most-recent-N`, `GetTimeSinceAction`) never touch
//! disk on the hot path.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use swb_core::Role;
use swb_results::TransactionPast;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::RwLock;

/// Errors opening, reading, or appending to the transaction database.
#[derive(Debug, thiserror::Error)]
pub enum TxnDbError {
    /// Underlying filesystem I/O failed.
    #[error("transaction database I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A stored record could not be parsed as JSON.
    #[error("corrupt transaction database record: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Append-only store of [`TransactionPast`] records.
pub struct TransactionDb {
    path: PathBuf,
    cache: RwLock<Vec<TransactionPast>>,
}

impl TransactionDb {
    /// Open (creating if absent) the database file at `path`, hydrating
    /// every existing record into memory.
    ///
    /// # Errors
    ///
    /// Returns [`TxnDbError`] if the file cannot be read or a line fails
    /// to parse.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, TxnDbError> {
        let path = path.into();
        let cache = Self::hydrate(&path).await?;
        Ok(Self { path, cache: RwLock::new(cache) })
    }

    async fn hydrate(path: &Path) -> Result<Vec<TransactionPast>, TxnDbError> {
        let Ok(file) = tokio::fs::File::open(path).await else {
            return Ok(Vec::new());
        };
        let mut lines = BufReader::new(file).lines();
        let mut out = Vec::new();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            out.push(serde_json::from_str(&line)?);
        }
        tracing::info!(count = out.len(), path = %path.display(), "hydrated transaction database");
        Ok(out)
    }

    /// Append one finished-transaction record, persisting it immediately.
    ///
    /// # Errors
    ///
    /// Returns [`TxnDbError::Io`] if the write fails. The in-memory cache
    /// is only updated after the write succeeds.
    pub async fn append(&self, record: TransactionPast) -> Result<(), TxnDbError> {
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path).await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        self.cache.write().await.push(record);
        Ok(())
    }

    /// The most recent `n` transactions, newest first. `n == 0` means
    /// "all of them" (spec §9 open-question resolution for
    /// `GetOldTransactions(0)`).
    pub async fn recent(&self, n: usize) -> Vec<TransactionPast> {
        let cache = self.cache.read().await;
        let take = if n == 0 { cache.len() } else { n.min(cache.len()) };
        cache.iter().rev().take(take).cloned().collect()
    }

    /// Seconds since the most recent successful completion of `role`, if
    /// any is on record. Backs `GetTimeSinceAction` (spec §4.7).
    pub async fn seconds_since_last(&self, role: Role, now: DateTime<Utc>) -> Option<i64> {
        let cache = self.cache.read().await;
        cache
            .iter()
            .rev()
            .find(|t| t.role == role && t.succeeded)
            .map(|t| (now - t.timespec).num_seconds().max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(role: Role, succeeded: bool, timespec: DateTime<Utc>) -> TransactionPast {
        TransactionPast {
            tid: "/transactions/1".into(),
            timespec,
            succeeded,
            role,
            duration_ms: 1234,
            data: String::new(),
            uid: 1000,
            cmdline: "swbctl install vim".into(),
        }
    }

    #[tokio::test]
    async fn append_then_recent_round_trips_and_orders_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let db = TransactionDb::open(dir.path().join("history.jsonl")).await.unwrap();
        let t0 = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let t1 = t0 + chrono::Duration::hours(1);
        db.append(sample(Role::InstallPackages, true, t0)).await.unwrap();
        db.append(sample(Role::RemovePackages, true, t1)).await.unwrap();

        let recent = db.recent(1).await;
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].role, Role::RemovePackages);

        let all = db.recent(0).await;
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn reopen_hydrates_prior_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let t0 = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        {
            let db = TransactionDb::open(&path).await.unwrap();
            db.append(sample(Role::Resolve, true, t0)).await.unwrap();
        }
        let db = TransactionDb::open(&path).await.unwrap();
        assert_eq!(db.recent(0).await.len(), 1);
    }

    #[tokio::test]
    async fn seconds_since_last_ignores_failed_runs() {
        let dir = tempfile::tempdir().unwrap();
        let db = TransactionDb::open(dir.path().join("history.jsonl")).await.unwrap();
        let t0 = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        db.append(sample(Role::RefreshCache, false, t0)).await.unwrap();
        let now = t0 + chrono::Duration::seconds(90);
        assert_eq!(db.seconds_since_last(Role::RefreshCache, now).await, None);

        db.append(sample(Role::RefreshCache, true, t0)).await.unwrap();
        assert_eq!(db.seconds_since_last(Role::RefreshCache, now).await, Some(90));
    }
}
