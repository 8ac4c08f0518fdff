//! Outbox of remote writes awaiting replay.
//!
//! When the hybrid coordinator cannot mirror a local change to the remote
//! store, the change is recorded here instead of being dropped. Entries live
//! in the same database as the posts so they survive restarts.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use tracing::debug;

use crate::error::{Error, Result};

use super::{format_timestamp, now, parse_timestamp, LocalStore};

/// A remote write that can be replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncOperation {
    /// Upload the current local record.
    Put,
    /// Delete the remote document.
    Delete,
    /// Add one view to the remote document.
    IncrementViews,
}

impl SyncOperation {
    /// The name stored in the database.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Put => "put",
            Self::Delete => "delete",
            Self::IncrementViews => "increment_views",
        }
    }
}

impl std::fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SyncOperation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "put" => Ok(Self::Put),
            "delete" => Ok(Self::Delete),
            "increment_views" => Ok(Self::IncrementViews),
            other => Err(Error::internal(format!("unknown sync operation: {other}"))),
        }
    }
}

/// One queued remote write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSync {
    /// Queue position; lower entries are older.
    pub seq: i64,
    /// The post the write concerns.
    pub post_id: String,
    /// What to replay.
    pub operation: SyncOperation,
    /// Failed attempts so far, including the original one.
    pub attempts: u32,
    /// Error from the most recent attempt.
    pub last_error: Option<String>,
    /// When the entry was first queued.
    pub queued_at: DateTime<Utc>,
}

impl LocalStore {
    /// Queue a remote write that just failed.
    ///
    /// A `Put` for a post that already has one queued only refreshes the
    /// error, since replay uploads whatever the local record is by then.
    /// Returns the entry's sequence number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn enqueue_sync(
        &self,
        post_id: &str,
        operation: SyncOperation,
        error: &str,
    ) -> Result<i64> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        if operation == SyncOperation::Put {
            let existing: Option<i64> = tx
                .query_row(
                    "SELECT seq FROM pending_sync WHERE post_id = ?1 AND operation = ?2",
                    params![post_id, operation.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(seq) = existing {
                tx.execute(
                    "UPDATE pending_sync SET last_error = ?2 WHERE seq = ?1",
                    params![seq, error],
                )?;
                tx.commit()?;
                return Ok(seq);
            }
        }

        tx.execute(
            r"
            INSERT INTO pending_sync (post_id, operation, attempts, last_error, queued_at)
            VALUES (?1, ?2, 1, ?3, ?4)
            ",
            params![post_id, operation.as_str(), error, format_timestamp(now())],
        )?;
        let seq = tx.last_insert_rowid();
        tx.commit()?;

        debug!("Queued {} for post {} (entry {})", operation, post_id, seq);
        Ok(seq)
    }

    /// All queued writes, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn pending_syncs(&self) -> Result<Vec<PendingSync>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r"
            SELECT seq, post_id, operation, attempts, last_error, queued_at
            FROM pending_sync ORDER BY seq ASC
            ",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    parse_timestamp(5, &row.get::<_, String>(5)?)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(seq, post_id, op, attempts, last_error, queued_at)| {
                Ok(PendingSync {
                    seq,
                    post_id,
                    operation: op.parse()?,
                    attempts: u32::try_from(attempts).unwrap_or(u32::MAX),
                    last_error,
                    queued_at,
                })
            })
            .collect()
    }

    /// Number of queued writes.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn pending_sync_count(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM pending_sync", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Remove an entry after a successful replay (or when it is abandoned).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn complete_sync(&self, seq: i64) -> Result<bool> {
        let conn = self.lock()?;
        let affected = conn.execute("DELETE FROM pending_sync WHERE seq = ?1", [seq])?;
        Ok(affected > 0)
    }

    /// Record another failed replay. Returns the new attempt count.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn record_sync_failure(&self, seq: i64, error: &str) -> Result<u32> {
        let conn = self.lock()?;
        let attempts: Option<i64> = conn
            .query_row(
                r"
                UPDATE pending_sync SET attempts = attempts + 1, last_error = ?2
                WHERE seq = ?1 RETURNING attempts
                ",
                params![seq, error],
                |row| row.get(0),
            )
            .optional()?;
        let attempts =
            attempts.ok_or_else(|| Error::internal(format!("outbox entry {seq} vanished")))?;
        Ok(u32::try_from(attempts).unwrap_or(u32::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> LocalStore {
        LocalStore::open_in_memory().expect("failed to create test store")
    }

    #[test]
    fn test_sync_operation_round_trip_names() {
        for op in [
            SyncOperation::Put,
            SyncOperation::Delete,
            SyncOperation::IncrementViews,
        ] {
            assert_eq!(op.as_str().parse::<SyncOperation>().unwrap(), op);
        }
        assert!("upsert".parse::<SyncOperation>().is_err());
    }

    #[test]
    fn test_enqueue_and_list() {
        let store = create_test_store();
        store
            .enqueue_sync("a", SyncOperation::Put, "connection refused")
            .unwrap();
        store
            .enqueue_sync("b", SyncOperation::Delete, "timeout")
            .unwrap();

        let pending = store.pending_syncs().unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].post_id, "a");
        assert_eq!(pending[0].operation, SyncOperation::Put);
        assert_eq!(pending[0].attempts, 1);
        assert_eq!(pending[0].last_error.as_deref(), Some("connection refused"));
        assert_eq!(pending[1].operation, SyncOperation::Delete);
        assert_eq!(store.pending_sync_count().unwrap(), 2);
    }

    #[test]
    fn test_put_entries_coalesce() {
        let store = create_test_store();
        let first = store.enqueue_sync("a", SyncOperation::Put, "e1").unwrap();
        let second = store.enqueue_sync("a", SyncOperation::Put, "e2").unwrap();

        assert_eq!(first, second);
        let pending = store.pending_syncs().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].last_error.as_deref(), Some("e2"));
    }

    #[test]
    fn test_increment_entries_accumulate() {
        let store = create_test_store();
        store
            .enqueue_sync("a", SyncOperation::IncrementViews, "down")
            .unwrap();
        store
            .enqueue_sync("a", SyncOperation::IncrementViews, "down")
            .unwrap();
        assert_eq!(store.pending_sync_count().unwrap(), 2);
    }

    #[test]
    fn test_complete_sync() {
        let store = create_test_store();
        let seq = store.enqueue_sync("a", SyncOperation::Put, "down").unwrap();

        assert!(store.complete_sync(seq).unwrap());
        assert!(!store.complete_sync(seq).unwrap());
        assert_eq!(store.pending_sync_count().unwrap(), 0);
    }

    #[test]
    fn test_record_sync_failure() {
        let store = create_test_store();
        let seq = store.enqueue_sync("a", SyncOperation::Put, "down").unwrap();

        assert_eq!(store.record_sync_failure(seq, "still down").unwrap(), 2);
        assert_eq!(store.record_sync_failure(seq, "again").unwrap(), 3);

        let pending = store.pending_syncs().unwrap();
        assert_eq!(pending[0].attempts, 3);
        assert_eq!(pending[0].last_error.as_deref(), Some("again"));
    }

    #[test]
    fn test_record_sync_failure_unknown_entry() {
        let store = create_test_store();
        assert!(store.record_sync_failure(42, "x").is_err());
    }

    #[test]
    fn test_stats_count_pending() {
        let store = create_test_store();
        store.enqueue_sync("a", SyncOperation::Delete, "x").unwrap();
        assert_eq!(store.stats().unwrap().pending_sync, 1);
    }
}
