//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.
//! The `commit_*` methods wrap their statements in one transaction each;
//! every other write commits independently.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageResult};
use crate::storage::{ArchivedItem, CoverageState, PendingEntry, SchedulerState};
use crate::ArchiveError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    pub fn new(path: &Path) -> Result<Self, ArchiveError> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, ArchiveError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    value.parse::<DateTime<Utc>>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn map_item_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ArchivedItem> {
    let added_at: Option<String> = row.get(8)?;
    let retrieved_at: String = row.get(9)?;

    Ok(ArchivedItem {
        id: row.get::<_, i64>(0)? as u64,
        parent: row.get::<_, i64>(1)? as u64,
        title: row.get(2)?,
        url: row.get(3)?,
        author: row.get(4)?,
        body: row.get(5)?,
        score: row.get(6)?,
        comment_count: row.get(7)?,
        added_at: added_at.as_deref().map(|s| parse_timestamp(8, s)).transpose()?,
        retrieved_at: parse_timestamp(9, &retrieved_at)?,
    })
}

/// Inserts pending entries for each identifier on the given connection
///
/// Shared between the standalone enqueue and the transactional commits.
fn enqueue_ids(conn: &Connection, ids: &[u64]) -> rusqlite::Result<()> {
    let now = Utc::now().to_rfc3339();
    let mut stmt = conn.prepare("INSERT OR REPLACE INTO pending (id, enqueued_at) VALUES (?1, ?2)")?;
    for id in ids {
        stmt.execute(params![*id as i64, now])?;
    }
    Ok(())
}

fn put_coverage(conn: &Connection, coverage: &CoverageState) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO coverage (id, low_bound, upper_bound, processed_count)
         VALUES (1, ?1, ?2, ?3)",
        params![
            coverage.low_bound as i64,
            coverage.upper_bound as i64,
            coverage.processed_count as i64
        ],
    )?;
    Ok(())
}

impl Storage for SqliteStorage {
    // ===== Content Store =====

    fn has_item(&self, id: u64) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM items WHERE id = ?1",
                params![id as i64],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn get_item(&self, id: u64) -> StorageResult<Option<ArchivedItem>> {
        let item = self
            .conn
            .query_row(
                "SELECT id, parent_id, title, url, author, body, score, comment_count,
                 added_at, retrieved_at FROM items WHERE id = ?1",
                params![id as i64],
                map_item_row,
            )
            .optional()?;
        Ok(item)
    }

    fn filter_unarchived(&self, ids: &BTreeSet<u64>) -> StorageResult<Vec<u64>> {
        let mut stmt = self.conn.prepare("SELECT 1 FROM items WHERE id = ?1")?;

        let mut unarchived = Vec::new();
        for &id in ids {
            // Identifier 0 is the sentinel parent, never a real item
            if id == 0 {
                continue;
            }
            let found: Option<i64> = stmt
                .query_row(params![id as i64], |row| row.get(0))
                .optional()?;
            if found.is_none() {
                unarchived.push(id);
            }
        }

        Ok(unarchived)
    }

    fn put_item(&mut self, item: &ArchivedItem) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO items
             (id, parent_id, title, url, author, body, score, comment_count, added_at, retrieved_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                item.id as i64,
                item.parent as i64,
                item.title,
                item.url,
                item.author,
                item.body,
                item.score,
                item.comment_count,
                item.added_at.map(|t| t.to_rfc3339()),
                item.retrieved_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ===== Raw Page Archive =====

    fn record_raw_page(&mut self, url: &str, body: &[u8]) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO raw_pages (url, fetched_at, body) VALUES (?1, ?2, ?3)",
            params![url, now, body],
        )?;
        Ok(())
    }

    // ===== Work Queue =====

    fn enqueue_pending(&mut self, ids: &[u64]) -> StorageResult<()> {
        enqueue_ids(&self.conn, ids)?;
        Ok(())
    }

    fn oldest_pending(&self) -> StorageResult<Option<PendingEntry>> {
        let entry = self
            .conn
            .query_row(
                "SELECT id, enqueued_at FROM pending ORDER BY enqueued_at ASC, id ASC LIMIT 1",
                [],
                |row| {
                    let enqueued_at: String = row.get(1)?;
                    Ok(PendingEntry {
                        id: row.get::<_, i64>(0)? as u64,
                        enqueued_at: parse_timestamp(1, &enqueued_at)?,
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }

    fn count_pending(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM pending", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Singleton Records =====

    fn coverage_state(&self) -> StorageResult<CoverageState> {
        let state = self
            .conn
            .query_row(
                "SELECT low_bound, upper_bound, processed_count FROM coverage WHERE id = 1",
                [],
                |row| {
                    Ok(CoverageState {
                        low_bound: row.get::<_, i64>(0)? as u64,
                        upper_bound: row.get::<_, i64>(1)? as u64,
                        processed_count: row.get::<_, i64>(2)? as u64,
                    })
                },
            )
            .optional()?;
        Ok(state.unwrap_or_default())
    }

    fn scheduler_state(&self) -> StorageResult<SchedulerState> {
        let state = self
            .conn
            .query_row("SELECT cursor FROM scheduler WHERE id = 1", [], |row| {
                Ok(SchedulerState {
                    cursor: row.get::<_, i64>(0)? as usize,
                })
            })
            .optional()?;
        Ok(state.unwrap_or_default())
    }

    fn put_scheduler_state(&mut self, state: &SchedulerState) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO scheduler (id, cursor) VALUES (1, ?1)",
            params![state.cursor as i64],
        )?;
        Ok(())
    }

    // ===== Atomic Units =====

    fn commit_discovery(
        &mut self,
        coverage: Option<&CoverageState>,
        ids: &[u64],
    ) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        if let Some(coverage) = coverage {
            put_coverage(&tx, coverage)?;
        }
        enqueue_ids(&tx, ids)?;
        tx.commit()?;
        Ok(())
    }

    fn commit_scan_advance(&mut self, coverage: &CoverageState, enqueue: u64) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        put_coverage(&tx, coverage)?;
        enqueue_ids(&tx, &[enqueue])?;
        tx.commit()?;
        Ok(())
    }

    fn commit_processed(
        &mut self,
        pending_id: u64,
        discovered: &[u64],
        records_persisted: u64,
    ) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        enqueue_ids(&tx, discovered)?;
        tx.execute(
            "DELETE FROM pending WHERE id = ?1",
            params![pending_id as i64],
        )?;
        tx.execute("INSERT OR IGNORE INTO coverage (id) VALUES (1)", [])?;
        tx.execute(
            "UPDATE coverage SET processed_count = processed_count + ?1 WHERE id = 1",
            params![records_persisted as i64],
        )?;
        tx.commit()?;
        Ok(())
    }

    // ===== Statistics =====

    fn count_items(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_raw_pages(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM raw_pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item(id: u64, parent: u64) -> ArchivedItem {
        ArchivedItem {
            id,
            parent,
            title: Some(format!("Item {}", id)),
            url: None,
            author: Some("alice".to_string()),
            body: None,
            score: Some(10),
            comment_count: None,
            added_at: None,
            retrieved_at: Utc::now(),
        }
    }

    #[test]
    fn test_create_in_memory() {
        let storage = SqliteStorage::new_in_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_put_and_get_item() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let item = sample_item(42, 42);
        storage.put_item(&item).unwrap();

        assert!(storage.has_item(42).unwrap());
        let loaded = storage.get_item(42).unwrap().unwrap();
        assert_eq!(loaded.title, Some("Item 42".to_string()));
        assert_eq!(loaded.author, Some("alice".to_string()));
        assert_eq!(loaded.parent, 42);
    }

    #[test]
    fn test_get_missing_item() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        assert!(!storage.has_item(7).unwrap());
        assert!(storage.get_item(7).unwrap().is_none());
    }

    #[test]
    fn test_filter_unarchived() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.put_item(&sample_item(5, 5)).unwrap();

        let ids: BTreeSet<u64> = [0, 5, 9, 12].into_iter().collect();
        let unarchived = storage.filter_unarchived(&ids).unwrap();

        // 5 is archived, 0 is the sentinel
        assert_eq!(unarchived, vec![9, 12]);
    }

    #[test]
    fn test_enqueue_is_overwrite_not_duplicate() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.enqueue_pending(&[9]).unwrap();
        storage.enqueue_pending(&[9]).unwrap();
        assert_eq!(storage.count_pending().unwrap(), 1);
    }

    #[test]
    fn test_oldest_pending_fifo() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.enqueue_pending(&[5, 3]).unwrap();

        // Same enqueue timestamp, so identifier order breaks the tie
        let entry = storage.oldest_pending().unwrap().unwrap();
        assert_eq!(entry.id, 3);
    }

    #[test]
    fn test_oldest_pending_empty() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        assert!(storage.oldest_pending().unwrap().is_none());
    }

    #[test]
    fn test_coverage_defaults_when_absent() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let coverage = storage.coverage_state().unwrap();
        assert_eq!(coverage, CoverageState::default());
    }

    #[test]
    fn test_scheduler_state_roundtrip() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        assert_eq!(storage.scheduler_state().unwrap().cursor, 0);

        storage
            .put_scheduler_state(&SchedulerState { cursor: 7 })
            .unwrap();
        assert_eq!(storage.scheduler_state().unwrap().cursor, 7);
    }

    #[test]
    fn test_commit_discovery_raises_bound_and_enqueues() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let coverage = CoverageState {
            low_bound: 0,
            upper_bound: 12,
            processed_count: 0,
        };
        storage
            .commit_discovery(Some(&coverage), &[5, 9, 12])
            .unwrap();

        assert_eq!(storage.coverage_state().unwrap().upper_bound, 12);
        assert_eq!(storage.count_pending().unwrap(), 3);
    }

    #[test]
    fn test_commit_processed_deletes_and_counts() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.enqueue_pending(&[100]).unwrap();

        storage.commit_processed(100, &[101, 102], 3).unwrap();

        assert_eq!(storage.count_pending().unwrap(), 2);
        assert!(storage.oldest_pending().unwrap().unwrap().id != 100);
        assert_eq!(storage.coverage_state().unwrap().processed_count, 3);
    }

    #[test]
    fn test_commit_processed_preserves_existing_coverage() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let coverage = CoverageState {
            low_bound: 4,
            upper_bound: 20,
            processed_count: 1,
        };
        storage.commit_discovery(Some(&coverage), &[]).unwrap();

        storage.enqueue_pending(&[10]).unwrap();
        storage.commit_processed(10, &[], 2).unwrap();

        let loaded = storage.coverage_state().unwrap();
        assert_eq!(loaded.low_bound, 4);
        assert_eq!(loaded.upper_bound, 20);
        assert_eq!(loaded.processed_count, 3);
    }

    #[test]
    fn test_record_raw_page_appends() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.record_raw_page("https://example.com/", b"<html>").unwrap();
        storage.record_raw_page("https://example.com/", b"<html>").unwrap();
        assert_eq!(storage.count_raw_pages().unwrap(), 2);
    }
}
