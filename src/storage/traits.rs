//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{ArchivedItem, CoverageState, PendingEntry, SchedulerState};
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed by the crawl steps.
/// Multi-record bookkeeping updates are exposed as `commit_*` methods that
/// run as a single all-or-nothing transaction; everything else commits
/// independently.
pub trait Storage {
    // ===== Content Store =====

    /// Returns whether an archived item exists for the identifier
    fn has_item(&self, id: u64) -> StorageResult<bool>;

    /// Gets an archived item by identifier
    fn get_item(&self, id: u64) -> StorageResult<Option<ArchivedItem>>;

    /// Filters a set of identifiers down to those with no archived item
    ///
    /// This is the sole dedup check: pending entries are deliberately not
    /// consulted, since re-enqueueing a pending identifier is an overwrite.
    fn filter_unarchived(&self, ids: &BTreeSet<u64>) -> StorageResult<Vec<u64>>;

    /// Persists one archived item, committed on its own
    ///
    /// Records are written individually during parsing so that a later
    /// failure on the same page cannot roll back earlier records.
    fn put_item(&mut self, item: &ArchivedItem) -> StorageResult<()>;

    // ===== Raw Page Archive =====

    /// Appends one fetched page to the raw page log
    fn record_raw_page(&mut self, url: &str, body: &[u8]) -> StorageResult<()>;

    // ===== Work Queue =====

    /// Enqueues pending work for each identifier
    ///
    /// Already-pending identifiers are overwritten, not duplicated.
    fn enqueue_pending(&mut self, ids: &[u64]) -> StorageResult<()>;

    /// Returns the oldest pending entry without removing it
    ///
    /// The entry is deleted only when its processing attempt completes,
    /// via [`Storage::commit_processed`].
    fn oldest_pending(&self) -> StorageResult<Option<PendingEntry>>;

    /// Counts pending entries
    fn count_pending(&self) -> StorageResult<u64>;

    // ===== Singleton Records =====

    /// Loads the coverage record, or its defaults if absent
    fn coverage_state(&self) -> StorageResult<CoverageState>;

    /// Loads the scheduler record, or its defaults if absent
    fn scheduler_state(&self) -> StorageResult<SchedulerState>;

    /// Persists the scheduler record
    fn put_scheduler_state(&mut self, state: &SchedulerState) -> StorageResult<()>;

    // ===== Atomic Units =====

    /// Commits a listing discovery: the raised coverage bound (when one was
    /// raised) and the pending inserts, all-or-nothing
    fn commit_discovery(
        &mut self,
        coverage: Option<&CoverageState>,
        ids: &[u64],
    ) -> StorageResult<()>;

    /// Commits a gap-scan advance: the moved scan cursor and the single
    /// pending insert, all-or-nothing
    fn commit_scan_advance(&mut self, coverage: &CoverageState, enqueue: u64) -> StorageResult<()>;

    /// Commits the bookkeeping for one processed item: enqueue the
    /// discovered identifiers, delete the finished pending entry, and bump
    /// the processed-count metric, all-or-nothing
    fn commit_processed(
        &mut self,
        pending_id: u64,
        discovered: &[u64],
        records_persisted: u64,
    ) -> StorageResult<()>;

    // ===== Statistics =====

    /// Counts archived items
    fn count_items(&self) -> StorageResult<u64>;

    /// Counts entries in the raw page log
    fn count_raw_pages(&self) -> StorageResult<u64>;
}
