//! Storage module for persisting archive data
//!
//! This module handles all database operations for the archiver, including:
//! - SQLite database initialization and schema management
//! - The immutable content store of archived items
//! - The pending work queue (FIFO by enqueue time)
//! - Coverage and scheduler singleton records
//! - The append-only raw page log

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::ArchiveError;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> Result<SqliteStorage, ArchiveError> {
    SqliteStorage::new(path)
}

/// An archived content item: a story or a comment
///
/// Once a row exists for an identifier it is never re-fetched or mutated;
/// existence is the sole dedup signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedItem {
    /// Site-assigned identifier, the universal key
    pub id: u64,

    /// Back-reference to the parent item. Root items carry a self-reference
    /// when the page showed no explicit parent link.
    pub parent: u64,

    /// Story title (root items only)
    pub title: Option<String>,

    /// Canonical URL (root items with an external link only)
    pub url: Option<String>,

    /// Author handle
    pub author: Option<String>,

    /// Body content as a normalized HTML fragment
    pub body: Option<String>,

    /// Score, when the metadata block showed one
    pub score: Option<i64>,

    /// Descendant comment count (root items only)
    pub comment_count: Option<i64>,

    /// Estimated creation time, derived from relative-age text. An
    /// approximation, not authoritative.
    pub added_at: Option<DateTime<Utc>>,

    /// When this record was written
    pub retrieved_at: DateTime<Utc>,
}

/// A pending work queue entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntry {
    pub id: u64,
    pub enqueued_at: DateTime<Utc>,
}

/// Singleton record tracking the known identifier range
///
/// `low_bound` is the highest identifier the gap scanner has confirmed as
/// fully covered; `upper_bound` is the highest identifier ever observed.
/// Both are monotonically non-decreasing. `processed_count` is a metric
/// only and never drives control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageState {
    pub low_bound: u64,
    pub upper_bound: u64,
    pub processed_count: u64,
}

impl Default for CoverageState {
    fn default() -> Self {
        Self {
            low_bound: 0,
            upper_bound: 1,
            processed_count: 0,
        }
    }
}

/// Singleton record holding the scheduler's position in the step cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchedulerState {
    pub cursor: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coverage_defaults() {
        let coverage = CoverageState::default();
        assert_eq!(coverage.low_bound, 0);
        assert_eq!(coverage.upper_bound, 1);
        assert_eq!(coverage.processed_count, 0);
    }

    #[test]
    fn test_scheduler_state_default() {
        assert_eq!(SchedulerState::default().cursor, 0);
    }
}
