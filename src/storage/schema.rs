//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Treeline database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Immutable content store of archived items, keyed by site identifier
CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY,
    parent_id INTEGER NOT NULL,
    title TEXT,
    url TEXT,
    author TEXT,
    body TEXT,
    score INTEGER,
    comment_count INTEGER,
    added_at TEXT,
    retrieved_at TEXT NOT NULL
);

-- Pending work queue, keyed by identifier so re-enqueueing overwrites
CREATE TABLE IF NOT EXISTS pending (
    id INTEGER PRIMARY KEY,
    enqueued_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pending_enqueued ON pending(enqueued_at);

-- Singleton coverage record (one row, id = 1)
CREATE TABLE IF NOT EXISTS coverage (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    low_bound INTEGER NOT NULL DEFAULT 0,
    upper_bound INTEGER NOT NULL DEFAULT 1,
    processed_count INTEGER NOT NULL DEFAULT 0
);

-- Singleton scheduler record (one row, id = 1)
CREATE TABLE IF NOT EXISTS scheduler (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    cursor INTEGER NOT NULL DEFAULT 0
);

-- Append-only log of fetched pages, never read back by the crawl logic
CREATE TABLE IF NOT EXISTS raw_pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    fetched_at TEXT NOT NULL,
    body BLOB NOT NULL
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
