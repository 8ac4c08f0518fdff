//! `SQLite` schema definitions for casebook.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the posts table.
///
/// `seq` preserves insertion order for posts created within the same
/// timestamp.
pub const CREATE_POSTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS posts (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE,
    excerpt TEXT NOT NULL,
    content TEXT NOT NULL,
    status TEXT NOT NULL,
    author TEXT NOT NULL,
    category TEXT NOT NULL,
    publish_date TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    views INTEGER NOT NULL DEFAULT 0 CHECK (views >= 0),
    image_url TEXT,
    image_alt TEXT,
    meta_title TEXT,
    meta_description TEXT
)
";

/// SQL statement to create an index on creation time for listings.
pub const CREATE_CREATED_AT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at DESC)
";

/// SQL statement to create an index on status for public listings.
pub const CREATE_STATUS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_posts_status ON posts(status)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// SQL statement to create the outbox of remote writes awaiting replay.
///
/// Added in schema version 2.
pub const CREATE_PENDING_SYNC_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS pending_sync (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id TEXT NOT NULL,
    operation TEXT NOT NULL,
    attempts INTEGER NOT NULL DEFAULT 0,
    last_error TEXT,
    queued_at TEXT NOT NULL
)
";

/// SQL statement to index the outbox by post.
pub const CREATE_PENDING_SYNC_POST_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_pending_sync_post ON pending_sync(post_id, operation)
";

/// Base schema statements (version 1) in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_POSTS_TABLE,
    CREATE_CREATED_AT_INDEX,
    CREATE_STATUS_INDEX,
    CREATE_METADATA_TABLE,
];

/// Columns selected for a full post row, in the order `row_to_post` reads them.
pub const POST_COLUMNS: &str = "id, title, slug, excerpt, content, status, author, category, \
     publish_date, created_at, updated_at, views, image_url, image_alt, meta_title, \
     meta_description";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.is_empty());
        }
    }

    #[test]
    fn test_create_posts_table_contains_required_columns() {
        assert!(CREATE_POSTS_TABLE.contains("id TEXT NOT NULL UNIQUE"));
        assert!(CREATE_POSTS_TABLE.contains("slug TEXT NOT NULL UNIQUE"));
        assert!(CREATE_POSTS_TABLE.contains("status TEXT NOT NULL"));
        assert!(CREATE_POSTS_TABLE.contains("views INTEGER NOT NULL DEFAULT 0"));
    }

    #[test]
    fn test_post_columns_are_in_table() {
        for column in POST_COLUMNS.split(',').map(str::trim) {
            assert!(CREATE_POSTS_TABLE.contains(column), "missing column {column}");
        }
    }

    #[test]
    fn test_create_metadata_table_structure() {
        assert!(CREATE_METADATA_TABLE.contains("key TEXT PRIMARY KEY"));
        assert!(CREATE_METADATA_TABLE.contains("value TEXT NOT NULL"));
    }

    #[test]
    fn test_pending_sync_not_in_base_schema() {
        assert!(!SCHEMA_STATEMENTS.contains(&CREATE_PENDING_SYNC_TABLE));
    }
}
