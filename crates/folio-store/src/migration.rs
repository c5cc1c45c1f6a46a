//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL
//! batch that transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Documents table: one row per document record
        CREATE TABLE documents (
            id BLOB PRIMARY KEY,              -- 16 bytes
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            owner BLOB NOT NULL,              -- 16 bytes, immutable
            visibility TEXT NOT NULL,         -- 'private' | 'public' | 'link'
            link_token TEXT,                  -- 64-char lowercase hex, NULL unless link
            is_starred INTEGER NOT NULL DEFAULT 0,
            version INTEGER NOT NULL,         -- optimistic-concurrency counter
            created_at INTEGER NOT NULL,      -- Unix ms
            updated_at INTEGER NOT NULL
        );

        -- Tokens are globally unique. SQLite treats NULLs as distinct, so
        -- non-link documents do not collide.
        CREATE UNIQUE INDEX idx_documents_link_token ON documents(link_token);
        CREATE INDEX idx_documents_owner ON documents(owner);
        CREATE INDEX idx_documents_created ON documents(created_at);
        CREATE INDEX idx_documents_updated ON documents(updated_at);

        -- Share grants: at most one entry per (document, user)
        CREATE TABLE document_shares (
            document_id BLOB NOT NULL,
            user_id BLOB NOT NULL,
            permission TEXT NOT NULL,         -- 'read' | 'edit'
            PRIMARY KEY (document_id, user_id)
        );
        CREATE INDEX idx_shares_user ON document_shares(user_id);

        -- Document/tag relation
        CREATE TABLE document_tags (
            document_id BLOB NOT NULL,
            tag_id BLOB NOT NULL,
            PRIMARY KEY (document_id, tag_id)
        );
        CREATE INDEX idx_document_tags_tag ON document_tags(tag_id);

        -- Global tag records, lazily created, names unique and normalized
        CREATE TABLE tags (
            id BLOB PRIMARY KEY,              -- 16 bytes
            name TEXT NOT NULL UNIQUE,
            created_at INTEGER NOT NULL
        );
        "#,
    )?;

    Ok(())
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creates_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"documents".to_string()));
        assert!(tables.contains(&"document_shares".to_string()));
        assert!(tables.contains(&"document_tags".to_string()));
        assert!(tables.contains(&"tags".to_string()));
        assert!(tables.contains(&"schema_migrations".to_string()));
    }

    #[test]
    fn test_migration_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();

        let version: u32 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }
}
