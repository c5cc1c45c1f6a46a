//! SQLite implementation of the store traits.
//!
//! This is the primary storage backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via `tokio::task::spawn_blocking`. Share grants
//! and tag attachments live in relation tables so the access filter and the
//! tag filter compile to plain SQL.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use folio_core::{
    validate_document, Document, DocumentId, LinkToken, ShareEntry, Tag, TagId, UserId,
};

use crate::error::{Result, StoreError};
use crate::filter::{AccessScope, DocumentFilter, SortField, SortOrder, SortSpec};
use crate::migration;
use crate::traits::{
    check_share_entries, permission_from_column, visibility_from_column, DocumentPatch,
    DocumentStore, NewDocumentRecord, TagStore, UpdateOutcome,
};

/// SQLite-based store implementing both [`DocumentStore`] and [`TagStore`].
///
/// Thread-safe via an internal Mutex. All operations run on the blocking
/// thread pool to avoid stalling the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        tracing::debug!(version = migration::CURRENT_VERSION, "sqlite store opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Background(e.to_string()))?
    }
}

/// Whether an error is a SQLite uniqueness/constraint violation.
fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(rusqlite::ErrorCode::ConstraintViolation)
    )
}

/// Narrow a 16-byte blob column.
fn bytes16(bytes: Vec<u8>, column: &str) -> Result<[u8; 16]> {
    bytes
        .try_into()
        .map_err(|_| StoreError::InvalidData(format!("column {column} is not 16 bytes")))
}

/// Raw column values of one documents row, prior to hydration.
struct RawDocument {
    id: Vec<u8>,
    title: String,
    content: String,
    owner: Vec<u8>,
    visibility: String,
    link_token: Option<String>,
    is_starred: bool,
    version: i64,
    created_at: i64,
    updated_at: i64,
}

const DOC_COLUMNS: &str =
    "d.id, d.title, d.content, d.owner, d.visibility, d.link_token, d.is_starred, \
     d.version, d.created_at, d.updated_at";

fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawDocument> {
    Ok(RawDocument {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        owner: row.get(3)?,
        visibility: row.get(4)?,
        link_token: row.get(5)?,
        is_starred: row.get(6)?,
        version: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

/// Attach share and tag relations and produce the full record.
fn hydrate(conn: &Connection, raw: RawDocument) -> Result<Document> {
    let id = DocumentId::from_bytes(bytes16(raw.id, "id")?);

    let mut stmt = conn.prepare_cached(
        "SELECT user_id, permission FROM document_shares WHERE document_id = ?1 ORDER BY user_id",
    )?;
    let shared_with = stmt
        .query_map(params![id.as_bytes().as_slice()], |row| {
            Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?
        .into_iter()
        .map(|(user, permission)| {
            Ok(ShareEntry::new(
                UserId::from_bytes(bytes16(user, "user_id")?),
                permission_from_column(&permission)?,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut stmt = conn
        .prepare_cached("SELECT tag_id FROM document_tags WHERE document_id = ?1")?;
    let tags = stmt
        .query_map(params![id.as_bytes().as_slice()], |row| {
            row.get::<_, Vec<u8>>(0)
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?
        .into_iter()
        .map(|bytes| Ok(TagId::from_bytes(bytes16(bytes, "tag_id")?)))
        .collect::<Result<BTreeSet<_>>>()?;

    let link_token = raw
        .link_token
        .map(|hex| {
            LinkToken::from_hex(&hex)
                .map_err(|e| StoreError::InvalidData(format!("stored token: {e}")))
        })
        .transpose()?;

    Ok(Document {
        id,
        title: raw.title,
        content: raw.content,
        owner: UserId::from_bytes(bytes16(raw.owner, "owner")?),
        shared_with,
        visibility: visibility_from_column(&raw.visibility)?,
        link_token,
        tags,
        is_starred: raw.is_starred,
        version: raw.version as u64,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
    })
}

/// Whether a documents row exists for `id`.
fn document_exists(conn: &Connection, id: &DocumentId) -> Result<bool> {
    let hit: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM documents WHERE id = ?1",
            params![id.as_bytes().as_slice()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(hit.is_some())
}

/// Load one document by id, with relations.
fn load_document(conn: &Connection, id: &DocumentId) -> Result<Option<Document>> {
    let raw = conn
        .query_row(
            &format!("SELECT {DOC_COLUMNS} FROM documents d WHERE d.id = ?1"),
            params![id.as_bytes().as_slice()],
            row_to_raw,
        )
        .optional()?;

    raw.map(|raw| hydrate(conn, raw)).transpose()
}

/// Compile a [`DocumentFilter`] to a WHERE clause and its parameters.
fn filter_sql(filter: &DocumentFilter) -> (String, Vec<Value>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    const SHARED: &str =
        "EXISTS (SELECT 1 FROM document_shares s WHERE s.document_id = d.id AND s.user_id = ?)";

    match filter.scope {
        AccessScope::Owned(user) => {
            clauses.push("d.owner = ?".into());
            values.push(Value::Blob(user.as_bytes().to_vec()));
        }
        AccessScope::SharedWith(user) => {
            clauses.push(format!("d.owner != ? AND {SHARED}"));
            values.push(Value::Blob(user.as_bytes().to_vec()));
            values.push(Value::Blob(user.as_bytes().to_vec()));
        }
        AccessScope::OwnedOrShared(user) => {
            clauses.push(format!("(d.owner = ? OR {SHARED})"));
            values.push(Value::Blob(user.as_bytes().to_vec()));
            values.push(Value::Blob(user.as_bytes().to_vec()));
        }
    }

    if let Some(needle) = &filter.search {
        clauses.push("(instr(lower(d.title), ?) > 0 OR instr(lower(d.content), ?) > 0)".into());
        let needle = needle.to_lowercase();
        values.push(Value::Text(needle.clone()));
        values.push(Value::Text(needle));
    }

    if let Some(tags) = &filter.tags {
        if tags.is_empty() {
            // Tag names that resolved to nothing match nothing.
            clauses.push("0 = 1".into());
        } else {
            let placeholders = vec!["?"; tags.len()].join(", ");
            clauses.push(format!(
                "EXISTS (SELECT 1 FROM document_tags t \
                 WHERE t.document_id = d.id AND t.tag_id IN ({placeholders}))"
            ));
            for tag in tags {
                values.push(Value::Blob(tag.as_bytes().to_vec()));
            }
        }
    }

    if filter.starred_only {
        clauses.push("d.is_starred = 1".into());
    }

    (clauses.join(" AND "), values)
}

/// ORDER BY clause for a sort spec, including the identifier tiebreak.
fn order_sql(sort: &SortSpec) -> String {
    let field = match sort.field {
        SortField::CreatedAt => "d.created_at",
        SortField::UpdatedAt => "d.updated_at",
        SortField::Title => "d.title",
    };
    let dir = match sort.order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    format!("{field} {dir}, d.id ASC")
}

fn insert_share_rows(conn: &Connection, id: &DocumentId, entries: &[ShareEntry]) -> Result<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO document_shares (document_id, user_id, permission) VALUES (?1, ?2, ?3)",
    )?;
    for entry in entries {
        stmt.execute(params![
            id.as_bytes().as_slice(),
            entry.user.as_bytes().as_slice(),
            entry.permission.as_str(),
        ])?;
    }
    Ok(())
}

fn insert_tag_rows(conn: &Connection, id: &DocumentId, tags: &BTreeSet<TagId>) -> Result<()> {
    let mut stmt = conn
        .prepare_cached("INSERT INTO document_tags (document_id, tag_id) VALUES (?1, ?2)")?;
    for tag in tags {
        stmt.execute(params![id.as_bytes().as_slice(), tag.as_bytes().as_slice()])?;
    }
    Ok(())
}

/// Whether any other document already holds `token`.
fn token_taken(conn: &Connection, token: &LinkToken, except: Option<&DocumentId>) -> Result<bool> {
    let holder: Option<Vec<u8>> = conn
        .query_row(
            "SELECT id FROM documents WHERE link_token = ?1",
            params![token.to_hex()],
            |row| row.get(0),
        )
        .optional()?;

    Ok(match holder {
        Some(id) => except.map_or(true, |keep| id != keep.as_bytes().as_slice()),
        None => false,
    })
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn insert(&self, record: NewDocumentRecord) -> Result<Document> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            if let Some(token) = &record.link_token {
                if token_taken(&tx, token, None)? {
                    return Err(StoreError::Conflict("link token already in use".into()));
                }
            }
            check_share_entries(&record.shared_with, &record.owner)?;

            let mut id = DocumentId::generate();
            while document_exists(&tx, &id)? {
                id = DocumentId::generate();
            }

            let now = now_millis();
            let doc = Document {
                id,
                title: record.title,
                content: record.content,
                owner: record.owner,
                shared_with: record.shared_with,
                visibility: record.visibility,
                link_token: record.link_token,
                tags: record.tags,
                is_starred: record.is_starred,
                version: 1,
                created_at: now,
                updated_at: now,
            };
            validate_document(&doc).map_err(|e| StoreError::InvalidData(e.to_string()))?;

            tx.execute(
                "INSERT INTO documents (
                    id, title, content, owner, visibility, link_token,
                    is_starred, version, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    doc.id.as_bytes().as_slice(),
                    doc.title,
                    doc.content,
                    doc.owner.as_bytes().as_slice(),
                    doc.visibility.as_str(),
                    doc.link_token.map(|t| t.to_hex()),
                    doc.is_starred,
                    doc.version as i64,
                    doc.created_at,
                    doc.updated_at,
                ],
            )?;
            insert_share_rows(&tx, &doc.id, &doc.shared_with)?;
            insert_tag_rows(&tx, &doc.id, &doc.tags)?;

            tx.commit()?;
            Ok(doc)
        })
        .await
    }

    async fn get(&self, id: &DocumentId) -> Result<Option<Document>> {
        let id = *id;
        self.with_conn(move |conn| load_document(conn, &id)).await
    }

    async fn find_by_link_token(&self, token: &LinkToken) -> Result<Option<Document>> {
        let token = *token;
        self.with_conn(move |conn| {
            let raw = conn
                .query_row(
                    &format!(
                        "SELECT {DOC_COLUMNS} FROM documents d \
                         WHERE d.link_token = ?1 AND d.visibility = 'link'"
                    ),
                    params![token.to_hex()],
                    row_to_raw,
                )
                .optional()?;
            raw.map(|raw| hydrate(conn, raw)).transpose()
        })
        .await
    }

    async fn find_page(
        &self,
        filter: &DocumentFilter,
        sort: &SortSpec,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Document>> {
        let filter = filter.clone();
        let sort = *sort;
        self.with_conn(move |conn| {
            let (where_sql, mut values) = filter_sql(&filter);
            let sql = format!(
                "SELECT {DOC_COLUMNS} FROM documents d WHERE {where_sql} \
                 ORDER BY {} LIMIT ? OFFSET ?",
                order_sql(&sort)
            );
            values.push(Value::Integer(limit as i64));
            values.push(Value::Integer(skip as i64));

            let mut stmt = conn.prepare(&sql)?;
            let raws = stmt
                .query_map(params_from_iter(values.iter()), row_to_raw)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            drop(stmt);

            raws.into_iter().map(|raw| hydrate(conn, raw)).collect()
        })
        .await
    }

    async fn count(&self, filter: &DocumentFilter) -> Result<u64> {
        let filter = filter.clone();
        self.with_conn(move |conn| {
            let (where_sql, values) = filter_sql(&filter);
            let sql = format!("SELECT COUNT(*) FROM documents d WHERE {where_sql}");
            let count: i64 =
                conn.query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }

    async fn update(
        &self,
        id: &DocumentId,
        expected_version: u64,
        patch: DocumentPatch,
    ) -> Result<UpdateOutcome> {
        let id = *id;
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            let current: Option<(i64, Vec<u8>)> = tx
                .query_row(
                    "SELECT version, owner FROM documents WHERE id = ?1",
                    params![id.as_bytes().as_slice()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let Some((version, owner)) = current else {
                return Ok(UpdateOutcome::Missing);
            };
            if version as u64 != expected_version {
                return Ok(UpdateOutcome::Stale);
            }
            let owner = UserId::from_bytes(bytes16(owner, "owner")?);

            if let Some((_, Some(token))) = &patch.visibility {
                if token_taken(&tx, token, Some(&id))? {
                    return Err(StoreError::Conflict("link token already in use".into()));
                }
            }
            if let Some(entries) = &patch.shared_with {
                check_share_entries(entries, &owner)?;
            }

            let mut sets: Vec<String> = Vec::new();
            let mut values: Vec<Value> = Vec::new();
            if let Some(title) = &patch.title {
                sets.push("title = ?".into());
                values.push(Value::Text(title.clone()));
            }
            if let Some(content) = &patch.content {
                sets.push("content = ?".into());
                values.push(Value::Text(content.clone()));
            }
            if let Some((visibility, token)) = &patch.visibility {
                sets.push("visibility = ?".into());
                values.push(Value::Text(visibility.as_str().into()));
                sets.push("link_token = ?".into());
                values.push(match token {
                    Some(token) => Value::Text(token.to_hex()),
                    None => Value::Null,
                });
            }
            if let Some(is_starred) = patch.is_starred {
                sets.push("is_starred = ?".into());
                values.push(Value::Integer(is_starred as i64));
            }
            sets.push("version = version + 1".into());
            sets.push("updated_at = ?".into());
            values.push(Value::Integer(now_millis()));
            values.push(Value::Blob(id.as_bytes().to_vec()));

            tx.execute(
                &format!("UPDATE documents SET {} WHERE id = ?", sets.join(", ")),
                params_from_iter(values.iter()),
            )?;

            if let Some(tags) = &patch.tags {
                tx.execute(
                    "DELETE FROM document_tags WHERE document_id = ?1",
                    params![id.as_bytes().as_slice()],
                )?;
                insert_tag_rows(&tx, &id, tags)?;
            }
            if let Some(entries) = &patch.shared_with {
                tx.execute(
                    "DELETE FROM document_shares WHERE document_id = ?1",
                    params![id.as_bytes().as_slice()],
                )?;
                insert_share_rows(&tx, &id, entries)?;
            }

            let doc = load_document(&tx, &id)?
                .ok_or_else(|| StoreError::InvalidData("document vanished mid-update".into()))?;
            validate_document(&doc).map_err(|e| StoreError::InvalidData(e.to_string()))?;

            tx.commit()?;
            Ok(UpdateOutcome::Applied(doc))
        })
        .await
    }

    async fn add_share(&self, id: &DocumentId, entry: ShareEntry) -> Result<UpdateOutcome> {
        let id = *id;
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            if !document_exists(&tx, &id)? {
                return Ok(UpdateOutcome::Missing);
            }

            tx.execute(
                "INSERT INTO document_shares (document_id, user_id, permission)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(document_id, user_id) DO UPDATE SET permission = excluded.permission",
                params![
                    id.as_bytes().as_slice(),
                    entry.user.as_bytes().as_slice(),
                    entry.permission.as_str(),
                ],
            )?;
            tx.execute(
                "UPDATE documents SET version = version + 1, updated_at = ?1 WHERE id = ?2",
                params![now_millis(), id.as_bytes().as_slice()],
            )?;

            let doc = load_document(&tx, &id)?
                .ok_or_else(|| StoreError::InvalidData("document vanished mid-update".into()))?;
            tx.commit()?;
            Ok(UpdateOutcome::Applied(doc))
        })
        .await
    }

    async fn remove_share(&self, id: &DocumentId, user: &UserId) -> Result<UpdateOutcome> {
        let id = *id;
        let user = *user;
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            if !document_exists(&tx, &id)? {
                return Ok(UpdateOutcome::Missing);
            }

            let removed = tx.execute(
                "DELETE FROM document_shares WHERE document_id = ?1 AND user_id = ?2",
                params![id.as_bytes().as_slice(), user.as_bytes().as_slice()],
            )?;
            if removed > 0 {
                tx.execute(
                    "UPDATE documents SET version = version + 1, updated_at = ?1 WHERE id = ?2",
                    params![now_millis(), id.as_bytes().as_slice()],
                )?;
            }

            let doc = load_document(&tx, &id)?
                .ok_or_else(|| StoreError::InvalidData("document vanished mid-update".into()))?;
            tx.commit()?;
            Ok(UpdateOutcome::Applied(doc))
        })
        .await
    }

    async fn delete(&self, id: &DocumentId, owner: &UserId) -> Result<bool> {
        let id = *id;
        let owner = *owner;
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            let deleted = tx.execute(
                "DELETE FROM documents WHERE id = ?1 AND owner = ?2",
                params![id.as_bytes().as_slice(), owner.as_bytes().as_slice()],
            )?;
            if deleted == 0 {
                return Ok(false);
            }

            tx.execute(
                "DELETE FROM document_shares WHERE document_id = ?1",
                params![id.as_bytes().as_slice()],
            )?;
            tx.execute(
                "DELETE FROM document_tags WHERE document_id = ?1",
                params![id.as_bytes().as_slice()],
            )?;

            tx.commit()?;
            Ok(true)
        })
        .await
    }
}

#[async_trait]
impl TagStore for SqliteStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let name = name.to_string();
        self.with_conn(move |conn| {
            let row: Option<(Vec<u8>, String)> = conn
                .query_row(
                    "SELECT id, name FROM tags WHERE name = ?1",
                    params![name],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            row.map(|(id, name)| {
                Ok(Tag {
                    id: TagId::from_bytes(bytes16(id, "id")?),
                    name,
                })
            })
            .transpose()
        })
        .await
    }

    async fn create(&self, name: &str) -> Result<Tag> {
        let name = name.to_string();
        self.with_conn(move |conn| {
            let tag = Tag {
                id: TagId::generate(),
                name,
            };
            conn.execute(
                "INSERT INTO tags (id, name, created_at) VALUES (?1, ?2, ?3)",
                params![tag.id.as_bytes().as_slice(), tag.name, now_millis()],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StoreError::Conflict(format!("tag name already exists: {}", tag.name))
                } else {
                    StoreError::Database(e)
                }
            })?;
            Ok(tag)
        })
        .await
    }

    async fn get(&self, id: &TagId) -> Result<Option<Tag>> {
        let id = *id;
        self.with_conn(move |conn| {
            let row: Option<(Vec<u8>, String)> = conn
                .query_row(
                    "SELECT id, name FROM tags WHERE id = ?1",
                    params![id.as_bytes().as_slice()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            row.map(|(id, name)| {
                Ok(Tag {
                    id: TagId::from_bytes(bytes16(id, "id")?),
                    name,
                })
            })
            .transpose()
        })
        .await
    }
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
    use folio_core::{Permission, Visibility};

    fn record(owner: UserId, title: &str) -> NewDocumentRecord {
        NewDocumentRecord {
            title: title.into(),
            content: String::new(),
            owner,
            shared_with: Vec::new(),
            visibility: Visibility::Private,
            link_token: None,
            tags: BTreeSet::new(),
            is_starred: false,
        }
    }

    #[tokio::test]
    async fn test_sqlite_roundtrip_with_relations() {
        let store = SqliteStore::open_memory().unwrap();
        let owner = UserId::from_bytes([1; 16]);
        let reader = UserId::from_bytes([2; 16]);
        let tag = TagId::from_bytes([3; 16]);

        let mut rec = record(owner, "notes");
        rec.content = "hello world".into();
        rec.shared_with.push(ShareEntry::new(reader, Permission::Read));
        rec.tags.insert(tag);
        rec.is_starred = true;

        let doc = store.insert(rec).await.unwrap();
        let loaded = DocumentStore::get(&store, &doc.id).await.unwrap().unwrap();
        assert_eq!(loaded, doc);
        assert_eq!(loaded.permission_for(&reader), Some(Permission::Read));
        assert!(loaded.tags.contains(&tag));
        assert!(loaded.is_starred);
    }

    #[tokio::test]
    async fn test_sqlite_token_uniqueness() {
        let store = SqliteStore::open_memory().unwrap();
        let owner = UserId::from_bytes([1; 16]);
        let token = LinkToken::generate();

        let mut first = record(owner, "a");
        first.visibility = Visibility::Link;
        first.link_token = Some(token);
        store.insert(first).await.unwrap();

        let mut second = record(owner, "b");
        second.visibility = Visibility::Link;
        second.link_token = Some(token);
        assert!(matches!(
            store.insert(second).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_sqlite_link_lookup_requires_link_visibility() {
        let store = SqliteStore::open_memory().unwrap();
        let owner = UserId::from_bytes([1; 16]);
        let token = LinkToken::generate();

        let mut rec = record(owner, "a");
        rec.visibility = Visibility::Link;
        rec.link_token = Some(token);
        let doc = store.insert(rec).await.unwrap();

        assert!(store.find_by_link_token(&token).await.unwrap().is_some());

        let patch = DocumentPatch {
            visibility: Some((Visibility::Public, None)),
            ..Default::default()
        };
        store.update(&doc.id, doc.version, patch).await.unwrap();
        assert!(store.find_by_link_token(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sqlite_update_version_gate_and_patch() {
        let store = SqliteStore::open_memory().unwrap();
        let owner = UserId::from_bytes([1; 16]);
        let doc = store.insert(record(owner, "a")).await.unwrap();

        let patch = DocumentPatch {
            title: Some("renamed".into()),
            is_starred: Some(true),
            ..Default::default()
        };
        let outcome = store.update(&doc.id, doc.version, patch.clone()).await.unwrap();
        let updated = match outcome {
            UpdateOutcome::Applied(d) => d,
            other => panic!("expected Applied, got {:?}", other),
        };
        assert_eq!(updated.title, "renamed");
        assert!(updated.is_starred);
        assert_eq!(updated.version, 2);

        assert_eq!(
            store.update(&doc.id, doc.version, patch).await.unwrap(),
            UpdateOutcome::Stale
        );
        assert_eq!(
            store
                .update(&DocumentId::generate(), 1, DocumentPatch::default())
                .await
                .unwrap(),
            UpdateOutcome::Missing
        );
    }

    #[tokio::test]
    async fn test_sqlite_share_upsert_and_remove() {
        let store = SqliteStore::open_memory().unwrap();
        let owner = UserId::from_bytes([1; 16]);
        let user = UserId::from_bytes([2; 16]);
        let doc = store.insert(record(owner, "a")).await.unwrap();

        store
            .add_share(&doc.id, ShareEntry::new(user, Permission::Read))
            .await
            .unwrap();
        let outcome = store
            .add_share(&doc.id, ShareEntry::new(user, Permission::Edit))
            .await
            .unwrap();
        let updated = match outcome {
            UpdateOutcome::Applied(d) => d,
            other => panic!("expected Applied, got {:?}", other),
        };
        assert_eq!(updated.shared_with.len(), 1);
        assert_eq!(updated.permission_for(&user), Some(Permission::Edit));

        let outcome = store.remove_share(&doc.id, &user).await.unwrap();
        let updated = match outcome {
            UpdateOutcome::Applied(d) => d,
            other => panic!("expected Applied, got {:?}", other),
        };
        assert!(updated.shared_with.is_empty());

        // Removing again is a no-op, not an error.
        assert!(matches!(
            store.remove_share(&doc.id, &user).await.unwrap(),
            UpdateOutcome::Applied(_)
        ));
    }

    #[tokio::test]
    async fn test_sqlite_filtered_listing() {
        let store = SqliteStore::open_memory().unwrap();
        let me = UserId::from_bytes([1; 16]);
        let other = UserId::from_bytes([2; 16]);

        store.insert(record(me, "alpha report")).await.unwrap();
        let mut shared = record(other, "beta notes");
        shared.shared_with.push(ShareEntry::new(me, Permission::Read));
        store.insert(shared).await.unwrap();
        store.insert(record(other, "hidden")).await.unwrap();

        let all = DocumentFilter::scoped(AccessScope::OwnedOrShared(me));
        assert_eq!(store.count(&all).await.unwrap(), 2);

        let owned = DocumentFilter::scoped(AccessScope::Owned(me));
        assert_eq!(store.count(&owned).await.unwrap(), 1);

        let shared_only = DocumentFilter::scoped(AccessScope::SharedWith(me));
        let page = store
            .find_page(&shared_only, &SortSpec::default(), 0, 10)
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title, "beta notes");

        let mut searched = DocumentFilter::scoped(AccessScope::OwnedOrShared(me));
        searched.search = Some("REPORT".into());
        assert_eq!(store.count(&searched).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sqlite_delete_cascades_relations() {
        let store = SqliteStore::open_memory().unwrap();
        let owner = UserId::from_bytes([1; 16]);
        let user = UserId::from_bytes([2; 16]);

        let mut rec = record(owner, "a");
        rec.shared_with.push(ShareEntry::new(user, Permission::Edit));
        rec.tags.insert(TagId::from_bytes([3; 16]));
        let doc = store.insert(rec).await.unwrap();

        assert!(!store.delete(&doc.id, &user).await.unwrap());
        assert!(store.delete(&doc.id, &owner).await.unwrap());
        assert!(DocumentStore::get(&store, &doc.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sqlite_tag_name_conflict() {
        let store = SqliteStore::open_memory().unwrap();

        let tag = store.create("work").await.unwrap();
        assert!(matches!(
            store.create("work").await,
            Err(StoreError::Conflict(_))
        ));
        assert_eq!(store.find_by_name("work").await.unwrap().unwrap().id, tag.id);
    }

    #[tokio::test]
    async fn test_sqlite_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.db");
        let owner = UserId::from_bytes([1; 16]);

        let id = {
            let store = SqliteStore::open(&path).unwrap();
            store.insert(record(owner, "durable")).await.unwrap().id
        };

        let store = SqliteStore::open(&path).unwrap();
        let doc = DocumentStore::get(&store, &id).await.unwrap().unwrap();
        assert_eq!(doc.title, "durable");
    }
}
