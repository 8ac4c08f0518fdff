//! Local post store.
//!
//! This module provides `SQLite`-based persistent storage for blog posts,
//! one row per post, plus the outbox of remote writes awaiting replay.
//! Mutations run in a transaction while holding the connection lock, so
//! concurrent writers serialize instead of overwriting each other.

pub mod migrations;
pub mod outbox;
pub mod schema;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};
use ulid::Ulid;

use crate::error::{Error, Result};
use crate::post::{BlogPost, PostDraft, PostPatch, PostStatus};
use crate::seed::sample_posts;
use crate::slug::unique_slug;
use crate::store::PostStore;

use schema::POST_COLUMNS;

pub use outbox::{PendingSync, SyncOperation};

/// Metadata key recording that the sample posts were inserted once.
const SEEDED_KEY: &str = "samples_seeded";

/// Storage engine for blog posts.
#[derive(Debug)]
pub struct LocalStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection; the lock serializes all access.
    conn: Mutex<Connection>,
}

impl LocalStore {
    /// Open or create a post database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store, mostly for tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::internal("local store connection lock poisoned"))
    }

    /// Insert the sample posts unless this database was seeded before.
    ///
    /// A store emptied by deletes is not seeded again. Returns the number of
    /// posts inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn seed_samples(&self) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let seeded: Option<String> = tx
            .query_row(
                "SELECT value FROM metadata WHERE key = ?1",
                [SEEDED_KEY],
                |row| row.get(0),
            )
            .optional()?;
        if seeded.is_some() {
            return Ok(0);
        }

        let mut inserted = 0;
        for post in sample_posts() {
            if slug_owner(&tx, &post.slug)?.is_some() || fetch_by_id(&tx, &post.id)?.is_some() {
                continue;
            }
            insert_row(&tx, &post)?;
            inserted += 1;
        }
        tx.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            (SEEDED_KEY, format_timestamp(now())),
        )?;
        tx.commit()?;

        if inserted > 0 {
            info!("Seeded {} sample posts", inserted);
        }
        Ok(inserted)
    }

    /// Count posts in storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let conn = self.lock()?;

        let (total_posts, published_posts, total_views): (i64, i64, i64) = conn.query_row(
            r"
            SELECT COUNT(*),
                   COALESCE(SUM(CASE WHEN status = 'published' THEN 1 ELSE 0 END), 0),
                   COALESCE(SUM(views), 0)
            FROM posts
            ",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let pending_sync: i64 =
            conn.query_row("SELECT COUNT(*) FROM pending_sync", [], |row| row.get(0))?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_posts,
            published_posts,
            draft_posts: total_posts - published_posts,
            total_views,
            pending_sync,
            db_size_bytes,
        })
    }

    fn query_posts(&self, filter: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<BlogPost>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts {filter} ORDER BY created_at DESC, seq DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let posts = stmt
            .query_map(args, row_to_post)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    fn find_one(&self, column: &str, value: &str) -> Result<Option<BlogPost>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE {column} = ?1");
        let post = conn.query_row(&sql, [value], row_to_post).optional()?;
        Ok(post)
    }

    fn save_draft(&self, draft: &PostDraft) -> Result<BlogPost> {
        draft.validate()?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let mut post = BlogPost::from_draft(Ulid::new().to_string(), draft, now());
        let taken = slugs_with_prefix(&tx, &post.slug)?;
        post.slug = unique_slug(&post.slug, |candidate| taken.contains(candidate));

        insert_row(&tx, &post)?;
        tx.commit()?;

        debug!("Saved post {} ({})", post.id, post.slug);
        Ok(post)
    }

    fn upsert(&self, post: &BlogPost) -> Result<BlogPost> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        if let Some(owner) = slug_owner(&tx, &post.slug)? {
            if owner != post.id {
                return Err(Error::SlugConflict {
                    slug: post.slug.clone(),
                    existing_id: owner,
                });
            }
        }

        tx.execute(
            r"
            INSERT INTO posts (id, title, slug, excerpt, content, status, author, category,
                               publish_date, created_at, updated_at, views, image_url,
                               image_alt, meta_title, meta_description)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                slug = excluded.slug,
                excerpt = excluded.excerpt,
                content = excluded.content,
                status = excluded.status,
                author = excluded.author,
                category = excluded.category,
                publish_date = excluded.publish_date,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at,
                views = MAX(posts.views, excluded.views),
                image_url = excluded.image_url,
                image_alt = excluded.image_alt,
                meta_title = excluded.meta_title,
                meta_description = excluded.meta_description
            ",
            params![
                post.id,
                post.title,
                post.slug,
                post.excerpt,
                post.content,
                post.status.as_str(),
                post.author,
                post.category,
                format_date(post.publish_date),
                format_timestamp(post.created_at),
                format_timestamp(post.updated_at),
                views_to_sql(post.views),
                post.image_url,
                post.image_alt,
                post.meta_title,
                post.meta_description,
            ],
        )?;
        let stored = fetch_by_id(&tx, &post.id)?
            .ok_or_else(|| Error::internal(format!("post {} vanished during upsert", post.id)))?;
        tx.commit()?;

        debug!("Stored post {}", post.id);
        Ok(stored)
    }

    fn apply_patch(&self, id: &str, patch: &PostPatch) -> Result<Option<BlogPost>> {
        let patch = patch.normalized()?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let Some(mut post) = fetch_by_id(&tx, id)? else {
            debug!("Update skipped, post {} not found", id);
            return Ok(None);
        };

        if let Some(slug) = &patch.slug {
            if let Some(owner) = slug_owner(&tx, slug)? {
                if owner != id {
                    return Err(Error::SlugConflict {
                        slug: slug.clone(),
                        existing_id: owner,
                    });
                }
            }
        }

        post.apply(&patch);
        post.updated_at = now();

        tx.execute(
            r"
            UPDATE posts SET
                title = ?2, slug = ?3, excerpt = ?4, content = ?5, status = ?6,
                author = ?7, category = ?8, publish_date = ?9, updated_at = ?10,
                image_url = ?11, image_alt = ?12, meta_title = ?13, meta_description = ?14
            WHERE id = ?1
            ",
            params![
                post.id,
                post.title,
                post.slug,
                post.excerpt,
                post.content,
                post.status.as_str(),
                post.author,
                post.category,
                format_date(post.publish_date),
                format_timestamp(post.updated_at),
                post.image_url,
                post.image_alt,
                post.meta_title,
                post.meta_description,
            ],
        )?;
        tx.commit()?;

        debug!("Updated post {}", id);
        Ok(Some(post))
    }

    fn remove(&self, id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let affected = conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
        if affected > 0 {
            debug!("Deleted post {}", id);
        }
        Ok(affected > 0)
    }

    fn bump_views(&self, id: &str) -> Result<()> {
        let conn = self.lock()?;
        let affected = conn.execute("UPDATE posts SET views = views + 1 WHERE id = ?1", [id])?;
        if affected == 0 {
            debug!("View increment skipped, post {} not found", id);
        }
        Ok(())
    }
}

#[async_trait]
impl PostStore for LocalStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn get_all(&self) -> Result<Vec<BlogPost>> {
        self.query_posts("", &[])
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<BlogPost>> {
        self.find_one("id", id)
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        self.find_one("slug", slug)
    }

    async fn get_by_status(&self, status: PostStatus) -> Result<Vec<BlogPost>> {
        self.query_posts("WHERE status = ?1", &[&status.as_str()])
    }

    async fn search(&self, query: &str) -> Result<Vec<BlogPost>> {
        let pattern = format!("%{}%", escape_like(query));
        self.query_posts(
            r"WHERE title LIKE ?1 ESCAPE '\' OR excerpt LIKE ?1 ESCAPE '\'
               OR content LIKE ?1 ESCAPE '\' OR category LIKE ?1 ESCAPE '\'",
            &[&pattern],
        )
    }

    async fn save(&self, draft: &PostDraft) -> Result<BlogPost> {
        self.save_draft(draft)
    }

    async fn put(&self, post: &BlogPost) -> Result<BlogPost> {
        self.upsert(post)
    }

    async fn update(&self, id: &str, patch: &PostPatch) -> Result<Option<BlogPost>> {
        self.apply_patch(id, patch)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.remove(id)
    }

    async fn increment_views(&self, id: &str) -> Result<()> {
        self.bump_views(id)
    }
}

/// Statistics about the local store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Total number of posts stored.
    pub total_posts: i64,
    /// Posts visible in public listings.
    pub published_posts: i64,
    /// Posts still in draft.
    pub draft_posts: i64,
    /// Sum of all view counters.
    pub total_views: i64,
    /// Remote writes waiting in the outbox.
    pub pending_sync: i64,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

fn fetch_by_id(conn: &Connection, id: &str) -> Result<Option<BlogPost>> {
    let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], row_to_post).optional()?)
}

/// Id of the post currently using `slug`, if any.
fn slug_owner(conn: &Connection, slug: &str) -> Result<Option<String>> {
    Ok(conn
        .query_row("SELECT id FROM posts WHERE slug = ?1", [slug], |row| row.get(0))
        .optional()?)
}

/// All slugs equal to `base` or of the form `base-...`.
fn slugs_with_prefix(conn: &Connection, base: &str) -> Result<HashSet<String>> {
    let pattern = format!("{}-%", escape_like(base));
    let mut stmt =
        conn.prepare(r"SELECT slug FROM posts WHERE slug = ?1 OR slug LIKE ?2 ESCAPE '\'")?;
    let slugs = stmt
        .query_map(params![base, pattern], |row| row.get(0))?
        .collect::<std::result::Result<HashSet<String>, _>>()?;
    Ok(slugs)
}

fn insert_row(conn: &Connection, post: &BlogPost) -> Result<()> {
    conn.execute(
        r"
        INSERT INTO posts (id, title, slug, excerpt, content, status, author, category,
                           publish_date, created_at, updated_at, views, image_url,
                           image_alt, meta_title, meta_description)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
        ",
        params![
            post.id,
            post.title,
            post.slug,
            post.excerpt,
            post.content,
            post.status.as_str(),
            post.author,
            post.category,
            format_date(post.publish_date),
            format_timestamp(post.created_at),
            format_timestamp(post.updated_at),
            views_to_sql(post.views),
            post.image_url,
            post.image_alt,
            post.meta_title,
            post.meta_description,
        ],
    )?;
    Ok(())
}

/// Current time at the precision stored in the database.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC 3339 so text ordering matches time ordering.
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn views_to_sql(views: u64) -> i64 {
    i64::try_from(views).unwrap_or(i64::MAX)
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn conversion_error(
    idx: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

pub(crate) fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

/// Convert a database row to a `BlogPost`.
fn row_to_post(row: &rusqlite::Row) -> rusqlite::Result<BlogPost> {
    let status_str: String = row.get(5)?;
    let status = status_str
        .parse::<PostStatus>()
        .map_err(|e| conversion_error(5, e.to_string()))?;

    let date_str: String = row.get(8)?;
    let publish_date =
        NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| conversion_error(8, e))?;

    let created_str: String = row.get(9)?;
    let updated_str: String = row.get(10)?;
    let views: i64 = row.get(11)?;

    Ok(BlogPost {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        excerpt: row.get(3)?,
        content: row.get(4)?,
        status,
        author: row.get(6)?,
        category: row.get(7)?,
        publish_date,
        created_at: parse_timestamp(9, &created_str)?,
        updated_at: parse_timestamp(10, &updated_str)?,
        views: u64::try_from(views).unwrap_or(0),
        image_url: row.get(12)?,
        image_alt: row.get(13)?,
        meta_title: row.get(14)?,
        meta_description: row.get(15)?,
    })
}
