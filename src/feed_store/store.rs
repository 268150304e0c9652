//! SQLite-backed feed store implementation.

use super::models::{FeedCount, FeedItem, FeedLatest, NewFeedItem};
use super::schema::FEED_VERSIONED_SCHEMAS;
use super::trait_def::FeedStore;
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

/// SQLite-backed feed store.
#[derive(Clone, Debug)]
pub struct SqliteFeedStore {
    read_conn: Arc<Mutex<Connection>>,
    write_conn: Arc<Mutex<Connection>>,
}

fn migrate_if_needed(conn: &mut Connection) -> Result<()> {
    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;

    let latest_version = FEED_VERSIONED_SCHEMAS.len() - 1;
    let latest_schema = &FEED_VERSIONED_SCHEMAS[latest_version];

    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if table_count == 0 {
        info!("Creating feeds db schema at version {}", latest_version);
        latest_schema.create(conn)?;
        return Ok(());
    }

    let mut current_version = if db_version < BASE_DB_VERSION as i64 {
        0
    } else {
        (db_version - BASE_DB_VERSION as i64) as usize
    };

    if current_version >= latest_version {
        return latest_schema.validate(conn);
    }

    let tx = conn.transaction()?;
    for schema in FEED_VERSIONED_SCHEMAS.iter().skip(current_version + 1) {
        if let Some(migration_fn) = schema.migration {
            info!(
                "Migrating feeds db from version {} to {}",
                current_version, schema.version
            );
            migration_fn(&tx)?;
            current_version = schema.version;
        }
    }
    tx.pragma_update(None, "user_version", BASE_DB_VERSION + current_version)?;
    tx.commit()?;
    latest_schema.validate(conn)
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<FeedItem> {
    let created_at_epoch: i64 = row.get(5)?;
    Ok(FeedItem {
        id: row.get(0)?,
        feed: row.get(1)?,
        title: row.get(2)?,
        body: row.get(3)?,
        url: row.get(4)?,
        created_at: DateTime::<Utc>::from_timestamp(created_at_epoch, 0).unwrap_or_default(),
    })
}

impl SqliteFeedStore {
    /// Create a new SqliteFeedStore.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path_ref = db_path.as_ref();

        let mut write_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open feeds database")?;

        migrate_if_needed(&mut write_conn)?;

        write_conn
            .pragma_update(None, "journal_mode", "WAL")
            .context("Failed to set WAL mode on feeds write connection")?;

        let read_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open feeds database for reading")?;

        read_conn
            .pragma_update(None, "journal_mode", "WAL")
            .context("Failed to set WAL mode on feeds read connection")?;

        let item_count: i64 =
            read_conn.query_row("SELECT COUNT(*) FROM items", [], |r| r.get(0))?;
        let feed_count: i64 =
            read_conn.query_row("SELECT COUNT(DISTINCT feed) FROM items", [], |r| r.get(0))?;
        info!(
            "Feed store ready: {} items across {} feeds",
            item_count, feed_count
        );

        Ok(Self {
            read_conn: Arc::new(Mutex::new(read_conn)),
            write_conn: Arc::new(Mutex::new(write_conn)),
        })
    }
}

impl FeedStore for SqliteFeedStore {
    fn append_items(&self, feed: &str, items: &[NewFeedItem]) -> Result<()> {
        let conn = self.write_conn.lock().unwrap();
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO items (feed, title, body, url) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for item in items {
                stmt.execute(params![feed, item.title, item.body, item.url])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn recent_items(&self, feed: &str, limit: usize) -> Result<Vec<FeedItem>> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT id, feed, title, body, url, created_at
             FROM items WHERE feed = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2",
        )?;
        let items = stmt
            .query_map(params![feed, limit], item_from_row)?
            .collect::<std::result::Result<_, _>>()?;
        Ok(items)
    }

    fn latest_item(&self, feed: &str) -> Result<Option<FeedItem>> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT id, feed, title, body, url, created_at
             FROM items WHERE feed = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT 1",
        )?;
        let result = stmt.query_row(params![feed], item_from_row).optional()?;
        Ok(result)
    }

    fn feeds_exceeding(&self, threshold: usize) -> Result<Vec<FeedCount>> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT feed, COUNT(*) as item_count
             FROM items
             GROUP BY feed
             HAVING item_count > ?1
             ORDER BY item_count DESC",
        )?;
        let counts = stmt
            .query_map(params![threshold], |row| {
                Ok(FeedCount {
                    feed: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<_, _>>()?;
        Ok(counts)
    }

    fn newest_per_feed(&self) -> Result<Vec<FeedLatest>> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT feed, MAX(created_at) FROM items GROUP BY feed ORDER BY feed",
        )?;
        let latests = stmt
            .query_map([], |row| {
                let epoch: i64 = row.get(1)?;
                Ok(FeedLatest {
                    feed: row.get(0)?,
                    newest_created_at: DateTime::<Utc>::from_timestamp(epoch, 0)
                        .unwrap_or_default(),
                })
            })?
            .collect::<std::result::Result<_, _>>()?;
        Ok(latests)
    }

    fn sweep_retention(&self, cap: usize) -> Result<usize> {
        let conn = self.write_conn.lock().unwrap();
        // One set-based delete: a row goes when at least `cap` rows of the
        // same feed are newer than it (created_at, id tiebreak).
        let deleted = conn.execute(
            "DELETE FROM items WHERE id IN (
                 SELECT i.id FROM items i
                 WHERE (SELECT COUNT(*) FROM items n
                        WHERE n.feed = i.feed
                          AND (n.created_at > i.created_at
                               OR (n.created_at = i.created_at AND n.id > i.id))) >= ?1
             )",
            params![cap],
        )?;
        Ok(deleted)
    }
}
