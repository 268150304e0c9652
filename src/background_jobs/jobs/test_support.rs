//! Shared helpers for job tests.

use crate::feed_store::SqliteFeedStore;
use crate::notifier::{Notify, NotifyError};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// Notifier that records every delivered alert.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Notify for RecordingNotifier {
    async fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
        Ok(())
    }
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

/// Notifier whose deliveries always fail.
pub struct FailingNotifier;

#[async_trait]
impl Notify for FailingNotifier {
    async fn notify(&self, _title: &str, _body: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Status(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        ))
    }
}

pub fn create_test_store() -> (SqliteFeedStore, PathBuf, TempDir) {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("feeds.db");
    let store = SqliteFeedStore::new(&db_path).unwrap();
    (store, db_path, tmp)
}

/// Rewrite an item's creation time, bypassing the store API.
pub fn backdate_item(db_path: &Path, title: &str, epoch: i64) {
    let conn = Connection::open(db_path).unwrap();
    conn.execute(
        "UPDATE items SET created_at = ?1 WHERE title = ?2",
        params![epoch, title],
    )
    .unwrap();
}
