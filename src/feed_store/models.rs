//! Feed item models.

use chrono::{DateTime, Utc};

/// A persisted feed item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub id: i64,
    pub feed: String,
    pub title: String,
    pub body: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// An item about to be inserted; the store assigns id and created_at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeedItem {
    pub title: String,
    pub body: String,
    pub url: String,
}

/// Number of items currently held by a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedCount {
    pub feed: String,
    pub count: usize,
}

/// Creation time of the newest item in a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedLatest {
    pub feed: String,
    pub newest_created_at: DateTime<Utc>,
}
