//! FeedStore trait definition.

use super::models::{FeedCount, FeedItem, FeedLatest, NewFeedItem};
use anyhow::Result;

/// Trait for feed item storage backends.
pub trait FeedStore: Send + Sync {
    /// Insert a batch of items into a feed within a single transaction.
    /// Either all items land or none do.
    fn append_items(&self, feed: &str, items: &[NewFeedItem]) -> Result<()>;

    /// The newest items of a feed, ordered newest first (ties broken by id).
    fn recent_items(&self, feed: &str, limit: usize) -> Result<Vec<FeedItem>>;

    /// The single newest item of a feed, if the feed has any.
    fn latest_item(&self, feed: &str) -> Result<Option<FeedItem>>;

    /// Feeds holding more than `threshold` items, largest first.
    fn feeds_exceeding(&self, threshold: usize) -> Result<Vec<FeedCount>>;

    /// Newest item creation time per feed, for every feed that has items.
    fn newest_per_feed(&self) -> Result<Vec<FeedLatest>>;

    /// Delete everything beyond the `cap` newest items of each feed.
    /// Returns the number of deleted rows.
    fn sweep_retention(&self, cap: usize) -> Result<usize>;
}
