//! Atom rendering of feed items.

use crate::feed_store::FeedItem;
use atom_syndication::{Entry, Feed, Link, Text};
use chrono::{DateTime, Utc};

/// How many items a rendered document carries at most.
pub const RENDER_LIMIT: usize = 50;

/// Render a feed's newest items as an Atom document.
///
/// `feed_url` is the URL the document was requested at; entry ids are derived
/// from it (minus the ".rss" suffix) plus the item's numeric id, so they stay
/// stable across renders. An empty `items` slice yields a header-only document
/// with `updated` set to `now`.
pub fn render_feed(
    feed_name: &str,
    feed_url: &str,
    items: &[FeedItem],
    now: DateTime<Utc>,
) -> String {
    let entry_base = feed_url.trim_end_matches(".rss");

    let updated = items
        .first()
        .map(|item| item.created_at)
        .unwrap_or(now)
        .fixed_offset();

    let entries: Vec<Entry> = items
        .iter()
        .map(|item| {
            let mut entry = Entry::default();
            entry.set_title(Text::plain(item.title.clone()));
            entry.set_id(format!("{}/items/{}", entry_base, item.id));
            entry.set_updated(item.created_at.fixed_offset());
            entry.set_summary(Some(Text::html(item.body.clone())));
            if !item.url.is_empty() {
                let mut link = Link::default();
                link.set_href(item.url.clone());
                entry.set_links(vec![link]);
            }
            entry
        })
        .collect();

    let mut link = Link::default();
    link.set_href(feed_url.to_string());
    link.set_rel("self".to_string());

    let mut feed = Feed::default();
    feed.set_title(Text::plain(feed_name.to_string()));
    feed.set_id(feed_url.to_string());
    feed.set_updated(updated);
    feed.set_links(vec![link]);
    feed.set_entries(entries);

    feed.to_string()
}
