mod models;
mod schema;
mod store;
mod trait_def;

pub use models::{FeedCount, FeedItem, FeedLatest, NewFeedItem};
pub use store::SqliteFeedStore;
pub use trait_def::FeedStore;
