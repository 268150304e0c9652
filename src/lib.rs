//! Hookfeed Server Library
//!
//! Ingests webhook payloads into named feeds, republishes them as Atom
//! documents, and runs the maintenance jobs that keep the feeds healthy.

pub mod background_jobs;
pub mod config;
pub mod feed_store;
pub mod notifier;
pub mod render;
pub mod server;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use feed_store::{FeedStore, SqliteFeedStore};
pub use notifier::{FeedAlertNotifier, Notify, PushoverNotifier};
pub use server::{run_server, RequestsLoggingLevel};
