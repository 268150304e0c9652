use super::RequestsLoggingLevel;
use crate::feed_store::FeedStore;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    /// Base URL clients reach this server at, used for feed and entry ids.
    pub endpoint_base: String,
    pub requests_logging_level: RequestsLoggingLevel,
}

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub store: Arc<dyn FeedStore>,
}

impl ServerState {
    pub fn new(config: ServerConfig, store: Arc<dyn FeedStore>) -> Self {
        Self { config, store }
    }
}
