use hookfeed_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use hookfeed_server::{FeedStore, SqliteFeedStore};
use std::sync::Arc;
use tempfile::TempDir;

/// A real server on an ephemeral port backed by a throwaway database.
pub struct TestServer {
    pub base_url: String,
    pub store: Arc<dyn FeedStore>,
    _tmp: TempDir,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        let tmp = TempDir::new().unwrap();
        let store: Arc<dyn FeedStore> =
            Arc::new(SqliteFeedStore::new(tmp.path().join("feeds.db")).unwrap());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let config = ServerConfig {
            port: addr.port(),
            endpoint_base: base_url.clone(),
            requests_logging_level: RequestsLoggingLevel::None,
        };
        let app = make_app(config, Arc::clone(&store));

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            store,
            _tmp: tmp,
            handle,
        }
    }

    pub fn feed_url(&self, feed: &str) -> String {
        format!("{}/feeds/{}.rss", self.base_url, feed)
    }

    pub fn items_url(&self, feed: &str) -> String {
        format!("{}/feeds/{}/items", self.base_url, feed)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
