use super::feed_routes::{create_items, get_feed};
use super::requests_logging::log_requests;
use super::state::{ServerConfig, ServerState};
use crate::feed_store::FeedStore;
use anyhow::Result;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tracing::info;

pub fn make_app(config: ServerConfig, store: Arc<dyn FeedStore>) -> Router {
    let state = ServerState::new(config, store);

    Router::new()
        .route("/feeds/{feed}/items", post(create_items))
        .route("/feeds/{feed}", get(get_feed))
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .with_state(state)
}

pub async fn run_server(config: ServerConfig, store: Arc<dyn FeedStore>) -> Result<()> {
    let port = config.port;
    let app = make_app(config, store);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    Ok(axum::serve(listener, app).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed_store::SqliteFeedStore;
    use crate::server::RequestsLoggingLevel;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt; // for `oneshot`

    fn test_app() -> (Router, TempDir) {
        let tmp = TempDir::new().unwrap();
        let store = SqliteFeedStore::new(tmp.path().join("feeds.db")).unwrap();
        let config = ServerConfig {
            port: 0,
            endpoint_base: "http://127.0.0.1:8080".to_string(),
            requests_logging_level: RequestsLoggingLevel::None,
        };
        (make_app(config, Arc::new(store)), tmp)
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn post_items(feed: &str, json: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/feeds/{}/items", feed))
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_post_then_get_roundtrip() {
        let (app, _tmp) = test_app();

        let response = app
            .clone()
            .oneshot(post_items(
                "example",
                r#"[{"title":"item1","body":"body for item item1","url":"https://example.com/1"}]"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/feeds/example.rss")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "application/atom+xml; charset=utf-8"
        );

        let doc = body_string(response).await;
        assert!(doc.contains("<title>item1</title>"));
        assert!(doc.contains(r#"<summary type="html">body for item item1</summary>"#));
        assert!(doc.contains("http://127.0.0.1:8080/feeds/example/items/"));
    }

    #[tokio::test]
    async fn test_single_object_payload_is_accepted() {
        let (app, _tmp) = test_app();

        let response = app
            .oneshot(post_items("example", r#"{"title":"solo"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_feed_name_is_rejected() {
        let (app, _tmp) = test_app();

        let response = app
            .clone()
            .oneshot(post_items("Bad_Name", r#"[{"title":"x"}]"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/feeds/Bad_Name.rss")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected() {
        let (app, _tmp) = test_app();

        let response = app
            .oneshot(post_items("example", "not json at all"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_batch_inserts_nothing() {
        let (app, _tmp) = test_app();

        let response = app
            .clone()
            .oneshot(post_items(
                "example",
                r#"[{"title":"good"},{"title":""}]"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/feeds/example.rss")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let doc = body_string(response).await;
        assert!(!doc.contains("<entry>"));
    }

    #[tokio::test]
    async fn test_get_without_rss_suffix_is_not_found() {
        let (app, _tmp) = test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/feeds/example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_feed_renders_header_only_document() {
        let (app, _tmp) = test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/feeds/ghost.rss")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let doc = body_string(response).await;
        assert!(doc.contains("<title>ghost</title>"));
        assert!(!doc.contains("<entry>"));
    }

    #[tokio::test]
    async fn test_render_caps_at_fifty_entries() {
        let (app, _tmp) = test_app();

        let items: Vec<String> = (0..60)
            .map(|i| format!(r#"{{"title":"item{:02}","body":"","url":""}}"#, i))
            .collect();
        let json = format!("[{}]", items.join(","));
        let response = app.clone().oneshot(post_items("busy", &json)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/feeds/busy.rss")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let doc = body_string(response).await;
        assert_eq!(doc.matches("<entry>").count(), 50);
        assert!(doc.contains("<title>item59</title>"));
        assert!(!doc.contains("<title>item09</title>"));
    }
}
