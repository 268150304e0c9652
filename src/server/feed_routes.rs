//! Feed ingestion and rendering handlers.

use super::state::ServerState;
use crate::feed_store::NewFeedItem;
use crate::render::{render_feed, RENDER_LIMIT};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use tracing::error;

const MAX_TITLE_CHARS: usize = 500;
const MAX_BODY_CHARS: usize = 100_000;

const ATOM_CONTENT_TYPE: &str = "application/atom+xml; charset=utf-8";

lazy_static! {
    static ref FEED_NAME_PATTERN: Regex = Regex::new("^[a-z0-9-]{1,64}$").unwrap();
}

/// Lowercase alphanumerics and hyphens, at most 64 chars.
pub fn valid_feed_name(name: &str) -> bool {
    FEED_NAME_PATTERN.is_match(name)
}

#[derive(Deserialize, Debug)]
struct ItemPayload {
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    url: String,
}

fn parse_payloads(body: &str) -> Option<Vec<ItemPayload>> {
    match serde_json::from_str::<Vec<ItemPayload>>(body) {
        Ok(items) => Some(items),
        // Some clients (Apple Shortcuts among them) cannot send arrays, so a
        // lone object counts as a one-element batch
        Err(_) => serde_json::from_str::<ItemPayload>(body)
            .map(|item| vec![item])
            .ok(),
    }
}

fn validate_payloads(payloads: &[ItemPayload]) -> Result<(), &'static str> {
    for payload in payloads {
        if payload.title.is_empty() {
            return Err("item title must not be empty");
        }
        if payload.title.chars().count() > MAX_TITLE_CHARS {
            return Err("item title too long");
        }
        if payload.body.chars().count() > MAX_BODY_CHARS {
            return Err("item body too long");
        }
    }
    Ok(())
}

/// POST /feeds/{feed}/items
pub async fn create_items(
    State(state): State<ServerState>,
    Path(feed): Path<String>,
    body: String,
) -> Response {
    if !valid_feed_name(&feed) {
        return (StatusCode::BAD_REQUEST, "invalid feed name").into_response();
    }

    let Some(payloads) = parse_payloads(&body) else {
        return (StatusCode::BAD_REQUEST, "invalid JSON payload").into_response();
    };

    if let Err(reason) = validate_payloads(&payloads) {
        return (StatusCode::BAD_REQUEST, reason).into_response();
    }

    let items: Vec<NewFeedItem> = payloads
        .into_iter()
        .map(|payload| NewFeedItem {
            title: payload.title,
            body: payload.body,
            url: payload.url,
        })
        .collect();

    match state.store.append_items(&feed, &items) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            error!("Failed to store items for feed {}: {}", feed, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "storage error").into_response()
        }
    }
}

/// GET /feeds/{feed}.rss
pub async fn get_feed(
    State(state): State<ServerState>,
    Path(feed_param): Path<String>,
) -> Response {
    let Some(feed) = feed_param.strip_suffix(".rss") else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if !valid_feed_name(feed) {
        return (StatusCode::BAD_REQUEST, "invalid feed name").into_response();
    }

    let items = match state.store.recent_items(feed, RENDER_LIMIT) {
        Ok(items) => items,
        Err(e) => {
            error!("Failed to load items for feed {}: {}", feed, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "storage error").into_response();
        }
    };

    let feed_url = format!("{}/feeds/{}.rss", state.config.endpoint_base, feed);
    let doc = render_feed(feed, &feed_url, &items, Utc::now());
    ([(header::CONTENT_TYPE, ATOM_CONTENT_TYPE)], doc).into_response()
}
