//! Alert delivery channels.
//!
//! Maintenance jobs report problems through the [`Notify`] trait and never
//! talk to a transport directly. Two implementations exist: push
//! notifications through Pushover, and re-ingestion of a synthetic item into
//! one of this server's own feeds.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

const PUSHOVER_MESSAGES_URL: &str = "https://api.pushover.net/1/messages.json";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("notification endpoint returned status {0}")]
    Status(StatusCode),
}

/// A channel that can deliver a titled alert.
#[async_trait]
pub trait Notify: Send + Sync {
    async fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError>;
}

#[derive(Serialize)]
struct PushoverMessage<'a> {
    token: &'a str,
    user: &'a str,
    title: &'a str,
    message: &'a str,
}

/// Delivers alerts as Pushover push notifications.
pub struct PushoverNotifier {
    client: reqwest::Client,
    token: String,
    user_key: String,
}

impl PushoverNotifier {
    pub fn new(token: String, user_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("Failed to build pushover http client")?;
        Ok(Self {
            client,
            token,
            user_key,
        })
    }
}

#[async_trait]
impl Notify for PushoverNotifier {
    async fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(PUSHOVER_MESSAGES_URL)
            .json(&PushoverMessage {
                token: &self.token,
                user: &self.user_key,
                title,
                message: body,
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(NotifyError::Status(response.status()));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct AlertItem<'a> {
    title: &'a str,
    body: &'a str,
    url: &'a str,
}

/// Delivers alerts by posting a synthetic item to an ingestion endpoint,
/// usually this server's own alerts feed.
pub struct FeedAlertNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl FeedAlertNotifier {
    pub fn new(endpoint: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("Failed to build feed alert http client")?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl Notify for FeedAlertNotifier {
    async fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&[AlertItem {
                title,
                body,
                url: "",
            }])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(NotifyError::Status(response.status()));
        }
        Ok(())
    }
}
