use crate::models::{HomeworkItem, WeekSchedule};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("{url} returned malformed JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Clone)]
pub struct FeedClient {
    http: Client,
    base_url: String,
}

impl FeedClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn calendar(&self) -> Result<WeekSchedule, FeedError> {
        self.get_json("calendar").await
    }

    pub async fn homework(&self) -> Result<Vec<HomeworkItem>, FeedError> {
        self.get_json("homework").await
    }

    async fn get_json<T: DeserializeOwned>(&self, feed: &str) -> Result<T, FeedError> {
        let url = format!("{}/{feed}", self.base_url);
        debug!(%url, "fetching feed");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| FeedError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                url,
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| FeedError::Decode { url, source })
    }
}
