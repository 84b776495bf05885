// Feed store client for a running advice server
//
// REST for writes and reads, `/ws/feed` WebSocket for live snapshots.

use super::{FeedStore, FeedSubscription};
use crate::error::{ErrorBody, StoreError};
use crate::models::{AdviceRecord, FeedOrder, FeedSnapshot, NewAdvice};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Deserialize;
use tokio_tungstenite::tungstenite::Message;

#[derive(Debug, Deserialize)]
struct AppendResponse {
    id: String,
}

/// Feed store backed by the advice server's HTTP API
pub struct RemoteFeedStore {
    http: reqwest::Client,
    base_url: String,
}

impl RemoteFeedStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn api(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// `/api/advices/{id}[/{action}]` with the id percent-encoded as one segment
    fn advice_url(&self, id: &str, action: Option<&str>) -> Result<reqwest::Url, StoreError> {
        let invalid = || StoreError::Persistence(format!("Invalid server URL: {}", self.base_url));
        let mut url = reqwest::Url::parse(&self.api("/advices")).map_err(|_| invalid())?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| invalid())?;
            segments.push(id);
            if let Some(action) = action {
                segments.push(action);
            }
        }
        Ok(url)
    }

    fn ws_url(&self, order: FeedOrder) -> Result<String, StoreError> {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else {
            return Err(StoreError::Persistence(format!(
                "Unsupported server URL: {}",
                self.base_url
            )));
        };
        Ok(format!("{}/ws/feed?order={}", ws_base, order))
    }

    /// Turn a non-success response into a store error
    async fn error_from(id: Option<&str>, response: reqwest::Response) -> StoreError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.details.unwrap_or(body.error))
            .unwrap_or(text);

        match (status, id) {
            (reqwest::StatusCode::NOT_FOUND, Some(id)) => StoreError::NotFound(id.to_string()),
            (reqwest::StatusCode::BAD_REQUEST, _) => StoreError::InvalidRecord(message),
            _ => StoreError::Persistence(format!("Server error ({}): {}", status, message)),
        }
    }
}

fn transport(e: reqwest::Error) -> StoreError {
    StoreError::Persistence(format!("Failed to reach advice server: {}", e))
}

#[async_trait]
impl FeedStore for RemoteFeedStore {
    async fn append(&self, advice: NewAdvice) -> Result<String, StoreError> {
        let response = self
            .http
            .post(self.api("/advices"))
            .json(&advice)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(Self::error_from(None, response).await);
        }

        let body: AppendResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Persistence(format!("Invalid append response: {}", e)))?;
        Ok(body.id)
    }

    async fn subscribe(&self, order: FeedOrder) -> Result<FeedSubscription, StoreError> {
        let url = self.ws_url(order)?;
        let (socket, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| StoreError::Persistence(format!("Failed to connect to {}: {}", url, e)))?;

        log::debug!("Subscribed to {}", url);

        let snapshots = futures_util::stream::unfold(socket, |mut socket| async move {
            loop {
                match socket.next().await? {
                    Ok(Message::Text(text)) => match serde_json::from_str::<FeedSnapshot>(&text) {
                        Ok(snapshot) => return Some((snapshot.advices, socket)),
                        Err(e) => log::warn!("Ignoring malformed feed frame: {}", e),
                    },
                    Ok(Message::Close(_)) => return None,
                    Ok(_) => {}
                    Err(e) => {
                        log::warn!("Feed connection error: {}", e);
                        return None;
                    }
                }
            }
        });

        Ok(FeedSubscription::new(order, snapshots.boxed()))
    }

    async fn increment_vote(&self, id: &str) -> Result<(), StoreError> {
        let response = self
            .http
            .post(self.advice_url(id, Some("vote"))?)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(Self::error_from(Some(id), response).await);
        }
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<AdviceRecord>, StoreError> {
        let response = self
            .http
            .get(self.advice_url(id, None)?)
            .send()
            .await
            .map_err(transport)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::error_from(Some(id), response).await);
        }

        response
            .json()
            .await
            .map(Some)
            .map_err(|e| StoreError::Persistence(format!("Invalid advice response: {}", e)))
    }

    async fn list(&self, order: FeedOrder) -> Result<Vec<AdviceRecord>, StoreError> {
        let response = self
            .http
            .get(self.api("/advices"))
            .query(&[("order", order.as_str())])
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(Self::error_from(None, response).await);
        }

        response
            .json()
            .await
            .map_err(|e| StoreError::Persistence(format!("Invalid feed response: {}", e)))
    }
}
