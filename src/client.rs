// HTTP client for the advice endpoint of a running server

use crate::advice::AdviceSource;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct GenerateAdviceRequest<'a> {
    problem: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateAdviceResponse {
    #[serde(default)]
    advice: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<String>,
}

/// Requests advice from `POST /generate-advice`
pub struct HttpAdviceClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAdviceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl AdviceSource for HttpAdviceClient {
    async fn request_advice(&self, problem: &str) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/generate-advice", self.base_url))
            .json(&GenerateAdviceRequest { problem })
            .send()
            .await
            .map_err(|e| anyhow!("Failed to reach advice server: {}", e))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| "Failed to generate advice".to_string());
            log::debug!("Advice request failed ({}): {}", status, text);
            return Err(anyhow!(message));
        }

        let body: GenerateAdviceResponse = serde_json::from_str(&text)
            .map_err(|_| anyhow!("Invalid response format from server"))?;

        body.advice
            .filter(|advice| !advice.is_empty())
            .ok_or_else(|| anyhow!("Invalid response format: missing advice"))
    }
}
