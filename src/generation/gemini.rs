// Google Gemini provider
//
// Uses the `generateContent` REST endpoint:
//   POST {base_url}/v1beta/models/{model}:generateContent
//   header x-goog-api-key: <key>
// The text of every part of the first candidate is concatenated.

use super::TextGenerator;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Connection settings for the Gemini API
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl GeminiSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

// Wire types: only the fields we read

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate (empty if there is none)
    fn into_text(self) -> String {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            log::warn!("[GeminiClient] Prompt blocked: {}", reason);
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            return String::new();
        };

        if let Some(reason) = &candidate.finish_reason {
            log::debug!("[GeminiClient] Finish reason: {}", reason);
        }

        candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

fn model_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._\-]*$").expect("valid regex"))
}

/// Gemini API client
pub struct GeminiClient {
    http: reqwest::Client,
    settings: GeminiSettings,
}

impl GeminiClient {
    pub fn new(settings: GeminiSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn model(&self) -> &str {
        &self.settings.model
    }

    fn check_ready(&self) -> Result<(), String> {
        if self.settings.api_key.trim().is_empty() {
            return Err("Gemini API key is empty".to_string());
        }
        if !model_id_pattern().is_match(&self.settings.model) {
            return Err(format!("Invalid Gemini model id: '{}'", self.settings.model));
        }
        if reqwest::Url::parse(&self.settings.base_url).is_err() {
            return Err(format!(
                "Invalid Gemini base URL: '{}'",
                self.settings.base_url
            ));
        }
        Ok(())
    }

    async fn generate(&self, prompt: &str) -> Result<String, String> {
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        log::debug!("[GeminiClient] Requesting {}", self.settings.model);

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.settings.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("Gemini request failed: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&text)
                .map(|envelope| match envelope.error.status {
                    Some(kind) => format!("{} ({})", envelope.error.message, kind),
                    None => envelope.error.message,
                })
                .unwrap_or(text);
            return Err(format!("Gemini API error ({}): {}", status, message));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse Gemini response: {}", e))?;

        Ok(body.into_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_key: &str, model: &str) -> GeminiClient {
        GeminiClient::new(GeminiSettings::new(api_key).with_model(model))
    }

    #[test]
    fn test_check_ready_requires_api_key() {
        assert!(client("", DEFAULT_GEMINI_MODEL).check_ready().is_err());
        assert!(client("   ", DEFAULT_GEMINI_MODEL).check_ready().is_err());
        assert!(client("key", DEFAULT_GEMINI_MODEL).check_ready().is_ok());
    }

    #[test]
    fn test_check_ready_rejects_malformed_model() {
        assert!(client("key", "models/../x").check_ready().is_err());
        assert!(client("key", "gemini 1.5").check_ready().is_err());
        assert!(client("key", "gemini-2.0-flash").check_ready().is_ok());
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = GeminiClient::new(
            GeminiSettings::new("key").with_base_url("http://localhost:9999/"),
        );
        assert_eq!(
            client.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_response_text_concatenates_parts() {
        let body: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"bhai "},{"text":"seedha bol de"}]},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(body.into_text(), "bhai seedha bol de");
    }

    #[test]
    fn test_response_without_candidates_is_empty() {
        let body: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert_eq!(body.into_text(), "");
    }
}
