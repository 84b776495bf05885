// Error taxonomy for advice generation, the feed store and configuration

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Failure of a single advice request, distinguishable by kind
#[derive(Debug, Error)]
pub enum AdviceError {
    #[error("Problem statement is required")]
    Validation,

    #[error("AI service initialization failed: {0}")]
    Initialization(String),

    #[error("Failed to set up AI flow: {0}")]
    FlowSetup(String),

    #[error("AI request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Empty response from AI")]
    EmptyGeneration,

    #[error("Failed to generate advice: {0}")]
    Generation(String),

    #[error("Failed to process request: {0}")]
    Unexpected(String),
}

impl AdviceError {
    /// Stable one-line summary used as the `error` field of the response body
    pub fn summary(&self) -> &'static str {
        match self {
            AdviceError::Validation => "Problem statement is required",
            AdviceError::Initialization(_) => "AI service initialization failed",
            AdviceError::FlowSetup(_) => "Failed to set up AI flow",
            AdviceError::Timeout(_) => "AI request timed out",
            AdviceError::EmptyGeneration => "Empty response from AI",
            AdviceError::Generation(_) => "Failed to generate advice",
            AdviceError::Unexpected(_) => "Failed to process request",
        }
    }

    /// Lower-level diagnostic; `None` for client-fixable input errors
    pub fn details(&self) -> Option<String> {
        match self {
            AdviceError::Validation => None,
            AdviceError::Initialization(msg)
            | AdviceError::FlowSetup(msg)
            | AdviceError::Generation(msg)
            | AdviceError::Unexpected(msg) => Some(msg.clone()),
            AdviceError::Timeout(limit) => {
                Some(format!("No response within {} seconds", limit.as_secs()))
            }
            AdviceError::EmptyGeneration => {
                Some("The model returned no usable text".to_string())
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AdviceError::Validation => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether retrying the same request later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AdviceError::Timeout(_) | AdviceError::EmptyGeneration | AdviceError::Generation(_)
        )
    }
}

/// JSON body for error responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AdviceError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.summary().to_string(),
            details: self.details(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Feed store failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Feed store unavailable: {0}")]
    Persistence(String),

    #[error("Advice not found: {0}")]
    NotFound(String),

    #[error("Invalid advice record: {0}")]
    InvalidRecord(String),
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let (status, summary) = match &self {
            StoreError::Persistence(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Feed store unavailable")
            }
            StoreError::NotFound(_) => (StatusCode::NOT_FOUND, "Advice not found"),
            StoreError::InvalidRecord(_) => (StatusCode::BAD_REQUEST, "Invalid advice record"),
        };
        let body = ErrorBody {
            error: summary.to_string(),
            details: Some(self.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

/// Startup configuration failure
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GOOGLE_AI_API_KEY is not set; pass --api-key, export GOOGLE_AI_API_KEY or add api_key to {0}")]
    MissingApiKey(String),

    #[error("Failed to read config file '{path}': {message}")]
    Read { path: String, message: String },

    #[error("Failed to parse config file '{path}': {message}")]
    Parse { path: String, message: String },
}
