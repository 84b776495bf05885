//! Text generation providers
//!
//! The advice handler only sees the [`TextGenerator`] trait; provider
//! responses are converted to plain strings at this boundary.

pub mod gemini;

pub use gemini::{GeminiClient, GeminiSettings};

use async_trait::async_trait;

/// A hosted text-generation model
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Model identifier, for logging
    fn model(&self) -> &str;

    /// Verify the provider is usable before a request is issued
    /// (credentials present, model id well formed).
    fn check_ready(&self) -> Result<(), String>;

    /// Generate text for a prompt. An empty string means the provider
    /// answered without usable text; `Err` is a provider or network fault.
    async fn generate(&self, prompt: &str) -> Result<String, String>;
}
