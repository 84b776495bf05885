//! Advice request handling
//!
//! One request runs: validate the problem, check the generator, render the
//! persona prompt, then race a single generation call against a fixed
//! 15-second timer. There are no retries; every terminal phase is reported
//! straight back to the caller.

pub mod lifecycle;
pub mod race;

pub use lifecycle::{PhaseTransitionError, RequestLifecycle, RequestPhase};
pub use race::{race_with_timeout, RaceOutcome};

use crate::error::AdviceError;
use crate::generation::TextGenerator;
use crate::prompt::PersonaPrompt;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on a single generation call
pub const GENERATION_TIMEOUT: Duration = Duration::from_secs(15);

impl From<PhaseTransitionError> for AdviceError {
    fn from(e: PhaseTransitionError) -> Self {
        AdviceError::Unexpected(e.to_string())
    }
}

/// Anything that can turn a problem into advice text
#[async_trait]
pub trait AdviceSource: Send + Sync {
    async fn request_advice(&self, problem: &str) -> anyhow::Result<String>;
}

/// Turns a problem statement into advice using a text generator
pub struct AdviceHandler {
    generator: Arc<dyn TextGenerator>,
    prompt: Result<PersonaPrompt, String>,
    timeout: Duration,
}

impl AdviceHandler {
    /// Create a handler with the built-in persona prompt
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            prompt: PersonaPrompt::new(),
            timeout: GENERATION_TIMEOUT,
        }
    }

    /// Use a custom prompt template; a template that fails to compile is
    /// reported per request as a flow-setup failure
    pub fn with_prompt_template(mut self, template: &str) -> Self {
        self.prompt = PersonaPrompt::from_template(template);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Handle one advice request, returning the trimmed advice text
    pub async fn handle(&self, problem: &str) -> Result<String, AdviceError> {
        let request_id = uuid::Uuid::new_v4().simple().to_string();
        let mut lifecycle = RequestLifecycle::new(&request_id[..8]);

        lifecycle.advance(RequestPhase::Validating)?;
        if problem.trim().is_empty() {
            lifecycle.advance(RequestPhase::Rejected)?;
            log::debug!("Rejected advice request with blank problem");
            return Err(AdviceError::Validation);
        }

        if let Err(e) = self.generator.check_ready() {
            lifecycle.advance(RequestPhase::Failed)?;
            log::error!("Error initializing {}: {}", self.generator.model(), e);
            return Err(AdviceError::Initialization(e));
        }

        let prompt = match &self.prompt {
            Ok(template) => template.render(problem),
            Err(e) => Err(e.clone()),
        };
        let prompt = match prompt {
            Ok(prompt) => prompt,
            Err(e) => {
                lifecycle.advance(RequestPhase::Failed)?;
                log::error!("Error setting up advice prompt: {}", e);
                return Err(AdviceError::FlowSetup(e));
            }
        };

        lifecycle.advance(RequestPhase::Generating)?;
        let outcome = race_with_timeout(self.generator.generate(&prompt), self.timeout).await;

        match outcome {
            RaceOutcome::Succeeded(text) => {
                let advice = text.trim();
                if advice.is_empty() {
                    lifecycle.advance(RequestPhase::Failed)?;
                    log::warn!("Empty response from {}", self.generator.model());
                    return Err(AdviceError::EmptyGeneration);
                }
                lifecycle.advance(RequestPhase::Succeeded)?;
                log::info!(
                    "Generated advice ({} chars) with {}",
                    advice.len(),
                    self.generator.model()
                );
                Ok(advice.to_string())
            }
            RaceOutcome::Failed(e) => {
                lifecycle.advance(RequestPhase::Failed)?;
                log::error!("Error in AI advice generation: {}", e);
                Err(AdviceError::Generation(e))
            }
            RaceOutcome::TimedOut => {
                lifecycle.advance(RequestPhase::TimedOut)?;
                log::warn!(
                    "AI request timed out after {}s",
                    self.timeout.as_secs_f32()
                );
                Err(AdviceError::Timeout(self.timeout))
            }
        }
    }
}

#[async_trait]
impl AdviceSource for AdviceHandler {
    async fn request_advice(&self, problem: &str) -> anyhow::Result<String> {
        Ok(self.handle(problem).await?)
    }
}
