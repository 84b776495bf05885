//! Feed View orchestration
//!
//! Maps user actions to calls: submitting a problem asks the advice source
//! and appends the result to the feed; voting goes through the dedup ledger
//! before and after the store increment. Rendering is plain text.

use crate::advice::AdviceSource;
use crate::error::StoreError;
use crate::feed::{FeedStore, FeedSubscription};
use crate::ledger::VoteDedupLedger;
use crate::models::{AdviceRecord, FeedOrder, NewAdvice};
use std::fmt;
use std::sync::Arc;

/// User-visible notice for an action that did not go through
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Submit pressed with nothing typed
    EmptyProblem,
    /// Advice generation or saving failed
    Busy(String),
    /// This device already voted for the advice
    AlreadyVoted,
    /// The vote could not be saved
    VoteFailed(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::EmptyProblem => write!(f, "🤔 Pehle problem toh likh, bhai!"),
            Notice::Busy(detail) => write!(
                f,
                "Bhai, system thoda busy hai. Phir se try karo! Error: {}",
                detail
            ),
            Notice::AlreadyVoted => write!(f, "Bhai, ek baar hi like kar sakta hai!"),
            Notice::VoteFailed(detail) => {
                write!(f, "Bhai, vote nahi gaya. Phir se try karo! Error: {}", detail)
            }
        }
    }
}

/// Result of a successful submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    pub id: String,
    pub advice: String,
}

/// Drives the feed for one user on one device
pub struct FeedController {
    advice_source: Arc<dyn AdviceSource>,
    store: Arc<dyn FeedStore>,
    ledger: VoteDedupLedger,
    order: FeedOrder,
    loading: bool,
}

impl FeedController {
    pub fn new(
        advice_source: Arc<dyn AdviceSource>,
        store: Arc<dyn FeedStore>,
        ledger: VoteDedupLedger,
    ) -> Self {
        Self {
            advice_source,
            store,
            ledger,
            order: FeedOrder::Latest,
            loading: false,
        }
    }

    pub fn order(&self) -> FeedOrder {
        self.order
    }

    pub fn set_order(&mut self, order: FeedOrder) {
        self.order = order;
    }

    /// Whether a submit is in flight
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn ledger(&self) -> &VoteDedupLedger {
        &self.ledger
    }

    /// Subscribe to the feed in the current order
    pub async fn watch(&self) -> Result<FeedSubscription, StoreError> {
        self.store.subscribe(self.order).await
    }

    /// Ask for advice on `problem` and add it to the feed
    pub async fn submit(&mut self, problem: &str) -> Result<Submitted, Notice> {
        if problem.trim().is_empty() {
            return Err(Notice::EmptyProblem);
        }

        self.loading = true;
        let result = self.generate_and_append(problem).await;
        self.loading = false;

        match &result {
            Ok(submitted) => {
                self.order = FeedOrder::Latest;
                log::info!("Advice {} added to the feed", submitted.id);
            }
            Err(notice) => log::warn!("Error generating advice: {}", notice),
        }
        result
    }

    async fn generate_and_append(&self, problem: &str) -> Result<Submitted, Notice> {
        let advice = self
            .advice_source
            .request_advice(problem)
            .await
            .map_err(|e| Notice::Busy(e.to_string()))?;

        let id = self
            .store
            .append(NewAdvice::new(problem, advice.clone()))
            .await
            .map_err(|e| Notice::Busy(e.to_string()))?;

        Ok(Submitted { id, advice })
    }

    /// Up-vote an advice once per device
    pub async fn vote(&mut self, id: &str) -> Result<(), Notice> {
        if self.ledger.has_voted(id) {
            log::debug!("Vote for {} rejected locally", id);
            return Err(Notice::AlreadyVoted);
        }

        self.store
            .increment_vote(id)
            .await
            .map_err(|e| Notice::VoteFailed(e.to_string()))?;

        if let Err(e) = self.ledger.record_vote(id) {
            log::warn!("Vote counted but ledger not saved: {}", e);
        }
        Ok(())
    }
}

/// Render one feed card; `position` is zero-based
pub fn render_card(position: usize, record: &AdviceRecord) -> String {
    format!(
        "Problem #{} [{}] {}\n  {}\n  Bhai's Advice: {}\n  👍 {}  (id {})",
        position + 1,
        record.vibe_level.label(),
        record.timestamp.format("%d/%m/%Y"),
        record.problem,
        record.advice,
        record.votes,
        record.id
    )
}

/// Render a whole snapshot, or the empty-feed message
pub fn render_feed(records: &[AdviceRecord]) -> String {
    if records.is_empty() {
        return "No advice yet. Be the first to ask a question and get Bhai's wisdom".to_string();
    }
    records
        .iter()
        .enumerate()
        .map(|(position, record)| render_card(position, record))
        .collect::<Vec<_>>()
        .join("\n\n")
}
