//! Feed store adapter
//!
//! Three operations over the shared advice collection: append a record,
//! subscribe to live ordered snapshots, and increment a vote counter.
//! Votes are not deduplicated here; see [`crate::ledger`].

pub mod file_store;
pub mod remote;

pub use file_store::FileFeedStore;
pub use remote::RemoteFeedStore;

use crate::error::StoreError;
use crate::models::{AdviceRecord, FeedOrder, NewAdvice};
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;

/// The shared advice collection
#[async_trait]
pub trait FeedStore: Send + Sync {
    /// Create a record with a store-assigned id, timestamp and zero votes
    async fn append(&self, advice: NewAdvice) -> Result<String, StoreError>;

    /// Subscribe to full-list snapshots sorted by `order`, descending
    async fn subscribe(&self, order: FeedOrder) -> Result<FeedSubscription, StoreError>;

    /// Atomically add one vote to a record
    async fn increment_vote(&self, id: &str) -> Result<(), StoreError>;

    /// Read a single record
    async fn get(&self, id: &str) -> Result<Option<AdviceRecord>, StoreError>;

    /// One-shot read of the current ordered feed
    async fn list(&self, order: FeedOrder) -> Result<Vec<AdviceRecord>, StoreError> {
        let mut subscription = self.subscribe(order).await?;
        subscription
            .next()
            .await
            .ok_or_else(|| StoreError::Persistence("Feed closed before first snapshot".to_string()))
    }
}

/// Live sequence of feed snapshots
///
/// The first snapshot is the current state; later ones follow every change
/// to the collection. Dropping the subscription (or calling
/// [`FeedSubscription::unsubscribe`]) stops delivery and releases the
/// underlying channel or connection.
pub struct FeedSubscription {
    order: FeedOrder,
    snapshots: BoxStream<'static, Vec<AdviceRecord>>,
}

impl FeedSubscription {
    pub fn new(order: FeedOrder, snapshots: BoxStream<'static, Vec<AdviceRecord>>) -> Self {
        Self { order, snapshots }
    }

    pub fn order(&self) -> FeedOrder {
        self.order
    }

    /// Wait for the next snapshot; `None` once the store has gone away
    pub async fn next(&mut self) -> Option<Vec<AdviceRecord>> {
        self.snapshots.next().await
    }

    /// Stop receiving snapshots
    pub fn unsubscribe(self) {
        log::debug!("Unsubscribed from {} feed", self.order);
    }
}

impl std::fmt::Debug for FeedSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedSubscription")
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

/// Reject records that would break the non-empty text invariant
pub(crate) fn validate_new_advice(advice: &NewAdvice) -> Result<(), StoreError> {
    if advice.problem.trim().is_empty() {
        return Err(StoreError::InvalidRecord(
            "problem must not be empty".to_string(),
        ));
    }
    if advice.advice.trim().is_empty() {
        return Err(StoreError::InvalidRecord(
            "advice must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    #[test]
    fn test_validate_rejects_blank_text() {
        assert!(validate_new_advice(&NewAdvice::new("  ", "advice")).is_err());
        assert!(validate_new_advice(&NewAdvice::new("problem", "")).is_err());
        assert!(validate_new_advice(&NewAdvice::new("problem", "advice")).is_ok());
    }

    #[tokio::test]
    async fn test_subscription_ends_with_stream() {
        let mut subscription =
            FeedSubscription::new(FeedOrder::Latest, stream::iter(vec![Vec::new()]).boxed());
        assert_eq!(subscription.next().await, Some(Vec::new()));
        assert_eq!(subscription.next().await, None);
    }
}
