//! JSON-file backed feed store
//!
//! Records live in memory behind a mutex and the whole collection is written
//! atomically to `advices.json` after every mutation. A failed write rolls
//! the in-memory change back so memory and disk never disagree. Snapshots
//! are published on a watch channel while the lock is held, so subscribers
//! see changes in mutation order.

use super::{validate_new_advice, FeedStore, FeedSubscription};
use crate::error::StoreError;
use crate::file_storage::{read_json, write_json_locked};
use crate::models::{AdviceRecord, FeedOrder, NewAdvice};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

/// File name of the feed collection inside the data directory
pub const FEED_FILE_NAME: &str = "advices.json";

/// On-disk format of the feed collection
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct FeedFile {
    advices: Vec<AdviceRecord>,
}

pub struct FileFeedStore {
    /// `None` keeps the feed in memory only
    path: Option<PathBuf>,
    records: Mutex<Vec<AdviceRecord>>,
    changes: watch::Sender<Arc<Vec<AdviceRecord>>>,
}

impl FileFeedStore {
    /// Open (or create) the feed stored in `data_dir`
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        let path = data_dir.join(FEED_FILE_NAME);

        let records = if path.exists() {
            let file: FeedFile = read_json(&path).map_err(StoreError::Persistence)?;
            file.advices
        } else {
            Vec::new()
        };

        log::info!("Loaded {} advices from {:?}", records.len(), path);
        Ok(Self::with_records(Some(path), records))
    }

    /// A feed that is never written to disk
    pub fn in_memory() -> Self {
        Self::with_records(None, Vec::new())
    }

    fn with_records(path: Option<PathBuf>, records: Vec<AdviceRecord>) -> Self {
        let (changes, _) = watch::channel(Arc::new(records.clone()));
        Self {
            path,
            records: Mutex::new(records),
            changes,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of records in the feed
    pub fn len(&self) -> usize {
        self.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.changes.receiver_count()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<AdviceRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|e| StoreError::Persistence(format!("Feed lock poisoned: {}", e)))
    }

    fn persist(&self, records: &[AdviceRecord]) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let file = FeedFile {
            advices: records.to_vec(),
        };
        write_json_locked(path, &file).map_err(StoreError::Persistence)
    }

    fn publish(&self, records: &[AdviceRecord]) {
        self.changes.send_replace(Arc::new(records.to_vec()));
    }
}

#[async_trait]
impl FeedStore for FileFeedStore {
    async fn append(&self, advice: NewAdvice) -> Result<String, StoreError> {
        validate_new_advice(&advice)?;

        let mut records = self.lock()?;

        let mut id = uuid::Uuid::new_v4().to_string();
        while records.iter().any(|r| r.id == id) {
            id = uuid::Uuid::new_v4().to_string();
        }

        // Strictly increasing timestamps keep recency order total
        let mut timestamp = Utc::now();
        if let Some(latest) = records.iter().map(|r| r.timestamp).max() {
            if timestamp <= latest {
                timestamp = latest + Duration::microseconds(1);
            }
        }

        records.push(AdviceRecord {
            id: id.clone(),
            problem: advice.problem,
            advice: advice.advice,
            votes: 0,
            timestamp,
            vibe_level: advice.vibe_level,
        });

        if let Err(e) = self.persist(&records) {
            records.pop();
            log::error!("Failed to persist new advice: {}", e);
            return Err(e);
        }

        self.publish(&records);
        log::info!("Added advice {} (feed size {})", id, records.len());
        Ok(id)
    }

    async fn subscribe(&self, order: FeedOrder) -> Result<FeedSubscription, StoreError> {
        let receiver = self.changes.subscribe();

        let snapshots = futures_util::stream::unfold(
            (receiver, true),
            move |(mut receiver, first)| async move {
                if !first && receiver.changed().await.is_err() {
                    return None;
                }
                let snapshot = receiver.borrow_and_update().clone();
                Some((order.sort(snapshot.as_ref().clone()), (receiver, false)))
            },
        );

        log::debug!("New {} feed subscription", order);
        Ok(FeedSubscription::new(order, snapshots.boxed()))
    }

    async fn increment_vote(&self, id: &str) -> Result<(), StoreError> {
        let mut records = self.lock()?;

        let Some(index) = records.iter().position(|r| r.id == id) else {
            return Err(StoreError::NotFound(id.to_string()));
        };

        let previous = records[index].votes;
        records[index].votes = previous.saturating_add(1);

        if let Err(e) = self.persist(&records) {
            records[index].votes = previous;
            log::error!("Failed to persist vote for {}: {}", id, e);
            return Err(e);
        }

        self.publish(&records);
        log::debug!("Vote recorded for {} ({} votes)", id, records[index].votes);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<AdviceRecord>, StoreError> {
        let records = self.lock()?;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }
}
