// Feed data model shared by the store, the server and the Feed View

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A persisted problem/advice pair with its vote count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdviceRecord {
    /// Store-assigned identifier
    pub id: String,
    pub problem: String,
    pub advice: String,
    /// Only ever incremented, one at a time
    pub votes: u64,
    /// Creation time, assigned by the store
    pub timestamp: DateTime<Utc>,
    pub vibe_level: VibeLevel,
}

/// A record as submitted for creation, before the store assigns id/timestamp/votes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAdvice {
    pub problem: String,
    pub advice: String,
    pub vibe_level: VibeLevel,
}

impl NewAdvice {
    /// Create a new advice with a freshly rolled vibe level
    pub fn new(problem: impl Into<String>, advice: impl Into<String>) -> Self {
        Self {
            problem: problem.into(),
            advice: advice.into(),
            vibe_level: VibeLevel::random(),
        }
    }
}

/// Cosmetic rating in [1,5], assigned randomly at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct VibeLevel(u8);

const VIBE_LABELS: [&str; 5] = ["Basic", "Good", "Great", "Excellent", "Legendary"];

impl VibeLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Draw a level uniformly from [1,5]
    pub fn random() -> Self {
        Self(rand::thread_rng().gen_range(Self::MIN..=Self::MAX))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Display label shown on feed cards
    pub fn label(self) -> &'static str {
        VIBE_LABELS[(self.0 - Self::MIN) as usize]
    }
}

impl Default for VibeLevel {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl TryFrom<u8> for VibeLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!(
                "vibe level must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            ))
        }
    }
}

impl From<VibeLevel> for u8 {
    fn from(level: VibeLevel) -> Self {
        level.0
    }
}

/// Sort key for feed subscriptions (always descending)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedOrder {
    /// Newest first
    #[default]
    Latest,
    /// Most votes first, newest first among equal votes
    Popular,
}

impl FeedOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            FeedOrder::Latest => "latest",
            FeedOrder::Popular => "popular",
        }
    }

    /// Compare two records so that sorting ascending yields the feed order
    pub fn compare(self, a: &AdviceRecord, b: &AdviceRecord) -> Ordering {
        match self {
            FeedOrder::Latest => b.timestamp.cmp(&a.timestamp),
            FeedOrder::Popular => b
                .votes
                .cmp(&a.votes)
                .then_with(|| b.timestamp.cmp(&a.timestamp)),
        }
    }

    /// Return the records sorted by this order
    pub fn sort(self, mut records: Vec<AdviceRecord>) -> Vec<AdviceRecord> {
        records.sort_by(|a, b| self.compare(a, b));
        records
    }
}

impl fmt::Display for FeedOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latest" | "recency" | "timestamp" => Ok(FeedOrder::Latest),
            "popular" | "popularity" | "votes" => Ok(FeedOrder::Popular),
            other => Err(format!("Unknown feed order: {}", other)),
        }
    }
}

/// Snapshot frame pushed to live feed subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    pub order: FeedOrder,
    pub advices: Vec<AdviceRecord>,
}
