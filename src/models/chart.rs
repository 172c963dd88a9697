use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder stored when a chart row has no title or artist.
pub const MISSING_FIELD: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartEntry {
    pub rank: u32,
    pub title: String,
    pub artist: String,
}

impl ChartEntry {
    pub fn new(rank: u32, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            rank,
            title: title.into(),
            artist: artist.into(),
        }
    }
}

/// Outcome of a successful chart refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshReport {
    pub stored: usize,
    pub skipped_duplicates: usize,
    pub skipped_invalid: usize,
    pub refreshed_at: DateTime<Utc>,
}
