use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{ChartEntry, RefreshReport};

use super::fetcher::ChartSource;
use super::parser::ChartDocument;

/// Fetches, parses and stores the chart as a single replace.
///
/// Nothing touches the database until fetching and parsing have both succeeded,
/// so a failed run leaves the previous snapshot as it was.
pub struct Refresher {
    source: Arc<dyn ChartSource>,
    repository: Repository,
}

impl Refresher {
    pub fn new(source: Arc<dyn ChartSource>, repository: Repository) -> Self {
        Self { source, repository }
    }

    pub async fn run(&self) -> Result<RefreshReport> {
        tracing::info!("Refreshing chart");

        let markup = self.source.fetch().await?;
        let document = ChartDocument::parse(markup)?;
        let batch = normalize(document.entries());

        if batch.entries.is_empty() {
            return Err(AppError::Parse(format!(
                "none of the {} chart rows had a usable rank",
                document.row_count()
            )));
        }

        let refreshed_at = Utc::now();
        let stored = self
            .repository
            .replace_chart(batch.entries, refreshed_at)
            .await?;

        tracing::info!(
            "Stored {} chart entries ({} duplicate ranks, {} invalid ranks skipped)",
            stored,
            batch.skipped_duplicates,
            batch.skipped_invalid
        );

        Ok(RefreshReport {
            stored,
            skipped_duplicates: batch.skipped_duplicates,
            skipped_invalid: batch.skipped_invalid,
            refreshed_at,
        })
    }
}

struct Batch {
    entries: Vec<ChartEntry>,
    skipped_duplicates: usize,
    skipped_invalid: usize,
}

/// Keep the first entry seen for each rank and drop rank 0.
fn normalize(entries: impl Iterator<Item = ChartEntry>) -> Batch {
    let mut seen = HashSet::new();
    let mut batch = Batch {
        entries: Vec::new(),
        skipped_duplicates: 0,
        skipped_invalid: 0,
    };

    for entry in entries {
        if entry.rank == 0 {
            tracing::warn!("Dropping chart entry {:?} with rank 0", entry.title);
            batch.skipped_invalid += 1;
            continue;
        }
        if !seen.insert(entry.rank) {
            tracing::warn!(
                "Dropping duplicate rank {} ({:?} by {:?})",
                entry.rank,
                entry.title,
                entry.artist
            );
            batch.skipped_duplicates += 1;
            continue;
        }
        batch.entries.push(entry);
    }

    batch
}
