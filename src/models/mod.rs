mod chart;
mod leaderboard;

pub use chart::{ChartEntry, RefreshReport, MISSING_FIELD};
pub use leaderboard::{ArtistEntryCount, SearchTermCount};
