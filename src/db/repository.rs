use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Row, TransactionBehavior};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{ArtistEntryCount, ChartEntry, SearchTermCount};

use super::schema::SCHEMA;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the chart database.
///
/// Every method is one scoped unit of work: it runs a single closure on the
/// connection thread and, for writes, opens and finishes its own transaction
/// before returning. Nothing is held open between calls.
#[derive(Clone)]
pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref()).await?;
        Self::initialize(conn).await
    }

    /// In-memory database, mostly for tests.
    pub async fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::initialize(conn).await
    }

    async fn initialize(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            // Readers keep seeing the last committed snapshot while a replace is running.
            let _mode: String =
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Chart snapshot

    /// Swap the stored chart for `entries` in one transaction.
    ///
    /// Ranks must already be unique and positive; a constraint violation rolls the
    /// whole replace back and the previous snapshot stays in place.
    pub async fn replace_chart(
        &self,
        entries: Vec<ChartEntry>,
        fetched_at: DateTime<Utc>,
    ) -> Result<usize> {
        let stamp = fetched_at.to_rfc3339();
        let stored = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                tx.execute("DELETE FROM chart_entries", [])?;
                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO chart_entries (rank, title, artist, fetched_at) VALUES (?1, ?2, ?3, ?4)",
                    )?;
                    for entry in &entries {
                        stmt.execute(params![entry.rank, entry.title, entry.artist, stamp])?;
                    }
                }
                tx.commit()?;
                Ok(entries.len())
            })
            .await?;
        Ok(stored)
    }

    pub async fn chart(&self) -> Result<Vec<ChartEntry>> {
        let entries = self
            .conn
            .call(|conn| {
                let mut stmt = conn
                    .prepare("SELECT rank, title, artist FROM chart_entries ORDER BY rank ASC")?;
                let entries = stmt
                    .query_map([], chart_entry_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(entries)
            })
            .await?;
        Ok(entries)
    }

    pub async fn last_refreshed(&self) -> Result<Option<DateTime<Utc>>> {
        let stamp = self
            .conn
            .call(|conn| {
                let stamp: Option<String> =
                    conn.query_row("SELECT MAX(fetched_at) FROM chart_entries", [], |row| {
                        row.get(0)
                    })?;
                Ok(stamp)
            })
            .await?;
        Ok(stamp.and_then(|s| parse_datetime(&s)))
    }

    // Search term counter

    /// Count one submission of `term`. Blank terms are ignored.
    pub async fn record_term(&self, term: &str) -> Result<()> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(());
        }
        let term = term.to_string();

        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO search_terms (term, count) VALUES (?1, 1)
                       ON CONFLICT(term) DO UPDATE SET
                           count = count + 1,
                           last_seen = datetime('now')"#,
                    params![term],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    // Leaderboards

    /// Most searched terms, highest count first, ties in lexical order.
    pub async fn top_search_terms(&self, limit: usize) -> Result<Vec<SearchTermCount>> {
        let limit = sql_limit(limit);
        let terms = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT term, count FROM search_terms ORDER BY count DESC, term ASC LIMIT ?1",
                )?;
                let terms = stmt
                    .query_map(params![limit], search_term_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(terms)
            })
            .await?;
        Ok(terms)
    }

    /// Artists with the most entries in the current chart, ties in lexical order.
    pub async fn top_artists_by_entry_count(&self, limit: usize) -> Result<Vec<ArtistEntryCount>> {
        let limit = sql_limit(limit);
        let artists = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT artist, COUNT(*) AS entries
                       FROM chart_entries
                       GROUP BY artist
                       ORDER BY entries DESC, artist ASC
                       LIMIT ?1"#,
                )?;
                let artists = stmt
                    .query_map(params![limit], artist_count_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(artists)
            })
            .await?;
        Ok(artists)
    }

    // Artist lookup

    /// Case-sensitive substring match on the artist column, by rank.
    pub async fn find_by_artist_substring(&self, query: &str) -> Result<Vec<ChartEntry>> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let query = query.to_string();

        let entries = self
            .conn
            .call(move |conn| {
                // instr() instead of LIKE, which folds ASCII case
                let mut stmt = conn.prepare(
                    r#"SELECT rank, title, artist FROM chart_entries
                       WHERE instr(artist, ?1) > 0
                       ORDER BY rank ASC"#,
                )?;
                let entries = stmt
                    .query_map(params![query], chart_entry_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(entries)
            })
            .await?;
        Ok(entries)
    }
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // SQLite datetime('now') format
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn chart_entry_from_row(row: &Row) -> rusqlite::Result<ChartEntry> {
    Ok(ChartEntry {
        rank: row.get(0)?,
        title: row.get(1)?,
        artist: row.get(2)?,
    })
}

fn search_term_from_row(row: &Row) -> rusqlite::Result<SearchTermCount> {
    Ok(SearchTermCount {
        term: row.get(0)?,
        count: row.get::<_, i64>(1)?.max(0) as u64,
    })
}

fn artist_count_from_row(row: &Row) -> rusqlite::Result<ArtistEntryCount> {
    Ok(ArtistEntryCount {
        artist: row.get(0)?,
        entries: row.get::<_, i64>(1)?.max(0) as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(rank: u32, title: &str, artist: &str) -> ChartEntry {
        ChartEntry::new(rank, title, artist)
    }

    async fn repo_with_chart(entries: Vec<ChartEntry>) -> Repository {
        let repo = Repository::in_memory().await.unwrap();
        repo.replace_chart(entries, Utc::now()).await.unwrap();
        repo
    }

    #[tokio::test]
    async fn record_term_counts_each_submission() {
        let repo = Repository::in_memory().await.unwrap();
        repo.record_term("newjeans").await.unwrap();
        repo.record_term("newjeans").await.unwrap();
        repo.record_term("  newjeans  ").await.unwrap();
        repo.record_term("ive").await.unwrap();

        let terms = repo.top_search_terms(10).await.unwrap();
        assert_eq!(
            terms,
            vec![
                SearchTermCount { term: "newjeans".into(), count: 3 },
                SearchTermCount { term: "ive".into(), count: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn blank_terms_are_not_recorded() {
        let repo = Repository::in_memory().await.unwrap();
        repo.record_term("").await.unwrap();
        repo.record_term("   ").await.unwrap();
        repo.record_term("\t\n").await.unwrap();

        assert!(repo.top_search_terms(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn terms_differing_in_case_are_distinct() {
        let repo = Repository::in_memory().await.unwrap();
        repo.record_term("IU").await.unwrap();
        repo.record_term("iu").await.unwrap();

        assert_eq!(repo.top_search_terms(10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn search_term_ties_break_lexically() {
        let repo = Repository::in_memory().await.unwrap();
        for term in ["zico", "aespa", "bts", "bts"] {
            repo.record_term(term).await.unwrap();
        }

        let terms: Vec<String> = repo
            .top_search_terms(10)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.term)
            .collect();
        assert_eq!(terms, vec!["bts", "aespa", "zico"]);
    }

    #[tokio::test]
    async fn leaderboards_respect_limit() {
        let repo = repo_with_chart(vec![
            entry(1, "A", "X"),
            entry(2, "B", "Y"),
            entry(3, "C", "Z"),
        ])
        .await;
        repo.record_term("one").await.unwrap();
        repo.record_term("two").await.unwrap();

        assert_eq!(repo.top_artists_by_entry_count(2).await.unwrap().len(), 2);
        assert_eq!(repo.top_search_terms(1).await.unwrap().len(), 1);
        assert!(repo.top_artists_by_entry_count(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn artists_ranked_by_entry_count() {
        let repo = repo_with_chart(vec![
            entry(1, "A", "X"),
            entry(2, "B", "Y"),
            entry(3, "C", "X"),
        ])
        .await;

        let artists = repo.top_artists_by_entry_count(10).await.unwrap();
        assert_eq!(
            artists,
            vec![
                ArtistEntryCount { artist: "X".into(), entries: 2 },
                ArtistEntryCount { artist: "Y".into(), entries: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn artist_ties_break_lexically() {
        let repo = repo_with_chart(vec![
            entry(1, "A", "Zion"),
            entry(2, "B", "Abel"),
            entry(3, "C", "Mina"),
        ])
        .await;

        let names: Vec<String> = repo
            .top_artists_by_entry_count(10)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.artist)
            .collect();
        assert_eq!(names, vec!["Abel", "Mina", "Zion"]);
    }

    #[tokio::test]
    async fn artist_substring_is_case_sensitive_and_rank_ordered() {
        let repo = repo_with_chart(vec![
            entry(3, "Later", "Foo Fighters"),
            entry(1, "First", "Foo"),
            entry(2, "Other", "Bar"),
            entry(4, "Shout", "FOO"),
        ])
        .await;

        let hits = repo.find_by_artist_substring("oo").await.unwrap();
        assert_eq!(
            hits,
            vec![entry(1, "First", "Foo"), entry(3, "Later", "Foo Fighters")]
        );
    }

    #[tokio::test]
    async fn empty_artist_query_returns_nothing() {
        let repo = repo_with_chart(vec![entry(1, "A", "Foo")]).await;
        assert!(repo.find_by_artist_substring("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn replace_chart_discards_previous_snapshot() {
        let repo = repo_with_chart(vec![entry(1, "Old", "X"), entry(2, "Old2", "X")]).await;

        repo.replace_chart(vec![entry(1, "New", "Y")], Utc::now())
            .await
            .unwrap();

        assert_eq!(repo.chart().await.unwrap(), vec![entry(1, "New", "Y")]);
    }

    #[tokio::test]
    async fn failed_replace_keeps_previous_snapshot() {
        let repo = repo_with_chart(vec![entry(1, "Old", "X")]).await;

        let result = repo
            .replace_chart(vec![entry(1, "A", "Y"), entry(1, "B", "Z")], Utc::now())
            .await;

        assert!(result.unwrap_err().is_store());
        assert_eq!(repo.chart().await.unwrap(), vec![entry(1, "Old", "X")]);
    }

    #[tokio::test]
    async fn last_refreshed_tracks_replace_time() {
        let repo = Repository::in_memory().await.unwrap();
        assert!(repo.last_refreshed().await.unwrap().is_none());

        let at = DateTime::parse_from_rfc3339("2026-10-01T09:30:00+00:00")
            .unwrap()
            .with_timezone(&Utc);
        repo.replace_chart(vec![entry(1, "A", "X")], at).await.unwrap();

        assert_eq!(repo.last_refreshed().await.unwrap(), Some(at));
    }
}
