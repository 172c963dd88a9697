use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::chart::{ChartFetcher, ChartSource, Refresher};
use crate::config::Config;
use crate::db::Repository;
use crate::error::Result;
use crate::models::{ArtistEntryCount, ChartEntry, RefreshReport, SearchTermCount};
use crate::services::{BlogPost, NaverBlogClient};

/// Everything the front page shows.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub chart: Vec<ChartEntry>,
    pub top_search_terms: Vec<SearchTermCount>,
    pub top_artists: Vec<ArtistEntryCount>,
    pub last_refreshed: Option<DateTime<Utc>>,
}

/// Chart writes only happen through [`App::refresh_chart`]; the repository
/// itself is not reachable from outside.
///
/// ```compile_fail
/// async fn bypass(app: &chart_ranker::App) {
///     let _ = app.repository.replace_chart(Vec::new(), chrono::Utc::now()).await;
/// }
/// ```
pub struct App {
    repository: Repository,
    refresher: Refresher,
    blog_search: Option<NaverBlogClient>,
    leaderboard_limit: usize,
}

impl App {
    pub async fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let repository = Repository::new(&config.db_path).await?;
        let fetcher = Arc::new(ChartFetcher::new(config)?);

        let blog_search = match config.naver_credentials() {
            Some((id, secret)) => Some(NaverBlogClient::new(id, secret)?),
            None => {
                tracing::debug!("Naver credentials not configured, blog search disabled");
                None
            }
        };

        Ok(Self::with_parts(
            repository,
            fetcher,
            blog_search,
            config.leaderboard_limit,
        ))
    }

    pub fn with_parts(
        repository: Repository,
        source: Arc<dyn ChartSource>,
        blog_search: Option<NaverBlogClient>,
        leaderboard_limit: usize,
    ) -> Self {
        let refresher = Refresher::new(source, repository.clone());
        Self {
            repository,
            refresher,
            blog_search,
            leaderboard_limit,
        }
    }

    pub fn leaderboard_limit(&self) -> usize {
        self.leaderboard_limit
    }

    pub async fn refresh_chart(&self) -> Result<RefreshReport> {
        self.refresher.run().await
    }

    /// Count the term, then look it up. Counting is best effort.
    pub async fn search(&self, query: &str) -> Vec<BlogPost> {
        if let Err(e) = self.repository.record_term(query).await {
            tracing::warn!("Failed to record search term {:?}: {}", query, e);
        }

        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        match &self.blog_search {
            Some(client) => client.search(query).await,
            None => Vec::new(),
        }
    }

    pub async fn top_search_terms(&self, limit: usize) -> Result<Vec<SearchTermCount>> {
        self.repository.top_search_terms(limit).await
    }

    pub async fn top_artists(&self, limit: usize) -> Result<Vec<ArtistEntryCount>> {
        self.repository.top_artists_by_entry_count(limit).await
    }

    pub async fn find_by_artist(&self, query: &str) -> Result<Vec<ChartEntry>> {
        self.repository.find_by_artist_substring(query).await
    }

    pub async fn chart(&self) -> Result<Vec<ChartEntry>> {
        self.repository.chart().await
    }

    pub async fn dashboard(&self) -> Result<Dashboard> {
        let limit = self.leaderboard_limit;
        let (chart, top_search_terms, top_artists, last_refreshed) = futures::try_join!(
            self.repository.chart(),
            self.repository.top_search_terms(limit),
            self.repository.top_artists_by_entry_count(limit),
            self.repository.last_refreshed(),
        )?;

        Ok(Dashboard {
            chart,
            top_search_terms,
            top_artists,
            last_refreshed,
        })
    }
}
