use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;

use crate::config::Config;
use crate::error::{AppError, FetchError, Result};

/// Anything that can hand over the raw chart page.
#[async_trait]
pub trait ChartSource: Send + Sync {
    async fn fetch(&self) -> std::result::Result<String, FetchError>;
}

/// Pulls the chart page over HTTP. One attempt per call, no retries.
pub struct ChartFetcher {
    client: Client,
    url: String,
}

impl ChartFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_timeouts(
            &config.chart_url,
            &config.user_agent,
            Duration::from_secs(config.fetch_timeout_secs),
            Duration::from_secs(config.connect_timeout_secs),
        )
    }

    pub fn with_timeouts(
        url: &str,
        user_agent: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/html,application/xhtml+xml"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ko-KR,ko;q=0.9,en;q=0.8"));

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ChartSource for ChartFetcher {
    async fn fetch(&self) -> std::result::Result<String, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Chart fetch from {} answered {}", self.url, status);
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(FetchError::Transport)?;
        tracing::debug!("Fetched {} bytes from {}", body.len(), self.url);
        Ok(body)
    }
}
