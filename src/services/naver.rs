use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::chart::plain_text;
use crate::error::{AppError, Result};

const NAVER_BLOG_SEARCH_URL: &str = "https://openapi.naver.com/v1/search/blog.json";
const RESULT_COUNT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub title: String,
    pub description: String,
    pub link: String,
}

#[derive(Debug, Deserialize)]
struct BlogSearchResponse {
    #[serde(default)]
    items: Vec<BlogSearchItem>,
}

#[derive(Debug, Deserialize)]
struct BlogSearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    link: String,
}

impl From<BlogSearchItem> for BlogPost {
    fn from(item: BlogSearchItem) -> Self {
        Self {
            title: plain_text(&item.title),
            description: plain_text(&item.description),
            link: item.link,
        }
    }
}

/// Pass-through client for the Naver blog search API.
pub struct NaverBlogClient {
    client: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl NaverBlogClient {
    pub fn new(client_id: String, client_secret: String) -> Result<Self> {
        Self::with_base_url(NAVER_BLOG_SEARCH_URL, client_id, client_secret)
    }

    pub fn with_base_url(base_url: &str, client_id: String, client_secret: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            client_id,
            client_secret,
        })
    }

    /// Up to ten blog posts for `query`. Upstream failures yield an empty list.
    pub async fn search(&self, query: &str) -> Vec<BlogPost> {
        match self.try_search(query).await {
            Ok(posts) => posts,
            Err(e) => {
                tracing::warn!("Blog search for {:?} failed: {}", query, e);
                Vec::new()
            }
        }
    }

    async fn try_search(&self, query: &str) -> Result<Vec<BlogPost>> {
        let response = self
            .client
            .get(search_url(&self.base_url, query))
            .header("X-Naver-Client-Id", &self.client_id)
            .header("X-Naver-Client-Secret", &self.client_secret)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Blog search API answered HTTP {}", response.status()).into());
        }

        let body: BlogSearchResponse = response.json().await?;
        Ok(body
            .items
            .into_iter()
            .take(RESULT_COUNT)
            .map(BlogPost::from)
            .collect())
    }
}

fn search_url(base_url: &str, query: &str) -> String {
    format!(
        "{}?query={}&display={}&sort=sim",
        base_url,
        urlencoding::encode(query),
        RESULT_COUNT
    )
}
