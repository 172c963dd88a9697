use thiserror::Error;

/// Why a chart page could not be retrieved.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("chart source answered HTTP {0}")]
    Status(u16),

    #[error("chart source unreachable: {0}")]
    Transport(#[source] reqwest::Error),
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status(code) => Some(*code),
            FetchError::Transport(_) => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Parse failed: {0}")]
    Parse(String),

    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Store error: {0}")]
    AsyncStore(#[from] tokio_rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// True for failures of the persistence layer.
    pub fn is_store(&self) -> bool {
        matches!(self, AppError::Store(_) | AppError::AsyncStore(_))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
