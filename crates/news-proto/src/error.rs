use reqwest::StatusCode;

/// Why a live search produced no answer.  Callers collapse every variant to
/// "not live"; the distinction only reaches the log.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("live search request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("live search returned HTTP {0}")]
    Status(StatusCode),
    #[error("malformed live search response: {0}")]
    Malformed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("failed to read headline file: {0}")]
    Io(#[from] std::io::Error),
    #[error("headline request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("headline source returned HTTP {0}")]
    Status(StatusCode),
    #[error("invalid headline URL: {0}")]
    Url(String),
    #[error("headline document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("headline document has no article list")]
    NoList,
}
