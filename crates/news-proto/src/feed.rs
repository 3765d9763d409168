//! Headline feed fetcher.
//!
//! Every refresh goes back to the source: URLs get a cache-busting query
//! parameter plus no-cache headers, files are re-read from disk.

use std::path::{Path, PathBuf};

use reqwest::Url;
use tracing::{debug, warn};

use crate::config::HeadlinesConfig;
use crate::error::FeedError;
use crate::headlines::{self, FeedView};

/// Name of the cache-busting query parameter.
pub const CACHE_BUST_PARAM: &str = "_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadlineSource {
    Url(String),
    File(PathBuf),
}

impl HeadlineSource {
    /// `http://` / `https://` prefixes select a URL, anything else is a path.
    pub fn parse(source: &str) -> Self {
        let trimmed = source.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            HeadlineSource::Url(trimmed.to_string())
        } else {
            HeadlineSource::File(PathBuf::from(trimmed))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            HeadlineSource::Url(url) => url.clone(),
            HeadlineSource::File(path) => path.display().to_string(),
        }
    }
}

/// Append `_=<stamp>` to `url`, keeping any existing query.
pub fn cache_busted_url(url: &str, stamp: i64) -> Result<Url, FeedError> {
    let mut url = Url::parse(url).map_err(|e| FeedError::Url(format!("{}: {}", url, e)))?;
    url.query_pairs_mut()
        .append_pair(CACHE_BUST_PARAM, &stamp.to_string());
    Ok(url)
}

pub struct HeadlineFeed {
    client: reqwest::Client,
    source: HeadlineSource,
}

impl HeadlineFeed {
    pub fn new(source: HeadlineSource) -> Self {
        Self {
            client: reqwest::Client::new(),
            source,
        }
    }

    pub fn from_config(config: &HeadlinesConfig) -> Self {
        Self::new(HeadlineSource::parse(&config.source))
    }

    pub fn source(&self) -> &HeadlineSource {
        &self.source
    }

    /// Raw document text.
    pub async fn fetch(&self) -> Result<String, FeedError> {
        match &self.source {
            HeadlineSource::Url(url) => self.fetch_url(url).await,
            HeadlineSource::File(path) => read_file(path).await,
        }
    }

    async fn fetch_url(&self, url: &str) -> Result<String, FeedError> {
        let url = cache_busted_url(url, chrono::Utc::now().timestamp_millis())?;
        debug!("fetching headlines from {}", url);

        let response = self
            .client
            .get(url)
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status));
        }
        Ok(response.text().await?)
    }

    pub async fn load(&self) -> Result<FeedView, FeedError> {
        let text = self.fetch().await?;
        headlines::parse_document(&text)
    }

    /// Fetch and normalise.  Failures become `NotFound` so a broken refresh
    /// replaces whatever was shown before.
    pub async fn refresh(&self) -> FeedView {
        match self.load().await {
            Ok(view) => {
                debug!(
                    "headlines from {}: {} entries",
                    self.source.describe(),
                    view.headlines().len()
                );
                view
            }
            Err(e) => {
                warn!("headline refresh from {} failed: {}", self.source.describe(), e);
                FeedView::NotFound {
                    reason: e.to_string(),
                }
            }
        }
    }
}

async fn read_file(path: &Path) -> Result<String, FeedError> {
    Ok(tokio::fs::read_to_string(path).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_parse() {
        assert_eq!(
            HeadlineSource::parse("https://example.org/top_news.json"),
            HeadlineSource::Url("https://example.org/top_news.json".into())
        );
        assert_eq!(
            HeadlineSource::parse("HTTP://example.org/x.json"),
            HeadlineSource::Url("HTTP://example.org/x.json".into())
        );
        assert_eq!(
            HeadlineSource::parse("data/top_news.json"),
            HeadlineSource::File(PathBuf::from("data/top_news.json"))
        );
    }

    #[test]
    fn test_cache_busted_url_keeps_existing_query() {
        let url = cache_busted_url("https://example.org/news.json?region=eu", 1706520000000).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.org/news.json?region=eu&_=1706520000000"
        );
        let url = cache_busted_url("https://example.org/news.json", 7).unwrap();
        assert_eq!(url.query(), Some("_=7"));
        assert!(matches!(cache_busted_url("not a url", 1), Err(FeedError::Url(_))));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let feed = HeadlineFeed::new(HeadlineSource::File(dir.path().join("absent.json")));
        assert!(matches!(feed.refresh().await, FeedView::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_file_is_reread_on_every_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("top_news.json");
        std::fs::write(&path, r#"[{"title": "First"}]"#).unwrap();
        let feed = HeadlineFeed::new(HeadlineSource::File(path.clone()));
        assert_eq!(feed.refresh().await.headlines()[0].title, "First");

        std::fs::write(&path, r#"{"items": []}"#).unwrap();
        assert_eq!(feed.refresh().await, FeedView::Empty);

        std::fs::write(&path, "{broken").unwrap();
        assert!(matches!(feed.refresh().await, FeedView::NotFound { .. }));
    }
}
