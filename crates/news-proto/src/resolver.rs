//! Live resolver — asks the video platform whether a channel is live right now.
//!
//! One search request per resolution.  No caching, no retry, and no client
//! timeout: a hung request only ever delays its own activation, because the
//! controller discards results that arrive after a newer click.

use std::future::Future;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::YoutubeConfig;
use crate::error::ResolveError;
use crate::protocol::{ResolvedStream, VideoRef};

/// Anything that can answer "which video is this channel streaming live?".
pub trait LiveSearch: Send + Sync {
    fn search_live(
        &self,
        channel_id: &str,
    ) -> impl Future<Output = Result<Option<VideoRef>, ResolveError>> + Send;
}

/// Resolve `channel_id`, folding every failure into "not live".
pub async fn resolve<S: LiveSearch>(search: &S, channel_id: &str) -> ResolvedStream {
    let video = if channel_id.trim().is_empty() {
        warn!("resolve: empty channel id, treating as not live");
        None
    } else {
        match search.search_live(channel_id).await {
            Ok(video) => video,
            Err(e) => {
                warn!("resolve {}: {}", channel_id, e);
                None
            }
        }
    };
    debug!("resolve {} → {:?}", channel_id, video);
    ResolvedStream {
        channel_id: channel_id.to_string(),
        video,
    }
}

// ── YouTube Data API search ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Option<Vec<SearchItem>>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    id: Option<SearchItemId>,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

/// Extract the first live video id from a search response body.
/// Missing or empty `items` means "not live".
pub fn parse_search_response(body: &[u8]) -> Result<Option<VideoRef>, ResolveError> {
    let response: SearchResponse =
        serde_json::from_slice(body).map_err(|e| ResolveError::Malformed(e.to_string()))?;

    let first = response
        .items
        .unwrap_or_default()
        .into_iter()
        .find_map(|item| item.id.and_then(|id| id.video_id));

    match first {
        None => Ok(None),
        Some(id) if VideoRef::is_well_formed(&id) => Ok(Some(VideoRef::new(id))),
        Some(id) => Err(ResolveError::Malformed(format!(
            "unexpected video id {:?}",
            id
        ))),
    }
}

pub struct YoutubeSearch {
    client: reqwest::Client,
    search_url: String,
    api_key: Option<String>,
}

impl YoutubeSearch {
    pub fn new(search_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            search_url: search_url.into(),
            api_key,
        }
    }

    pub fn from_config(config: &YoutubeConfig) -> Self {
        let api_key = config.api_key();
        if api_key.is_none() {
            warn!(
                "{} is not set; live search requests go out without a key",
                config.api_key_env
            );
        }
        Self::new(config.search_url.clone(), api_key)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Query parameters for a single live-video lookup.
    pub fn query(&self, channel_id: &str) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("part", "snippet".to_string()),
            ("channelId", channel_id.to_string()),
            ("eventType", "live".to_string()),
            ("type", "video".to_string()),
            ("maxResults", "1".to_string()),
        ];
        if let Some(key) = &self.api_key {
            query.push(("key", key.clone()));
        }
        query
    }
}

impl LiveSearch for YoutubeSearch {
    async fn search_live(&self, channel_id: &str) -> Result<Option<VideoRef>, ResolveError> {
        let response = self
            .client
            .get(&self.search_url)
            .query(&self.query(channel_id))
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status(status));
        }

        let body = response.bytes().await?;
        parse_search_response(&body)
    }
}
