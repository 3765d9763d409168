use serde::{Deserialize, Serialize};
use std::fmt;

use crate::headlines::FeedView;

/// A broadcaster: stable platform channel id plus the label shown on its tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub label: String,
}

impl Channel {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Opaque platform video id; enough to build an embed or watch URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoRef(String);

impl VideoRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Video ids are URL-safe base64-ish tokens.  Anything else is treated as
    /// a malformed upstream answer rather than spliced into a URL.
    pub fn is_well_formed(id: &str) -> bool {
        !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl fmt::Display for VideoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of one live resolution.  Built fresh for every attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStream {
    pub channel_id: String,
    pub video: Option<VideoRef>,
}

impl ResolvedStream {
    pub fn is_live(&self) -> bool {
        self.video.is_some()
    }
}

/// What the player pane currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlayerBinding {
    #[default]
    Empty,
    Bound {
        channel_id: String,
        video: VideoRef,
        embed_url: String,
    },
}

impl PlayerBinding {
    pub fn is_bound(&self) -> bool {
        matches!(self, PlayerBinding::Bound { .. })
    }

    pub fn embed_url(&self) -> Option<&str> {
        match self {
            PlayerBinding::Bound { embed_url, .. } => Some(embed_url),
            PlayerBinding::Empty => None,
        }
    }

    pub fn video(&self) -> Option<&VideoRef> {
        match self {
            PlayerBinding::Bound { video, .. } => Some(video),
            PlayerBinding::Empty => None,
        }
    }
}

/// Per-click state machine: `Idle -> Resolving -> {Bound | NotLive}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabStatus {
    #[default]
    Idle,
    Resolving,
    Bound,
    NotLive,
}

impl TabStatus {
    /// Short label for the tab badge.
    pub fn badge_label(&self) -> Option<&'static str> {
        match self {
            TabStatus::Idle => None,
            TabStatus::Resolving => Some("…"),
            TabStatus::Bound => Some("LIVE"),
            TabStatus::NotLive => Some("OFF"),
        }
    }
}

/// User-visible "nothing live" message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub channel_label: String,
    pub message: String,
}

impl Notice {
    pub fn not_live(channel_label: &str) -> Self {
        Self {
            channel_label: channel_label.to_string(),
            message: format!("{}: no live stream right now", channel_label),
        }
    }
}

/// Tab activation + player state, owned by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UiState {
    /// Index of the active tab.  `None` only before the first activation.
    pub active: Option<usize>,
    pub status: TabStatus,
    pub player: PlayerBinding,
    pub notice: Option<Notice>,
    /// Generation of the most recent activation request.
    pub generation: u64,
}

impl UiState {
    pub fn is_active(&self, idx: usize) -> bool {
        self.active == Some(idx)
    }
}

/// Snapshot published by the core to the UI and the HTTP API.  `rev` is
/// bumped on every change so listeners can skip identical snapshots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeskState {
    #[serde(default)]
    pub rev: u64,
    pub channels: Vec<Channel>,
    pub ui: UiState,
    pub feed: FeedView,
}

impl DeskState {
    pub fn active_channel(&self) -> Option<&Channel> {
        self.ui.active.and_then(|i| self.channels.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_ref_well_formed() {
        assert!(VideoRef::is_well_formed("9Auq9mYxFEE"));
        assert!(VideoRef::is_well_formed("-upyPouRrB8"));
        assert!(!VideoRef::is_well_formed(""));
        assert!(!VideoRef::is_well_formed("abc?autoplay=0"));
        assert!(!VideoRef::is_well_formed("a b"));
    }

    #[test]
    fn test_notice_names_channel() {
        let n = Notice::not_live("DW NEWS");
        assert_eq!(n.channel_label, "DW NEWS");
        assert!(n.message.contains("DW NEWS"));
        assert!(n.message.contains("no live stream"));
    }

    #[test]
    fn test_player_binding_serializes_tagged() {
        let bound = PlayerBinding::Bound {
            channel_id: "A".into(),
            video: VideoRef::new("vid123"),
            embed_url: "https://www.youtube.com/embed/vid123".into(),
        };
        let json = serde_json::to_value(&bound).unwrap();
        assert_eq!(json["state"], "bound");
        assert_eq!(json["video"], "vid123");
        let empty = serde_json::to_value(PlayerBinding::Empty).unwrap();
        assert_eq!(empty["state"], "empty");
    }
}
