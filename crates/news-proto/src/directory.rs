//! Channel directory — the fixed, ordered list of broadcasters.

use std::path::Path;

use tracing::{info, warn};

use crate::protocol::Channel;

/// Built-in broadcaster table: (platform channel id, tab label).
const BUILTIN_CHANNELS: &[(&str, &str)] = &[
    ("UCoMdktPbSTixAyNGwb-UYkQ", "SKY NEWS"),
    ("UCeY0bbntWzzVIaj2z3QigXg", "NBC NEWS"),
    ("UC8p1vwvWtl6T73JiExfWs1g", "CBS NEWS"),
    ("UCBi2mrWuNuyYy4gbM6fU18Q", "ABC NEWS"),
    ("UCknLrEdhRCp1aegoMqRaCZg", "DW NEWS"),
    ("UCNye-wNBqNL5ZzHSJj3l8Bg", "AL JAZEERA"),
    ("UCQfwfsi5VrQ8yKZ-UWmAEFg", "FRANCE 24"),
    ("UCSrZ3UV4jOidv8ppoVuvW9Q", "EURONEWS"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDirectory {
    channels: Vec<Channel>,
}

impl ChannelDirectory {
    pub fn new(channels: Vec<Channel>) -> Self {
        Self { channels }
    }

    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_CHANNELS
                .iter()
                .map(|(id, label)| Channel::new(*id, *label))
                .collect(),
        )
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn get(&self, idx: usize) -> Option<&Channel> {
        self.channels.get(idx)
    }

    pub fn first(&self) -> Option<&Channel> {
        self.channels.first()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn position(&self, channel_id: &str) -> Option<usize> {
        self.channels.iter().position(|c| c.id == channel_id)
    }

    /// Use the TOML override at `path` when it exists and parses to at least
    /// one channel; the built-in table otherwise.
    pub fn load_or_builtin(path: &Path) -> Self {
        if path.exists() {
            match load_channels_from_toml(path) {
                Ok(channels) if !channels.is_empty() => {
                    info!(
                        "Loaded {} channels from TOML: {}",
                        channels.len(),
                        path.display()
                    );
                    return Self::new(channels);
                }
                Ok(_) => warn!("{} lists no usable channels, using built-in table", path.display()),
                Err(e) => warn!("Failed to parse TOML channels: {}", e),
            }
        }
        Self::builtin()
    }
}

impl Default for ChannelDirectory {
    fn default() -> Self {
        Self::builtin()
    }
}

// ── TOML channel loader ───────────────────────────────────────────────────────

/// Matches the `[[channel]]` table of `channels.toml`.
#[derive(Debug, serde::Deserialize)]
struct TomlChannelFile {
    #[serde(default)]
    channel: Vec<TomlChannel>,
}

#[derive(Debug, serde::Deserialize)]
struct TomlChannel {
    id: String,
    #[serde(default)]
    label: String,
}

pub fn load_channels_from_toml(path: &Path) -> anyhow::Result<Vec<Channel>> {
    let content = std::fs::read_to_string(path)?;
    parse_channels_from_toml_str(&content)
}

/// Entries with a blank id are dropped; a blank label falls back to the id.
pub fn parse_channels_from_toml_str(content: &str) -> anyhow::Result<Vec<Channel>> {
    let file: TomlChannelFile = toml::from_str(content)?;
    let channels = file
        .channel
        .into_iter()
        .filter_map(|c| {
            let id = c.id.trim().to_string();
            if id.is_empty() {
                return None;
            }
            let label = match c.label.trim() {
                "" => id.clone(),
                l => l.to_string(),
            };
            Some(Channel { id, label })
        })
        .collect();
    Ok(channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_is_ordered_and_unique() {
        let dir = ChannelDirectory::builtin();
        assert_eq!(dir.len(), 8);
        assert_eq!(dir.first().unwrap().label, "SKY NEWS");
        assert_eq!(dir.get(7).unwrap().label, "EURONEWS");
        let mut ids: Vec<_> = dir.channels().iter().map(|c| c.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 8);
        assert!(dir.channels().iter().all(|c| c.id.starts_with("UC")));
    }

    #[test]
    fn test_parse_toml_skips_blank_ids() {
        let channels = parse_channels_from_toml_str(
            r#"
            [[channel]]
            id = "UCabc"
            label = "Alpha"

            [[channel]]
            id = "  "
            label = "Ghost"

            [[channel]]
            id = "UCdef"
            "#,
        )
        .unwrap();
        assert_eq!(
            channels,
            vec![Channel::new("UCabc", "Alpha"), Channel::new("UCdef", "UCdef")]
        );
    }

    #[test]
    fn test_load_or_builtin_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("channels.toml");
        assert_eq!(ChannelDirectory::load_or_builtin(&missing), ChannelDirectory::builtin());

        std::fs::write(&missing, "this is [not toml").unwrap();
        assert_eq!(ChannelDirectory::load_or_builtin(&missing), ChannelDirectory::builtin());

        std::fs::write(&missing, "[[channel]]\nid = \"UCx\"\nlabel = \"X\"\n").unwrap();
        let loaded = ChannelDirectory::load_or_builtin(&missing);
        assert_eq!(loaded.channels(), &[Channel::new("UCx", "X")]);
        assert_eq!(loaded.position("UCx"), Some(0));
    }
}
