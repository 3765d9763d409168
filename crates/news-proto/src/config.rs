use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub youtube: YoutubeConfig,
    #[serde(default)]
    pub headlines: HeadlinesConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub channels: ChannelsConfig,
}

/// Upstream live-search settings.
///
/// The API key itself is never written to the config file; only the name of
/// the environment variable that holds it.  Pointing `search_url` at a
/// proxy that injects the key server-side works as well.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubeConfig {
    #[serde(default = "default_search_url")]
    pub search_url: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlinesConfig {
    /// Local path (relative to the working directory) or http(s) URL of the
    /// headline JSON document.
    #[serde(default = "default_headlines_source")]
    pub source: String,
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Launch mpv for bound channels.  When false the player pane only shows
    /// the embed URL.
    #[serde(default = "default_player_enabled")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Channel directory source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelsConfig {
    /// Optional TOML override for the built-in channel table.
    /// Defaults to `$XDG_CONFIG_HOME/newsdesk/channels.toml`.
    #[serde(default = "default_channels_toml")]
    pub channels_toml: PathBuf,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            search_url: default_search_url(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl Default for HeadlinesConfig {
    fn default() -> Self {
        Self {
            source: default_headlines_source(),
            refresh_secs: default_refresh_secs(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            enabled: default_player_enabled(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            channels_toml: default_channels_toml(),
        }
    }
}

impl YoutubeConfig {
    /// Read the API key from the configured environment variable.
    /// Blank values count as missing.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }
}

fn default_search_url() -> String {
    "https://www.googleapis.com/youtube/v3/search".to_string()
}

fn default_api_key_env() -> String {
    "YOUTUBE_API_KEY".to_string()
}

fn default_headlines_source() -> String {
    "data/top_news.json".to_string()
}

fn default_refresh_secs() -> u64 {
    300
}

fn default_player_enabled() -> bool {
    true
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8990
}

fn default_channels_toml() -> PathBuf {
    platform::config_dir().join("channels.toml")
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load from `path`, writing the defaults there first if it does not exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }

    /// Headline refresh period, never shorter than ten seconds.
    pub fn headline_refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.headlines.refresh_secs.max(10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.http.enabled);
        assert_eq!(config.http.port, 8990);
        assert_eq!(config.http.bind_address, "127.0.0.1");
        assert!(config.youtube.search_url.starts_with("https://"));
        assert_eq!(config.youtube.api_key_env, "YOUTUBE_API_KEY");
        assert_eq!(config.headlines.source, "data/top_news.json");
        assert_eq!(config.headlines.refresh_secs, 300);
        assert!(config
            .channels
            .channels_toml
            .ends_with("newsdesk/channels.toml"));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [headlines]
            source = "https://example.org/top_news.json"
            "#,
        )
        .unwrap();
        assert_eq!(config.headlines.source, "https://example.org/top_news.json");
        assert_eq!(config.headlines.refresh_secs, 300);
        assert!(config.player.enabled);
        assert_eq!(config.youtube.api_key_env, "YOUTUBE_API_KEY");
    }

    #[test]
    fn test_load_from_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.http.port, 8990);

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.headlines.source, config.headlines.source);
    }

    #[test]
    fn test_refresh_interval_has_floor() {
        let mut config = Config::default();
        config.headlines.refresh_secs = 1;
        assert_eq!(
            config.headline_refresh_interval(),
            std::time::Duration::from_secs(10)
        );
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let yt = YoutubeConfig {
            api_key_env: "NEWSDESK_TEST_BLANK_KEY".to_string(),
            ..YoutubeConfig::default()
        };
        std::env::set_var("NEWSDESK_TEST_BLANK_KEY", "   ");
        assert_eq!(yt.api_key(), None);
        std::env::set_var("NEWSDESK_TEST_BLANK_KEY", "abc");
        assert_eq!(yt.api_key().as_deref(), Some("abc"));
        std::env::remove_var("NEWSDESK_TEST_BLANK_KEY");
    }
}
