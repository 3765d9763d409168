//! MpvPlayer — external player for the bound live stream.
//!
//! One child process at most.  Binding a new stream kills the previous child
//! before spawning the next; clearing the binding kills it.  Spawn failures
//! are logged and otherwise ignored: the embed URL is still shown in the
//! player pane.

use std::path::PathBuf;

use news_proto::config::PlayerConfig;
use tracing::{info, warn};

pub struct MpvPlayer {
    binary: Option<PathBuf>,
    child: Option<tokio::process::Child>,
    current: Option<String>,
}

impl MpvPlayer {
    pub fn from_config(config: &PlayerConfig) -> Self {
        if !config.enabled {
            info!("mpv: player disabled in config");
            return Self::disabled();
        }
        match news_proto::platform::find_mpv_binary() {
            Some(path) => {
                info!("mpv: using {}", path.display());
                Self::with_binary(path)
            }
            None => {
                warn!("mpv: binary not found, live streams will only be listed");
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self {
            binary: None,
            child: None,
            current: None,
        }
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: Some(binary.into()),
            child: None,
            current: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.binary.is_some()
    }

    /// Watch URL of the stream currently handed to the player.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Command-line arguments for `url`.  Playback starts muted, like the
    /// embedded player.
    pub fn args(url: &str) -> Vec<String> {
        let mut args = vec![
            "--no-terminal".to_string(),
            "--mute=yes".to_string(),
            "--ytdl=yes".to_string(),
            "--force-window=yes".to_string(),
        ];
        if let Some(ytdl) = news_proto::platform::find_yt_dlp_binary() {
            args.push(format!("--script-opts=ytdl_hook-ytdl_path={}", ytdl.display()));
        }
        args.push(url.to_string());
        args
    }

    pub async fn play(&mut self, url: &str) {
        self.stop().await;
        self.current = Some(url.to_string());

        let Some(binary) = self.binary.clone() else {
            return;
        };

        let stderr = match open_stderr_log() {
            Ok(file) => std::process::Stdio::from(file),
            Err(e) => {
                warn!("mpv: cannot open stderr log: {}", e);
                std::process::Stdio::null()
            }
        };

        match tokio::process::Command::new(&binary)
            .args(Self::args(url))
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(stderr)
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => {
                info!("mpv: playing {} (pid {:?})", url, child.id());
                self.child = Some(child);
            }
            Err(e) => warn!("mpv: failed to spawn {}: {}", binary.display(), e),
        }
    }

    /// Kill the child if running and clear the current URL.
    pub async fn stop(&mut self) {
        self.current = None;
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                warn!("mpv: kill failed: {}", e);
            }
        }
    }

    pub fn process_alive(&mut self) -> bool {
        let Some(child) = self.child.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                match status.code() {
                    Some(code) => warn!("mpv process exited with code: {}", code),
                    None => warn!("mpv process terminated by signal"),
                }
                self.child = None;
                false
            }
            Err(e) => {
                warn!("mpv process_alive check failed: {}", e);
                false
            }
        }
    }
}

fn open_stderr_log() -> std::io::Result<std::fs::File> {
    let dir = news_proto::platform::data_dir();
    std::fs::create_dir_all(&dir)?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("mpv-stderr.log"))
}
