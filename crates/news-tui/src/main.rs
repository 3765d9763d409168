mod action;
mod app;
mod app_state;
mod component;
mod components;
mod core;
mod focus;
mod http;
mod player;
mod theme;
mod widgets;

use news_proto::config::Config;
use news_proto::controller::LiveController;
use news_proto::directory::ChannelDirectory;
use news_proto::feed::HeadlineFeed;
use news_proto::protocol::Notice;
use news_proto::resolver::YoutubeSearch;
use tokio::sync::{broadcast, mpsc};

/// What the DeskCore broadcasts to the TUI.
#[derive(Debug, Clone)]
pub enum BroadcastMessage {
    /// The DeskState snapshot changed; receivers fetch it from StateManager.
    StateUpdated,
    /// The active channel has nothing live right now.
    Notice(Notice),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `--system-deps`: prefer mpv / yt-dlp from PATH over bundled copies.
    if std::env::args().skip(1).any(|a| a == "--system-deps") {
        news_proto::platform::set_use_system_deps(true);
    }

    let data_dir = news_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("newsdesk.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but keep
    // connection-level chatter from the HTTP client quiet.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("newsdesk log: {}", log_path.display());

    tracing::info!("newsdesk starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("config: {:#}, using defaults", e);
            Config::default()
        }
    };

    let directory = ChannelDirectory::load_or_builtin(&config.channels.channels_toml);
    tracing::info!("{} channels", directory.len());

    // ── Broadcast channel (DeskCore → TUI) ──────────────────────────────────
    let (broadcast_tx, broadcast_rx) = broadcast::channel::<BroadcastMessage>(256);

    // ── DeskEvent channel (TUI/HTTP → DeskCore) ─────────────────────────────
    let (event_tx, event_rx) = mpsc::channel::<core::DeskEvent>(256);

    // ── Build DeskCore ───────────────────────────────────────────────────────
    let desk_core = core::DeskCore::new(
        LiveController::new(directory),
        YoutubeSearch::from_config(&config.youtube),
        HeadlineFeed::from_config(&config.headlines),
        player::MpvPlayer::from_config(&config.player),
        config.headline_refresh_interval(),
        broadcast_tx.clone(),
        event_tx.clone(),
    );
    let state_manager = desk_core.state_manager();

    // ── HTTP server ──────────────────────────────────────────────────────────
    if config.http.enabled {
        http::start_server(
            config.http.bind_address.clone(),
            config.http.port,
            state_manager.clone(),
            event_tx.clone(),
        );
    }

    // ── Spawn DeskCore event loop ────────────────────────────────────────────
    let core_handle = tokio::spawn(async move {
        if let Err(e) = desk_core.run(event_rx).await {
            tracing::error!("DeskCore exited with error: {}", e);
        }
    });

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let app = app::App::new(log_path, event_tx, state_manager);
    app.run(broadcast_rx).await?;

    // Let the core stop mpv before the runtime goes away.
    let _ = core_handle.await;
    tracing::info!("newsdesk exiting");

    Ok(())
}
