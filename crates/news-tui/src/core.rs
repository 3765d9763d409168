/// DeskCore — single-owner event loop for all mutable desk state.
///
/// Owns the `LiveController` (tab activation, player binding) and the
/// `MpvPlayer`.  The TUI and the HTTP API send `DeskEvent`s; nothing else
/// touches controller state.
///
/// Live resolutions run in spawned tasks and come back as
/// `DeskEvent::Resolved` carrying their ticket.  Results for a superseded
/// ticket are dropped by the controller, so the order in which searches
/// finish never matters.
///
/// After each change the snapshot in `StateManager` is replaced and
/// `BroadcastMessage::StateUpdated` goes out.
use std::sync::Arc;
use std::time::Duration;

use news_proto::controller::{LiveController, Outcome, Ticket};
use news_proto::embed;
use news_proto::feed::HeadlineFeed;
use news_proto::headlines::FeedView;
use news_proto::protocol::ResolvedStream;
use news_proto::resolver::{self, LiveSearch};
use news_proto::state::StateManager;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

use crate::player::MpvPlayer;
use crate::BroadcastMessage;

// ── DeskEvent ─────────────────────────────────────────────────────────────────

/// All inputs into the DeskCore loop.
#[derive(Debug)]
pub enum DeskEvent {
    /// Tab click / key / HTTP request.
    Activate(usize),
    /// A live search finished.
    Resolved {
        ticket: Ticket,
        stream: ResolvedStream,
    },
    /// Timer or manual headline refresh.
    RefreshHeadlines,
    HeadlinesLoaded(FeedView),
    /// Shutdown requested (TUI quit).
    Shutdown,
}

// ── DeskCore ──────────────────────────────────────────────────────────────────

pub struct DeskCore<S> {
    controller: LiveController,
    search: Arc<S>,
    feed: Arc<HeadlineFeed>,
    player: MpvPlayer,
    state_manager: Arc<StateManager>,
    event_tx: mpsc::Sender<DeskEvent>,
    broadcast_tx: broadcast::Sender<BroadcastMessage>,
    refresh_interval: Duration,
    /// A headline refresh task is running; further requests are skipped.
    feed_in_flight: bool,
}

impl<S: LiveSearch + 'static> DeskCore<S> {
    pub fn new(
        controller: LiveController,
        search: S,
        feed: HeadlineFeed,
        player: MpvPlayer,
        refresh_interval: Duration,
        broadcast_tx: broadcast::Sender<BroadcastMessage>,
        event_tx: mpsc::Sender<DeskEvent>,
    ) -> Self {
        let state_manager = Arc::new(StateManager::new(
            controller.directory().channels().to_vec(),
        ));
        Self {
            controller,
            search: Arc::new(search),
            feed: Arc::new(feed),
            player,
            state_manager,
            event_tx,
            broadcast_tx,
            refresh_interval,
            feed_in_flight: false,
        }
    }

    /// Borrow the state manager (for the TUI and the HTTP server).
    pub fn state_manager(&self) -> Arc<StateManager> {
        Arc::clone(&self.state_manager)
    }

    /// Run the core event loop.  Returns when a `Shutdown` event is received
    /// or the event channel is closed (TUI exited).
    pub async fn run(mut self, mut event_rx: mpsc::Receiver<DeskEvent>) -> anyhow::Result<()> {
        info!("DeskCore: starting event loop");
        if !self.player.is_enabled() {
            info!("DeskCore: no mpv, player bindings are display-only");
        }

        // Start-up goes through the same path as a click on the first tab.
        if let Some(ticket) = self.controller.begin_initial() {
            self.spawn_resolution(ticket);
            self.publish().await;
        }
        self.spawn_headline_refresh();

        let refresh_tx = self.event_tx.clone();
        let period = self.refresh_interval;
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                if refresh_tx.send(DeskEvent::RefreshHeadlines).await.is_err() {
                    break;
                }
            }
        });

        loop {
            match event_rx.recv().await {
                None => {
                    info!("DeskCore: event channel closed, shutting down");
                    break;
                }

                Some(DeskEvent::Shutdown) => {
                    info!("DeskCore: shutdown requested");
                    break;
                }

                Some(DeskEvent::Activate(idx)) => self.activate(idx).await,

                Some(DeskEvent::Resolved { ticket, stream }) => {
                    self.on_resolved(ticket, stream).await;
                }

                Some(DeskEvent::RefreshHeadlines) => self.spawn_headline_refresh(),

                Some(DeskEvent::HeadlinesLoaded(view)) => {
                    self.feed_in_flight = false;
                    if self.state_manager.set_feed(view).await {
                        let _ = self.broadcast_tx.send(BroadcastMessage::StateUpdated);
                    }
                }
            }
        }

        info!("DeskCore: cleanup, stopping player");
        self.player.stop().await;
        Ok(())
    }

    async fn activate(&mut self, idx: usize) {
        let Some(ticket) = self.controller.begin(idx) else {
            debug!("DeskCore: activate({}) ignored, no such tab", idx);
            return;
        };
        info!(
            "DeskCore: activate {} ({}) gen={}",
            ticket.channel.label, ticket.channel.id, ticket.generation
        );
        self.spawn_resolution(ticket);
        self.publish().await;
    }

    fn spawn_resolution(&self, ticket: Ticket) {
        let search = Arc::clone(&self.search);
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let stream = resolver::resolve(search.as_ref(), &ticket.channel.id).await;
            let _ = tx.send(DeskEvent::Resolved { ticket, stream }).await;
        });
    }

    async fn on_resolved(&mut self, ticket: Ticket, stream: ResolvedStream) {
        match self.controller.complete(&ticket, stream.video) {
            Outcome::Stale => return,
            Outcome::Bound(video) => {
                let url = embed::watch_url(&video);
                // Re-clicking a channel that is already playing keeps mpv running.
                if self.player.current() == Some(url.as_str()) && self.player.process_alive() {
                    debug!("DeskCore: {} already playing", url);
                } else {
                    self.player.play(&url).await;
                }
            }
            Outcome::NotLive(notice) => {
                self.player.stop().await;
                let _ = self.broadcast_tx.send(BroadcastMessage::Notice(notice));
            }
        }
        self.publish().await;
    }

    fn spawn_headline_refresh(&mut self) {
        if self.feed_in_flight {
            debug!("DeskCore: headline refresh already running");
            return;
        }
        self.feed_in_flight = true;
        let feed = Arc::clone(&self.feed);
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let view = feed.refresh().await;
            let _ = tx.send(DeskEvent::HeadlinesLoaded(view)).await;
        });
    }

    async fn publish(&self) {
        if self.state_manager.set_ui(self.controller.state()).await {
            let _ = self.broadcast_tx.send(BroadcastMessage::StateUpdated);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use news_proto::directory::ChannelDirectory;
    use news_proto::error::ResolveError;
    use news_proto::feed::HeadlineSource;
    use news_proto::protocol::{Channel, PlayerBinding, TabStatus, VideoRef};

    /// "A" is never live and answers fast; "B" is live after `b_delay`.
    struct AbSearch {
        b_delay: Duration,
    }

    impl LiveSearch for AbSearch {
        async fn search_live(&self, channel_id: &str) -> Result<Option<VideoRef>, ResolveError> {
            match channel_id {
                "B" => {
                    tokio::time::sleep(self.b_delay).await;
                    Ok(Some(VideoRef::new("vid123")))
                }
                _ => {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Ok(None)
                }
            }
        }
    }

    struct Harness {
        event_tx: mpsc::Sender<DeskEvent>,
        broadcast_rx: broadcast::Receiver<BroadcastMessage>,
        state_manager: Arc<StateManager>,
        feed_path: std::path::PathBuf,
        _dir: tempfile::TempDir,
    }

    fn start(b_delay: Duration) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let feed_path = dir.path().join("top_news.json");
        std::fs::write(&feed_path, r#"[{"title": "First"}]"#).unwrap();

        let (broadcast_tx, broadcast_rx) = broadcast::channel(256);
        let (event_tx, event_rx) = mpsc::channel(256);
        let controller = LiveController::new(ChannelDirectory::new(vec![
            Channel::new("A", "ALPHA"),
            Channel::new("B", "BRAVO"),
        ]));
        let core = DeskCore::new(
            controller,
            AbSearch { b_delay },
            HeadlineFeed::new(HeadlineSource::File(feed_path.clone())),
            MpvPlayer::disabled(),
            Duration::from_secs(300),
            broadcast_tx,
            event_tx.clone(),
        );
        let state_manager = core.state_manager();
        tokio::spawn(core.run(event_rx));
        Harness {
            event_tx,
            broadcast_rx,
            state_manager,
            feed_path,
            _dir: dir,
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_secs(2)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_startup_activates_first_channel_and_loads_headlines() {
        let h = start(Duration::from_millis(5));
        settle().await;
        let state = h.state_manager.get_state().await;
        assert_eq!(state.ui.active, Some(0));
        assert_eq!(state.ui.status, TabStatus::NotLive);
        assert_eq!(state.ui.notice.as_ref().unwrap().channel_label, "ALPHA");
        assert_eq!(state.feed.headlines()[0].title, "First");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_bind_is_discarded_after_newer_click() {
        let h = start(Duration::from_millis(500));
        settle().await;

        h.event_tx.send(DeskEvent::Activate(1)).await.unwrap();
        h.event_tx.send(DeskEvent::Activate(0)).await.unwrap();
        settle().await;

        let state = h.state_manager.get_state().await;
        assert_eq!(state.ui.active, Some(0));
        assert_eq!(state.ui.player, PlayerBinding::Empty);
        assert_eq!(state.ui.notice.as_ref().unwrap().channel_label, "ALPHA");
    }

    #[tokio::test(start_paused = true)]
    async fn test_bind_publishes_embed_url() {
        let mut h = start(Duration::from_millis(5));
        settle().await;
        while h.broadcast_rx.try_recv().is_ok() {}

        h.event_tx.send(DeskEvent::Activate(1)).await.unwrap();
        settle().await;

        let state = h.state_manager.get_state().await;
        assert_eq!(
            state.ui.player.embed_url(),
            Some("https://www.youtube.com/embed/vid123?autoplay=1&mute=1&playsinline=1")
        );
        assert!(state.ui.notice.is_none());
        assert!(matches!(
            h.broadcast_rx.try_recv(),
            Ok(BroadcastMessage::StateUpdated)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_range_activation_changes_nothing() {
        let h = start(Duration::from_millis(5));
        settle().await;
        let before = h.state_manager.get_state().await;
        h.event_tx.send(DeskEvent::Activate(9)).await.unwrap();
        settle().await;
        let after = h.state_manager.get_state().await;
        assert_eq!(before.rev, after.rev);
        assert_eq!(after.ui.active, Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_refresh_rereads_feed() {
        let h = start(Duration::from_millis(5));
        settle().await;
        std::fs::write(&h.feed_path, r#"{"items": []}"#).unwrap();
        h.event_tx.send(DeskEvent::RefreshHeadlines).await.unwrap();
        settle().await;
        assert_eq!(h.state_manager.get_state().await.feed, FeedView::Empty);
    }
}
