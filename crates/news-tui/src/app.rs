//! App — component-based terminal event loop.
//!
//! - `App` owns the components and `AppState` (read-only for components).
//! - A `tokio::mpsc` channel carries `AppMessage`s in from background tasks.
//! - Each turn draws a frame, then awaits the next message or timer.
//! - Components return `Vec<Action>`; the App dispatches them.
//! - Requests for the desk core go out through `cmd_tx`.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use news_proto::protocol::{DeskState, TabStatus};
use news_proto::state::StateManager;
use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::Block,
    Terminal,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::core::DeskEvent;
use crate::BroadcastMessage;
use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    components::{
        channel_tabs::ChannelTabs,
        headline_panel::HeadlinePanel,
        help_overlay::HelpOverlay,
        log_panel::{LogPanel, LOG_TAIL_LINES},
        player_panel::PlayerPanel,
    },
    focus::FocusRing,
    theme::C_BG,
    widgets::{status_bar, toast::ToastManager},
};

// ── Internal event bus ────────────────────────────────────────────────────────

enum AppMessage {
    Event(Event),
    StateUpdated(DeskState),
    Notice(String),
}

/// Last-drawn pane rects, for mouse hit-testing.
#[derive(Default, Clone)]
struct PaneAreas {
    tabs: Rect,
    player: Rect,
    headlines: Rect,
    log_panel: Rect,
}

fn hit(r: Rect, col: u16, row: u16) -> bool {
    r.width > 0
        && r.height > 0
        && col >= r.x
        && col < r.x + r.width
        && row >= r.y
        && row < r.y + r.height
}

// ── App ───────────────────────────────────────────────────────────────────────

pub struct App {
    log_path: PathBuf,

    pub state: AppState,

    channel_tabs: ChannelTabs,
    player_panel: PlayerPanel,
    headline_panel: HeadlinePanel,
    log_panel: LogPanel,
    help_overlay: HelpOverlay,

    focus: FocusRing,
    toast: ToastManager,

    cmd_tx: mpsc::Sender<DeskEvent>,
    state_manager: Arc<StateManager>,

    /// Local time of the last headline change, for the status bar.
    last_refresh: Option<String>,
    should_quit: bool,
    pane_areas: PaneAreas,
}

impl App {
    pub fn new(
        log_path: PathBuf,
        cmd_tx: mpsc::Sender<DeskEvent>,
        state_manager: Arc<StateManager>,
    ) -> Self {
        Self {
            log_path,
            state: AppState::new(DeskState::default()),
            channel_tabs: ChannelTabs::new(),
            player_panel: PlayerPanel::new(),
            headline_panel: HeadlinePanel::new(),
            log_panel: LogPanel::new(),
            help_overlay: HelpOverlay::new(),
            focus: FocusRing::new(vec![
                ComponentId::ChannelTabs,
                ComponentId::PlayerPanel,
                ComponentId::HeadlinePanel,
            ]),
            toast: ToastManager::new(),
            cmd_tx,
            state_manager,
            last_refresh: None,
            should_quit: false,
            pane_areas: PaneAreas::default(),
        }
    }

    pub async fn run(mut self, mut broadcast_rx: broadcast::Receiver<BroadcastMessage>) -> anyhow::Result<()> {
        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let (tx, mut rx) = mpsc::channel::<AppMessage>(1024);

        // Snapshot published before the broadcast receiver existed.
        let initial = self.state_manager.get_state().await;
        self.apply_state(initial);

        // ── Background task: keyboard/mouse events ────────────────────────────
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Background task: broadcast receiver (DeskCore → AppMessage) ───────
        let bc_tx = tx.clone();
        let bc_state_manager = self.state_manager.clone();
        tokio::spawn(async move {
            loop {
                match broadcast_rx.recv().await {
                    Ok(msg) => {
                        let app_msg = match msg {
                            BroadcastMessage::StateUpdated => {
                                AppMessage::StateUpdated(bc_state_manager.get_state().await)
                            }
                            BroadcastMessage::Notice(notice) => AppMessage::Notice(notice.message),
                        };
                        if bc_tx.send(app_msg).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("broadcast receiver lagged by {} messages", n);
                        // A fresh snapshot covers whatever was skipped.
                        let state = bc_state_manager.get_state().await;
                        if bc_tx.send(AppMessage::StateUpdated(state)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        // Toast expiry + spinner animation
        let mut toast_tick = tokio::time::interval(Duration::from_millis(100));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // newsdesk.log tail, only while the log panel is open
        let mut log_refresh = tokio::time::interval(Duration::from_secs(2));
        log_refresh.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        let mut result: anyhow::Result<()> = Ok(());
        loop {
            if needs_redraw {
                if let Err(e) = terminal.draw(|f| self.draw(f)) {
                    error!("draw failed: {}", e);
                    result = Err(e.into());
                    break;
                }
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    const MAX_DRAIN: usize = 256;
                    self.handle_message(msg).await;
                    let mut drained = 0usize;
                    while drained < MAX_DRAIN {
                        let Ok(next) = rx.try_recv() else { break };
                        self.handle_message(next).await;
                        drained += 1;
                    }
                    needs_redraw = true;
                }

                _ = toast_tick.tick() => {
                    if !self.toast.is_empty() {
                        self.toast.tick();
                        needs_redraw = true;
                    }
                }

                _ = log_refresh.tick() => {
                    if self.log_panel.visible {
                        self.reload_log();
                        needs_redraw = true;
                    }
                }
            }
        }

        // ── Teardown (also after a failed draw) ───────────────────────────────
        self.shutdown_core().await;
        let restored = restore_terminal(&mut terminal);
        if restored.is_ok() {
            info!("newsdesk: terminal restored");
        }

        result.and(restored)
    }

    /// Tell the core to stop mpv and exit its loop.
    async fn shutdown_core(&self) {
        if self.cmd_tx.send(DeskEvent::Shutdown).await.is_err() {
            debug!("shutdown: core already gone");
        }
    }

    async fn handle_message(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::Event(Event::Key(key)) => {
                if key.kind == KeyEventKind::Release {
                    return;
                }
                for action in self.handle_key(key) {
                    self.dispatch(action).await;
                }
            }
            AppMessage::Event(Event::Mouse(m)) => {
                for action in self.handle_mouse(m) {
                    self.dispatch(action).await;
                }
            }
            AppMessage::Event(_) => {}
            AppMessage::StateUpdated(desk) => self.apply_state(desk),
            AppMessage::Notice(message) => self.toast.warning(message),
        }
    }

    /// Take a new desk snapshot and keep the spinner in step with it.
    fn apply_state(&mut self, desk: DeskState) {
        if desk.rev != 0 && desk.rev < self.state.desk.rev {
            return;
        }
        if desk.feed != self.state.desk.feed {
            self.last_refresh = Some(chrono::Local::now().format("%H:%M").to_string());
        }

        match (desk.ui.status, desk.active_channel()) {
            (TabStatus::Resolving, Some(channel)) => {
                self.toast.spinner(format!("checking {}…", channel.label));
            }
            _ => self.toast.dismiss_spinner(),
        }
        self.state.desk = desk;
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        match key.code {
            KeyCode::Char('c') if key.modifiers == KeyModifiers::CONTROL => {
                return vec![Action::Quit];
            }
            _ => {}
        }

        // Help overlay captures all keys when visible
        if self.help_overlay.visible {
            return self.help_overlay.handle_key(key, &self.state);
        }

        match key.code {
            KeyCode::Char('q') => return vec![Action::Quit],
            KeyCode::Char('?') => return vec![Action::ToggleHelp],
            KeyCode::Char('L') => return vec![Action::ToggleLogs],
            KeyCode::Char('r') => return vec![Action::RefreshHeadlines],
            KeyCode::Tab => return vec![Action::FocusNext],
            KeyCode::BackTab => return vec![Action::FocusPrev],
            KeyCode::Char(c @ '1'..='9') => {
                let idx = (c as u8 - b'1') as usize;
                if idx < self.state.channel_count() {
                    return vec![Action::Activate(idx)];
                }
                return vec![];
            }
            _ => {}
        }

        let s = &self.state;
        match self.focus.current() {
            Some(ComponentId::ChannelTabs) => self.channel_tabs.handle_key(key, s),
            Some(ComponentId::PlayerPanel) => self.player_panel.handle_key(key, s),
            Some(ComponentId::HeadlinePanel) => self.headline_panel.handle_key(key, s),
            Some(ComponentId::LogPanel) => self.log_panel.handle_key(key, s),
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        let relevant = matches!(
            event.kind,
            MouseEventKind::Down(_) | MouseEventKind::ScrollUp | MouseEventKind::ScrollDown
        );
        if !relevant {
            return vec![];
        }
        if self.help_overlay.visible {
            return match event.kind {
                MouseEventKind::Down(_) => vec![Action::ToggleHelp],
                _ => vec![],
            };
        }

        let (col, row) = (event.column, event.row);
        let areas = self.pane_areas.clone();
        let s = &self.state;

        let (id, mut actions) = if hit(areas.tabs, col, row) {
            (ComponentId::ChannelTabs, self.channel_tabs.handle_mouse(event, areas.tabs, s))
        } else if hit(areas.player, col, row) {
            (ComponentId::PlayerPanel, self.player_panel.handle_mouse(event, areas.player, s))
        } else if hit(areas.headlines, col, row) {
            (
                ComponentId::HeadlinePanel,
                self.headline_panel.handle_mouse(event, areas.headlines, s),
            )
        } else if hit(areas.log_panel, col, row) {
            (ComponentId::LogPanel, self.log_panel.handle_mouse(event, areas.log_panel, s))
        } else {
            return vec![];
        };

        // Focus follows clicks.
        if matches!(event.kind, MouseEventKind::Down(_)) && !self.focus.is_focused(id) {
            actions.insert(0, Action::FocusPane(id));
        }
        actions
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    async fn dispatch(&mut self, action: Action) {
        let secondary: Vec<Action> = {
            let s = &self.state;
            let mut out = Vec::new();
            out.extend(self.channel_tabs.on_action(&action, s));
            out.extend(self.player_panel.on_action(&action, s));
            out.extend(self.headline_panel.on_action(&action, s));
            out.extend(self.log_panel.on_action(&action, s));
            out.extend(self.help_overlay.on_action(&action, s));
            out
        };

        self.apply_action(action).await;

        // Secondary actions are applied one level deep only.
        for a in secondary {
            self.apply_action(a).await;
        }
    }

    async fn apply_action(&mut self, action: Action) {
        match action {
            Action::Activate(idx) => {
                if self.cmd_tx.send(DeskEvent::Activate(idx)).await.is_err() {
                    warn!("desk core is gone, activate({}) dropped", idx);
                }
            }
            Action::RefreshHeadlines => {
                if self.cmd_tx.send(DeskEvent::RefreshHeadlines).await.is_ok() {
                    self.toast.info("refreshing headlines");
                }
            }
            Action::OpenLink(url) => match open::that_detached(&url) {
                Ok(()) => self.toast.info(format!("opened {}", truncate(&url, 40))),
                Err(e) => {
                    warn!("failed to open {}: {}", url, e);
                    self.toast.error(format!("could not open link: {}", e));
                }
            },
            Action::FocusNext => {
                self.focus.next();
            }
            Action::FocusPrev => {
                self.focus.prev();
            }
            Action::FocusPane(id) => self.focus.set(id),
            Action::ToggleLogs => {
                // LogPanel flipped its own visibility in on_action.
                let open = self.log_panel.visible;
                self.focus.set_present(ComponentId::LogPanel, open);
                if open {
                    self.reload_log();
                }
            }
            Action::ToggleHelp => {}
            Action::CopyToClipboard(text) => {
                match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text.clone())) {
                    Ok(()) => self.toast.success(format!("copied: {}", truncate(&text, 40))),
                    Err(e) => {
                        warn!("clipboard error: {}", e);
                        self.toast.error(format!("clipboard error: {}", e));
                    }
                }
            }
            Action::Quit => self.should_quit = true,
        }
    }

    /// Read the last lines of newsdesk.log into `state.log_lines`.
    fn reload_log(&mut self) {
        if let Ok(content) = std::fs::read_to_string(&self.log_path) {
            let lines: Vec<&str> = content.lines().collect();
            let start = lines.len().saturating_sub(LOG_TAIL_LINES);
            self.state.log_lines = lines[start..].iter().map(|l| l.to_string()).collect();
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(Style::default().bg(C_BG)), area);

        let log_h = if self.log_panel.visible { 10u16 } else { 0 };
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(log_h),
                Constraint::Length(1),
            ])
            .split(area);
        let (tabs_area, body_area, log_area, status_area) = (outer[0], outer[1], outer[2], outer[3]);

        // Player on the left, headlines on the right; stacked on narrow terminals.
        let body = if body_area.width >= 100 {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                .split(body_area)
        } else {
            Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(6), Constraint::Min(0)])
                .split(body_area)
        };

        let s = &self.state;
        self.channel_tabs
            .draw(frame, tabs_area, self.focus.is_focused(ComponentId::ChannelTabs), s);
        self.player_panel
            .draw(frame, body[0], self.focus.is_focused(ComponentId::PlayerPanel), s);
        self.headline_panel
            .draw(frame, body[1], self.focus.is_focused(ComponentId::HeadlinePanel), s);
        self.pane_areas.tabs = tabs_area;
        self.pane_areas.player = body[0];
        self.pane_areas.headlines = body[1];

        if self.log_panel.visible {
            self.log_panel
                .draw(frame, log_area, self.focus.is_focused(ComponentId::LogPanel), s);
            self.pane_areas.log_panel = log_area;
        } else {
            self.pane_areas.log_panel = Rect::default();
        }

        status_bar::draw_keys_bar(
            frame,
            status_area,
            s.desk.ui.player.is_bound(),
            self.last_refresh.as_deref(),
        );

        // Help overlay, then toasts on top of everything.
        self.help_overlay.draw(frame, area, false, s);
        self.toast.draw(frame, area);
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}…", text.chars().take(max).collect::<String>())
    } else {
        text.to_string()
    }
}

/// Undo raw mode, the alternate screen and mouse capture.  Every step is
/// attempted even when an earlier one fails.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> anyhow::Result<()> {
    let raw = disable_raw_mode();
    let screen = execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture);
    let cursor = terminal.show_cursor();
    raw?;
    screen?;
    cursor?;
    Ok(())
}
