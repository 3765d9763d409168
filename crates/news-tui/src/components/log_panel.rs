//! LogPanel — tail of newsdesk.log, shown at the bottom while toggled on.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_ACCENT, C_MUTED, C_RESOLVING, C_SECONDARY},
    widgets::pane_chrome::pane_chrome,
};

pub const LOG_TAIL_LINES: usize = 500;

pub struct LogPanel {
    pub visible: bool,
    /// Lines scrolled up from the bottom; 0 follows new output.
    from_bottom: usize,
}

impl LogPanel {
    pub fn new() -> Self {
        Self {
            visible: false,
            from_bottom: 0,
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        self.from_bottom = 0;
    }
}

impl Component for LogPanel {
    fn id(&self) -> ComponentId {
        ComponentId::LogPanel
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release || !self.visible {
            return vec![];
        }
        let max = state.log_lines.len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.from_bottom = (self.from_bottom + 1).min(max),
            KeyCode::Down | KeyCode::Char('j') => self.from_bottom = self.from_bottom.saturating_sub(1),
            KeyCode::PageUp => self.from_bottom = (self.from_bottom + 10).min(max),
            KeyCode::PageDown => self.from_bottom = self.from_bottom.saturating_sub(10),
            KeyCode::End | KeyCode::Char('G') => self.from_bottom = 0,
            KeyCode::Home | KeyCode::Char('g') => self.from_bottom = max,
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, state: &AppState) -> Vec<Action> {
        match event.kind {
            MouseEventKind::ScrollUp => {
                self.from_bottom = (self.from_bottom + 1).min(state.log_lines.len())
            }
            MouseEventKind::ScrollDown => self.from_bottom = self.from_bottom.saturating_sub(1),
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if *action == Action::ToggleLogs {
            self.toggle();
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        if !self.visible || area.height == 0 {
            return;
        }
        frame.render_widget(Clear, area);
        let block = pane_chrome("log", focused, None);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let logs = &state.log_lines;
        if logs.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("  no log entries yet", Style::default().fg(C_MUTED))),
                inner,
            );
            return;
        }

        let height = inner.height as usize;
        let end = logs.len().saturating_sub(self.from_bottom.min(logs.len()));
        let start = end.saturating_sub(height);
        let lines: Vec<Line> = logs[start..end]
            .iter()
            .map(|raw| {
                let (level, text) = compact_log_line(raw);
                let color = match level {
                    Some("ERROR") => C_ACCENT,
                    Some("WARN") => C_RESOLVING,
                    _ => C_SECONDARY,
                };
                Line::from(vec![
                    Span::raw(" "),
                    Span::styled(text, Style::default().fg(color)),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

/// Shorten a tracing fmt line
/// (`2024-01-29T10:00:00.123456Z  INFO news_tui::core: message`) to
/// `10:00:00 INFO message`.  Returns the level when one was found.
pub fn compact_log_line(raw: &str) -> (Option<&'static str>, String) {
    let mut rest = raw.trim();
    let mut head = Vec::new();

    if let Some((tok, rem)) = rest.split_once(char::is_whitespace) {
        if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(tok) {
            head.push(ts.with_timezone(&chrono::Local).format("%H:%M:%S").to_string());
            rest = rem.trim_start();
        }
    }

    let mut level = None;
    if let Some((tok, rem)) = rest.split_once(char::is_whitespace) {
        level = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"]
            .into_iter()
            .find(|l| *l == tok);
        if let Some(l) = level {
            head.push(l.to_string());
            rest = rem.trim_start();
        }
    }

    if let Some((target, msg)) = rest.split_once(": ") {
        if !target.is_empty()
            && target.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
        {
            rest = msg;
        }
    }

    head.push(news_proto::headlines::sanitize_terminal(rest));
    (level, head.join(" "))
}
