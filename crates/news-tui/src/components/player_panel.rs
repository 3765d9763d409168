//! PlayerPanel — what the player is bound to right now.

use news_proto::embed;
use news_proto::protocol::{PlayerBinding, TabStatus};
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseEvent};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{status_color, C_LINK, C_MUTED, C_OFF_AIR, C_PRIMARY, C_SECONDARY},
    widgets::pane_chrome::{pane_chrome, Badge},
};

pub struct PlayerPanel;

impl PlayerPanel {
    pub fn new() -> Self {
        Self
    }
}

/// Text lines for the pane body.
pub fn body_lines(state: &AppState) -> Vec<Line<'static>> {
    let desk = &state.desk;
    let Some(channel) = desk.active_channel() else {
        return vec![Line::from(Span::styled(
            "  no channel selected",
            Style::default().fg(C_MUTED),
        ))];
    };

    let mut lines = vec![Line::from(Span::styled(
        format!("  {}", channel.label),
        Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
    ))];

    match (&desk.ui.status, &desk.ui.player) {
        (TabStatus::Resolving, _) => lines.push(Line::from(Span::styled(
            "  checking for a live stream…",
            Style::default().fg(C_SECONDARY),
        ))),
        (_, PlayerBinding::Bound { video, embed_url, .. }) => {
            lines.push(Line::from(""));
            lines.push(label_value("embed", embed_url.clone()));
            lines.push(label_value("watch", embed::watch_url(video)));
        }
        (_, PlayerBinding::Empty) => {
            let message = desk
                .ui
                .notice
                .as_ref()
                .map(|n| n.message.clone())
                .unwrap_or_else(|| format!("{}: no live stream right now", channel.label));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("  {}", message),
                Style::default().fg(C_OFF_AIR),
            )));
        }
    }
    lines
}

fn label_value(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<6}", label), Style::default().fg(C_MUTED)),
        Span::styled(value, Style::default().fg(C_LINK)),
    ])
}

impl Component for PlayerPanel {
    fn id(&self) -> ComponentId {
        ComponentId::PlayerPanel
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let player = &state.desk.ui.player;
        match key.code {
            KeyCode::Char('y') => player
                .embed_url()
                .map(|u| vec![Action::CopyToClipboard(u.to_string())])
                .unwrap_or_default(),
            KeyCode::Char('o') | KeyCode::Enter => player
                .video()
                .map(|v| vec![Action::OpenLink(embed::watch_url(v))])
                .unwrap_or_default(),
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, _event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let status = state.desk.ui.status;
        let badge = status.badge_label().map(|text| Badge {
            text,
            color: status_color(status),
        });
        let block = pane_chrome("player", focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 {
            return;
        }
        frame.render_widget(
            Paragraph::new(body_lines(state)).wrap(Wrap { trim: false }),
            inner,
        );
    }
}
