//! ChannelTabs — one tab per broadcaster.
//!
//! The active tab (the one bound to the player) is highlighted and carries
//! the status badge; the cursor is only a keyboard selection and does not
//! change anything until Enter.

use std::ops::Range;

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{status_color, style_selected, style_selected_focused, C_ACCENT, C_NUMBER_HINT, C_SECONDARY},
    widgets::pane_chrome::pane_chrome,
};

pub struct ChannelTabs {
    cursor: usize,
    /// Column ranges of the tabs from the last draw, for mouse hits.
    hit_ranges: Vec<Range<u16>>,
}

/// Text of tab `idx`: " 1 SKY NEWS " (digits only for the first nine).
pub fn tab_text(idx: usize, label: &str) -> String {
    if idx < 9 {
        format!(" {} {} ", idx + 1, label)
    } else {
        format!(" {} ", label)
    }
}

/// Column ranges for `texts` laid out left to right from `x`, separated by
/// one column, clipped at `x + width`.
pub fn layout_tabs(texts: &[String], x: u16, width: u16) -> Vec<Range<u16>> {
    let end = x.saturating_add(width);
    let mut col = x;
    let mut out = Vec::with_capacity(texts.len());
    for text in texts {
        let w = UnicodeWidthStr::width(text.as_str()) as u16;
        let start = col.min(end);
        let stop = col.saturating_add(w).min(end);
        out.push(start..stop);
        col = col.saturating_add(w + 1);
    }
    out
}

impl ChannelTabs {
    pub fn new() -> Self {
        Self {
            cursor: 0,
            hit_ranges: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn tab_at(&self, col: u16) -> Option<usize> {
        self.hit_ranges
            .iter()
            .position(|r| !r.is_empty() && r.contains(&col))
    }
}

impl Component for ChannelTabs {
    fn id(&self) -> ComponentId {
        ComponentId::ChannelTabs
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let count = state.channel_count();
        if count == 0 {
            return vec![];
        }
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.cursor = self.cursor.checked_sub(1).unwrap_or(count - 1);
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.cursor = (self.cursor + 1) % count;
            }
            KeyCode::Home | KeyCode::Char('g') => self.cursor = 0,
            KeyCode::End | KeyCode::Char('G') => self.cursor = count - 1,
            KeyCode::Enter => return vec![Action::Activate(self.cursor)],
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, state: &AppState) -> Vec<Action> {
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => match self.tab_at(event.column) {
                Some(idx) if idx < state.channel_count() => {
                    self.cursor = idx;
                    vec![Action::Activate(idx)]
                }
                _ => vec![],
            },
            _ => vec![],
        }
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if let Action::Activate(idx) = action {
            self.cursor = *idx;
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let block = pane_chrome("channels", focused, None);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.width == 0 || inner.height == 0 {
            self.hit_ranges.clear();
            return;
        }

        let channels = &state.desk.channels;
        let ui = &state.desk.ui;
        if !channels.is_empty() && self.cursor >= channels.len() {
            self.cursor = channels.len() - 1;
        }

        let texts: Vec<String> = channels
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let mut t = tab_text(i, &c.label);
                if ui.is_active(i) {
                    if let Some(badge) = ui.status.badge_label() {
                        t.push_str(&format!("{} ", badge));
                    }
                }
                t
            })
            .collect();
        self.hit_ranges = layout_tabs(&texts, inner.x, inner.width);

        let mut spans = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            let base = if ui.is_active(i) {
                Style::default()
                    .fg(C_ACCENT)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::default().fg(C_SECONDARY)
            };
            let style = if focused && i == self.cursor {
                base.patch(style_selected_focused())
            } else if i == self.cursor {
                base.patch(style_selected())
            } else {
                base
            };

            if ui.is_active(i) {
                if let Some(badge) = ui.status.badge_label() {
                    let (head, _) = text.split_at(text.len() - badge.len() - 1);
                    spans.push(Span::styled(head.to_string(), style));
                    spans.push(Span::styled(
                        format!("{} ", badge),
                        style.fg(status_color(ui.status)),
                    ));
                    spans.push(Span::raw(" "));
                    continue;
                }
            }
            spans.push(Span::styled(text.clone(), style));
            spans.push(Span::styled(" ", Style::default().fg(C_NUMBER_HINT)));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), inner);
    }
}
