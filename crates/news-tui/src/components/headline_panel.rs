//! HeadlinePanel — top headlines with a selectable row.
//!
//! Each headline takes two rows (title, then source · date).  Feed text is
//! sanitised by `render_lines` before it reaches the terminal.

use news_proto::headlines::{self, FeedView, HeadlineLine};
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{style_selected, style_selected_focused, C_MUTED, C_PRIMARY, C_SECONDARY, C_SOURCE},
    widgets::pane_chrome::pane_chrome,
};

const ROWS_PER_HEADLINE: u16 = 2;

pub struct HeadlinePanel {
    selected: usize,
    /// Inner area and scroll offset (rows) from the last draw, for mouse hits.
    inner: Rect,
    scroll: u16,
}

impl HeadlinePanel {
    pub fn new() -> Self {
        Self {
            selected: 0,
            inner: Rect::default(),
            scroll: 0,
        }
    }

    #[cfg(test)]
    pub fn selected(&self) -> usize {
        self.selected
    }

    fn summary_rows(feed: &FeedView) -> u16 {
        match feed {
            FeedView::Articles {
                summary: Some(_), ..
            } => 2,
            _ => 0,
        }
    }

    fn selected_link(&self, state: &AppState) -> Option<String> {
        state
            .desk
            .feed
            .headlines()
            .get(self.selected)
            .and_then(|h| h.link.clone())
    }

    fn clamp(&mut self, count: usize) {
        if count == 0 {
            self.selected = 0;
        } else if self.selected >= count {
            self.selected = count - 1;
        }
    }
}

impl Component for HeadlinePanel {
    fn id(&self) -> ComponentId {
        ComponentId::HeadlinePanel
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let count = state.desk.feed.headlines().len();
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < count {
                    self.selected += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Home | KeyCode::Char('g') => self.selected = 0,
            KeyCode::End | KeyCode::Char('G') => self.selected = count.saturating_sub(1),
            KeyCode::Enter | KeyCode::Char('o') => {
                return self
                    .selected_link(state)
                    .map(|l| vec![Action::OpenLink(l)])
                    .unwrap_or_default();
            }
            KeyCode::Char('y') => {
                return self
                    .selected_link(state)
                    .map(|l| vec![Action::CopyToClipboard(l)])
                    .unwrap_or_default();
            }
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, state: &AppState) -> Vec<Action> {
        let count = state.desk.feed.headlines().len();
        match event.kind {
            MouseEventKind::ScrollDown => {
                if self.selected + 1 < count {
                    self.selected += 1;
                }
            }
            MouseEventKind::ScrollUp => self.selected = self.selected.saturating_sub(1),
            MouseEventKind::Down(MouseButton::Left) => {
                if event.row < self.inner.y {
                    return vec![];
                }
                // The summary scrolls with the list, so work in content rows.
                let content_row = event.row - self.inner.y + self.scroll;
                let summary = Self::summary_rows(&state.desk.feed);
                if content_row >= summary {
                    let idx = ((content_row - summary) / ROWS_PER_HEADLINE) as usize;
                    if idx < count {
                        self.selected = idx;
                    }
                }
            }
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let block = pane_chrome("headlines", focused, None);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        self.inner = inner;
        self.scroll = 0;
        if inner.height == 0 {
            return;
        }

        let feed = &state.desk.feed;
        if let Some(placeholder) = feed.placeholder() {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    format!("  {}", placeholder),
                    Style::default().fg(C_MUTED),
                )),
                inner,
            );
            return;
        }

        let rows = headlines::render_lines(feed);
        self.clamp(rows.len());

        let mut lines = Vec::new();
        if let FeedView::Articles {
            summary: Some(summary),
            ..
        } = feed
        {
            lines.push(Line::from(Span::styled(
                format!("  {}", headlines::sanitize_terminal(summary)),
                Style::default().fg(C_SECONDARY).add_modifier(Modifier::ITALIC),
            )));
            lines.push(Line::from(""));
        }
        for (i, row) in rows.iter().enumerate() {
            lines.extend(headline_rows(i, row, i == self.selected, focused));
        }

        // Keep the selected headline on screen.
        let visible = inner.height.saturating_sub(Self::summary_rows(feed)) / ROWS_PER_HEADLINE;
        let skip = if visible == 0 {
            0
        } else {
            self.selected.saturating_sub(visible as usize - 1) as u16 * ROWS_PER_HEADLINE
        };
        self.scroll = skip;
        frame.render_widget(Paragraph::new(lines).scroll((skip, 0)), inner);
    }
}

fn headline_rows(idx: usize, row: &HeadlineLine, selected: bool, focused: bool) -> [Line<'static>; 2] {
    let title_style = match (selected, focused) {
        (true, true) => style_selected_focused(),
        (true, false) => style_selected(),
        _ => Style::default().fg(C_PRIMARY),
    };
    let marker = if selected { "▸" } else { " " };
    [
        Line::from(vec![
            Span::styled(format!("{} {:>2}. ", marker, idx + 1), Style::default().fg(C_MUTED)),
            Span::styled(row.title.clone(), title_style),
        ]),
        Line::from(vec![
            Span::raw("      "),
            Span::styled(row.meta.clone(), Style::default().fg(C_SOURCE)),
        ]),
    ]
}
