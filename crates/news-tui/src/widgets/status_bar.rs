//! Status bar — bottom line with the refresh clock and keybindings.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_LIVE, C_MUTED, C_OFF_AIR, C_SECONDARY};

const KEYS: &str = " ←→/hl tab  Enter/1-9 watch  j/k headlines  r refresh  o open  y copy  Tab panes  L logs  ? help  q quit";

/// Draw the keybindings footer (one row).  `live` reports whether the active
/// channel is bound; `last_refresh` is the local time of the last headline
/// update.
pub fn draw_keys_bar(frame: &mut Frame, area: Rect, live: bool, last_refresh: Option<&str>) {
    let (label, color) = if live {
        (" ON AIR ", C_LIVE)
    } else {
        (" OFF AIR ", C_OFF_AIR)
    };

    let mut spans = vec![Span::styled(
        label,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )];
    if let Some(t) = last_refresh {
        spans.push(Span::styled(
            format!(" news {}", t),
            Style::default().fg(C_SECONDARY),
        ));
    }
    spans.push(Span::styled(KEYS, Style::default().fg(C_MUTED)));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
