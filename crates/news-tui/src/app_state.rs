//! AppState — shared read-only data passed to all components during render/event.
//!
//! The App event-loop is the only writer.

use news_proto::protocol::DeskState;

pub struct AppState {
    /// Latest snapshot published by the desk core.
    pub desk: DeskState,
    /// Tail of newsdesk.log, refreshed while the log panel is open.
    pub log_lines: Vec<String>,
}

impl AppState {
    pub fn new(desk: DeskState) -> Self {
        Self {
            desk,
            log_lines: Vec::new(),
        }
    }

    pub fn channel_count(&self) -> usize {
        self.desk.channels.len()
    }
}
