//! StateManager — the published `DeskState` snapshot.
//!
//! The desk core is the only writer; the TUI and the HTTP API read clones.
//! Every write bumps `rev`.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::headlines::FeedView;
use crate::protocol::{Channel, DeskState, UiState};

pub struct StateManager {
    state: Arc<RwLock<DeskState>>,
}

impl StateManager {
    pub fn new(channels: Vec<Channel>) -> Self {
        let state = DeskState {
            rev: 1,
            channels,
            ui: UiState::default(),
            feed: FeedView::default(),
        };
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub fn arc(&self) -> Arc<RwLock<DeskState>> {
        Arc::clone(&self.state)
    }

    pub async fn get_state(&self) -> DeskState {
        self.state.read().await.clone()
    }

    pub async fn rev(&self) -> u64 {
        self.state.read().await.rev
    }

    /// Replace the controller-owned part of the snapshot.  Returns false (and
    /// leaves `rev` alone) when nothing changed.
    pub async fn set_ui(&self, ui: &UiState) -> bool {
        let mut state = self.state.write().await;
        if state.ui == *ui {
            return false;
        }
        state.ui = ui.clone();
        state.rev += 1;
        true
    }

    pub async fn set_feed(&self, feed: FeedView) -> bool {
        let mut state = self.state.write().await;
        if state.feed == feed {
            return false;
        }
        state.feed = feed;
        state.rev += 1;
        true
    }
}
