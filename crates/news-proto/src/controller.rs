//! LiveController — tab activation and player binding.
//!
//! Activation is split in two so the resolution can run elsewhere (a spawned
//! task in the TUI core) while the controller stays the single writer of
//! `UiState`:
//!
//! ```text
//!   begin(idx)  → Ticket { generation, .. }   tab marked active, status Resolving,
//!                                              player and notice cleared
//!   …resolve ticket.channel.id…
//!   complete(ticket, video) → Bound | NotLive | Stale
//! ```
//!
//! Every `begin` bumps the generation.  `complete` only applies a result
//! whose ticket carries the latest generation; anything older is dropped so
//! a slow answer for a previous click can never overwrite the player.

use tracing::{debug, info};

use crate::directory::ChannelDirectory;
use crate::embed;
use crate::protocol::{Channel, Notice, PlayerBinding, TabStatus, UiState, VideoRef};
use crate::resolver::{self, LiveSearch};

/// Handle for one in-flight activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub generation: u64,
    pub index: usize,
    pub channel: Channel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Player bound to this video.
    Bound(VideoRef),
    /// Player cleared; the notice names the channel.
    NotLive(Notice),
    /// A newer activation superseded this one; nothing changed.
    Stale,
}

pub struct LiveController {
    directory: ChannelDirectory,
    state: UiState,
}

impl LiveController {
    pub fn new(directory: ChannelDirectory) -> Self {
        Self {
            directory,
            state: UiState::default(),
        }
    }

    pub fn directory(&self) -> &ChannelDirectory {
        &self.directory
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn active_channel(&self) -> Option<&Channel> {
        self.state.active.and_then(|i| self.directory.get(i))
    }

    /// Per-tab active marking, in directory order.
    pub fn tab_marks(&self) -> Vec<bool> {
        (0..self.directory.len())
            .map(|i| self.state.is_active(i))
            .collect()
    }

    /// Mark tab `idx` active and start a new resolution generation.
    /// Returns `None` (state untouched) when `idx` is out of range.
    pub fn begin(&mut self, idx: usize) -> Option<Ticket> {
        let Some(channel) = self.directory.get(idx).cloned() else {
            debug!("begin: no channel at index {}", idx);
            return None;
        };

        self.state.active = Some(idx);
        self.state.generation += 1;
        self.state.status = TabStatus::Resolving;
        // Nothing is shown for the new tab until its own result lands.
        self.state.player = PlayerBinding::Empty;
        self.state.notice = None;

        debug!(
            "begin: {} ({}) gen={}",
            channel.label, channel.id, self.state.generation
        );

        Some(Ticket {
            generation: self.state.generation,
            index: idx,
            channel,
        })
    }

    /// True while `ticket` is still the most recent activation.
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.generation == self.state.generation
    }

    /// Apply a finished resolution.
    pub fn complete(&mut self, ticket: &Ticket, video: Option<VideoRef>) -> Outcome {
        if !self.is_current(ticket) {
            debug!(
                "complete: discarding stale result for {} (gen {} < {})",
                ticket.channel.label, ticket.generation, self.state.generation
            );
            return Outcome::Stale;
        }

        match video {
            Some(video) => {
                info!("{} is live: {}", ticket.channel.label, video);
                self.state.player = PlayerBinding::Bound {
                    channel_id: ticket.channel.id.clone(),
                    embed_url: embed::embed_url(&video),
                    video: video.clone(),
                };
                self.state.notice = None;
                self.state.status = TabStatus::Bound;
                Outcome::Bound(video)
            }
            None => {
                info!("{} has no live stream", ticket.channel.label);
                let notice = Notice::not_live(&ticket.channel.label);
                self.state.player = PlayerBinding::Empty;
                self.state.notice = Some(notice.clone());
                self.state.status = TabStatus::NotLive;
                Outcome::NotLive(notice)
            }
        }
    }

    /// Sequential activate: begin, resolve, complete.
    pub async fn activate<S: LiveSearch>(&mut self, idx: usize, search: &S) -> Option<Outcome> {
        let ticket = self.begin(idx)?;
        let resolved = resolver::resolve(search, &ticket.channel.id).await;
        Some(self.complete(&ticket, resolved.video))
    }

    /// Start-up path: the first channel goes through the same activation.
    pub fn begin_initial(&mut self) -> Option<Ticket> {
        self.begin(0)
    }
}
