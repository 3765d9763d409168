pub mod channel_tabs;
pub mod headline_panel;
pub mod help_overlay;
pub mod log_panel;
pub mod player_panel;
