pub mod config;
pub mod controller;
pub mod directory;
pub mod embed;
pub mod error;
pub mod feed;
pub mod headlines;
pub mod platform;
pub mod protocol;
pub mod resolver;
pub mod state;
