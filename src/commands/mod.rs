//! Command handlers behind the `exam-sync` binary

pub mod channels;
pub mod replay;

pub use channels::handle_channels_command;
pub use replay::{handle_replay_command, ReplayOptions, ReplaySummary};
