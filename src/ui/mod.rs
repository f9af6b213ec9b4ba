//! Terminal rendering for the chartcache CLI
//!
//! Download progress is drawn inline with ratatui rather than in a full-screen
//! UI, so command output stays in the scrollback.

pub mod progress;
pub mod widgets;

pub use progress::{LogProgress, TerminalProgress};
