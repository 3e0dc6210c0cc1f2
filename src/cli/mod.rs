//! CLI Terminal Interface Module
//!
//! Collaborators the editing engine and the driver are built on.
//!
//! ## Module Structure
//!
//! - `config` - settings store
//! - `editor` - line buffer with grouped undo
//! - `history` - history store, event expansion and navigation
//! - `commands` - bindable editing commands
//! - `input` - raw key input sources
//! - `terminal` - crossterm key input
//! - `utils` - common utilities and helper functions

pub mod commands;
pub mod config;
pub mod editor;
pub mod history;
pub mod input;
pub mod terminal;
pub mod utils;

// Re-export main types for convenience
pub use commands::{CommandCategory, EditCommand};
pub use config::{CliConfig, SettingsStore};
pub use editor::{LineBuffer, TextBuffer};
pub use history::{CommandHistory, HistoryStore};
pub use input::{InputEvent, InputSource, ScriptedInput};
pub use terminal::TerminalInput;
