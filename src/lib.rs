//! promptline - a programmable line editor for console command hosts
//!
//! This library sits between a command host and its raw line input. It
//! replaces character input with an editor that resolves key sequences
//! through bind groups, completes words from pluggable match generators,
//! colours words by syntax class, and keeps session state across prompts.
//!
//! # Features
//!
//! - **Key binding**: byte tries per bind group, rejecting ambiguous prefixes
//! - **Completion**: generators run lazily and results are cached per word
//! - **Classification**: word colouring rerun only when the line changes
//! - **Prompt driver**: autostart, errorlevel probing, doskey aliases,
//!   queued lines, history admission and directory shortcuts
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use promptline::cli::{TerminalInput, TextBuffer};
//! use promptline::host::{CycleOutcome, PromptDriver, SystemEnvironment};
//!
//! let mut driver = PromptDriver::new(
//!     Box::new(SystemEnvironment),
//!     Box::new(TextBuffer::new()),
//!     Box::new(std::io::stdout()),
//!     Box::new(TerminalInput::new()),
//! );
//! while let CycleOutcome::Line(line) = driver.edit_line("> ", "") {
//!     println!("run: {}", line);
//! }
//! ```

pub mod binder;
pub mod cli;
pub mod error;
pub mod host;
pub mod line_editor;
pub mod logging;
pub mod matches;
pub mod session;
pub mod words;

// Re-export commonly used types for convenience
pub use error::{BindError, HistoryError, ScriptError, SettingsError};
pub use host::{CycleOutcome, PromptDriver};
pub use line_editor::EditingSession;
pub use session::{DirectoryHistory, Session};
