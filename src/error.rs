//! Error types
//!
//! Recoverable failures surfaced by the binder, the settings and history
//! stores and the script engine. Programmer errors (re-entrant edits,
//! ambiguous default bindings) are not represented here; they panic.

use std::io;
use thiserror::Error;

/// Failures registering key bindings.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("cannot bind an empty key sequence")]
    EmptySequence,

    #[error("key sequence {sequence} conflicts with bound sequence {existing}")]
    Ambiguous { sequence: String, existing: String },

    #[error("unknown bind group {0}")]
    UnknownGroup(usize),

    #[error("invalid key sequence '{0}': {1}")]
    InvalidKeySequence(String, &'static str),

    #[error("unknown command '{0}'")]
    UnknownCommand(String),
}

/// Failures loading or querying settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("malformed settings file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown setting '{0}'")]
    UnknownSetting(String),

    #[error("invalid value '{value}' for setting '{name}'")]
    InvalidValue { name: String, value: String },
}

/// Failures reading or writing the history file.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("history index {0} is out of range")]
    OutOfRange(usize),
}

/// Failures discovering or loading scripts.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    #[error("script directory {0} does not exist")]
    MissingDirectory(String),

    #[error("malformed script {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
