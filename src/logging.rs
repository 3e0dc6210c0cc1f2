//! Diagnostic logging
//!
//! Environment errors that are recovered locally (probe file trouble, a
//! missing working directory, scripts that fail to load) are only ever
//! surfaced through `tracing`. This module installs the subscriber.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

/// Where log records go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriterConfig {
    None,
    Stderr,
    File(PathBuf),
}

/// Subscriber configuration: a destination and a maximum level.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub writer_config: WriterConfig,
    pub level: tracing::Level,
}

impl TracingConfig {
    /// Log to a file at the given level name, falling back to `info` when the
    /// name is not a level.
    pub fn new_file(path: PathBuf, level: &str) -> Self {
        Self {
            writer_config: WriterConfig::File(path),
            level: parse_level(level),
        }
    }

    pub fn new_stderr(level: &str) -> Self {
        Self {
            writer_config: WriterConfig::Stderr,
            level: parse_level(level),
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            writer_config: WriterConfig::None,
            level: tracing::Level::INFO,
        }
    }
}

fn parse_level(name: &str) -> tracing::Level {
    tracing::Level::from_str(name.trim()).unwrap_or(tracing::Level::INFO)
}

/// Install the global subscriber. Returns `false` when nothing was installed,
/// either because logging is disabled, the log file cannot be opened, or a
/// subscriber is already set.
pub fn init_tracing(config: &TracingConfig) -> bool {
    let builder = tracing_subscriber::fmt()
        .compact()
        .with_target(false)
        .with_ansi(false)
        .with_max_level(config.level);

    match &config.writer_config {
        WriterConfig::None => false,
        WriterConfig::Stderr => builder.with_writer(std::io::stderr).try_init().is_ok(),
        WriterConfig::File(path) => {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => builder.with_writer(Mutex::new(file)).try_init().is_ok(),
                Err(e) => {
                    eprintln!("cannot open log file {}: {}", path.display(), e);
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing() {
        assert_eq!(TracingConfig::new_stderr("debug").level, tracing::Level::DEBUG);
        assert_eq!(TracingConfig::new_stderr("WARN").level, tracing::Level::WARN);
        assert_eq!(TracingConfig::new_stderr("chatty").level, tracing::Level::INFO);
    }

    #[test]
    fn test_disabled_writer_installs_nothing() {
        assert!(!init_tracing(&TracingConfig::default()));
    }
}
