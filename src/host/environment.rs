//! Host environment
//!
//! Process facts the driver consults each cycle.

use std::env;
use std::path::{Path, PathBuf};

pub trait HostEnvironment {
    /// Current working directory, if it can be determined.
    fn current_dir(&self) -> Option<PathBuf>;

    fn temp_dir(&self) -> PathBuf;

    fn process_id(&self) -> u32;

    fn home_dir(&self) -> Option<PathBuf>;

    /// Whether `path` names an existing directory. Either separator style
    /// is accepted.
    fn is_dir(&self, path: &str) -> bool;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl HostEnvironment for SystemEnvironment {
    fn current_dir(&self) -> Option<PathBuf> {
        env::current_dir().ok()
    }

    fn temp_dir(&self) -> PathBuf {
        env::temp_dir()
    }

    fn process_id(&self) -> u32 {
        std::process::id()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    fn is_dir(&self, path: &str) -> bool {
        let native = path.replace(['\\', '/'], std::path::MAIN_SEPARATOR_STR);
        Path::new(&native).is_dir()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_system_is_dir_accepts_either_separator() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("sub")).unwrap();
        let env = SystemEnvironment;
        let with_slash = format!("{}/sub/", temp.path().display());
        assert!(env.is_dir(&with_slash));
        assert!(!env.is_dir(&format!("{}/missing", temp.path().display())));
    }
}
