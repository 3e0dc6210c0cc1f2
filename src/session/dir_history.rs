//! Directory history
//!
//! Working directories seen at successive prompts, oldest first.

use std::path::{Path, PathBuf};

pub const MAX_DIR_HISTORY: usize = 100;

#[derive(Debug, Clone)]
pub struct DirectoryHistory {
    entries: Vec<PathBuf>,
    capacity: usize,
}

impl Default for DirectoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
}

impl DirectoryHistory {
    pub fn new() -> Self {
        Self::with_capacity(MAX_DIR_HISTORY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append `dir` unless it equals the newest entry, ignoring case.
    /// Returns whether it was added.
    pub fn push(&mut self, dir: &Path) -> bool {
        if self.entries.last().map_or(false, |last| same_dir(last, dir)) {
            return false;
        }
        self.entries.push(dir.to_path_buf());
        if self.entries.len() > self.capacity {
            let excess = self.entries.len() - self.capacity;
            self.entries.drain(..excess);
        }
        true
    }

    /// Entries oldest to newest.
    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// The directory before the newest one.
    pub fn previous(&self) -> Option<&Path> {
        let len = self.entries.len();
        (len >= 2).then(|| self.entries[len - 2].as_path())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consecutive_duplicates_ignoring_case() {
        let mut history = DirectoryHistory::new();
        assert!(history.push(Path::new("C:\\Work")));
        assert!(!history.push(Path::new("c:\\work")));
        assert!(history.push(Path::new("C:\\Other")));
        assert!(history.push(Path::new("C:\\Work")));
        assert_eq!(history.len(), 3);
        assert_eq!(history.previous(), Some(Path::new("C:\\Other")));
    }

    #[test]
    fn test_bounded_to_capacity() {
        let mut history = DirectoryHistory::new();
        for i in 0..150 {
            history.push(&PathBuf::from(format!("C:\\dir{}", i)));
        }
        assert_eq!(history.len(), MAX_DIR_HISTORY);
        assert_eq!(history.entries()[0], PathBuf::from("C:\\dir50"));
        assert_eq!(history.entries().last(), Some(&PathBuf::from("C:\\dir149")));
    }

    #[test]
    fn test_previous_needs_two_entries() {
        let mut history = DirectoryHistory::new();
        assert_eq!(history.previous(), None);
        history.push(Path::new("/a"));
        assert_eq!(history.previous(), None);
    }
}
