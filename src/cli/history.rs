//! Command History Module
//!
//! History storage behind the [`HistoryStore`] trait, `!`-style event
//! expansion, the admission exclusion list, and the cursor the editor uses to
//! walk a snapshot of past lines.

use crate::error::HistoryError;
use regex::Regex;
use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Outcome of history event expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    Unchanged,
    Rewritten(String),
    /// The expanded line is only to be shown, not executed.
    Print(String),
}

/// History store collaborator consumed by the prompt driver.
pub trait HistoryStore {
    /// Add a line; returns false when it was not stored.
    fn add(&mut self, line: &str) -> bool;

    /// Remove the entry at `index`, provided it still holds `line`.
    fn remove(&mut self, index: usize, line: &str) -> Result<(), HistoryError>;

    fn expand(&self, line: &str) -> Expansion;

    /// (Re)read persisted entries. A no-op for in-memory stores.
    fn load(&mut self) -> Result<(), HistoryError>;

    fn is_persistent(&self) -> bool;

    /// Entries oldest first.
    fn entries(&self) -> Vec<String>;

    fn get(&self, index: usize) -> Option<&str>;
}

/// Bounded command history, optionally mirrored to a plain text file with one
/// entry per line.
#[derive(Debug, Clone)]
pub struct CommandHistory {
    commands: VecDeque<String>,
    max_size: usize,
    file: Option<PathBuf>,
}

impl CommandHistory {
    /// Create an in-memory history with the given maximum size
    pub fn new(max_size: usize) -> Self {
        Self {
            commands: VecDeque::new(),
            max_size: max_size.max(1),
            file: None,
        }
    }

    /// Create a history persisted to `file`
    pub fn with_file(max_size: usize, file: PathBuf) -> Self {
        Self {
            file: Some(file),
            ..Self::new(max_size)
        }
    }

    /// Get the most recent command
    pub fn last_command(&self) -> Option<&String> {
        self.commands.back()
    }

    /// Get total number of commands in history
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if history is empty
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn push_bounded(&mut self, cmd: String) {
        if self.commands.len() >= self.max_size {
            self.commands.pop_front();
        }
        self.commands.push_back(cmd);
    }

    fn rewrite_file(&self) -> Result<(), HistoryError> {
        if let Some(path) = &self.file {
            let mut text = String::new();
            for cmd in &self.commands {
                text.push_str(cmd);
                text.push('\n');
            }
            fs::write(path, text)?;
        }
        Ok(())
    }

    fn append_file(&self, cmd: &str) -> Result<(), HistoryError> {
        if let Some(path) = &self.file {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(file, "{}", cmd)?;
        }
        Ok(())
    }

    /// Resolve one event designator (the text after `!`).
    fn find_event(&self, designator: &str) -> Option<&str> {
        let newest_first = || self.commands.iter().rev();
        if designator == "!" {
            return self.commands.back().map(String::as_str);
        }
        if let Some(needle) = designator.strip_prefix('?') {
            let needle = needle.strip_suffix('?').unwrap_or(needle);
            return newest_first().find(|c| c.contains(needle)).map(String::as_str);
        }
        if let Ok(n) = designator.parse::<i64>() {
            let len = self.commands.len() as i64;
            let index = if n < 0 { len + n } else { n - 1 };
            if index < 0 || index >= len {
                return None;
            }
            return self.commands.get(index as usize).map(String::as_str);
        }
        newest_first().find(|c| c.starts_with(designator)).map(String::as_str)
    }
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(1000)
    }
}

fn event_regex() -> &'static Regex {
    static EVENT: OnceLock<Regex> = OnceLock::new();
    EVENT.get_or_init(|| {
        Regex::new(r"!(!|-?\d+|\?[^?]*\??|[^\s!:?=()\d-][^\s!:]*)(:p)?")
            .unwrap_or_else(|e| panic!("history event pattern: {e}"))
    })
}

/// Byte offsets of `line` that sit inside single or double quotes.
fn quoted_offsets(line: &str) -> Vec<bool> {
    let mut quoted = vec![false; line.len() + 1];
    let mut open: Option<char> = None;
    for (i, c) in line.char_indices() {
        quoted[i] = open.is_some();
        match (open, c) {
            (None, '"') | (None, '\'') => open = Some(c),
            (Some(q), c) if q == c => open = None,
            _ => {}
        }
    }
    quoted
}

impl HistoryStore for CommandHistory {
    fn add(&mut self, line: &str) -> bool {
        let cmd = line.trim();
        if cmd.is_empty() || self.commands.back().map_or(false, |last| last == cmd) {
            return false;
        }
        self.push_bounded(cmd.to_string());
        if let Err(e) = self.append_file(cmd) {
            warn!("cannot append to history file: {}", e);
        }
        true
    }

    fn remove(&mut self, index: usize, line: &str) -> Result<(), HistoryError> {
        match self.commands.get(index) {
            Some(cmd) if cmd == line.trim() => {
                self.commands.remove(index);
                self.rewrite_file()
            }
            _ => Err(HistoryError::OutOfRange(index)),
        }
    }

    fn expand(&self, line: &str) -> Expansion {
        if !line.contains('!') {
            return Expansion::Unchanged;
        }

        let quoted = quoted_offsets(line);
        let mut out = String::with_capacity(line.len());
        let mut last = 0;
        let mut changed = false;
        let mut print = false;

        for caps in event_regex().captures_iter(line) {
            let whole = match caps.get(0) {
                Some(m) => m,
                None => continue,
            };
            if quoted[whole.start()] {
                continue;
            }
            let designator = caps.get(1).map_or("", |m| m.as_str());
            match self.find_event(designator) {
                Some(event) => {
                    out.push_str(&line[last..whole.start()]);
                    out.push_str(event);
                    last = whole.end();
                    changed = true;
                    print |= caps.get(2).is_some();
                }
                None => {
                    warn!("history event not found: !{}", designator);
                    return Expansion::Unchanged;
                }
            }
        }

        if !changed {
            return Expansion::Unchanged;
        }
        out.push_str(&line[last..]);
        debug!("history expansion: {:?} -> {:?}", line, out);
        if print {
            Expansion::Print(out)
        } else {
            Expansion::Rewritten(out)
        }
    }

    fn load(&mut self) -> Result<(), HistoryError> {
        let path = match &self.file {
            Some(path) if path.exists() => path.clone(),
            _ => return Ok(()),
        };
        let text = fs::read_to_string(&path)?;
        self.commands.clear();
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            self.push_bounded(line.to_string());
        }
        Ok(())
    }

    fn is_persistent(&self) -> bool {
        self.file.is_some()
    }

    fn entries(&self) -> Vec<String> {
        self.commands.iter().cloned().collect()
    }

    fn get(&self, index: usize) -> Option<&str> {
        self.commands.get(index).map(String::as_str)
    }
}

/// Whether `line` starts with one of the command names in `list`.
///
/// `list` is split on spaces, commas and semicolons. The name must be
/// followed by the end of the line or a character that is neither
/// alphanumeric nor a path separator, so `exit /b` matches `exit` but
/// `exitstuff` does not.
pub fn is_excluded_from_history(line: &str, list: &str) -> bool {
    let line = line.trim_start_matches([' ', '\t']);
    list.split([' ', ',', ';'])
        .filter(|name| !name.is_empty())
        .any(|name| {
            let head = match line.get(..name.len()) {
                Some(head) => head,
                None => return false,
            };
            if !head.eq_ignore_ascii_case(name) {
                return false;
            }
            match line[name.len()..].chars().next() {
                None => true,
                Some(c) => !c.is_alphanumeric() && c != '\\' && c != '/',
            }
        })
}

/// Navigation over a snapshot of history entries, oldest first.
///
/// Moving past the newest entry returns the line that was being typed when
/// navigation started.
#[derive(Debug, Clone, Default)]
pub struct HistoryCursor {
    entries: Vec<String>,
    current_index: Option<usize>,
    temp_current_line: Option<String>,
}

impl HistoryCursor {
    /// Create a cursor positioned past the newest entry
    pub fn new(entries: Vec<String>) -> Self {
        Self {
            entries,
            current_index: None,
            temp_current_line: None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    /// Get current navigation index
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// Store the current typed line before leaving it
    pub fn store_current_line(&mut self, line: &str) {
        if self.current_index.is_none() {
            self.temp_current_line = Some(line.to_string());
        }
    }

    /// Position on a specific entry, e.g. the one after an operate-and-get-next
    pub fn jump_to(&mut self, index: usize) -> Option<&str> {
        if index >= self.entries.len() {
            return None;
        }
        self.current_index = Some(index);
        self.get(index)
    }

    /// Get the previous command in history (up arrow functionality)
    pub fn previous(&mut self) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        let index = match self.current_index {
            None => self.entries.len() - 1,
            Some(idx) if idx > 0 => idx - 1,
            Some(_) => return None,
        };
        self.jump_to(index)
    }

    /// Get the next command in history (down arrow functionality)
    pub fn next(&mut self) -> Option<&str> {
        match self.current_index {
            None => None,
            Some(idx) if idx + 1 < self.entries.len() => self.jump_to(idx + 1),
            Some(_) => {
                self.current_index = None;
                Some(self.temp_current_line.as_deref().unwrap_or(""))
            }
        }
    }

    pub fn first(&mut self) -> Option<&str> {
        self.jump_to(0)
    }

    /// Leave navigation and return the stored typed line
    pub fn last(&mut self) -> &str {
        self.current_index = None;
        self.temp_current_line.as_deref().unwrap_or("")
    }

    /// Search older entries for one starting with `prefix`
    pub fn search_backward(&mut self, prefix: &str) -> Option<&str> {
        let start = self.current_index.unwrap_or(self.entries.len());
        let found = (0..start).rev().find(|&i| self.entries[i].starts_with(prefix))?;
        self.jump_to(found)
    }

    /// Search newer entries for one starting with `prefix`
    pub fn search_forward(&mut self, prefix: &str) -> Option<&str> {
        let start = self.current_index? + 1;
        let found = (start..self.entries.len()).find(|&i| self.entries[i].starts_with(prefix))?;
        self.jump_to(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn history_of(lines: &[&str]) -> CommandHistory {
        let mut history = CommandHistory::new(10);
        for line in lines {
            history.add(line);
        }
        history
    }

    #[test]
    fn test_command_history_basic() {
        let history = {
            let mut history = CommandHistory::new(3);
            for cmd in ["cmd1", "cmd2", "cmd3", "cmd4"] {
                history.add(cmd);
            }
            history
        };

        assert_eq!(history.len(), 3);
        assert_eq!(history.last_command().unwrap(), "cmd4");
        assert_eq!(history.entries(), vec!["cmd2", "cmd3", "cmd4"]);
    }

    #[test]
    fn test_command_history_duplicates_and_blanks() {
        let mut history = CommandHistory::new(5);
        assert!(history.add("cmd1"));
        assert!(!history.add("cmd1"));
        assert!(!history.add("   "));
        assert!(history.add("cmd2"));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_remove_checks_line() {
        let mut history = history_of(&["a", "b", "c"]);
        assert!(history.remove(1, "x").is_err());
        history.remove(1, "b").unwrap();
        assert_eq!(history.entries(), vec!["a", "c"]);
    }

    #[test]
    fn test_persistent_history_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history");

        let mut history = CommandHistory::with_file(10, path.clone());
        assert!(history.is_persistent());
        history.add("dir");
        history.add("echo hi");

        let mut reloaded = CommandHistory::with_file(10, path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.entries(), vec!["dir", "echo hi"]);
        assert!(!CommandHistory::new(10).is_persistent());
    }

    #[test]
    fn test_expand_event_designators() {
        let history = history_of(&["dir /w", "echo one", "echo two"]);

        assert_eq!(history.expand("plain"), Expansion::Unchanged);
        assert_eq!(history.expand("!!"), Expansion::Rewritten("echo two".into()));
        assert_eq!(history.expand("!1"), Expansion::Rewritten("dir /w".into()));
        assert_eq!(history.expand("!-2"), Expansion::Rewritten("echo one".into()));
        assert_eq!(history.expand("!di"), Expansion::Rewritten("dir /w".into()));
        assert_eq!(history.expand("!?one?"), Expansion::Rewritten("echo one".into()));
        assert_eq!(history.expand("x !! y"), Expansion::Rewritten("x echo two y".into()));
    }

    #[test]
    fn test_expand_print_quoted_and_missing() {
        let history = history_of(&["echo two"]);

        assert_eq!(history.expand("!!:p"), Expansion::Print("echo two".into()));
        assert_eq!(history.expand("echo \"!!\""), Expansion::Unchanged);
        assert_eq!(history.expand("echo hi!"), Expansion::Unchanged);
        assert_eq!(history.expand("!nothing"), Expansion::Unchanged);
        assert_eq!(history.expand("!9"), Expansion::Unchanged);
    }

    #[test]
    fn test_exclusion_list_boundaries() {
        let list = "exit history";
        assert!(is_excluded_from_history("exit", list));
        assert!(is_excluded_from_history("exit /b", list));
        assert!(is_excluded_from_history("history", list));
        assert!(is_excluded_from_history("  EXIT", list));
        assert!(!is_excluded_from_history("exitstuff", list));
        assert!(!is_excluded_from_history("historyx", list));
        assert!(!is_excluded_from_history("exit\\foo", list));
        assert!(!is_excluded_from_history("echo exit", list));
        assert!(is_excluded_from_history("cls", "exit,cls;history"));
    }

    #[test]
    fn test_cursor_navigation() {
        let mut cursor = HistoryCursor::new(vec!["first".into(), "second".into()]);
        cursor.store_current_line("currently typing...");

        assert_eq!(cursor.previous(), Some("second"));
        assert_eq!(cursor.previous(), Some("first"));
        assert_eq!(cursor.previous(), None);
        assert_eq!(cursor.next(), Some("second"));
        assert_eq!(cursor.next(), Some("currently typing..."));
        assert_eq!(cursor.current_index(), None);
        assert_eq!(cursor.next(), None);
    }

    #[test]
    fn test_cursor_prefix_search() {
        let mut cursor = HistoryCursor::new(vec!["git status".into(), "ls".into(), "git push".into()]);

        assert_eq!(cursor.search_backward("git"), Some("git push"));
        assert_eq!(cursor.search_backward("git"), Some("git status"));
        assert_eq!(cursor.search_backward("git"), None);
        assert_eq!(cursor.search_forward("git"), Some("git push"));
        assert_eq!(cursor.current_index(), Some(2));
    }
}
