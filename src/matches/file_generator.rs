//! File Match Generator
//!
//! Lists the directory named by the part of the end word before its last
//! path separator. The word is split after that separator so only the file
//! name part is completed and the listing is reused while it is typed.

use crate::cli::utils::{expand_tilde, is_path_separator, strip_quotes};
use crate::matches::generator::{MatchBuilder, MatchGenerator};
use crate::matches::matches::MatchKind;
use crate::words::line_state::{LineState, WordBreakInfo};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct FileMatchGenerator {
    pub show_hidden: bool,
}

impl FileMatchGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn directory_for(prefix: &str) -> PathBuf {
        let prefix = strip_quotes(prefix);
        if prefix.is_empty() {
            return PathBuf::from(".");
        }
        let prefix = expand_tilde(&prefix).unwrap_or(prefix);
        PathBuf::from(prefix.replace(['\\', '/'], std::path::MAIN_SEPARATOR_STR))
    }
}

impl MatchGenerator for FileMatchGenerator {
    fn generate(&self, line: &LineState<'_>, builder: &mut MatchBuilder<'_>) -> bool {
        let dir = Self::directory_for(line.end_word_prefix());
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "cannot list directory for completion");
                return false;
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if !self.show_hidden && name.starts_with('.') {
                continue;
            }
            let kind = match entry.file_type() {
                Ok(t) if t.is_dir() => MatchKind::Dir,
                _ => MatchKind::File,
            };
            builder.add_match(name, kind);
        }
        false
    }

    fn word_break_info(&self, line: &LineState<'_>) -> WordBreakInfo {
        let word = line.end_word();
        let truncate = word
            .char_indices()
            .filter(|(_, c)| is_path_separator(*c))
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        WordBreakInfo { truncate, keep: 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::matches::Matches;
    use crate::words::collector::{apply_word_break, CollectMode, WordCollector};
    use std::fs::File;
    use tempfile::TempDir;

    fn generate_for(line: &str) -> Matches {
        let collector = WordCollector::new();
        let generator = FileMatchGenerator::new();
        let mut words = Vec::new();
        let offset = collector.collect_words(line, line.len(), CollectMode::StopAtCursor, &mut words);

        let info = generator.word_break_info(&LineState::new(line, line.len(), offset, &words));
        let base = apply_word_break(&mut words, info);
        let state = LineState::new(line, line.len(), offset, &words).with_end_word_base(base);

        let mut matches = Matches::new();
        generator.generate(&state, &mut MatchBuilder::new(&mut matches));
        matches
    }

    #[test]
    fn test_word_break_after_last_separator() {
        let generator = FileMatchGenerator::new();
        let words = [crate::words::line_state::Word::new(4, 10)];
        let line = "dir src/lib/mo";
        let state = LineState::new(line, line.len(), 0, &words);
        assert_eq!(generator.word_break_info(&state), WordBreakInfo { truncate: 8, keep: 0 });

        let line = "dir mo";
        let words = [crate::words::line_state::Word::new(4, 2)];
        let state = LineState::new(line, line.len(), 0, &words);
        assert_eq!(generator.word_break_info(&state).truncate, 0);
    }

    #[test]
    fn test_lists_directory_of_prefix() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir(root.join("sub")).unwrap();
        File::create(root.join("a.txt")).unwrap();
        File::create(root.join(".hidden")).unwrap();

        let line = format!("type \"{}/", root.display());
        let mut matches = generate_for(&line);
        matches.sort(crate::matches::matches::MatchFolding::Exact);

        let found: Vec<(String, MatchKind)> = matches.iter().map(|e| (e.text.clone(), e.kind)).collect();
        assert_eq!(found, vec![("a.txt".to_string(), MatchKind::File), ("sub".to_string(), MatchKind::Dir)]);
    }

    #[test]
    fn test_missing_directory_yields_nothing() {
        let matches = generate_for("type /no/such/place/x");
        assert!(matches.is_empty());
    }
}
