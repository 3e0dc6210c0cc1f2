//! Match Engine
//!
//! Generators run once per end-word position. As the word is typed the
//! cached set is only re-selected against the text before the cursor;
//! sorting and glob restriction also work on the cached set.

use crate::cli::utils::strip_quotes;
use crate::matches::generator::{MatchBuilder, MatchGenerator};
use crate::matches::matches::{MatchFolding, Matches};
use crate::words::collector::{apply_word_break, widest_word_break, CollectMode, WordCollector};
use crate::words::line_state::{LineState, Word};
use glob::{MatchOptions, Pattern, PatternError};
use tracing::debug;

/// Position of the end word when matches were last generated or selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GenerationKey {
    pub word_index: u16,
    pub word_offset: u16,
    pub word_length: u16,
    pub cursor: u16,
}

impl GenerationKey {
    fn new(word_index: usize, word: &Word, cursor: usize) -> Self {
        let clamp = |v: usize| u16::try_from(v).unwrap_or(u16::MAX);
        Self {
            word_index: clamp(word_index),
            word_offset: clamp(word.offset),
            word_length: clamp(word.length),
            cursor: clamp(cursor),
        }
    }
}

/// What an update found stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheCheck {
    pub generate: bool,
    pub select: bool,
}

#[derive(Debug, Default)]
pub struct MatchEngine {
    collector: WordCollector,
    words: Vec<Word>,
    command_offset: usize,
    end_word_base: usize,
    matches: Matches,
    regen: Matches,
    folding: MatchFolding,
    prev_key: Option<GenerationKey>,
    prev_generate: Option<String>,
    needle: String,
    word_offset: usize,
    generations: usize,
    restricted: bool,
}

impl MatchEngine {
    pub fn new(folding: MatchFolding) -> Self {
        Self {
            folding,
            ..Self::default()
        }
    }

    pub fn folding(&self) -> MatchFolding {
        self.folding
    }

    pub fn set_folding(&mut self, folding: MatchFolding) {
        self.folding = folding;
    }

    pub fn matches(&self) -> &Matches {
        &self.matches
    }

    /// Text before the cursor that matches are selected against.
    pub fn needle(&self) -> &str {
        &self.needle
    }

    /// Where the text a match replaces begins.
    pub fn word_offset(&self) -> usize {
        self.word_offset
    }

    /// How many times generators have been run.
    pub fn generations(&self) -> usize {
        self.generations
    }

    pub fn is_restricted(&self) -> bool {
        self.restricted
    }

    /// Forget the cached position so the next update regenerates.
    pub fn reset(&mut self) {
        self.prev_key = None;
        self.prev_generate = None;
    }

    fn collect(&mut self, line: &str, cursor: usize, generators: &[&dyn MatchGenerator]) {
        self.command_offset = self
            .collector
            .collect_words(line, cursor, CollectMode::StopAtCursor, &mut self.words);
        let state = LineState::new(line, cursor, self.command_offset, &self.words);
        let info = widest_word_break(generators.iter().map(|g| g.word_break_info(&state)));
        self.end_word_base = apply_word_break(&mut self.words, info);
    }

    /// Compare the end word against the cached key and text. Generation is
    /// reported stale only when the text up to the end word changed, and
    /// never while `block_generate` is set.
    pub fn update(
        &mut self,
        line: &str,
        cursor: usize,
        generators: &[&dyn MatchGenerator],
        block_generate: bool,
    ) -> CacheCheck {
        self.collect(line, cursor, generators);
        let Some(end) = self.words.last().copied() else {
            return CacheCheck::default();
        };
        let next = GenerationKey::new(self.words.len() - 1, &end, cursor);
        let prefix = line.get(..end.end()).unwrap_or(line);
        let same_text = self.prev_generate.as_deref() == Some(prefix);

        let mut check = CacheCheck::default();
        if !same_text {
            if !block_generate {
                check.generate = true;
                self.word_offset = end.offset;
            }
        }

        if self.prev_key != Some(next) || !same_text {
            let raw = line.get(end.offset..cursor).unwrap_or("");
            self.needle = strip_quotes(raw);
            self.prev_key = Some(next);
            check.select = true;
        }

        if !same_text {
            self.prev_generate = Some(prefix.to_string());
        }
        check
    }

    /// Run generators in order into the staging set, then promote it.
    pub fn generate(&mut self, line: &str, cursor: usize, generators: &[&dyn MatchGenerator]) {
        self.collect(line, cursor, generators);
        if let Some(end) = self.words.last() {
            self.word_offset = end.offset;
        }

        self.regen.clear();
        let state = LineState::new(line, cursor, self.command_offset, &self.words)
            .with_end_word_base(self.end_word_base);
        let mut builder = MatchBuilder::new(&mut self.regen);
        for generator in generators {
            if generator.generate(&state, &mut builder) {
                break;
            }
        }

        self.regen.dedup(self.folding);
        std::mem::swap(&mut self.matches, &mut self.regen);
        self.regen.clear();
        self.generations += 1;
        self.restricted = false;
        debug!(count = self.matches.len(), generation = self.generations, "generated matches");
    }

    /// Mark matches that start with the needle.
    pub fn select(&mut self) {
        self.matches.select(&self.needle, self.folding);
    }

    pub fn sort(&mut self) {
        self.matches.sort(self.folding);
    }

    /// Keep only matches whose text matches the glob `pattern`. Returns how
    /// many remain.
    pub fn restrict(&mut self, pattern: &str) -> Result<usize, PatternError> {
        let pattern = Pattern::new(pattern)?;
        let options = MatchOptions {
            case_sensitive: !self.folding.is_caseless(),
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };
        self.matches.retain(|e| pattern.matches_with(&e.text, options));
        self.restricted = true;
        Ok(self.matches.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::matches::MatchKind;
    use crate::words::line_state::WordBreakInfo;
    use std::cell::Cell;

    struct Counting {
        words: Vec<&'static str>,
        calls: Cell<usize>,
    }

    impl Counting {
        fn new(words: &[&'static str]) -> Self {
            Self {
                words: words.to_vec(),
                calls: Cell::new(0),
            }
        }
    }

    impl MatchGenerator for Counting {
        fn generate(&self, _line: &LineState<'_>, builder: &mut MatchBuilder<'_>) -> bool {
            self.calls.set(self.calls.get() + 1);
            for w in &self.words {
                builder.add_match(*w, MatchKind::Word);
            }
            false
        }
    }

    struct SplitAtSlash;

    impl MatchGenerator for SplitAtSlash {
        fn generate(&self, line: &LineState<'_>, builder: &mut MatchBuilder<'_>) -> bool {
            builder.add_match(format!("{}file", line.end_word_prefix()), MatchKind::File);
            true
        }

        fn word_break_info(&self, line: &LineState<'_>) -> WordBreakInfo {
            let truncate = line.end_word().rfind('/').map(|i| i + 1).unwrap_or(0);
            WordBreakInfo { truncate, keep: 0 }
        }
    }

    /// Type `text` one char at a time, generating whenever the engine asks.
    fn type_text(engine: &mut MatchEngine, generators: &[&dyn MatchGenerator], line: &mut String, text: &str) {
        for c in text.chars() {
            line.push(c);
            let check = engine.update(line, line.len(), generators, false);
            if check.generate {
                engine.generate(line, line.len(), generators);
            }
            if check.select {
                engine.select();
            }
        }
    }

    #[test]
    fn test_generates_once_per_word() {
        let counting = Counting::new(&["status", "stash", "switch"]);
        let generators: [&dyn MatchGenerator; 1] = [&counting];
        let mut engine = MatchEngine::new(MatchFolding::Caseless);
        let mut line = String::new();

        type_text(&mut engine, &generators, &mut line, "git");
        assert_eq!(counting.calls.get(), 1);

        type_text(&mut engine, &generators, &mut line, " st");
        assert_eq!(counting.calls.get(), 2);
        assert_eq!(engine.needle(), "st");
        assert_eq!(engine.matches().selected_count(), 2);

        type_text(&mut engine, &generators, &mut line, "atu");
        assert_eq!(counting.calls.get(), 2);
        assert_eq!(engine.matches().selected_count(), 1);
        assert_eq!(engine.word_offset(), 4);
    }

    #[test]
    fn test_cursor_moves_reselect_without_generating() {
        let counting = Counting::new(&["alpha", "beta"]);
        let generators: [&dyn MatchGenerator; 1] = [&counting];
        let mut engine = MatchEngine::new(MatchFolding::Exact);
        let line = "cmd be";

        let check = engine.update(line, line.len(), &generators, false);
        assert!(check.generate && check.select);
        engine.generate(line, line.len(), &generators);

        let check = engine.update(line, line.len(), &generators, false);
        assert_eq!(check, CacheCheck::default());

        let check = engine.update(line, 5, &generators, false);
        assert!(!check.generate);
        assert!(check.select);
        assert_eq!(engine.needle(), "b");
        assert_eq!(counting.calls.get(), 1);
    }

    #[test]
    fn test_block_generate_defers() {
        let counting = Counting::new(&["x"]);
        let generators: [&dyn MatchGenerator; 1] = [&counting];
        let mut engine = MatchEngine::new(MatchFolding::Exact);

        let check = engine.update("a b", 3, &generators, true);
        assert!(!check.generate);
        let check = engine.update("a b", 3, &generators, false);
        assert!(!check.generate);

        engine.reset();
        assert!(engine.update("a b", 3, &generators, false).generate);
    }

    #[test]
    fn test_word_break_regenerates_per_directory() {
        let split = SplitAtSlash;
        let generators: [&dyn MatchGenerator; 1] = [&split];
        let mut engine = MatchEngine::new(MatchFolding::Exact);
        let mut line = String::from("type ");

        type_text(&mut engine, &generators, &mut line, "src/ma");
        assert_eq!(engine.generations(), 2);
        assert_eq!(engine.matches().get(0).map(|e| e.text.as_str()), Some("src/file"));
        assert_eq!(engine.needle(), "ma");
        assert_eq!(engine.word_offset(), "type src/".len());
    }

    #[test]
    fn test_generators_concatenate_and_dedup() {
        let a = Counting::new(&["Build", "bench"]);
        let b = Counting::new(&["build", "check"]);
        let generators: [&dyn MatchGenerator; 2] = [&a, &b];
        let mut engine = MatchEngine::new(MatchFolding::Caseless);

        engine.generate("cargo ", 6, &generators);
        let texts: Vec<&str> = engine.matches().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["Build", "bench", "check"]);

        engine.sort();
        let texts: Vec<&str> = engine.matches().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["bench", "Build", "check"]);
    }

    #[test]
    fn test_restrict_filters_cached_set() {
        let counting = Counting::new(&["main.rs", "lib.rs", "Cargo.toml"]);
        let generators: [&dyn MatchGenerator; 1] = [&counting];
        let mut engine = MatchEngine::new(MatchFolding::Caseless);
        engine.generate("type ", 5, &generators);

        assert_eq!(engine.restrict("*.RS").unwrap(), 2);
        assert!(engine.is_restricted());
        assert!(engine.restrict("[").is_err());
        assert_eq!(counting.calls.get(), 1);
    }
}
