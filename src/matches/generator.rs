//! Match generators
//!
//! Generators run in registration order and append into a shared
//! [`MatchBuilder`]; deduplication and ordering happen afterwards in the
//! engine.

use crate::matches::matches::{MatchEntry, MatchKind, Matches};
use crate::words::line_state::{LineState, WordBreakInfo};

/// Appends matches into the staging set.
pub struct MatchBuilder<'a> {
    matches: &'a mut Matches,
}

impl<'a> MatchBuilder<'a> {
    pub fn new(matches: &'a mut Matches) -> Self {
        Self { matches }
    }

    /// Add a match; empty text is ignored. Returns whether it was added.
    pub fn add_match(&mut self, text: impl Into<String>, kind: MatchKind) -> bool {
        self.add_entry(MatchEntry::new(text, kind))
    }

    pub fn add_entry(&mut self, entry: MatchEntry) -> bool {
        if entry.text.is_empty() {
            return false;
        }
        self.matches.add(entry);
        true
    }

    pub fn count(&self) -> usize {
        self.matches.len()
    }
}

pub trait MatchGenerator {
    /// Add matches for the end word of `line`. Returning true stops later
    /// generators from running.
    fn generate(&self, line: &LineState<'_>, builder: &mut MatchBuilder<'_>) -> bool;

    /// How the end word should be split before generation.
    fn word_break_info(&self, _line: &LineState<'_>) -> WordBreakInfo {
        WordBreakInfo::default()
    }
}
