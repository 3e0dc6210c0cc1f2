//! Word classification
//!
//! Classifiers tag words with a syntax role used for input coloring.
//! [`ClassifierCache`] reruns classification only when the line changed.

use crate::words::collector::{CollectMode, WordCollector};
use crate::words::line_state::{LineState, Word};
use crossterm::style::Color;
use std::ops::Range;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordClass {
    Other,
    Command,
    Doskey,
    Argument,
    Flag,
    None,
}

impl WordClass {
    pub fn color(&self) -> Option<Color> {
        match self {
            Self::Command => Some(Color::White),
            Self::Doskey => Some(Color::Cyan),
            Self::Argument => Some(Color::Yellow),
            Self::Flag => Some(Color::DarkYellow),
            Self::Other => Some(Color::Grey),
            Self::None => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ClassifiedWord {
    offset: usize,
    length: usize,
    class: Option<WordClass>,
}

/// Classes for every word on the line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordClassifications {
    words: Vec<ClassifiedWord>,
}

impl WordClassifications {
    fn init(&mut self, words: &[Word]) {
        self.words = words
            .iter()
            .map(|w| ClassifiedWord {
                offset: w.offset,
                length: w.length,
                class: None,
            })
            .collect();
    }

    /// Set the class of the word starting at `word.offset`.
    pub fn classify_word(&mut self, word: &Word, class: WordClass) {
        if let Some(entry) = self.words.iter_mut().find(|w| w.offset == word.offset) {
            entry.class.get_or_insert(class);
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<WordClass> {
        self.words.get(index).and_then(|w| w.class)
    }

    /// Color spans for the line buffer.
    pub fn colors(&self) -> Vec<(Range<usize>, Color)> {
        self.words
            .iter()
            .filter_map(|w| {
                let color = w.class?.color()?;
                Some((w.offset..w.offset + w.length, color))
            })
            .collect()
    }
}

pub trait Classifier {
    /// Classify the words of each command. Earlier classifications for a
    /// word win.
    fn classify(&self, commands: &[LineState<'_>], out: &mut WordClassifications);
}

/// Cache key for classification; scoped to the whole line rather than to
/// the word at the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassifyKey {
    pub word_count: u16,
    pub command_offset: u16,
    pub length: u16,
}

fn saturate(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

#[derive(Debug, Default)]
pub struct ClassifierCache {
    prev: Option<(ClassifyKey, String)>,
    words: Vec<Word>,
    classifications: WordClassifications,
    runs: usize,
}

impl ClassifierCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the cached line so the next call classifies again.
    pub fn reset(&mut self) {
        self.prev = None;
    }

    pub fn classifications(&self) -> &WordClassifications {
        &self.classifications
    }

    /// How many times classifiers actually ran.
    pub fn runs(&self) -> usize {
        self.runs
    }

    /// Classify `line` unless it matches the cached key and text. Returns
    /// whether the classifications changed.
    pub fn update(
        &mut self,
        line: &str,
        cursor: usize,
        collector: &WordCollector,
        classifiers: &[&dyn Classifier],
    ) -> bool {
        let command_offset = collector.collect_words(line, cursor, CollectMode::WholeCommand, &mut self.words);
        let key = ClassifyKey {
            word_count: saturate(self.words.len()),
            command_offset: saturate(command_offset),
            length: saturate(line.len()),
        };
        if let Some((prev_key, prev_text)) = &self.prev {
            if *prev_key == key && prev_text == line {
                return false;
            }
        }

        // One line state per command.
        let mut commands = Vec::new();
        let mut start = 0;
        for i in 1..=self.words.len() {
            if i == self.words.len() || self.words[i].command_word {
                let slice = &self.words[start..i];
                let offset = slice.first().map(|w| w.offset).unwrap_or(0);
                commands.push(LineState::new(line, cursor, offset, slice));
                start = i;
            }
        }

        let previous = std::mem::take(&mut self.classifications);
        self.classifications.init(&self.words);
        for classifier in classifiers {
            classifier.classify(&commands, &mut self.classifications);
        }
        self.runs += 1;
        self.prev = Some((key, line.to_string()));

        let changed = previous != self.classifications;
        debug!(words = self.words.len(), changed, "classified line");
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FirstWordIsCommand;

    impl Classifier for FirstWordIsCommand {
        fn classify(&self, commands: &[LineState<'_>], out: &mut WordClassifications) {
            for command in commands {
                for (i, word) in command.words().iter().enumerate() {
                    let class = if i == 0 { WordClass::Command } else { WordClass::Argument };
                    out.classify_word(word, class);
                }
            }
        }
    }

    #[test]
    fn test_classifies_each_command() {
        let collector = WordCollector::new();
        let mut cache = ClassifierCache::new();
        let classifier = FirstWordIsCommand;

        assert!(cache.update("dir /w & echo hi", 0, &collector, &[&classifier]));
        let c = cache.classifications();
        assert_eq!(c.len(), 4);
        assert_eq!(c.get(0), Some(WordClass::Command));
        assert_eq!(c.get(1), Some(WordClass::Argument));
        assert_eq!(c.get(2), Some(WordClass::Command));
        assert_eq!(c.colors().len(), 4);
    }

    #[test]
    fn test_unchanged_line_is_not_reclassified() {
        let collector = WordCollector::new();
        let mut cache = ClassifierCache::new();
        let classifier = FirstWordIsCommand;

        cache.update("git status", 3, &collector, &[&classifier]);
        cache.update("git status", 3, &collector, &[&classifier]);
        cache.update("git status", 10, &collector, &[&classifier]);
        assert_eq!(cache.runs(), 1);

        cache.update("git statu", 9, &collector, &[&classifier]);
        assert_eq!(cache.runs(), 2);

        cache.reset();
        cache.update("git statu", 9, &collector, &[&classifier]);
        assert_eq!(cache.runs(), 3);
    }

    #[test]
    fn test_first_classification_wins() {
        let mut out = WordClassifications::default();
        let words = [Word::new(0, 3)];
        out.init(&words);
        out.classify_word(&words[0], WordClass::Doskey);
        out.classify_word(&words[0], WordClass::Command);
        assert_eq!(out.get(0), Some(WordClass::Doskey));
    }
}
