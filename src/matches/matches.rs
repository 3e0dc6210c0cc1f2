//! Matches
//!
//! Candidate completions and the folding rules used to compare them.

use crate::cli::config::IgnoreCase;
use std::cmp::Ordering;
use std::collections::HashSet;

/// What a match stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchKind {
    #[default]
    Word,
    Argument,
    Command,
    Alias,
    File,
    Dir,
    Env,
}

/// One candidate completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchEntry {
    pub text: String,
    pub kind: MatchKind,
    /// Appended after the match when it completes the word.
    pub append_char: Option<char>,
    /// Whether the match passes the current filter.
    pub selected: bool,
}

impl MatchEntry {
    pub fn new(text: impl Into<String>, kind: MatchKind) -> Self {
        let append_char = match kind {
            MatchKind::Dir => Some(std::path::MAIN_SEPARATOR),
            _ => Some(' '),
        };
        Self {
            text: text.into(),
            kind,
            append_char,
            selected: true,
        }
    }

    pub fn with_append_char(mut self, c: Option<char>) -> Self {
        self.append_char = c;
        self
    }
}

/// How match text is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchFolding {
    Exact,
    #[default]
    Caseless,
    CaselessAccentless,
}

impl MatchFolding {
    pub fn from_settings(ignore_case: IgnoreCase, ignore_accent: bool) -> Self {
        match (ignore_case, ignore_accent) {
            (IgnoreCase::Off, _) => Self::Exact,
            (_, true) => Self::CaselessAccentless,
            (_, false) => Self::Caseless,
        }
    }

    pub fn is_caseless(&self) -> bool {
        *self != Self::Exact
    }

    pub fn fold(&self, text: &str) -> String {
        match self {
            Self::Exact => text.to_string(),
            Self::Caseless => text.to_lowercase(),
            Self::CaselessAccentless => text.to_lowercase().chars().map(strip_accent).collect(),
        }
    }

    /// Whether `text` starts with `needle` under this folding.
    pub fn starts_with(&self, text: &str, needle: &str) -> bool {
        self.fold(text).starts_with(&self.fold(needle))
    }
}

/// Base letter for accented lowercase Latin-1 and Latin Extended-A letters.
/// Letters outside those blocks fold by case only.
fn strip_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
        'ď' | 'đ' => 'd',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => 'g',
        'ĥ' | 'ħ' => 'h',
        'ì' | 'í' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => 'i',
        'ĵ' => 'j',
        'ķ' => 'k',
        'ĺ' | 'ļ' | 'ľ' | 'ŀ' | 'ł' => 'l',
        'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => 'o',
        'ŕ' | 'ŗ' | 'ř' => 'r',
        'ś' | 'ŝ' | 'ş' | 'š' => 's',
        'ţ' | 'ť' | 'ŧ' => 't',
        'ù' | 'ú' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'ŵ' => 'w',
        'ý' | 'ÿ' | 'ŷ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        _ => c,
    }
}

/// Ordered, appendable set of matches.
#[derive(Debug, Clone, Default)]
pub struct Matches {
    entries: Vec<MatchEntry>,
}

impl Matches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: MatchEntry) {
        self.entries.push(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MatchEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchEntry> {
        self.entries.iter()
    }

    pub fn selected(&self) -> impl Iterator<Item = &MatchEntry> {
        self.entries.iter().filter(|e| e.selected)
    }

    pub fn selected_count(&self) -> usize {
        self.selected().count()
    }

    /// Drop entries whose folded text was already seen; the first one wins.
    pub fn dedup(&mut self, folding: MatchFolding) {
        let mut seen = HashSet::new();
        self.entries.retain(|e| seen.insert(folding.fold(&e.text)));
    }

    /// Sort by folded text, breaking ties on the raw text.
    pub fn sort(&mut self, folding: MatchFolding) {
        self.entries.sort_by(|a, b| match folding.fold(&a.text).cmp(&folding.fold(&b.text)) {
            Ordering::Equal => a.text.cmp(&b.text),
            other => other,
        });
    }

    /// Mark the entries starting with `needle` as selected.
    pub fn select(&mut self, needle: &str, folding: MatchFolding) {
        let needle = folding.fold(needle);
        for entry in &mut self.entries {
            entry.selected = folding.fold(&entry.text).starts_with(&needle);
        }
    }

    /// Keep only entries for which `keep` returns true.
    pub fn retain(&mut self, keep: impl FnMut(&MatchEntry) -> bool) {
        self.entries.retain(keep);
    }

    /// Longest prefix shared by every selected entry. The prefix is taken
    /// from the first selected entry's text.
    pub fn common_prefix(&self, folding: MatchFolding) -> Option<String> {
        let mut selected = self.selected();
        let first = selected.next()?;
        let mut prefix: Vec<char> = first.text.chars().collect();
        for entry in selected {
            let shared = prefix
                .iter()
                .zip(entry.text.chars())
                .take_while(|(a, b)| folding.fold(&a.to_string()) == folding.fold(&b.to_string()))
                .count();
            prefix.truncate(shared);
        }
        Some(prefix.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Matches {
        let mut matches = Matches::new();
        for text in list {
            matches.add(MatchEntry::new(*text, MatchKind::Word));
        }
        matches
    }

    fn texts(matches: &Matches) -> Vec<&str> {
        matches.iter().map(|e| e.text.as_str()).collect()
    }

    #[test]
    fn test_folding_from_settings() {
        assert_eq!(MatchFolding::from_settings(IgnoreCase::Off, true), MatchFolding::Exact);
        assert_eq!(MatchFolding::from_settings(IgnoreCase::On, false), MatchFolding::Caseless);
        assert_eq!(MatchFolding::from_settings(IgnoreCase::Relaxed, true), MatchFolding::CaselessAccentless);
    }

    #[test]
    fn test_fold_levels() {
        assert_eq!(MatchFolding::Exact.fold("Café"), "Café");
        assert_eq!(MatchFolding::Caseless.fold("Café"), "café");
        assert_eq!(MatchFolding::CaselessAccentless.fold("Café"), "cafe");
        assert!(MatchFolding::CaselessAccentless.starts_with("Résumé.txt", "resu"));
        assert_eq!(MatchFolding::CaselessAccentless.fold("Łódź Ğüř"), "lodz gur");
        assert_eq!(MatchFolding::CaselessAccentless.fold("Ωmega"), "ωmega");
        assert!(!MatchFolding::Caseless.starts_with("Résumé.txt", "resu"));
    }

    #[test]
    fn test_dedup_keeps_first() {
        let mut matches = words(&["Foo", "bar", "foo", "BAR"]);
        matches.dedup(MatchFolding::Caseless);
        assert_eq!(texts(&matches), vec!["Foo", "bar"]);

        let mut matches = words(&["Foo", "foo"]);
        matches.dedup(MatchFolding::Exact);
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn test_sort_is_stable_under_folding() {
        let mut matches = words(&["beta", "Alpha", "alpha", "Gamma"]);
        matches.sort(MatchFolding::Caseless);
        assert_eq!(texts(&matches), vec!["Alpha", "alpha", "beta", "Gamma"]);
    }

    #[test]
    fn test_select_and_common_prefix() {
        let mut matches = words(&["Program Files", "ProgramData", "Users"]);
        matches.select("prog", MatchFolding::Caseless);
        assert_eq!(matches.selected_count(), 2);
        assert_eq!(matches.common_prefix(MatchFolding::Caseless).as_deref(), Some("Program"));

        matches.select("x", MatchFolding::Caseless);
        assert_eq!(matches.common_prefix(MatchFolding::Caseless), None);
    }

    #[test]
    fn test_entry_append_char() {
        assert_eq!(MatchEntry::new("src", MatchKind::Dir).append_char, Some(std::path::MAIN_SEPARATOR));
        assert_eq!(MatchEntry::new("a.txt", MatchKind::File).append_char, Some(' '));
        assert_eq!(MatchEntry::new("x", MatchKind::Word).with_append_char(None).append_char, None);
    }
}
