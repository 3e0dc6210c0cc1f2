//! CLI Utilities Module
//!
//! Text helpers shared by the editor, the completion engine and the host:
//! quoting, tilde expansion, display width and column layout.

use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;
use unicode_width::UnicodeWidthStr;

/// Characters that force a completion to be quoted when inserted.
const QUOTE_TRIGGERS: &[char] = &[' ', '\t', '&', '(', ')', '[', ']', '{', '}', '^', '=', ';', '!', '\'', '+', ',', '`', '~'];

pub fn is_path_separator(c: char) -> bool {
    c == '\\' || c == '/'
}

/// Remove every double quote from `text`.
pub fn strip_quotes(text: &str) -> String {
    text.chars().filter(|&c| c != '"').collect()
}

/// Whether `text` must be wrapped in quotes to survive as a single word.
pub fn needs_quoting(text: &str) -> bool {
    text.contains(QUOTE_TRIGGERS)
}

/// Expand a leading `~` to the home directory. Returns `None` when the text
/// does not start with a tilde or no home directory is known.
pub fn expand_tilde(text: &str) -> Option<String> {
    let rest = text.strip_prefix('~')?;
    if !(rest.is_empty() || rest.starts_with(is_path_separator)) {
        return None;
    }
    let home: PathBuf = dirs::home_dir()?;
    Some(format!("{}{}", home.to_string_lossy(), rest))
}

fn ansi_regex() -> &'static Regex {
    static ANSI: OnceLock<Regex> = OnceLock::new();
    ANSI.get_or_init(|| {
        Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]|\x1b\][^\x07]*\x07|[\x01\x02]")
            .unwrap_or_else(|e| panic!("ansi pattern: {e}"))
    })
}

/// Remove terminal escape sequences and readline's invisible markers.
pub fn strip_escapes(text: &str) -> String {
    ansi_regex().replace_all(text, "").into_owned()
}

/// Printable width of `text` in terminal columns.
pub fn visible_width(text: &str) -> usize {
    UnicodeWidthStr::width(strip_escapes(text).as_str())
}

/// Lay out `items` in columns that fit `width`, filling down each column
/// before moving across.
pub fn format_columns(items: &[String], width: usize) -> Vec<String> {
    if items.is_empty() {
        return Vec::new();
    }
    let cell = items.iter().map(|i| i.width()).max().unwrap_or(0) + 2;
    let columns = (width / cell.max(1)).max(1);
    let rows = (items.len() + columns - 1) / columns;

    (0..rows)
        .map(|row| {
            let mut line = String::new();
            for col in 0..columns {
                if let Some(item) = items.get(col * rows + row) {
                    line.push_str(item);
                    line.extend(std::iter::repeat(' ').take(cell.saturating_sub(item.width())));
                }
            }
            line.trim_end().to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoting_helpers() {
        assert_eq!(strip_quotes("\"Program Files\"\\x"), "Program Files\\x");
        assert!(needs_quoting("Program Files"));
        assert!(needs_quoting("a&b"));
        assert!(!needs_quoting("plain.txt"));
    }

    #[test]
    fn test_tilde_expansion() {
        assert_eq!(expand_tilde("plain"), None);
        assert_eq!(expand_tilde("~user"), None);
        if let Some(home) = dirs::home_dir() {
            let expected = format!("{}/src", home.to_string_lossy());
            assert_eq!(expand_tilde("~/src"), Some(expected));
        }
    }

    #[test]
    fn test_visible_width_ignores_escapes() {
        assert_eq!(visible_width("\x1b[32mC:\\>\x1b[0m "), 5);
        assert_eq!(visible_width("\x01\x1b[1m\x02$ "), 2);
        assert_eq!(visible_width("héllo"), 5);
    }

    #[test]
    fn test_visible_width_counts_wide_characters() {
        assert_eq!(visible_width("日本"), 4);
        assert_eq!(visible_width("\x1b[1m日本\x1b[0m> "), 6);
    }

    #[test]
    fn test_format_columns() {
        let items: Vec<String> = ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();
        assert_eq!(format_columns(&items, 9), vec!["a  c  e", "b  d"]);
        assert_eq!(format_columns(&items, 1).len(), 5);
        assert!(format_columns(&[], 80).is_empty());
    }

    #[test]
    fn test_format_columns_aligns_wide_items() {
        let items: Vec<String> = ["日本", "a", "bb", "c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(format_columns(&items, 12), vec!["日本  bb", "a     c"]);
    }
}
