//! Word Collector
//!
//! Splits a command line into commands at unquoted `&` and `|`, and each
//! command into words at unquoted delimiters. `^` escapes the next character
//! outside quotes, as in cmd.

use crate::words::line_state::{Word, WordBreakInfo};

/// Which part of the line to collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectMode {
    /// Only the command containing the cursor, up to the cursor. The last
    /// word is always the word at the cursor, possibly empty.
    StopAtCursor,
    /// Every command on the line, whole.
    WholeCommand,
}

#[derive(Debug, Clone)]
pub struct WordCollector {
    quote: char,
    command_delims: &'static str,
    word_delims: &'static str,
}

impl Default for WordCollector {
    fn default() -> Self {
        Self {
            quote: '"',
            command_delims: "&|",
            word_delims: " \t;,=<>",
        }
    }
}

impl WordCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Byte ranges of the commands in `line[..end]`.
    fn command_spans(&self, line: &str, end: usize) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        let mut start = 0;
        let mut in_quote = false;
        let mut chars = line[..end].char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            if c == self.quote {
                in_quote = !in_quote;
            } else if in_quote {
                continue;
            } else if c == '^' {
                chars.next();
            } else if self.command_delims.contains(c) {
                spans.push((start, i));
                start = i + c.len_utf8();
                // `&&` and `||`
                while let Some(&(j, d)) = chars.peek() {
                    if !self.command_delims.contains(d) {
                        break;
                    }
                    start = j + d.len_utf8();
                    chars.next();
                }
            }
        }
        spans.push((start, end));
        spans
    }

    fn collect_command(&self, line: &str, start: usize, end: usize, words: &mut Vec<Word>) {
        let mut current: Option<Word> = None;
        let mut in_quote = false;
        let mut escaped = false;
        let mut redir_next = false;
        let mut first = true;

        let close = |word: Option<Word>, words: &mut Vec<Word>, redir: &mut bool, first: &mut bool| {
            if let Some(mut word) = word {
                word.is_redir_arg = std::mem::take(redir);
                if !word.is_redir_arg && *first {
                    word.command_word = true;
                    *first = false;
                }
                words.push(word);
            }
        };

        for (i, c) in line[start..end].char_indices() {
            let i = start + i;
            let delim = !in_quote && !escaped && self.word_delims.contains(c);
            if delim {
                close(current.take(), words, &mut redir_next, &mut first);
                if c == '<' || c == '>' {
                    redir_next = true;
                }
                continue;
            }

            let word = current.get_or_insert_with(|| Word {
                quoted: c == self.quote,
                ..Word::new(i, 0)
            });
            word.length = i + c.len_utf8() - word.offset;

            if escaped {
                escaped = false;
            } else if c == self.quote {
                in_quote = !in_quote;
            } else if c == '^' && !in_quote {
                escaped = true;
            }
        }
        close(current.take(), words, &mut redir_next, &mut first);
    }

    /// Collect words into `words` (cleared first) and return the offset of
    /// the command containing the cursor.
    pub fn collect_words(&self, line: &str, cursor: usize, mode: CollectMode, words: &mut Vec<Word>) -> usize {
        words.clear();
        let cursor = cursor.min(line.len());

        match mode {
            CollectMode::StopAtCursor => {
                let spans = self.command_spans(line, cursor);
                let (start, end) = spans.last().copied().unwrap_or((0, cursor));
                self.collect_command(line, start, end, words);

                let needs_empty = match words.last() {
                    Some(last) => last.end() < cursor,
                    None => true,
                };
                if needs_empty {
                    let mut word = Word::new(cursor, 0);
                    word.command_word = words.iter().all(|w| w.is_redir_arg);
                    words.push(word);
                }
                start
            }
            CollectMode::WholeCommand => {
                let spans = self.command_spans(line, line.len());
                let mut command_offset = 0;
                for (start, end) in spans {
                    if start <= cursor {
                        command_offset = start;
                    }
                    self.collect_command(line, start, end, words);
                }
                command_offset
            }
        }
    }
}

/// Apply the widest word break request to the end word. Returns the offset
/// the end word had before any split.
pub fn apply_word_break(words: &mut Vec<Word>, info: WordBreakInfo) -> usize {
    let Some(end) = words.last_mut() else {
        return 0;
    };
    let base = end.offset;
    if end.length == 0 {
        return base;
    }

    let truncate = info.truncate.min(end.length);
    if truncate > 0 {
        let tail = Word::new(end.offset + truncate, end.length - truncate);
        end.length = truncate;
        words.push(tail);
    }

    if let Some(end) = words.last_mut() {
        end.length = info.keep.min(end.length);
    }
    base
}

/// Pick the widest of several word break requests.
pub fn widest_word_break(infos: impl IntoIterator<Item = WordBreakInfo>) -> WordBreakInfo {
    infos.into_iter().fold(WordBreakInfo::default(), |best, info| {
        if info.truncate > best.truncate || (info.truncate == best.truncate && info.keep > best.keep) {
            info
        } else {
            best
        }
    })
}
