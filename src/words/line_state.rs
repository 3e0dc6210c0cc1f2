//! Line State
//!
//! Borrowed view of a buffer and the words collected from it.

/// One collected word, as a byte range into the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Word {
    pub offset: usize,
    pub length: usize,
    /// First word of a command.
    pub command_word: bool,
    /// The word starts with a quote.
    pub quoted: bool,
    /// The word follows `<` or `>`.
    pub is_redir_arg: bool,
}

impl Word {
    pub fn new(offset: usize, length: usize) -> Self {
        Self {
            offset,
            length,
            ..Self::default()
        }
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// How generators want the end word split.
///
/// `truncate` splits the end word after that many bytes, making the tail a
/// new end word; `keep` is how many bytes of the end word take part in the
/// generation key. The widest request from all generators wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WordBreakInfo {
    pub truncate: usize,
    pub keep: usize,
}

/// A line, its cursor and the words of the command under consideration.
#[derive(Debug, Clone, Copy)]
pub struct LineState<'a> {
    line: &'a str,
    cursor: usize,
    command_offset: usize,
    words: &'a [Word],
    end_word_base: usize,
}

impl<'a> LineState<'a> {
    pub fn new(line: &'a str, cursor: usize, command_offset: usize, words: &'a [Word]) -> Self {
        let end_word_base = words.last().map(|w| w.offset).unwrap_or(cursor);
        Self {
            line,
            cursor,
            command_offset,
            words,
            end_word_base,
        }
    }

    /// Record where the end word started before a word break split it.
    pub fn with_end_word_base(mut self, base: usize) -> Self {
        self.end_word_base = base.min(self.end_word_offset());
        self
    }

    pub fn line(&self) -> &'a str {
        self.line
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn command_offset(&self) -> usize {
        self.command_offset
    }

    pub fn words(&self) -> &'a [Word] {
        self.words
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Text of word `index`, or `None` past the end.
    pub fn word(&self, index: usize) -> Option<&'a str> {
        let word = self.words.get(index)?;
        self.line.get(word.offset..word.end())
    }

    pub fn end_word_offset(&self) -> usize {
        self.words.last().map(|w| w.offset).unwrap_or(self.cursor)
    }

    /// Text from the end word's start up to the cursor.
    pub fn end_word(&self) -> &'a str {
        let start = self.end_word_offset().min(self.cursor);
        self.line.get(start..self.cursor).unwrap_or("")
    }

    /// Text split off the front of the end word by a word break, e.g. the
    /// directory part of a path.
    pub fn end_word_prefix(&self) -> &'a str {
        self.line.get(self.end_word_base..self.end_word_offset()).unwrap_or("")
    }

    /// The first word of the command, if any.
    pub fn command_word(&self) -> Option<&'a str> {
        self.words
            .iter()
            .position(|w| w.command_word)
            .and_then(|i| self.word(i))
    }
}
