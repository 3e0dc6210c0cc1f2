//! Line Buffer Module
//!
//! The editable line behind the [`LineBuffer`] trait: text, a byte cursor,
//! grouped undo, and a crossterm redraw of prompt plus coloured input.

use crate::cli::utils::visible_width;
use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use std::io::{self, Write};
use std::ops::Range;
use unicode_width::UnicodeWidthStr;

/// Terminal line-input primitive used by the editing session.
pub trait LineBuffer {
    fn text(&self) -> &str;

    /// Cursor as a byte offset into [`LineBuffer::text`].
    fn cursor(&self) -> usize;

    /// Move the cursor, clamped to the text and a char boundary. Returns the
    /// resulting position.
    fn set_cursor(&mut self, pos: usize) -> usize;

    /// Insert at the cursor and advance past the inserted text.
    fn insert(&mut self, text: &str) -> bool;

    /// Remove the byte range `from..to`.
    fn remove(&mut self, from: usize, to: usize) -> bool;

    fn begin_undo_group(&mut self);
    fn end_undo_group(&mut self);
    fn undo(&mut self) -> bool;

    /// Start a new line under `prompt`, optionally seeded with text.
    fn begin_line(&mut self, prompt: &str, initial: &str);

    /// Finish the line, optionally collapsing the prompt to `transient`.
    fn end_line(&mut self, transient: Option<&str>, out: &mut dyn Write) -> io::Result<()>;

    /// Replace the colour spans used when drawing.
    fn set_colors(&mut self, spans: Vec<(Range<usize>, Color)>);

    fn set_need_draw(&mut self);

    /// Print the whole prompt again on the next draw, e.g. after output was
    /// written below the line.
    fn reprompt(&mut self);

    /// Draw if anything changed since the last draw.
    fn draw(&mut self, out: &mut dyn Write) -> io::Result<()>;

    fn redraw(&mut self, out: &mut dyn Write) -> io::Result<()> {
        self.set_need_draw();
        self.draw(out)
    }

    /// Replace the whole text inside one undo group and put the cursor at the end.
    fn replace_all(&mut self, text: &str) {
        self.begin_undo_group();
        let len = self.text().len();
        self.remove(0, len);
        self.set_cursor(0);
        self.insert(text);
        self.end_undo_group();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum UndoOp {
    Insert { pos: usize, text: String },
    Remove { pos: usize, text: String },
}

/// Single-line text buffer.
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    text: String,
    cursor: usize,
    prompt: String,
    prompt_drawn: bool,
    need_draw: bool,
    colors: Vec<(Range<usize>, Color)>,
    undo_stack: Vec<Vec<UndoOp>>,
    group_depth: usize,
}

impl TextBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, op: UndoOp) {
        if self.group_depth > 0 {
            if let Some(group) = self.undo_stack.last_mut() {
                group.push(op);
                return;
            }
        }
        self.undo_stack.push(vec![op]);
    }

    fn floor_boundary(&self, pos: usize) -> usize {
        let mut pos = pos.min(self.text.len());
        while !self.text.is_char_boundary(pos) {
            pos -= 1;
        }
        pos
    }

    fn prompt_tail(&self) -> &str {
        self.prompt.rsplit('\n').next().unwrap_or("")
    }

    /// Terminal column of the cursor on the last prompt row.
    fn cursor_column(&self) -> usize {
        visible_width(self.prompt_tail()) + self.text[..self.cursor].width()
    }

    fn queue_text(&self, mut out: &mut dyn Write) -> io::Result<()> {
        let mut pos = 0;
        for (range, color) in &self.colors {
            if range.start < pos || range.end > self.text.len() || range.start >= range.end {
                continue;
            }
            queue!(&mut out, Print(&self.text[pos..range.start]))?;
            queue!(&mut out, SetForegroundColor(*color), Print(&self.text[range.clone()]), ResetColor)?;
            pos = range.end;
        }
        queue!(&mut out, Print(&self.text[pos..]))
    }
}

impl LineBuffer for TextBuffer {
    fn text(&self) -> &str {
        &self.text
    }

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn set_cursor(&mut self, pos: usize) -> usize {
        let pos = self.floor_boundary(pos);
        if pos != self.cursor {
            self.cursor = pos;
            self.need_draw = true;
        }
        self.cursor
    }

    fn insert(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let pos = self.cursor;
        self.text.insert_str(pos, text);
        self.cursor += text.len();
        self.need_draw = true;
        self.record(UndoOp::Insert { pos, text: text.to_string() });
        true
    }

    fn remove(&mut self, from: usize, to: usize) -> bool {
        let from = self.floor_boundary(from);
        let to = self.floor_boundary(to);
        if from >= to {
            return false;
        }
        let removed: String = self.text.drain(from..to).collect();
        if self.cursor >= to {
            self.cursor -= to - from;
        } else if self.cursor > from {
            self.cursor = from;
        }
        self.need_draw = true;
        self.record(UndoOp::Remove { pos: from, text: removed });
        true
    }

    fn begin_undo_group(&mut self) {
        if self.group_depth == 0 {
            self.undo_stack.push(Vec::new());
        }
        self.group_depth += 1;
    }

    fn end_undo_group(&mut self) {
        self.group_depth = self.group_depth.saturating_sub(1);
        if self.group_depth == 0 && self.undo_stack.last().map_or(false, Vec::is_empty) {
            self.undo_stack.pop();
        }
    }

    fn undo(&mut self) -> bool {
        let group = match self.undo_stack.pop() {
            Some(group) => group,
            None => return false,
        };
        for op in group.into_iter().rev() {
            match op {
                UndoOp::Insert { pos, text } => {
                    self.text.replace_range(pos..pos + text.len(), "");
                    self.cursor = pos;
                }
                UndoOp::Remove { pos, text } => {
                    self.text.insert_str(pos, &text);
                    self.cursor = pos + text.len();
                }
            }
        }
        self.need_draw = true;
        true
    }

    fn begin_line(&mut self, prompt: &str, initial: &str) {
        self.text = initial.to_string();
        self.cursor = self.text.len();
        self.prompt = prompt.to_string();
        self.prompt_drawn = false;
        self.need_draw = true;
        self.colors.clear();
        self.undo_stack.clear();
        self.group_depth = 0;
    }

    fn end_line(&mut self, transient: Option<&str>, mut out: &mut dyn Write) -> io::Result<()> {
        if let Some(transient) = transient {
            let rows = self.prompt.matches('\n').count() as u16;
            queue!(&mut out, MoveToColumn(0))?;
            if rows > 0 {
                queue!(&mut out, MoveUp(rows))?;
            }
            queue!(&mut out, Clear(ClearType::FromCursorDown), Print(transient))?;
            self.queue_text(&mut *out)?;
        }
        queue!(&mut out, Print("\r\n"))?;
        out.flush()
    }

    fn set_colors(&mut self, spans: Vec<(Range<usize>, Color)>) {
        if spans != self.colors {
            self.colors = spans;
            self.need_draw = true;
        }
    }

    fn set_need_draw(&mut self) {
        self.need_draw = true;
    }

    fn reprompt(&mut self) {
        self.prompt_drawn = false;
        self.need_draw = true;
    }

    fn draw(&mut self, mut out: &mut dyn Write) -> io::Result<()> {
        if !self.need_draw {
            return Ok(());
        }
        queue!(&mut out, MoveToColumn(0))?;
        if self.prompt_drawn {
            queue!(&mut out, Print(self.prompt_tail()))?;
        } else {
            queue!(&mut out, Print(self.prompt.replace('\n', "\r\n")))?;
            self.prompt_drawn = true;
        }
        self.queue_text(&mut *out)?;
        let column = self.cursor_column();
        queue!(&mut out, Clear(ClearType::UntilNewLine), MoveToColumn(column.min(u16::MAX as usize) as u16))?;
        self.need_draw = false;
        out.flush()
    }
}

/// Start of the word before `pos`: skip whitespace, then word characters.
pub fn word_left(text: &str, pos: usize) -> usize {
    let before = &text[..pos];
    let trimmed = before.trim_end();
    match trimmed.rfind(char::is_whitespace) {
        Some(i) => i + trimmed[i..].chars().next().map_or(1, char::len_utf8),
        None => 0,
    }
}

/// End of the word after `pos`: skip whitespace, then word characters.
pub fn word_right(text: &str, pos: usize) -> usize {
    let after = &text[pos..];
    let skipped = after.len() - after.trim_start().len();
    let rest = &after[skipped..];
    pos + skipped + rest.find(char::is_whitespace).unwrap_or(rest.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(text: &str) -> TextBuffer {
        let mut buffer = TextBuffer::new();
        buffer.begin_line("> ", text);
        buffer
    }

    #[test]
    fn test_insert_and_remove() {
        let mut buf = buffer("");
        buf.insert("hello");
        buf.set_cursor(0);
        buf.insert("oh ");
        assert_eq!(buf.text(), "oh hello");
        assert_eq!(buf.cursor(), 3);

        buf.remove(0, 3);
        assert_eq!(buf.text(), "hello");
        assert_eq!(buf.cursor(), 0);
    }

    #[test]
    fn test_cursor_clamps_to_char_boundary() {
        let mut buf = buffer("añb");
        assert_eq!(buf.set_cursor(2), 1);
        assert_eq!(buf.set_cursor(99), 4);
    }

    #[test]
    fn test_undo_groups() {
        let mut buf = buffer("");
        buf.insert("a");
        buf.begin_undo_group();
        buf.insert("b");
        buf.insert("c");
        buf.end_undo_group();
        assert_eq!(buf.text(), "abc");

        assert!(buf.undo());
        assert_eq!(buf.text(), "a");
        assert!(buf.undo());
        assert_eq!(buf.text(), "");
        assert!(!buf.undo());
    }

    #[test]
    fn test_replace_all_is_one_undo_step() {
        let mut buf = buffer("dir");
        buf.replace_all("echo hi");
        assert_eq!(buf.text(), "echo hi");
        assert_eq!(buf.cursor(), 7);
        buf.undo();
        assert_eq!(buf.text(), "dir");
    }

    #[test]
    fn test_draw_only_when_needed() {
        let mut buf = buffer("ls");
        let mut out = Vec::new();
        buf.draw(&mut out).unwrap();
        assert!(String::from_utf8_lossy(&out).contains("> ls"));

        let mut again = Vec::new();
        buf.draw(&mut again).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn test_cursor_column_counts_wide_characters() {
        let mut buf = buffer("日本x");
        assert_eq!(buf.cursor_column(), 2 + 5);
        buf.set_cursor(3);
        assert_eq!(buf.cursor_column(), 2 + 2);
    }

    #[test]
    fn test_word_motion() {
        let text = "git  commit -m";
        assert_eq!(word_left(text, text.len()), 12);
        assert_eq!(word_left(text, 12), 5);
        assert_eq!(word_left(text, 3), 0);
        assert_eq!(word_right(text, 0), 3);
        assert_eq!(word_right(text, 3), 11);
    }
}
