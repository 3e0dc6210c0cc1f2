//! Edit Context
//!
//! State shared by command handlers during one edit: the buffer and output,
//! the match engine and its generators, history navigation, and the popup,
//! pager and menu-completion state.

use crate::cli::commands::EditCommand;
use crate::cli::editor::LineBuffer;
use crate::cli::history::HistoryCursor;
use crate::cli::utils::{format_columns, is_path_separator, needs_quoting};
use crate::matches::engine::MatchEngine;
use crate::matches::generator::MatchGenerator;
use crate::matches::matches::{MatchEntry, MatchKind};
use bitflags::bitflags;
use crossterm::cursor::{MoveToNextLine, RestorePosition, SavePosition};
use crossterm::queue;
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal::{Clear, ClearType};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::warn;

bitflags! {
    /// Per-edit state bits.
    pub struct EditFlags: u8 {
        const INIT = 1 << 0;
        const EDITING = 1 << 1;
        const GENERATE = 1 << 2;
        const RESTRICT = 1 << 3;
        const SELECT = 1 << 4;
        const SORT = 1 << 5;
        const DONE = 1 << 6;
        const EOF = 1 << 7;
    }
}

/// What a command handler asks the session to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    Handled,
    /// Accept the line.
    Done,
    /// End input.
    Eof,
    /// Ring the bell.
    Ding,
    /// Enter the select-complete popup.
    PushPopup,
    /// Enter the pager.
    PushPager,
    /// List the key bindings.
    ShowHelp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupKind {
    Completion,
    Directories,
}

/// Items listed under the line, one of them selected.
#[derive(Debug, Clone)]
pub struct Popup {
    pub kind: PopupKind,
    pub items: Vec<MatchEntry>,
    pub index: usize,
    /// Byte range of the text the selection replaces.
    pub start: usize,
    pub end: usize,
}

impl Popup {
    pub fn selected(&self) -> Option<&MatchEntry> {
        self.items.get(self.index)
    }

    pub fn next(&mut self) {
        if !self.items.is_empty() {
            self.index = (self.index + 1) % self.items.len();
        }
    }

    pub fn previous(&mut self) {
        if !self.items.is_empty() {
            self.index = (self.index + self.items.len() - 1) % self.items.len();
        }
    }

    fn draw(&self, mut out: &mut dyn Write, max_rows: usize) -> io::Result<()> {
        let first = self.index.saturating_sub(max_rows.saturating_sub(1));
        queue!(&mut out, SavePosition)?;
        for (i, item) in self.items.iter().enumerate().skip(first).take(max_rows) {
            queue!(&mut out, MoveToNextLine(1), Clear(ClearType::CurrentLine))?;
            if i == self.index {
                queue!(&mut out, SetAttribute(Attribute::Reverse), Print(&item.text), SetAttribute(Attribute::Reset))?;
            } else {
                queue!(&mut out, Print(&item.text))?;
            }
        }
        queue!(&mut out, RestorePosition)?;
        out.flush()
    }
}

/// Output shown a page at a time.
#[derive(Debug, Clone)]
pub struct Pager {
    lines: Vec<String>,
    pos: usize,
}

impl Pager {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines, pos: 0 }
    }

    pub fn is_finished(&self) -> bool {
        self.pos >= self.lines.len()
    }

    /// Take up to `count` further lines.
    pub fn advance(&mut self, count: usize) -> &[String] {
        let start = self.pos;
        self.pos = (self.pos + count).min(self.lines.len());
        &self.lines[start..self.pos]
    }
}

/// Menu completion in progress: the candidates captured when it started and
/// the buffer range the current candidate occupies.
#[derive(Debug, Clone)]
pub struct Menu {
    pub candidates: Vec<MatchEntry>,
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

const MORE_PROMPT: &str = "-- More --";

pub struct EditContext<'a> {
    pub buffer: &'a mut dyn LineBuffer,
    pub out: &'a mut dyn Write,
    pub engine: MatchEngine,
    pub generators: Vec<&'a dyn MatchGenerator>,
    pub flags: EditFlags,
    pub history: HistoryCursor,
    pub kill_ring: String,
    pub dir_history: Vec<PathBuf>,
    pub popup: Option<Popup>,
    pub pager: Option<Pager>,
    pub menu: Option<Menu>,
    pub last_command: Option<EditCommand>,
    /// History entry to edit next, set by operate-and-get-next.
    pub operate_next: Option<usize>,
    pub rows: usize,
    pub columns: usize,
}

impl<'a> EditContext<'a> {
    pub fn new(buffer: &'a mut dyn LineBuffer, out: &'a mut dyn Write, engine: MatchEngine) -> Self {
        let (columns, rows) = crossterm::terminal::size()
            .map(|(c, r)| (c as usize, r as usize))
            .unwrap_or((80, 24));
        Self {
            buffer,
            out,
            engine,
            generators: Vec::new(),
            flags: EditFlags::INIT,
            history: HistoryCursor::default(),
            kill_ring: String::new(),
            dir_history: Vec::new(),
            popup: None,
            pager: None,
            menu: None,
            last_command: None,
            operate_next: None,
            rows: rows.max(2),
            columns: columns.max(1),
        }
    }

    fn report(result: io::Result<()>) {
        if let Err(e) = result {
            warn!(error = %e, "terminal write failed");
        }
    }

    pub fn ding(&mut self) {
        let out = &mut *self.out;
        Self::report(out.write_all(b"\x07").and_then(|_| out.flush()));
    }

    pub fn draw(&mut self) {
        Self::report(self.buffer.draw(&mut *self.out));
    }

    /// Print lines below the input line; the prompt is redrawn afterwards.
    pub fn print_lines(&mut self, lines: &[String]) {
        let mut text = String::from("\r\n");
        for line in lines {
            text.push_str(line);
            text.push_str("\r\n");
        }
        let out = &mut *self.out;
        Self::report(out.write_all(text.as_bytes()).and_then(|_| out.flush()));
        self.buffer.reprompt();
    }

    /// Page `lines` through the pager. Returns true when more than a screen
    /// is left to show.
    pub fn page(&mut self, lines: Vec<String>) -> bool {
        let mut pager = Pager::new(lines);
        let first = pager.advance(self.rows - 1).to_vec();
        if pager.is_finished() {
            self.print_lines(&first);
            return false;
        }
        let mut text = String::from("\r\n");
        for line in &first {
            text.push_str(line);
            text.push_str("\r\n");
        }
        text.push_str(MORE_PROMPT);
        let out = &mut *self.out;
        Self::report(out.write_all(text.as_bytes()).and_then(|_| out.flush()));
        self.pager = Some(pager);
        true
    }

    /// Show `count` more pager lines; closes the pager at the end.
    pub fn pager_advance(&mut self, count: usize) {
        let Some(pager) = self.pager.as_mut() else {
            return;
        };
        let lines = pager.advance(count).to_vec();
        let finished = pager.is_finished();

        let mut text = String::from("\r");
        for line in &lines {
            text.push_str(&format!("{:width$}\r\n", line, width = MORE_PROMPT.len()));
        }
        if !finished {
            text.push_str(MORE_PROMPT);
        }
        let out = &mut *self.out;
        Self::report(out.write_all(text.as_bytes()).and_then(|_| out.flush()));
        if finished {
            self.pager_quit();
        }
    }

    pub fn pager_quit(&mut self) {
        if self.pager.take().is_some() {
            let mut out = &mut *self.out;
            Self::report(queue!(&mut out, Print("\r"), Clear(ClearType::CurrentLine)).and_then(|_| out.flush()));
            self.buffer.reprompt();
        }
    }

    pub fn draw_popup(&mut self) {
        if let Some(popup) = &self.popup {
            let rows = (self.rows / 2).max(1);
            Self::report(popup.draw(&mut *self.out, rows));
        }
    }

    pub fn close_popup(&mut self) {
        if self.popup.take().is_some() {
            let mut out = &mut *self.out;
            let cleared = queue!(&mut out, SavePosition, MoveToNextLine(1), Clear(ClearType::FromCursorDown), RestorePosition);
            Self::report(cleared.and_then(|_| out.flush()));
        }
    }

    /// Check the match cache against the buffer and flag what is stale.
    pub fn update_internal(&mut self, block_generate: bool) {
        let check = self.engine.update(
            self.buffer.text(),
            self.buffer.cursor(),
            &self.generators,
            block_generate,
        );
        if check.generate {
            self.flags.insert(EditFlags::GENERATE);
        }
        if check.select {
            self.flags.insert(EditFlags::SELECT);
        }
    }

    /// Bring the match set up to date: generate, restrict, select and sort
    /// as flagged. Returns whether anything changed.
    pub fn update_matches(&mut self) -> bool {
        let pending = self.flags & (EditFlags::GENERATE | EditFlags::RESTRICT | EditFlags::SELECT | EditFlags::SORT);
        self.flags.remove(pending);

        if pending.contains(EditFlags::GENERATE) {
            self.engine.generate(self.buffer.text(), self.buffer.cursor(), &self.generators);
        }
        if pending.contains(EditFlags::RESTRICT) {
            let pattern = format!("{}*", glob::Pattern::escape(self.engine.needle()));
            if let Err(e) = self.engine.restrict(&pattern) {
                warn!(error = %e, "cannot restrict matches");
            }
        }
        if pending.intersects(EditFlags::SELECT | EditFlags::SORT | EditFlags::GENERATE) {
            self.engine.select();
        }
        if pending.contains(EditFlags::SORT) {
            self.engine.sort();
        }
        !pending.is_empty()
    }

    /// Selected matches after bringing the set up to date, sorted.
    pub fn current_matches(&mut self) -> Vec<MatchEntry> {
        self.flags.insert(EditFlags::SORT);
        self.update_matches();
        self.engine.matches().selected().cloned().collect()
    }

    /// Replace `start..end` with `text` as one undoable step.
    pub fn replace_range(&mut self, start: usize, end: usize, text: &str) {
        self.buffer.begin_undo_group();
        self.buffer.remove(start, end);
        self.buffer.set_cursor(start);
        self.buffer.insert(text);
        self.buffer.end_undo_group();
    }

    fn in_open_quote(&self, pos: usize) -> bool {
        let before = self.buffer.text().get(..pos).unwrap_or("");
        before.matches('"').count() % 2 == 1
    }

    /// Text that replaces `start..end` for `entry`. A complete insertion
    /// closes quotes and adds the append character.
    pub fn completion_text(&self, entry: &MatchEntry, start: usize, complete: bool) -> String {
        let quoted = self.in_open_quote(start);
        let existing = self.buffer.text().get(start..).unwrap_or("");
        let mut text = String::new();
        let opens = !quoted && !existing.starts_with('"') && needs_quoting(&entry.text);
        if opens {
            text.push('"');
        }
        text.push_str(&entry.text);
        if !complete {
            return text;
        }
        match (entry.kind, entry.append_char) {
            (MatchKind::Dir, Some(c)) if !entry.text.ends_with(is_path_separator) => text.push(c),
            (MatchKind::Dir, _) => {}
            (_, append) => {
                if opens || quoted || existing.starts_with('"') {
                    text.push('"');
                }
                if let Some(c) = append {
                    text.push(c);
                }
            }
        }
        text
    }

    /// Insert `entry` over the word being completed.
    pub fn insert_match(&mut self, entry: &MatchEntry, start: usize, end: usize, complete: bool) {
        let text = self.completion_text(entry, start, complete);
        self.replace_range(start, end, &text);
    }

    /// Format matches into screen-wide columns.
    pub fn match_columns(&self, entries: &[MatchEntry]) -> Vec<String> {
        let items: Vec<String> = entries.iter().map(|e| e.text.clone()).collect();
        format_columns(&items, self.columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::editor::TextBuffer;
    use crate::matches::matches::MatchFolding;

    #[test]
    fn test_popup_wraps() {
        let mut popup = Popup {
            kind: PopupKind::Completion,
            items: vec![MatchEntry::new("a", MatchKind::Word), MatchEntry::new("b", MatchKind::Word)],
            index: 0,
            start: 0,
            end: 0,
        };
        popup.previous();
        assert_eq!(popup.index, 1);
        popup.next();
        assert_eq!(popup.selected().map(|e| e.text.as_str()), Some("a"));
    }

    #[test]
    fn test_pager_advances() {
        let mut pager = Pager::new((0..5).map(|i| i.to_string()).collect());
        assert_eq!(pager.advance(3).len(), 3);
        assert!(!pager.is_finished());
        assert_eq!(pager.advance(3), &["3".to_string(), "4".to_string()]);
        assert!(pager.is_finished());
    }

    #[test]
    fn test_completion_text_quotes() {
        let mut buffer = TextBuffer::new();
        buffer.begin_line("> ", "type Pro");
        let mut out = Vec::new();
        let ctx = EditContext::new(&mut buffer, &mut out, MatchEngine::new(MatchFolding::Caseless));

        let file = MatchEntry::new("Program Files", MatchKind::File);
        assert_eq!(ctx.completion_text(&file, 5, true), "\"Program Files\" ");
        assert_eq!(ctx.completion_text(&file, 5, false), "\"Program Files");

        let dir = MatchEntry::new("src", MatchKind::Dir);
        assert_eq!(ctx.completion_text(&dir, 5, true), format!("src{}", std::path::MAIN_SEPARATOR));
    }

    #[test]
    fn test_completion_text_inside_quotes() {
        let mut buffer = TextBuffer::new();
        buffer.begin_line("> ", "type \"My Documents\\no");
        let mut out = Vec::new();
        let ctx = EditContext::new(&mut buffer, &mut out, MatchEngine::new(MatchFolding::Caseless));

        let file = MatchEntry::new("notes.txt", MatchKind::File);
        assert_eq!(ctx.completion_text(&file, 19, true), "notes.txt\" ");
    }

    #[test]
    fn test_page_short_output_prints_directly() {
        let mut buffer = TextBuffer::new();
        buffer.begin_line("> ", "");
        let mut out = Vec::new();
        let mut ctx = EditContext::new(&mut buffer, &mut out, MatchEngine::new(MatchFolding::Caseless));
        ctx.rows = 10;
        assert!(!ctx.page(vec!["one".into(), "two".into()]));
        assert!(ctx.pager.is_none());

        assert!(ctx.page((0..20).map(|i| i.to_string()).collect()));
        ctx.pager_advance(100);
        assert!(ctx.pager.is_none());
        drop(ctx);
        assert!(String::from_utf8_lossy(&out).ends_with("\r\x1b[2K"));
    }
}
