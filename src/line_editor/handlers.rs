//! Command Handlers
//!
//! Registry mapping every [`EditCommand`] to the function that performs it.

use crate::cli::commands::{CommandCategory, EditCommand};
use crate::line_editor::context::{CommandResult, EditContext, EditFlags, Menu, Popup, PopupKind};
use crate::matches::matches::{MatchEntry, MatchKind};
use crate::cli::editor::{word_left, word_right};
use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use std::io::Write;
use std::sync::OnceLock;
use tracing::warn;

pub type Handler = fn(&mut EditContext<'_>) -> CommandResult;

/// A command together with how it is described and performed.
#[derive(Clone, Copy)]
pub struct CommandEntry {
    pub command: EditCommand,
    pub name: &'static str,
    pub category: CommandCategory,
    pub description: &'static str,
    pub handler: Handler,
}

/// All commands, indexed by their discriminant.
pub fn registry() -> &'static [CommandEntry] {
    static REGISTRY: OnceLock<Vec<CommandEntry>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        EditCommand::all_commands()
            .into_iter()
            .map(|command| CommandEntry {
                command,
                name: command.name(),
                category: command.category(),
                description: command.description(),
                handler: handler_for(command),
            })
            .collect()
    })
}

pub fn lookup(command: EditCommand) -> &'static CommandEntry {
    let entry = &registry()[command as usize];
    assert_eq!(entry.command, command, "command registry out of order");
    entry
}

fn handler_for(command: EditCommand) -> Handler {
    use EditCommand::*;
    match command {
        AcceptLine => accept_line,
        Abort => abort,
        CancelLine => cancel_line,
        Undo => undo,
        ResetLine => reset_line,
        BackwardChar => backward_char,
        ForwardChar => forward_char,
        BackwardWord => backward_word,
        ForwardWord => forward_word,
        BeginningOfLine => beginning_of_line,
        EndOfLine => end_of_line,
        BackwardDeleteChar => backward_delete_char,
        DeleteChar => delete_char,
        KillLine => kill_line,
        BackwardKillLine => backward_kill_line,
        KillWholeLine => kill_whole_line,
        KillWord => kill_word,
        BackwardKillWord => backward_kill_word,
        Yank => yank,
        PreviousHistory => previous_history,
        NextHistory => next_history,
        BeginningOfHistory => beginning_of_history,
        EndOfHistory => end_of_history,
        HistorySearchBackward => history_search_backward,
        HistorySearchForward => history_search_forward,
        OperateAndGetNext => operate_and_get_next,
        Complete => complete,
        PossibleCompletions => possible_completions,
        MenuComplete => menu_complete,
        MenuCompleteBackward => menu_complete_backward,
        SelectComplete => select_complete,
        PopupDirectories => popup_directories,
        PopupNext => popup_next,
        PopupPrevious => popup_previous,
        PopupAccept => popup_accept,
        PopupCancel => popup_cancel,
        PagerNextPage => pager_next_page,
        PagerNextLine => pager_next_line,
        PagerQuit => pager_quit,
        UpDirectory => up_directory,
        InsertDotDot => insert_dot_dot,
        ShowHelp => show_help,
        ClearScreen => clear_screen,
    }
}

fn prev_boundary(text: &str, pos: usize) -> Option<usize> {
    text[..pos].chars().next_back().map(|c| pos - c.len_utf8())
}

fn next_boundary(text: &str, pos: usize) -> Option<usize> {
    text[pos..].chars().next().map(|c| pos + c.len_utf8())
}

fn kill(ctx: &mut EditContext<'_>, from: usize, to: usize) -> CommandResult {
    if from >= to {
        return CommandResult::Ding;
    }
    ctx.kill_ring = ctx.buffer.text()[from..to].to_string();
    ctx.buffer.remove(from, to);
    ctx.buffer.set_cursor(from);
    CommandResult::Handled
}

fn accept_line(ctx: &mut EditContext<'_>) -> CommandResult {
    ctx.flags.insert(EditFlags::DONE);
    CommandResult::Done
}

fn abort(ctx: &mut EditContext<'_>) -> CommandResult {
    ctx.menu = None;
    CommandResult::Ding
}

fn cancel_line(ctx: &mut EditContext<'_>) -> CommandResult {
    let end = ctx.buffer.text().len();
    ctx.buffer.set_cursor(end);
    ctx.buffer.set_need_draw();
    ctx.draw();
    if let Err(e) = ctx.out.write_all(b"^C") {
        warn!(error = %e, "terminal write failed");
    }
    ctx.buffer.replace_all("");
    ctx.flags.insert(EditFlags::DONE);
    CommandResult::Done
}

fn undo(ctx: &mut EditContext<'_>) -> CommandResult {
    if ctx.buffer.undo() {
        CommandResult::Handled
    } else {
        CommandResult::Ding
    }
}

fn reset_line(ctx: &mut EditContext<'_>) -> CommandResult {
    if ctx.buffer.text().is_empty() {
        return CommandResult::Handled;
    }
    ctx.buffer.replace_all("");
    CommandResult::Handled
}

fn backward_char(ctx: &mut EditContext<'_>) -> CommandResult {
    match prev_boundary(ctx.buffer.text(), ctx.buffer.cursor()) {
        Some(pos) => {
            ctx.buffer.set_cursor(pos);
            CommandResult::Handled
        }
        None => CommandResult::Ding,
    }
}

fn forward_char(ctx: &mut EditContext<'_>) -> CommandResult {
    match next_boundary(ctx.buffer.text(), ctx.buffer.cursor()) {
        Some(pos) => {
            ctx.buffer.set_cursor(pos);
            CommandResult::Handled
        }
        None => CommandResult::Ding,
    }
}

fn backward_word(ctx: &mut EditContext<'_>) -> CommandResult {
    let pos = word_left(ctx.buffer.text(), ctx.buffer.cursor());
    ctx.buffer.set_cursor(pos);
    CommandResult::Handled
}

fn forward_word(ctx: &mut EditContext<'_>) -> CommandResult {
    let pos = word_right(ctx.buffer.text(), ctx.buffer.cursor());
    ctx.buffer.set_cursor(pos);
    CommandResult::Handled
}

fn beginning_of_line(ctx: &mut EditContext<'_>) -> CommandResult {
    ctx.buffer.set_cursor(0);
    CommandResult::Handled
}

fn end_of_line(ctx: &mut EditContext<'_>) -> CommandResult {
    let end = ctx.buffer.text().len();
    ctx.buffer.set_cursor(end);
    CommandResult::Handled
}

fn backward_delete_char(ctx: &mut EditContext<'_>) -> CommandResult {
    let cursor = ctx.buffer.cursor();
    match prev_boundary(ctx.buffer.text(), cursor) {
        Some(pos) => {
            ctx.buffer.remove(pos, cursor);
            ctx.buffer.set_cursor(pos);
            CommandResult::Handled
        }
        None => CommandResult::Ding,
    }
}

fn delete_char(ctx: &mut EditContext<'_>) -> CommandResult {
    if ctx.buffer.text().is_empty() {
        ctx.flags.insert(EditFlags::EOF);
        return CommandResult::Eof;
    }
    let cursor = ctx.buffer.cursor();
    match next_boundary(ctx.buffer.text(), cursor) {
        Some(pos) => {
            ctx.buffer.remove(cursor, pos);
            CommandResult::Handled
        }
        None => CommandResult::Ding,
    }
}

fn kill_line(ctx: &mut EditContext<'_>) -> CommandResult {
    let (cursor, end) = (ctx.buffer.cursor(), ctx.buffer.text().len());
    kill(ctx, cursor, end)
}

fn backward_kill_line(ctx: &mut EditContext<'_>) -> CommandResult {
    let cursor = ctx.buffer.cursor();
    kill(ctx, 0, cursor)
}

fn kill_whole_line(ctx: &mut EditContext<'_>) -> CommandResult {
    let end = ctx.buffer.text().len();
    kill(ctx, 0, end)
}

fn kill_word(ctx: &mut EditContext<'_>) -> CommandResult {
    let cursor = ctx.buffer.cursor();
    let end = word_right(ctx.buffer.text(), cursor);
    kill(ctx, cursor, end)
}

fn backward_kill_word(ctx: &mut EditContext<'_>) -> CommandResult {
    let cursor = ctx.buffer.cursor();
    let start = word_left(ctx.buffer.text(), cursor);
    kill(ctx, start, cursor)
}

fn yank(ctx: &mut EditContext<'_>) -> CommandResult {
    if ctx.kill_ring.is_empty() {
        return CommandResult::Ding;
    }
    let text = ctx.kill_ring.clone();
    ctx.buffer.insert(&text);
    CommandResult::Handled
}

/// Replace the line with a history entry, or ding when there is none.
fn show_history(ctx: &mut EditContext<'_>, entry: Option<String>, cursor: Option<usize>) -> CommandResult {
    match entry {
        Some(line) => {
            ctx.buffer.replace_all(&line);
            if let Some(pos) = cursor {
                ctx.buffer.set_cursor(pos);
            }
            CommandResult::Handled
        }
        None => CommandResult::Ding,
    }
}

fn previous_history(ctx: &mut EditContext<'_>) -> CommandResult {
    ctx.history.store_current_line(ctx.buffer.text());
    let entry = ctx.history.previous().map(str::to_string);
    show_history(ctx, entry, None)
}

fn next_history(ctx: &mut EditContext<'_>) -> CommandResult {
    let entry = ctx.history.next().map(str::to_string);
    show_history(ctx, entry, None)
}

fn beginning_of_history(ctx: &mut EditContext<'_>) -> CommandResult {
    ctx.history.store_current_line(ctx.buffer.text());
    let entry = ctx.history.first().map(str::to_string);
    show_history(ctx, entry, None)
}

fn end_of_history(ctx: &mut EditContext<'_>) -> CommandResult {
    let entry = ctx.history.last().to_string();
    show_history(ctx, Some(entry), None)
}

fn history_search_backward(ctx: &mut EditContext<'_>) -> CommandResult {
    let cursor = ctx.buffer.cursor();
    let prefix = ctx.buffer.text()[..cursor].to_string();
    ctx.history.store_current_line(ctx.buffer.text());
    let entry = ctx.history.search_backward(&prefix).map(str::to_string);
    show_history(ctx, entry, Some(cursor))
}

fn history_search_forward(ctx: &mut EditContext<'_>) -> CommandResult {
    let cursor = ctx.buffer.cursor();
    let prefix = ctx.buffer.text()[..cursor].to_string();
    let entry = ctx.history.search_forward(&prefix).map(str::to_string);
    show_history(ctx, entry, Some(cursor))
}

fn operate_and_get_next(ctx: &mut EditContext<'_>) -> CommandResult {
    ctx.operate_next = ctx.history.current_index().map(|i| i + 1);
    ctx.flags.insert(EditFlags::DONE);
    CommandResult::Done
}

fn complete(ctx: &mut EditContext<'_>) -> CommandResult {
    let matches = ctx.current_matches();
    let (start, cursor) = (ctx.engine.word_offset(), ctx.buffer.cursor());
    match matches.len() {
        0 => CommandResult::Ding,
        1 => {
            ctx.insert_match(&matches[0], start, cursor, true);
            CommandResult::Handled
        }
        _ => {
            let folding = ctx.engine.folding();
            let prefix = ctx.engine.matches().common_prefix(folding).unwrap_or_default();
            if prefix.chars().count() > ctx.engine.needle().chars().count() {
                let entry = MatchEntry::new(prefix, MatchKind::Word);
                ctx.insert_match(&entry, start, cursor, false);
                CommandResult::Handled
            } else {
                list_matches(ctx, &matches)
            }
        }
    }
}

fn list_matches(ctx: &mut EditContext<'_>, matches: &[MatchEntry]) -> CommandResult {
    let lines = ctx.match_columns(matches);
    if ctx.page(lines) {
        CommandResult::PushPager
    } else {
        CommandResult::Handled
    }
}

fn possible_completions(ctx: &mut EditContext<'_>) -> CommandResult {
    let matches = ctx.current_matches();
    if matches.is_empty() {
        return CommandResult::Ding;
    }
    list_matches(ctx, &matches)
}

fn cycle_menu(ctx: &mut EditContext<'_>, forward: bool) -> CommandResult {
    let continuing = matches!(
        ctx.last_command,
        Some(EditCommand::MenuComplete | EditCommand::MenuCompleteBackward)
    );
    let mut menu = match ctx.menu.take() {
        Some(mut menu) if continuing => {
            let len = menu.candidates.len();
            menu.index = if forward { (menu.index + 1) % len } else { (menu.index + len - 1) % len };
            menu
        }
        _ => {
            let candidates = ctx.current_matches();
            if candidates.is_empty() {
                return CommandResult::Ding;
            }
            let index = if forward { 0 } else { candidates.len() - 1 };
            Menu {
                index,
                start: ctx.engine.word_offset(),
                end: ctx.buffer.cursor(),
                candidates,
            }
        }
    };

    let only = menu.candidates.len() == 1;
    let text = ctx.completion_text(&menu.candidates[menu.index], menu.start, only);
    ctx.replace_range(menu.start, menu.end, &text);
    menu.end = menu.start + text.len();
    if !only {
        ctx.menu = Some(menu);
    }
    CommandResult::Handled
}

fn menu_complete(ctx: &mut EditContext<'_>) -> CommandResult {
    cycle_menu(ctx, true)
}

fn menu_complete_backward(ctx: &mut EditContext<'_>) -> CommandResult {
    cycle_menu(ctx, false)
}

fn select_complete(ctx: &mut EditContext<'_>) -> CommandResult {
    let matches = ctx.current_matches();
    let (start, cursor) = (ctx.engine.word_offset(), ctx.buffer.cursor());
    match matches.len() {
        0 => CommandResult::Ding,
        1 => {
            ctx.insert_match(&matches[0], start, cursor, true);
            CommandResult::Handled
        }
        _ => {
            ctx.popup = Some(Popup {
                kind: PopupKind::Completion,
                items: matches,
                index: 0,
                start,
                end: cursor,
            });
            CommandResult::PushPopup
        }
    }
}

fn popup_directories(ctx: &mut EditContext<'_>) -> CommandResult {
    if ctx.dir_history.is_empty() {
        return CommandResult::Ding;
    }
    let items = ctx
        .dir_history
        .iter()
        .rev()
        .map(|dir| MatchEntry::new(dir.to_string_lossy(), MatchKind::Dir))
        .collect();
    ctx.popup = Some(Popup {
        kind: PopupKind::Directories,
        items,
        index: 0,
        start: 0,
        end: ctx.buffer.text().len(),
    });
    CommandResult::PushPopup
}

fn popup_next(ctx: &mut EditContext<'_>) -> CommandResult {
    match ctx.popup.as_mut() {
        Some(popup) => {
            popup.next();
            CommandResult::Handled
        }
        None => CommandResult::Ding,
    }
}

fn popup_previous(ctx: &mut EditContext<'_>) -> CommandResult {
    match ctx.popup.as_mut() {
        Some(popup) => {
            popup.previous();
            CommandResult::Handled
        }
        None => CommandResult::Ding,
    }
}

fn popup_accept(ctx: &mut EditContext<'_>) -> CommandResult {
    let Some(popup) = ctx.popup.clone() else {
        return CommandResult::Ding;
    };
    ctx.close_popup();
    let Some(selected) = popup.selected() else {
        return CommandResult::Ding;
    };
    match popup.kind {
        PopupKind::Completion => {
            ctx.insert_match(selected, popup.start, popup.end, true);
            CommandResult::Handled
        }
        PopupKind::Directories => {
            ctx.buffer.replace_all(&format!("cd /d \"{}\"", selected.text));
            ctx.flags.insert(EditFlags::DONE);
            CommandResult::Done
        }
    }
}

fn popup_cancel(ctx: &mut EditContext<'_>) -> CommandResult {
    ctx.close_popup();
    CommandResult::Handled
}

fn pager_next_page(ctx: &mut EditContext<'_>) -> CommandResult {
    let page = ctx.rows - 1;
    ctx.pager_advance(page);
    CommandResult::Handled
}

fn pager_next_line(ctx: &mut EditContext<'_>) -> CommandResult {
    ctx.pager_advance(1);
    CommandResult::Handled
}

fn pager_quit(ctx: &mut EditContext<'_>) -> CommandResult {
    ctx.pager_quit();
    CommandResult::Handled
}

fn up_directory(ctx: &mut EditContext<'_>) -> CommandResult {
    ctx.buffer.replace_all(" cd /d ..");
    ctx.flags.insert(EditFlags::DONE);
    CommandResult::Done
}

fn insert_dot_dot(ctx: &mut EditContext<'_>) -> CommandResult {
    ctx.buffer.insert("..\\");
    CommandResult::Handled
}

fn show_help(_ctx: &mut EditContext<'_>) -> CommandResult {
    CommandResult::ShowHelp
}

fn clear_screen(ctx: &mut EditContext<'_>) -> CommandResult {
    let mut out = &mut *ctx.out;
    let cleared = queue!(&mut out, Clear(ClearType::All), MoveTo(0, 0)).and_then(|_| out.flush());
    if let Err(e) = cleared {
        warn!(error = %e, "terminal write failed");
    }
    ctx.buffer.reprompt();
    CommandResult::Handled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::editor::{LineBuffer, TextBuffer};
    use crate::cli::history::HistoryCursor;
    use crate::matches::engine::MatchEngine;
    use crate::matches::generator::{MatchBuilder, MatchGenerator};
    use crate::matches::matches::MatchFolding;
    use crate::words::line_state::LineState;

    struct Fixed(Vec<&'static str>);

    impl MatchGenerator for Fixed {
        fn generate(&self, _line: &LineState<'_>, builder: &mut MatchBuilder<'_>) -> bool {
            for word in &self.0 {
                builder.add_match(*word, MatchKind::File);
            }
            false
        }
    }

    fn run(line: &str, command: EditCommand, generator: &Fixed) -> (String, CommandResult) {
        let mut buffer = TextBuffer::new();
        buffer.begin_line("> ", line);
        let mut out = Vec::new();
        let mut ctx = EditContext::new(&mut buffer, &mut out, MatchEngine::new(MatchFolding::Caseless));
        ctx.generators.push(generator);
        ctx.update_internal(false);
        let result = (lookup(command).handler)(&mut ctx);
        drop(ctx);
        (buffer.text().to_string(), result)
    }

    #[test]
    fn test_registry_is_complete() {
        let entries = registry();
        assert_eq!(entries.len(), EditCommand::all_commands().len());
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.command as usize, i);
            assert!(!entry.description.is_empty());
            assert_eq!(entry.name, entry.command.name());
        }
        assert_eq!(lookup(EditCommand::Yank).category, CommandCategory::KillAndYank);
    }

    #[test]
    fn test_complete_single_match() {
        let generator = Fixed(vec!["readme.txt", "src"]);
        let (text, result) = run("type re", EditCommand::Complete, &generator);
        assert_eq!(result, CommandResult::Handled);
        assert_eq!(text, "type readme.txt ");
    }

    #[test]
    fn test_complete_common_prefix() {
        let generator = Fixed(vec!["config.json", "config.toml", "other"]);
        let (text, _) = run("type c", EditCommand::Complete, &generator);
        assert_eq!(text, "type config.");
    }

    #[test]
    fn test_complete_without_matches_dings() {
        let generator = Fixed(vec!["alpha"]);
        let (text, result) = run("type z", EditCommand::Complete, &generator);
        assert_eq!(result, CommandResult::Ding);
        assert_eq!(text, "type z");
    }

    #[test]
    fn test_menu_complete_cycles() {
        let generator = Fixed(vec!["beta", "alpha"]);
        let mut buffer = TextBuffer::new();
        buffer.begin_line("> ", "type ");
        let mut out = Vec::new();
        let mut ctx = EditContext::new(&mut buffer, &mut out, MatchEngine::new(MatchFolding::Caseless));
        ctx.generators.push(&generator);
        ctx.update_internal(false);

        menu_complete(&mut ctx);
        assert_eq!(ctx.buffer.text(), "type alpha");
        ctx.last_command = Some(EditCommand::MenuComplete);
        menu_complete(&mut ctx);
        assert_eq!(ctx.buffer.text(), "type beta");
        menu_complete_backward(&mut ctx);
        assert_eq!(ctx.buffer.text(), "type alpha");
    }

    #[test]
    fn test_clear_screen_homes_cursor_and_reprompts() {
        let mut buffer = TextBuffer::new();
        buffer.begin_line("> ", "dir");
        let mut out = Vec::new();
        buffer.draw(&mut out).unwrap();
        out.clear();

        let mut ctx = EditContext::new(&mut buffer, &mut out, MatchEngine::new(MatchFolding::Caseless));
        assert_eq!(clear_screen(&mut ctx), CommandResult::Handled);
        drop(ctx);
        assert_eq!(out, b"\x1b[2J\x1b[1;1H");

        let mut redrawn = Vec::new();
        buffer.draw(&mut redrawn).unwrap();
        assert!(String::from_utf8_lossy(&redrawn).contains("> dir"));
    }

    #[test]
    fn test_kill_and_yank() {
        let mut buffer = TextBuffer::new();
        buffer.begin_line("> ", "echo hello world");
        let mut out = Vec::new();
        let mut ctx = EditContext::new(&mut buffer, &mut out, MatchEngine::new(MatchFolding::Exact));

        assert_eq!(backward_kill_word(&mut ctx), CommandResult::Handled);
        assert_eq!(ctx.buffer.text(), "echo hello ");
        assert_eq!(ctx.kill_ring, "world");
        beginning_of_line(&mut ctx);
        yank(&mut ctx);
        assert_eq!(ctx.buffer.text(), "worldecho hello ");
        assert_eq!(kill_line(&mut ctx), CommandResult::Handled);
        assert_eq!(ctx.buffer.text(), "world");
    }

    #[test]
    fn test_delete_char_on_empty_line_is_eof() {
        let mut buffer = TextBuffer::new();
        buffer.begin_line("> ", "");
        let mut out = Vec::new();
        let mut ctx = EditContext::new(&mut buffer, &mut out, MatchEngine::new(MatchFolding::Exact));
        assert_eq!(delete_char(&mut ctx), CommandResult::Eof);
        assert!(ctx.flags.contains(EditFlags::EOF));
    }

    #[test]
    fn test_history_search_keeps_cursor() {
        let mut buffer = TextBuffer::new();
        buffer.begin_line("> ", "git");
        let mut out = Vec::new();
        let mut ctx = EditContext::new(&mut buffer, &mut out, MatchEngine::new(MatchFolding::Exact));
        ctx.history = HistoryCursor::new(vec!["git status".into(), "dir".into(), "git log".into()]);

        history_search_backward(&mut ctx);
        assert_eq!(ctx.buffer.text(), "git log");
        assert_eq!(ctx.buffer.cursor(), 3);
        history_search_backward(&mut ctx);
        assert_eq!(ctx.buffer.text(), "git status");
        assert_eq!(history_search_backward(&mut ctx), CommandResult::Ding);

        operate_and_get_next(&mut ctx);
        assert_eq!(ctx.operate_next, Some(1));
    }
}
