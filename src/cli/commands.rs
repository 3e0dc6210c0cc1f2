//! Editing Commands Module
//!
//! Identifiers, categories and descriptions of the operations that key
//! sequences can be bound to. Handlers are attached in
//! [`crate::line_editor::handlers`].

use std::fmt;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, EnumIter, EnumString, IntoStaticStr};

/// Bindable editing operations, named in kebab-case (`accept-line`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum EditCommand {
    AcceptLine,
    Abort,
    CancelLine,
    Undo,
    ResetLine,
    BackwardChar,
    ForwardChar,
    BackwardWord,
    ForwardWord,
    BeginningOfLine,
    EndOfLine,
    BackwardDeleteChar,
    DeleteChar,
    KillLine,
    BackwardKillLine,
    KillWholeLine,
    KillWord,
    BackwardKillWord,
    Yank,
    PreviousHistory,
    NextHistory,
    BeginningOfHistory,
    EndOfHistory,
    HistorySearchBackward,
    HistorySearchForward,
    OperateAndGetNext,
    Complete,
    PossibleCompletions,
    MenuComplete,
    MenuCompleteBackward,
    SelectComplete,
    PopupDirectories,
    PopupNext,
    PopupPrevious,
    PopupAccept,
    PopupCancel,
    PagerNextPage,
    PagerNextLine,
    PagerQuit,
    UpDirectory,
    InsertDotDot,
    ShowHelp,
    ClearScreen,
}

/// Command categories used to group the help listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum CommandCategory {
    Basic,
    CursorMovement,
    Completion,
    History,
    KillAndYank,
    Selection,
    Scrolling,
    Miscellaneous,
    Macros,
}

impl fmt::Display for CommandCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Basic => "Basic",
            Self::CursorMovement => "Cursor Movement",
            Self::Completion => "Completion",
            Self::History => "History",
            Self::KillAndYank => "Kill and Yank",
            Self::Selection => "Selection",
            Self::Scrolling => "Scrolling",
            Self::Miscellaneous => "Miscellaneous",
            Self::Macros => "Macros",
        };
        write!(f, "{}", name)
    }
}

impl EditCommand {
    /// The bindable name, e.g. `backward-char`
    pub fn name(&self) -> &'static str {
        (*self).into()
    }

    /// Get command description
    pub fn description(&self) -> &'static str {
        match self {
            Self::AcceptLine => "Accept the line regardless of where the cursor is",
            Self::Abort => "Cancel the current key sequence or popup and ring the bell",
            Self::CancelLine => "Discard the current line and start a new one",
            Self::Undo => "Undo the last group of changes",
            Self::ResetLine => "Clear the line in one undoable step",
            Self::BackwardChar => "Move back a character",
            Self::ForwardChar => "Move forward a character",
            Self::BackwardWord => "Move back to the start of the current or previous word",
            Self::ForwardWord => "Move forward to the end of the next word",
            Self::BeginningOfLine => "Move to the start of the line",
            Self::EndOfLine => "Move to the end of the line",
            Self::BackwardDeleteChar => "Delete the character behind the cursor",
            Self::DeleteChar => "Delete the character at the cursor, or end input on an empty line",
            Self::KillLine => "Kill the text from the cursor to the end of the line",
            Self::BackwardKillLine => "Kill backward from the cursor to the beginning of the line",
            Self::KillWholeLine => "Kill all characters on the current line",
            Self::KillWord => "Kill from the cursor to the end of the current or next word",
            Self::BackwardKillWord => "Kill the word behind the cursor",
            Self::Yank => "Insert the most recently killed text at the cursor",
            Self::PreviousHistory => "Fetch the previous command from the history list",
            Self::NextHistory => "Fetch the next command from the history list",
            Self::BeginningOfHistory => "Move to the first line in the history",
            Self::EndOfHistory => "Move to the end of the history, restoring the typed line",
            Self::HistorySearchBackward => "Search backward for a history entry starting with the text before the cursor",
            Self::HistorySearchForward => "Search forward for a history entry starting with the text before the cursor",
            Self::OperateAndGetNext => "Accept the line and fetch the next history entry for editing",
            Self::Complete => "Perform completion on the text before the cursor point",
            Self::PossibleCompletions => "List the possible completions of the text before the cursor",
            Self::MenuComplete => "Replace the word with the next possible completion",
            Self::MenuCompleteBackward => "Replace the word with the previous possible completion",
            Self::SelectComplete => "Choose a completion from a popup list",
            Self::PopupDirectories => "Choose a recently used directory from a popup list",
            Self::PopupNext => "Select the next item in the popup list",
            Self::PopupPrevious => "Select the previous item in the popup list",
            Self::PopupAccept => "Insert the selected popup item",
            Self::PopupCancel => "Close the popup list without inserting anything",
            Self::PagerNextPage => "Show the next page of output",
            Self::PagerNextLine => "Show the next line of output",
            Self::PagerQuit => "Stop showing output",
            Self::UpDirectory => "Change to the parent directory",
            Self::InsertDotDot => "Insert ..\\ at the cursor",
            Self::ShowHelp => "List the key bindings and the commands they invoke",
            Self::ClearScreen => "Clear the screen and redraw the prompt",
        }
    }

    /// Get command category for grouping
    pub fn category(&self) -> CommandCategory {
        match self {
            Self::AcceptLine | Self::Abort | Self::CancelLine | Self::Undo | Self::ResetLine => CommandCategory::Basic,
            Self::BackwardChar
            | Self::ForwardChar
            | Self::BackwardWord
            | Self::ForwardWord
            | Self::BeginningOfLine
            | Self::EndOfLine => CommandCategory::CursorMovement,
            Self::BackwardDeleteChar
            | Self::DeleteChar
            | Self::KillLine
            | Self::BackwardKillLine
            | Self::KillWholeLine
            | Self::KillWord
            | Self::BackwardKillWord
            | Self::Yank => CommandCategory::KillAndYank,
            Self::PreviousHistory
            | Self::NextHistory
            | Self::BeginningOfHistory
            | Self::EndOfHistory
            | Self::HistorySearchBackward
            | Self::HistorySearchForward
            | Self::OperateAndGetNext => CommandCategory::History,
            Self::Complete
            | Self::PossibleCompletions
            | Self::MenuComplete
            | Self::MenuCompleteBackward
            | Self::SelectComplete
            | Self::PopupDirectories => CommandCategory::Completion,
            Self::PopupNext | Self::PopupPrevious | Self::PopupAccept | Self::PopupCancel => CommandCategory::Selection,
            Self::PagerNextPage | Self::PagerNextLine | Self::PagerQuit => CommandCategory::Scrolling,
            Self::UpDirectory | Self::InsertDotDot | Self::ShowHelp | Self::ClearScreen => CommandCategory::Miscellaneous,
        }
    }

    /// Get all available commands
    pub fn all_commands() -> Vec<Self> {
        Self::iter().collect()
    }

    /// Get commands by category
    pub fn by_category(category: CommandCategory) -> Vec<Self> {
        Self::iter().filter(|cmd| cmd.category() == category).collect()
    }
}

impl fmt::Display for EditCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_names_parse_back() {
        for cmd in EditCommand::all_commands() {
            assert_eq!(EditCommand::from_str(cmd.as_ref()).unwrap(), cmd);
        }
        assert_eq!(EditCommand::from_str("backward-char").unwrap(), EditCommand::BackwardChar);
        assert_eq!(EditCommand::OperateAndGetNext.to_string(), "operate-and-get-next");
        assert!(EditCommand::from_str("no-such-command").is_err());
    }

    #[test]
    fn test_by_category() {
        let selection = EditCommand::by_category(CommandCategory::Selection);
        assert_eq!(selection.len(), 4);
        assert!(EditCommand::by_category(CommandCategory::Macros).is_empty());
        assert_eq!(CommandCategory::KillAndYank.to_string(), "Kill and Yank");
    }
}
