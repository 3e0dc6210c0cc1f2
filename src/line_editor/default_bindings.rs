//! Default key bindings
//!
//! Emacs-style bindings for the base group plus the popup and pager groups.
//! Sequences are the bytes [`crate::cli::terminal::key_to_bytes`] produces.

use crate::binder::{parse_keyseq, Binder, Binding};
use crate::cli::commands::EditCommand::{self, *};
use crate::cli::terminal::BINDABLE_ESC;
use crate::line_editor::modules::{DEFAULT_GROUP, PAGER_GROUP, SELECT_COMPLETE_GROUP};
use tracing::{debug, warn};

const DEFAULT_KEYS: &[(&[u8], EditCommand)] = &[
    (b"\r", AcceptLine),
    (b"\n", AcceptLine),
    (b"\x07", Abort),
    (BINDABLE_ESC, ResetLine),
    (b"\x03", CancelLine),
    (b"\x1f", Undo),
    (b"\x1a", Undo),
    (b"\x02", BackwardChar),
    (b"\x1b[D", BackwardChar),
    (b"\x06", ForwardChar),
    (b"\x1b[C", ForwardChar),
    (b"\x1bb", BackwardWord),
    (b"\x1b[1;5D", BackwardWord),
    (b"\x1bf", ForwardWord),
    (b"\x1b[1;5C", ForwardWord),
    (b"\x01", BeginningOfLine),
    (b"\x1b[H", BeginningOfLine),
    (b"\x05", EndOfLine),
    (b"\x1b[F", EndOfLine),
    (b"\x08", BackwardDeleteChar),
    (b"\x1b[3~", DeleteChar),
    (b"\x04", DeleteChar),
    (b"\x0b", KillLine),
    (b"\x15", BackwardKillLine),
    (b"\x1bd", KillWord),
    (b"\x1b[3;5~", KillWord),
    (b"\x17", BackwardKillWord),
    (b"\x7f", BackwardKillWord),
    (b"\x19", Yank),
    (b"\x10", PreviousHistory),
    (b"\x1b[A", PreviousHistory),
    (b"\x0e", NextHistory),
    (b"\x1b[B", NextHistory),
    (b"\x1b<", BeginningOfHistory),
    (b"\x1b>", EndOfHistory),
    (b"\x1b[5~", HistorySearchBackward),
    (b"\x1b[6~", HistorySearchForward),
    (b"\x0f", OperateAndGetNext),
    (b"\t", Complete),
    (b"\x1b=", PossibleCompletions),
    (b"\x1b\t", MenuComplete),
    (b"\x1b[Z", MenuCompleteBackward),
    (b"\x00", SelectComplete),
    (b"\x1b[1;7A", PopupDirectories),
    (b"\x1b[5;5~", UpDirectory),
    (b"\x1ba", InsertDotDot),
    (b"\x1bh", ShowHelp),
    (b"\x0c", ClearScreen),
];

const SELECT_COMPLETE_KEYS: &[(&[u8], EditCommand)] = &[
    (b"\x1b[B", PopupNext),
    (b"\t", PopupNext),
    (b"\x1b[A", PopupPrevious),
    (b"\x1b[Z", PopupPrevious),
    (b"\r", PopupAccept),
    (b"\n", PopupAccept),
    (BINDABLE_ESC, PopupCancel),
    (b"\x07", PopupCancel),
];

const PAGER_KEYS: &[(&[u8], EditCommand)] = &[
    (b" ", PagerNextPage),
    (b"\r", PagerNextLine),
    (b"\n", PagerNextLine),
    (b"q", PagerQuit),
    (b"Q", PagerQuit),
    (BINDABLE_ESC, PagerQuit),
    (b"\x07", PagerQuit),
];

/// Create the built-in groups and bind their keys.
///
/// # Panics
///
/// If two built-in sequences conflict.
pub fn install_default_bindings(binder: &mut Binder) {
    for (name, keys) in [
        (DEFAULT_GROUP, DEFAULT_KEYS),
        (SELECT_COMPLETE_GROUP, SELECT_COMPLETE_KEYS),
        (PAGER_GROUP, PAGER_KEYS),
    ] {
        let group = binder.create_group(name);
        for (seq, command) in keys {
            if let Err(e) = binder.bind(group, seq, Binding::Command(*command)) {
                panic!("default binding for {} in group {}: {}", command, name, e);
            }
        }
    }
}

/// Apply user bindings (`"\C-x": "command"` or `"\C-x": "\"text\""`) to the
/// default group, replacing whatever they conflict with. Returns how many
/// were applied; invalid entries are logged and skipped.
pub fn apply_user_bindings(binder: &mut Binder, bindings: &[(String, String)]) -> usize {
    let group = binder.create_group(DEFAULT_GROUP);
    let mut applied = 0;
    for (key, target) in bindings {
        let bound = parse_keyseq(key)
            .and_then(|seq| Binding::parse(target).map(|binding| (seq, binding)))
            .and_then(|(seq, binding)| binder.rebind(group, &seq, binding));
        match bound {
            Ok(replaced) => {
                debug!(key = %key, target = %target, replaced = replaced.len(), "user key binding");
                applied += 1;
            }
            Err(e) => warn!(key = %key, error = %e, "ignoring key binding"),
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::Lookup;

    #[test]
    fn test_defaults_install_without_conflicts() {
        let mut binder = Binder::new();
        install_default_bindings(&mut binder);
        let group = binder.get_group(DEFAULT_GROUP).unwrap();
        assert_eq!(
            binder.lookup(group, b"\x1b[A"),
            Lookup::Bound(&Binding::Command(PreviousHistory))
        );
        assert_eq!(binder.lookup(group, b"\x1b["), Lookup::Prefix);
        assert_eq!(binder.lookup(group, b"z"), Lookup::Unbound);

        let popup = binder.get_group(SELECT_COMPLETE_GROUP).unwrap();
        assert_eq!(binder.lookup(popup, b"\t"), Lookup::Bound(&Binding::Command(PopupNext)));
    }

    #[test]
    fn test_user_bindings_replace_defaults() {
        let mut binder = Binder::new();
        install_default_bindings(&mut binder);
        let user = vec![
            ("\\C-a".to_string(), "end-of-line".to_string()),
            ("\\M-g".to_string(), "\"git status\"".to_string()),
            ("\\C-q".to_string(), "no-such-command".to_string()),
        ];
        assert_eq!(apply_user_bindings(&mut binder, &user), 2);

        let group = binder.get_group(DEFAULT_GROUP).unwrap();
        assert_eq!(binder.lookup(group, b"\x01"), Lookup::Bound(&Binding::Command(EndOfLine)));
        assert_eq!(
            binder.lookup(group, b"\x1bg"),
            Lookup::Bound(&Binding::Macro("git status".to_string()))
        );
        assert_eq!(binder.lookup(group, b"\x11"), Lookup::Unbound);
    }
}
