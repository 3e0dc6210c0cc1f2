use crate::cli::history::HistoryStore;
use crate::host::doskey::{Doskey, DoskeyAlias};
use crate::host::errorlevel::ErrorlevelPhase;
use crate::host::scripts::ScriptEngine;
use crate::session::dir_history::DirectoryHistory;
use std::collections::VecDeque;
use std::path::PathBuf;

/// History positions carried from one edit to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryNav {
    /// Entry to start the next edit from, set by operate-and-get-next.
    pub operate_next: Option<usize>,
    /// Entry the last edit was recalled from, for sticky search.
    pub sticky: Option<usize>,
}

/// State kept across prompts for the life of the host process.
pub struct Session {
    pub dir_history: DirectoryHistory,
    pub last_cwd: Option<PathBuf>,
    /// Whether the previous prompt may be collapsed to its transient form.
    pub can_transient: bool,
    pub queued_lines: VecDeque<String>,
    pub doskey: Doskey,
    pub doskey_alias: DoskeyAlias,
    pub scripts: Option<Box<dyn ScriptEngine>>,
    /// Script directory the loaded engine was created for.
    pub script_path: Option<String>,
    pub history: Option<Box<dyn HistoryStore>>,
    pub history_nav: HistoryNav,
    pub autostart_pending: bool,
    pub injected: bool,
    pub errorlevel_phase: ErrorlevelPhase,
    pub in_flight: bool,
    pub last_errorlevel: i32,
    /// Prompt shown by the last interactive cycle, used to echo replayed lines.
    pub last_prompt: String,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            dir_history: DirectoryHistory::new(),
            last_cwd: None,
            can_transient: false,
            queued_lines: VecDeque::new(),
            doskey: Doskey::new(),
            doskey_alias: DoskeyAlias::new(),
            scripts: None,
            script_path: None,
            history: None,
            history_nav: HistoryNav::default(),
            autostart_pending: true,
            injected: false,
            errorlevel_phase: ErrorlevelPhase::None,
            in_flight: false,
            last_errorlevel: 0,
            last_prompt: String::new(),
        }
    }

    /// Queue `text` line by line. Every line but possibly the last keeps
    /// its `\n`, which marks it to run without editing.
    pub fn enqueue_text(&mut self, text: &str) {
        for line in text.split_inclusive('\n') {
            self.queued_lines.push_back(line.to_string());
        }
    }

    /// Whether the next cycle edits interactively: no alias continuation is
    /// pending and the queue holds nothing that runs on its own.
    pub fn is_interactive(&self) -> bool {
        if self.doskey_alias.is_pending() {
            return false;
        }
        match self.queued_lines.len() {
            0 => true,
            1 => !self.queued_lines[0].ends_with('\n'),
            _ => false,
        }
    }
}
