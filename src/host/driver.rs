//! Prompt Session Driver
//!
//! Runs one prompt-to-command cycle per call to [`PromptDriver::edit_line`]:
//! reloads settings, scripts and history as needed, issues the autostart
//! and errorlevel probe commands, replays alias continuations and queued
//! lines, runs the editor, and post-processes the accepted line.

use crate::binder::Binder;
use crate::cli::config::{CliConfig, SettingsStore, TransientMode};
use crate::cli::editor::LineBuffer;
use crate::cli::history::{is_excluded_from_history, CommandHistory, Expansion, HistoryStore};
use crate::cli::input::InputSource;
use crate::cli::utils::strip_escapes;
use crate::host::dir_shortcut::rewrite_directory_shortcut;
use crate::host::environment::HostEnvironment;
use crate::host::errorlevel::{probe_command, probe_file, purge_old_probe_files, read_probe, ErrorlevelPhase};
use crate::host::scripts::{BuiltinScripts, ScriptEngine};
use crate::line_editor::{apply_user_bindings, install_default_bindings, EditingSession};
use crate::matches::file_generator::FileMatchGenerator;
use crate::matches::matches::MatchFolding;
use crate::session::Session;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Probe files older than this are removed when a driver shuts down.
const PROBE_MAX_AGE_MINUTES: i64 = 30;

/// Creates a script engine for a script directory.
pub type ScriptFactory = Box<dyn Fn(&str) -> Box<dyn ScriptEngine>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The command line for the host to run.
    Line(String),
    /// Input ended.
    Eof,
}

/// Where a raw line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineSource {
    Alias,
    Replayed,
    Edited,
}

pub struct PromptDriver {
    session: Session,
    config: CliConfig,
    settings_path: Option<PathBuf>,
    history_file: Option<PathBuf>,
    env: Box<dyn HostEnvironment>,
    binder: Binder,
    applied_bindings: BTreeMap<String, String>,
    buffer: Box<dyn LineBuffer>,
    out: Box<dyn Write>,
    input: Box<dyn InputSource>,
    files: FileMatchGenerator,
    script_factory: ScriptFactory,
    terminal_size: Option<(usize, usize)>,
}

impl PromptDriver {
    pub fn new(
        env: Box<dyn HostEnvironment>,
        buffer: Box<dyn LineBuffer>,
        out: Box<dyn Write>,
        input: Box<dyn InputSource>,
    ) -> Self {
        let mut binder = Binder::new();
        install_default_bindings(&mut binder);
        Self {
            session: Session::new(),
            config: CliConfig::new(),
            settings_path: None,
            history_file: None,
            env,
            binder,
            applied_bindings: BTreeMap::new(),
            buffer,
            out,
            input,
            files: FileMatchGenerator::new(),
            script_factory: Box::new(|path: &str| -> Box<dyn ScriptEngine> { Box::new(BuiltinScripts::new(path)) }),
            terminal_size: None,
        }
    }

    /// Reload settings from `path` at the start of every cycle.
    pub fn with_settings_path(mut self, path: PathBuf) -> Self {
        self.settings_path = Some(path);
        self
    }

    /// Persist history to `path` while `history.save` is on.
    pub fn with_history_file(mut self, path: PathBuf) -> Self {
        self.history_file = Some(path);
        self
    }

    pub fn with_script_factory(mut self, factory: ScriptFactory) -> Self {
        self.script_factory = factory;
        self
    }

    pub fn with_terminal_size(mut self, columns: usize, rows: usize) -> Self {
        self.terminal_size = Some((columns, rows));
        self
    }

    pub fn config(&self) -> &CliConfig {
        &self.config
    }

    /// Settings in effect; overwritten on the next cycle when a settings
    /// path is set and the file exists.
    pub fn config_mut(&mut self) -> &mut CliConfig {
        &mut self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Queue lines to run ahead of interactive input.
    pub fn enqueue_lines<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.session.queued_lines.extend(lines.into_iter().map(Into::into));
    }

    /// Queue pasted text, one entry per line.
    pub fn enqueue_text(&mut self, text: &str) {
        self.session.enqueue_text(text);
    }

    /// Directories seen at past prompts, oldest first.
    pub fn dir_history(&self) -> &[PathBuf] {
        self.session.dir_history.entries()
    }

    /// Exit status of the previous command, as read from the probe file.
    pub fn last_errorlevel(&self) -> i32 {
        self.session.last_errorlevel
    }

    pub fn can_transient(&self) -> bool {
        self.session.can_transient
    }

    /// Run one prompt cycle.
    ///
    /// # Panics
    ///
    /// If called while another cycle on this driver is in flight.
    pub fn edit_line(&mut self, prompt: &str, rprompt: &str) -> CycleOutcome {
        assert!(!self.session.in_flight, "edit_line() is not re-entrant");
        self.session.in_flight = true;
        let outcome = self.run_cycle(prompt, rprompt);
        self.session.in_flight = false;
        outcome
    }

    fn run_cycle(&mut self, prompt: &str, rprompt: &str) -> CycleOutcome {
        self.reload_settings();

        let mut interactive = self.session.is_interactive();
        let mut staged = None;
        if interactive && self.session.autostart_pending {
            self.session.autostart_pending = false;
            let autostart = self.config.autostart.trim();
            if !autostart.is_empty() {
                info!(command = autostart, "running autostart command");
                staged = Some(autostart.to_string());
                interactive = false;
            }
        }
        if staged.is_none() {
            staged = self.errorlevel_step(interactive);
            if staged.is_some() {
                interactive = false;
            }
        }

        if interactive {
            self.update_last_cwd();
        }
        let loaded = self.reload_scripts();
        self.reload_history(interactive);

        let scripts = self.session.scripts.as_deref_mut();
        if let Some(scripts) = scripts {
            if loaded && !self.session.injected {
                self.session.injected = true;
                scripts.send_event("oninject", &[]);
            }
            if interactive {
                scripts.send_event("onbeginedit", &[]);
            }
        }

        let (shown_prompt, transient) = if interactive {
            self.filter_prompt(prompt, rprompt)
        } else {
            (prompt.to_string(), None)
        };

        if let Some(text) = staged {
            debug!(line = %text, "issuing staged command");
            return CycleOutcome::Line(text);
        }

        self.update_dir_history();

        let (line, source) = loop {
            let (raw, source) = if let Some(next) = self.session.doskey_alias.next() {
                (next, LineSource::Alias)
            } else if let Some(queued) = self.session.queued_lines.pop_front() {
                match queued.strip_suffix('\n') {
                    Some(text) => {
                        let text = text.trim_end_matches('\r').to_string();
                        self.echo_replayed(&text);
                        (text, LineSource::Replayed)
                    }
                    None => match self.run_editor(&queued, &shown_prompt, transient.clone()) {
                        Some(text) => (text, LineSource::Edited),
                        None => return CycleOutcome::Eof,
                    },
                }
            } else {
                match self.run_editor("", &shown_prompt, transient.clone()) {
                    Some(text) => (text, LineSource::Edited),
                    None => return CycleOutcome::Eof,
                }
            };

            if source == LineSource::Alias {
                break (raw, source);
            }
            match self.admit(raw) {
                Admission::Print(text) => {
                    self.print_line(&text);
                    continue;
                }
                Admission::Excluded(text) => {
                    debug!(line = %text, "line excluded from history");
                    return CycleOutcome::Line(self.end_edit(interactive, text));
                }
                Admission::Accepted(text) => break (text, source),
            }
        };

        let line = self.end_edit(interactive, line);
        CycleOutcome::Line(self.post_process(line, source))
    }

    fn reload_settings(&mut self) {
        if let Some(path) = &self.settings_path {
            if let Err(e) = self.config.load(path) {
                warn!(path = %path.display(), error = %e, "cannot load settings, keeping previous values");
            }
        }

        self.session.doskey.set_aliases(self.config.aliases.iter());

        if self.config.key_bindings != self.applied_bindings {
            let mut binder = Binder::new();
            install_default_bindings(&mut binder);
            let user: Vec<(String, String)> = self
                .config
                .key_bindings
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            let applied = apply_user_bindings(&mut binder, &user);
            debug!(applied, requested = user.len(), "applied user key bindings");
            self.binder = binder;
            self.applied_bindings = self.config.key_bindings.clone();
        }
    }

    /// Advance the probe protocol. Returns the probe command when this
    /// cycle issues it.
    fn errorlevel_step(&mut self, interactive: bool) -> Option<String> {
        if !self.config.get_errorlevel {
            self.session.errorlevel_phase = ErrorlevelPhase::None;
            return None;
        }
        if !interactive {
            return None;
        }

        let file = probe_file(&self.env.temp_dir(), self.env.process_id());
        match self.session.errorlevel_phase {
            ErrorlevelPhase::ProbePending => {
                self.session.last_errorlevel = read_probe(&file);
                self.session.errorlevel_phase = ErrorlevelPhase::ProbeConsumed;
                debug!(errorlevel = self.session.last_errorlevel, "read errorlevel probe");
                None
            }
            ErrorlevelPhase::None | ErrorlevelPhase::ProbeConsumed => {
                self.session.errorlevel_phase = ErrorlevelPhase::ProbePending;
                Some(probe_command(&file))
            }
        }
    }

    fn update_last_cwd(&mut self) {
        let mode = self.config.transient;
        let cwd = self.env.current_dir();
        let same = match (&cwd, &self.session.last_cwd) {
            (Some(cwd), Some(last)) => same_path(cwd, last),
            _ => false,
        };
        if same {
            self.session.can_transient = mode != TransientMode::Off;
        } else {
            self.session.can_transient = mode == TransientMode::Always;
            self.session.last_cwd = cwd;
        }
    }

    /// Returns whether a new engine was loaded.
    fn reload_scripts(&mut self) -> bool {
        let path = self.config.script_path.clone();
        let stale = match &self.session.scripts {
            None => true,
            Some(engine) => {
                self.config.reload_scripts
                    || self.session.script_path.as_deref() != Some(path.as_str())
                    || engine.is_script_path_changed()
            }
        };
        if !stale {
            return false;
        }

        let mut engine = (self.script_factory)(&path);
        if let Err(e) = engine.load_scripts() {
            warn!(path = %path, error = %e, "cannot load scripts");
        }
        self.session.scripts = Some(engine);
        self.session.script_path = Some(path);
        true
    }

    fn reload_history(&mut self, interactive: bool) {
        let persistent = self.config.save_history && self.history_file.is_some();
        let stale = self
            .session
            .history
            .as_ref()
            .map_or(true, |history| history.is_persistent() != persistent);

        if stale {
            let max = self.config.max_history_size;
            let history: Box<dyn HistoryStore> = match (&self.history_file, persistent) {
                (Some(file), true) => Box::new(CommandHistory::with_file(max, file.clone())),
                _ => Box::new(CommandHistory::new(max)),
            };
            self.session.history = Some(history);
        }

        let reload = stale || (interactive && self.session.history_nav.operate_next.is_none());
        if let (true, Some(history)) = (reload, self.session.history.as_mut()) {
            if let Err(e) = history.load() {
                warn!(error = %e, "cannot load history");
            }
        }
    }

    /// Prompt to draw, and the transient prompt when the previous prompt
    /// may be collapsed.
    fn filter_prompt(&mut self, prompt: &str, rprompt: &str) -> (String, Option<String>) {
        let filter = self.config.prompt_filter;
        let can_transient = self.session.can_transient;
        let (shown, transient) = match self.session.scripts.as_deref_mut() {
            Some(scripts) if filter => {
                let (shown, _) = scripts.filter_prompt(prompt, rprompt, false);
                let transient = can_transient.then(|| scripts.filter_prompt(prompt, rprompt, true).0);
                (shown, transient)
            }
            _ => (prompt.to_string(), None),
        };
        self.session.last_prompt = shown.clone();
        (shown, transient)
    }

    fn update_dir_history(&mut self) {
        match self.env.current_dir() {
            Some(cwd) => {
                self.session.dir_history.push(&cwd);
            }
            None => debug!("cannot determine the working directory"),
        }
    }

    fn echo_replayed(&mut self, line: &str) {
        let prompt = strip_escapes(&self.session.last_prompt);
        if let Err(e) = writeln!(self.out, "{}{}", prompt, line).and_then(|_| self.out.flush()) {
            warn!(error = %e, "terminal write failed");
        }
    }

    fn print_line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{}", line).and_then(|_| self.out.flush()) {
            warn!(error = %e, "terminal write failed");
        }
    }

    fn run_editor(&mut self, initial: &str, prompt: &str, transient: Option<String>) -> Option<String> {
        let history = self
            .session
            .history
            .as_ref()
            .map(|history| history.entries())
            .unwrap_or_default();
        let start = self.session.history_nav.operate_next.take();
        let dirs = self.session.dir_history.entries().to_vec();

        let mut editor = EditingSession::new(&self.binder, self.buffer.as_mut(), self.out.as_mut(), self.input.as_mut());
        editor.set_prompt(prompt, transient);
        editor.set_history(history, start);
        editor.set_dir_history(dirs);
        editor.set_colorize(self.config.colorize_input);
        editor.set_folding(MatchFolding::from_settings(self.config.ignore_case, self.config.ignore_accent));
        if let Some((columns, rows)) = self.terminal_size {
            editor.set_terminal_size(columns, rows);
        }
        if let Some(scripts) = self.session.scripts.as_deref() {
            editor.add_generator(scripts.as_generator());
            if let Some(classifier) = scripts.as_classifier() {
                editor.add_classifier(classifier);
            }
        }
        editor.add_generator(&self.files);

        let line = editor.edit(initial);
        let operate_next = editor.operate_next();
        let recalled = editor.history_index();
        drop(editor);

        self.session.history_nav.operate_next = operate_next;
        self.session.history_nav.sticky = if self.config.sticky_search { recalled } else { None };
        line
    }

    /// Decide history admission, expand history events and apply the
    /// exclusion list.
    fn admit(&mut self, line: String) -> Admission {
        let nav = self.session.history_nav;
        let Some(history) = self.session.history.as_mut() else {
            return Admission::Accepted(line);
        };

        let add = if nav.operate_next.is_some() {
            false
        } else if let (false, Some(index)) = (line.is_empty(), nav.sticky) {
            history.get(index) != Some(line.as_str())
        } else {
            true
        };
        if add {
            self.session.history_nav.sticky = None;
        }

        let line = match history.expand(&line) {
            Expansion::Unchanged => line,
            Expansion::Rewritten(text) => text,
            Expansion::Print(text) => return Admission::Print(text),
        };

        if is_excluded_from_history(&line, &self.config.dont_add_to_history_cmds) {
            return Admission::Excluded(line);
        }
        if add {
            history.add(&line);
        }
        Admission::Accepted(line)
    }

    /// Send `onendedit`, then let scripts filter the line.
    fn end_edit(&mut self, interactive: bool, line: String) -> String {
        let (true, Some(scripts)) = (interactive, self.session.scripts.as_deref_mut()) else {
            return line;
        };
        scripts.send_event("onendedit", &[&line]);
        match scripts.filter_input(&line) {
            Some(filtered) => {
                debug!(line = %line, filtered = %filtered, "script filtered input");
                filtered
            }
            None => line,
        }
    }

    /// Doskey resolution, then the directory shortcut rewrite.
    fn post_process(&mut self, mut line: String, source: LineSource) -> String {
        if source != LineSource::Alias && self.session.doskey.resolve(&line, &mut self.session.doskey_alias) {
            if let Some(first) = self.session.doskey_alias.next() {
                debug!(alias = %line, expanded = %first, "expanded doskey alias");
                line = first;
            }
        }
        if let Some(rewritten) = rewrite_directory_shortcut(&line, &self.session.dir_history, self.env.as_ref()) {
            debug!(line = %line, rewritten = %rewritten, "rewrote directory shortcut");
            line = rewritten;
        }
        line
    }
}

enum Admission {
    Accepted(String),
    Excluded(String),
    Print(String),
}

fn same_path(a: &Path, b: &Path) -> bool {
    a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
}

impl Drop for PromptDriver {
    fn drop(&mut self) {
        let removed = purge_old_probe_files(
            &self.env.temp_dir(),
            chrono::Duration::minutes(PROBE_MAX_AGE_MINUTES),
        );
        debug!(removed, "driver shut down");
    }
}
