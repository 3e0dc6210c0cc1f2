//! Script engine
//!
//! The driver talks to scripts only through [`ScriptEngine`]: lifecycle
//! events, prompt filtering, and completion and classification for the
//! editor. [`BuiltinScripts`] is the shipped engine. It reads declarative
//! command descriptions from `*.json` files in the script directory:
//!
//! ```json
//! {
//!   "prompt": "$P$G",
//!   "transient_prompt": "$G ",
//!   "commands": [
//!     { "command": "git", "args": ["status", "checkout"], "flags": ["--help"] }
//!   ]
//! }
//! ```
//!
//! Prompt templates use cmd's `$` codes. Words starting with `%` complete
//! to environment variable names.

use crate::error::ScriptError;
use crate::matches::generator::{MatchBuilder, MatchGenerator};
use crate::matches::matches::{MatchEntry, MatchKind};
use crate::words::classifier::{Classifier, WordClass, WordClassifications};
use crate::words::line_state::LineState;
use chrono::Local;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub trait ScriptEngine {
    /// Discover and load scripts. On error the engine stays usable but
    /// produces nothing.
    fn load_scripts(&mut self) -> Result<(), ScriptError>;

    fn send_event(&mut self, name: &str, args: &[&str]);

    /// Offer an accepted line for rewriting before it is returned to the
    /// host. `None` keeps the line as it is.
    fn filter_input(&mut self, _line: &str) -> Option<String> {
        None
    }

    /// Filter the raw prompt and right prompt. `transient` asks for the
    /// collapsed form drawn over an accepted line.
    fn filter_prompt(&mut self, prompt: &str, rprompt: &str, transient: bool) -> (String, String);

    /// Whether the set of script files differs from what was loaded.
    fn is_script_path_changed(&self) -> bool;

    fn as_generator(&self) -> &dyn MatchGenerator;

    fn as_classifier(&self) -> Option<&dyn Classifier>;
}

/// One command described by a script file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommandScript {
    pub command: String,
    pub args: Vec<String>,
    pub flags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ScriptFile {
    prompt: Option<String>,
    transient_prompt: Option<String>,
    commands: Vec<CommandScript>,
}

const DEFAULT_TRANSIENT_PROMPT: &str = "$G ";

#[derive(Debug, Default)]
pub struct BuiltinScripts {
    dir: Option<PathBuf>,
    files: Vec<PathBuf>,
    commands: BTreeMap<String, CommandScript>,
    prompt: Option<String>,
    transient_prompt: Option<String>,
    events: Vec<String>,
}

impl BuiltinScripts {
    /// Engine reading scripts from `path`; an empty path means no scripts.
    pub fn new(path: &str) -> Self {
        let path = path.trim();
        Self {
            dir: (!path.is_empty()).then(|| PathBuf::from(path)),
            ..Self::default()
        }
    }

    /// Script files currently in the directory, sorted.
    fn discover(&self) -> Result<Vec<PathBuf>, ScriptError> {
        let Some(dir) = &self.dir else {
            return Ok(Vec::new());
        };
        if !dir.is_dir() {
            return Err(ScriptError::MissingDirectory(dir.display().to_string()));
        }
        let pattern = format!("{}/*.json", glob::Pattern::escape(&dir.to_string_lossy()));
        let mut files: Vec<PathBuf> = glob::glob(&pattern)?.flatten().collect();
        files.sort();
        Ok(files)
    }

    fn load_file(&mut self, path: &Path) -> Result<(), ScriptError> {
        let text = fs::read_to_string(path)?;
        let script: ScriptFile = serde_json::from_str(&text).map_err(|source| ScriptError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        if script.prompt.is_some() {
            self.prompt = script.prompt;
        }
        if script.transient_prompt.is_some() {
            self.transient_prompt = script.transient_prompt;
        }
        for command in script.commands {
            if command.command.is_empty() {
                warn!(file = %path.display(), "script command without a name");
                continue;
            }
            self.commands.insert(command.command.to_lowercase(), command);
        }
        Ok(())
    }

    fn command(&self, name: &str) -> Option<&CommandScript> {
        self.commands.get(&name.to_lowercase())
    }

    /// Names of the loaded commands.
    pub fn command_names(&self) -> Vec<&str> {
        self.commands.values().map(|c| c.command.as_str()).collect()
    }

    /// Events received so far, as `name arg...`.
    pub fn events(&self) -> &[String] {
        &self.events
    }
}

impl ScriptEngine for BuiltinScripts {
    fn load_scripts(&mut self) -> Result<(), ScriptError> {
        self.commands.clear();
        self.prompt = None;
        self.transient_prompt = None;
        self.files.clear();

        let files = self.discover()?;
        for file in &files {
            self.load_file(file)?;
        }
        info!(files = files.len(), commands = self.commands.len(), "loaded scripts");
        self.files = files;
        Ok(())
    }

    fn send_event(&mut self, name: &str, args: &[&str]) {
        debug!(event = name, ?args, "script event");
        let mut event = name.to_string();
        for arg in args {
            event.push(' ');
            event.push_str(arg);
        }
        self.events.push(event);
    }

    fn filter_prompt(&mut self, prompt: &str, rprompt: &str, transient: bool) -> (String, String) {
        if transient {
            let template = self.transient_prompt.as_deref().unwrap_or(DEFAULT_TRANSIENT_PROMPT);
            return (expand_prompt_codes(template), String::new());
        }
        match &self.prompt {
            Some(template) => (expand_prompt_codes(template), rprompt.to_string()),
            None => (prompt.to_string(), rprompt.to_string()),
        }
    }

    fn is_script_path_changed(&self) -> bool {
        match self.discover() {
            Ok(files) => files != self.files,
            Err(_) => !self.files.is_empty(),
        }
    }

    fn as_generator(&self) -> &dyn MatchGenerator {
        self
    }

    fn as_classifier(&self) -> Option<&dyn Classifier> {
        Some(self)
    }
}

impl MatchGenerator for BuiltinScripts {
    fn generate(&self, line: &LineState<'_>, builder: &mut MatchBuilder<'_>) -> bool {
        let word = line.end_word();
        if let Some(partial) = word.strip_prefix('%') {
            if partial.contains('%') {
                return false;
            }
            for (name, _) in env::vars() {
                builder.add_entry(MatchEntry::new(format!("%{}%", name), MatchKind::Env).with_append_char(None));
            }
            return true;
        }

        if line.word_count() <= 1 {
            for command in self.commands.values() {
                builder.add_match(command.command.clone(), MatchKind::Command);
            }
            return false;
        }

        let Some(script) = line.command_word().and_then(|name| self.command(name)) else {
            return false;
        };
        for arg in &script.args {
            builder.add_match(arg.clone(), MatchKind::Argument);
        }
        for flag in &script.flags {
            builder.add_match(flag.clone(), MatchKind::Argument);
        }
        false
    }
}

impl Classifier for BuiltinScripts {
    fn classify(&self, commands: &[LineState<'_>], out: &mut WordClassifications) {
        for command in commands {
            let script = command.command_word().and_then(|name| self.command(name));
            for (i, word) in command.words().iter().enumerate() {
                let text = command.word(i).unwrap_or("");
                let class = if word.command_word {
                    script.map(|_| WordClass::Command)
                } else if text.starts_with(['-', '/']) {
                    Some(WordClass::Flag)
                } else {
                    script
                        .filter(|s| s.args.iter().any(|a| a.eq_ignore_ascii_case(text)))
                        .map(|_| WordClass::Argument)
                };
                if let Some(class) = class {
                    out.classify_word(word, class);
                }
            }
        }
    }
}

/// Expand cmd `PROMPT` codes in `template`.
pub fn expand_prompt_codes(template: &str) -> String {
    let mut out = String::new();
    let mut chars = template.chars();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        let Some(code) = chars.next() else {
            out.push('$');
            break;
        };
        match code.to_ascii_uppercase() {
            'P' => out.push_str(&current_dir_text()),
            'N' => out.push_str(current_dir_text().get(..1).unwrap_or("")),
            'G' => out.push('>'),
            'L' => out.push('<'),
            'B' => out.push('|'),
            'Q' => out.push('='),
            'A' => out.push('&'),
            'C' => out.push('('),
            'F' => out.push(')'),
            'S' => out.push(' '),
            'E' => out.push('\x1b'),
            '_' => out.push('\n'),
            'T' => out.push_str(&Local::now().format("%H:%M:%S%.2f").to_string()),
            'D' => out.push_str(&Local::now().format("%a %m/%d/%Y").to_string()),
            '$' => out.push('$'),
            _ => {}
        }
    }
    out
}

fn current_dir_text() -> String {
    env::current_dir()
        .map(|dir| dir.display().to_string())
        .unwrap_or_default()
}
