//! promptline - Main Entry Point
//!
//! Runs a minimal command host on top of the prompt driver: every resolved
//! line is handed to the platform shell, and `cd` is handled in-process so
//! that directory history and directory shortcuts have something to track.

use promptline::cli::config::{CliConfig, SettingsStore};
use promptline::cli::editor::TextBuffer;
use promptline::cli::terminal::TerminalInput;
use promptline::host::{CycleOutcome, PromptDriver, SystemEnvironment};
use promptline::logging::{init_tracing, TracingConfig};
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{self, Command};
use tracing::{info, warn};

const APP_DIR: &str = "promptline";

fn settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("settings.json"))
}

fn state_dir() -> Option<PathBuf> {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .map(|dir| dir.join(APP_DIR))
}

fn init_logging(settings: Option<&PathBuf>) {
    let mut config = CliConfig::new();
    if let Some(path) = settings {
        if let Err(e) = config.load(path) {
            eprintln!("WARNING: cannot read settings {}: {}", path.display(), e);
        }
    }
    let tracing_config = match state_dir() {
        Some(dir) => TracingConfig::new_file(dir.join("promptline.log"), &config.log_level),
        None => TracingConfig::default(),
    };
    init_tracing(&tracing_config);
}

fn prompt_text() -> String {
    let cwd = env::current_dir()
        .map(|dir| dir.display().to_string())
        .unwrap_or_default();
    format!("{}> ", cwd)
}

/// Target of a `cd` line, with `/d` and quotes removed.
fn cd_target(line: &str) -> Option<String> {
    let line = line.trim();
    let (head, rest) = line.split_at(line.find(char::is_whitespace).unwrap_or(line.len()));
    if !head.eq_ignore_ascii_case("cd") && !head.eq_ignore_ascii_case("chdir") {
        return None;
    }
    let rest = rest.trim_start();
    let rest = match rest.get(..2) {
        Some(flag) if flag.eq_ignore_ascii_case("/d") => rest[2..].trim_start(),
        _ => rest,
    };
    Some(rest.trim_matches('"').to_string())
}

fn change_dir(target: &str) -> i32 {
    if target.is_empty() {
        println!("{}", env::current_dir().map(|d| d.display().to_string()).unwrap_or_default());
        return 0;
    }
    let native = target.replace(['\\', '/'], std::path::MAIN_SEPARATOR_STR);
    match env::set_current_dir(&native) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("cd: {}: {}", target, e);
            1
        }
    }
}

#[cfg(windows)]
fn shell_command(line: &str, _status: i32) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C").arg(line);
    command
}

#[cfg(not(windows))]
fn shell_command(line: &str, status: i32) -> Command {
    let line = line
        .replace("%errorlevel%", &status.to_string())
        .replace("2>nul", "2>/dev/null");
    let mut command = Command::new("sh");
    command.arg("-c").arg(line);
    command
}

fn run_line(line: &str, status: i32) -> i32 {
    if line.trim().is_empty() {
        return status;
    }
    if let Some(target) = cd_target(line) {
        return change_dir(&target);
    }
    match shell_command(line, status).status() {
        Ok(exit) => exit.code().unwrap_or(1),
        Err(e) => {
            warn!(error = %e, "cannot run command");
            eprintln!("ERROR: cannot run command: {}", e);
            1
        }
    }
}

fn main() {
    let settings = settings_path();
    init_logging(settings.as_ref());
    info!("promptline starting");

    let mut driver = PromptDriver::new(
        Box::new(SystemEnvironment),
        Box::new(TextBuffer::new()),
        Box::new(io::stdout()),
        Box::new(TerminalInput::new()),
    );
    if let Some(path) = settings {
        driver = driver.with_settings_path(path);
    }
    if let Some(dir) = state_dir() {
        driver = driver.with_history_file(dir.join("history"));
    }

    let mut status = 0;
    loop {
        match driver.edit_line(&prompt_text(), "") {
            CycleOutcome::Line(line) => {
                status = run_line(&line, status);
                io::stdout().flush().unwrap_or(());
            }
            CycleOutcome::Eof => break,
        }
    }

    info!("promptline exiting");
    drop(driver);
    process::exit(status);
}
