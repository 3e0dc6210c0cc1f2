//! Errorlevel probe
//!
//! The host shell does not report the exit status of the previous command.
//! Before an interactive prompt the driver injects a hidden command that
//! echoes `%errorlevel%` into a per-process temp file, and reads the file
//! back on the following cycle.

use chrono::{DateTime, Duration, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const PROBE_PREFIX: &str = "promptline_errorlevel";

/// Where the probe protocol stands between cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorlevelPhase {
    #[default]
    None,
    /// The probe command was issued; its file is read next cycle.
    ProbePending,
    /// The probe was read; the next interactive cycle probes again.
    ProbeConsumed,
}

/// Probe file for process `pid`.
pub fn probe_file(temp_dir: &Path, pid: u32) -> PathBuf {
    temp_dir.join(format!("{}_{:X}.txt", PROBE_PREFIX, pid))
}

/// Command line that writes the exit status to `file`.
pub fn probe_command(file: &Path) -> String {
    format!(" echo %errorlevel% 2>nul >\"{}\"", file.display())
}

/// Leading integer of `text`, like C's `atoi`.
fn parse_leading_int(text: &str) -> Option<i32> {
    let text = text.trim_start();
    let digits_start = usize::from(text.starts_with(['-', '+']));
    let end = text[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(text.len(), |i| i + digits_start);
    text[..end].parse().ok()
}

/// Read and delete the probe file. Any failure yields 0.
pub fn read_probe(file: &Path) -> i32 {
    let text = match fs::read_to_string(file) {
        Ok(text) => text,
        Err(e) => {
            debug!(file = %file.display(), error = %e, "no errorlevel probe file");
            return 0;
        }
    };
    if let Err(e) = fs::remove_file(file) {
        warn!(file = %file.display(), error = %e, "cannot delete errorlevel probe file");
    }

    let first = text.lines().next().unwrap_or("");
    match parse_leading_int(first) {
        Some(value) => value,
        None => {
            warn!(content = %first, "malformed errorlevel probe file");
            0
        }
    }
}

/// Delete probe files in `dir` older than `max_age`, including those left
/// behind by other processes. Returns how many were removed.
pub fn purge_old_probe_files(dir: &Path, max_age: Duration) -> usize {
    let pattern = format!(
        "{}/{}*.txt",
        glob::Pattern::escape(&dir.to_string_lossy()),
        PROBE_PREFIX
    );
    let paths = match glob::glob(&pattern) {
        Ok(paths) => paths,
        Err(e) => {
            warn!(error = %e, "bad probe file pattern");
            return 0;
        }
    };

    let now = Utc::now();
    let mut removed = 0;
    for path in paths.flatten() {
        let modified = match fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(time) => DateTime::<Utc>::from(time),
            Err(e) => {
                debug!(file = %path.display(), error = %e, "cannot stat probe file");
                continue;
            }
        };
        if now.signed_duration_since(modified) <= max_age {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => warn!(file = %path.display(), error = %e, "cannot purge probe file"),
        }
    }
    if removed > 0 {
        debug!(removed, "purged old errorlevel probe files");
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_probe_file_name_uses_hex_pid() {
        let file = probe_file(Path::new("/tmp"), 0x1a2b);
        assert_eq!(file, Path::new("/tmp").join("promptline_errorlevel_1A2B.txt"));
        assert!(probe_command(&file).starts_with(" echo %errorlevel% 2>nul >\""));
    }

    #[test]
    fn test_read_probe_parses_and_deletes() {
        let temp = TempDir::new().unwrap();
        let file = probe_file(temp.path(), 7);
        fs::write(&file, "9009 \r\n").unwrap();
        assert_eq!(read_probe(&file), 9009);
        assert!(!file.exists());
    }

    #[test]
    fn test_read_probe_defaults_to_zero() {
        let temp = TempDir::new().unwrap();
        let file = probe_file(temp.path(), 7);
        assert_eq!(read_probe(&file), 0);

        fs::write(&file, "garbage").unwrap();
        assert_eq!(read_probe(&file), 0);
        assert_eq!(parse_leading_int("-2abc"), Some(-2));
    }

    #[test]
    fn test_purge_keeps_recent_files() {
        let temp = TempDir::new().unwrap();
        let file = probe_file(temp.path(), 1);
        fs::write(&file, "0").unwrap();
        fs::write(temp.path().join("unrelated.txt"), "x").unwrap();

        assert_eq!(purge_old_probe_files(temp.path(), Duration::minutes(30)), 0);
        assert!(file.exists());

        assert_eq!(purge_old_probe_files(temp.path(), Duration::seconds(-1)), 1);
        assert!(!file.exists());
        assert!(temp.path().join("unrelated.txt").exists());
    }
}
