//! Directory shortcuts
//!
//! A line that is just a directory (`src\`, `"Program Files\"`, `~\`), a run
//! of dots (`...` is two levels up), or `-` / `cd -` for the previous
//! directory is rewritten into an explicit `cd /d` command.

use crate::cli::utils::is_path_separator;
use crate::host::environment::HostEnvironment;
use crate::session::DirectoryHistory;

/// Commands that defeat the shortcut when they form the first path
/// component unquoted, e.g. `cd..` or `echo.`.
const SHELL_COMMANDS: &[&str] = &["call", "cd", "chdir", "dir", "echo", "md", "mkdir", "popd", "pushd"];

fn cd_command(dir: &str) -> String {
    format!(" cd /d \"{}\"", dir)
}

/// The single token `line` consists of, with quotes removed. Fails on more
/// than one token and on characters that make the line a real command.
fn parse_line_token(line: &str) -> Option<String> {
    let line = line.trim_start_matches([' ', '\t']);
    let mut token = String::new();
    let mut quoted = false;
    let mut first_component = true;

    for (i, c) in line.char_indices() {
        match c {
            ' ' | '\t' if !quoted => {
                let trailing_only = line[i..].trim_start_matches([' ', '\t']).is_empty();
                return (trailing_only && !token.is_empty()).then_some(token);
            }
            '^' | '<' | '|' | '>' | '%' => return None,
            '@' | '(' | ')' | '&' | '+' | '=' | ';' | ',' if !quoted => return None,
            '"' => {
                first_component = false;
                quoted = !quoted;
                continue;
            }
            '.' | '/' | '\\' if first_component => {
                if SHELL_COMMANDS.iter().any(|cmd| token.eq_ignore_ascii_case(cmd)) {
                    return None;
                }
                first_component = false;
            }
            _ => {}
        }
        token.push(c);
    }
    (!token.is_empty()).then_some(token)
}

/// `...` becomes `..\..\`; a lone trailing separator is allowed.
fn expand_dots(token: &str) -> Option<String> {
    let dots = token.chars().take_while(|&c| c == '.').count();
    let rest = &token[dots..];
    let only_dots = rest.is_empty() || (rest.len() == 1 && rest.starts_with(is_path_separator));
    (only_dots && dots >= 2).then(|| "..\\".repeat(dots - 1))
}

/// Whether `token` is `..` repeated with separators, e.g. `..\..`.
fn is_parent_chain(token: &str) -> bool {
    token.split(is_path_separator).all(|part| part == "..")
}

fn expand_home(token: &str, env: &dyn HostEnvironment) -> String {
    let Some(rest) = token.strip_prefix('~') else {
        return token.to_string();
    };
    if !(rest.is_empty() || rest.starts_with(is_path_separator)) {
        return token.to_string();
    }
    match env.home_dir() {
        Some(home) => format!("{}{}", home.to_string_lossy(), rest),
        None => token.to_string(),
    }
}

/// Rewrite `line` if it is a directory shortcut. `-` with fewer than two
/// remembered directories yields an empty line.
pub fn rewrite_directory_shortcut(
    line: &str,
    history: &DirectoryHistory,
    env: &dyn HostEnvironment,
) -> Option<String> {
    if line == "-" || line.eq_ignore_ascii_case("cd -") || line.eq_ignore_ascii_case("chdir -") {
        let previous = history.previous().map(|dir| cd_command(&dir.to_string_lossy()));
        return Some(previous.unwrap_or_default());
    }

    let mut token = parse_line_token(line)?;
    if let Some(dots) = expand_dots(&token) {
        token = dots;
    }

    if !token.ends_with(is_path_separator) {
        // Without a trailing separator only `..\..` style chains count, so
        // a program named like a subdirectory still runs.
        if !is_parent_chain(&token) {
            return None;
        }
        token.push('\\');
    }

    let token = expand_home(&token, env);
    if !env.is_dir(&token) {
        return None;
    }
    Some(cd_command(&token.replace('/', "\\")))
}
