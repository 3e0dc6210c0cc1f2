//! Key sequence notation
//!
//! Parses the readline-style notation used in settings (`\C-a`, `\M-f`,
//! `\e[A`, `^X`) into raw bytes, and renders raw bytes back into readable
//! key names for the help listing.

use crate::error::BindError;

const NAMED: &[(&[u8], &str)] = &[
    (b"\x1b[27;27~", "Esc"),
    (b"\x1b[A", "Up"),
    (b"\x1b[B", "Down"),
    (b"\x1b[C", "Right"),
    (b"\x1b[D", "Left"),
    (b"\x1b[H", "Home"),
    (b"\x1b[F", "End"),
    (b"\x1b[Z", "Shift-Tab"),
    (b"\x1b[1;5A", "C-Up"),
    (b"\x1b[1;5B", "C-Down"),
    (b"\x1b[1;5C", "C-Right"),
    (b"\x1b[1;5D", "C-Left"),
    (b"\x1b[1;5H", "C-Home"),
    (b"\x1b[1;5F", "C-End"),
    (b"\x1b[2~", "Ins"),
    (b"\x1b[3~", "Del"),
    (b"\x1b[3;5~", "C-Del"),
    (b"\x1b[5~", "PgUp"),
    (b"\x1b[6~", "PgDn"),
    (b"\x1bOP", "F1"),
    (b"\x1bOQ", "F2"),
    (b"\x1bOR", "F3"),
    (b"\x1bOS", "F4"),
    (b"\t", "Tab"),
    (b"\r", "Enter"),
    (b"\x08", "Backspace"),
    (b" ", "Space"),
];

fn control(c: char, spec: &str) -> Result<u8, BindError> {
    match c.to_ascii_uppercase() {
        '?' => Ok(0x7f),
        c @ '@'..='_' => Ok(c as u8 ^ 0x40),
        _ => Err(BindError::InvalidKeySequence(spec.to_string(), "control key must be a letter or @[\\]^_?")),
    }
}

/// Parse key sequence notation into bytes.
///
/// Supported escapes: `\C-x` control, `\M-x` meta (Esc prefix), `\e`, `\t`,
/// `\n`, `\r`, `\\`, `\"`, `\'`, `\xHH`, and `^X` for control characters.
pub fn parse_keyseq(spec: &str) -> Result<Vec<u8>, BindError> {
    let invalid = |why| BindError::InvalidKeySequence(spec.to_string(), why);
    let mut out = Vec::new();
    let mut chars = spec.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '^' => {
                let next = chars.next().ok_or_else(|| invalid("dangling ^"))?;
                out.push(control(next, spec)?);
            }
            '\\' => {
                let esc = chars.next().ok_or_else(|| invalid("dangling backslash"))?;
                match esc {
                    'C' | 'M' if chars.peek() == Some(&'-') => {
                        chars.next();
                        if esc == 'M' {
                            out.push(0x1b);
                            // \M-\C-x
                            if chars.peek() == Some(&'\\') {
                                continue;
                            }
                            let next = chars.next().ok_or_else(|| invalid("missing key after \\M-"))?;
                            let mut buf = [0u8; 4];
                            out.extend_from_slice(next.encode_utf8(&mut buf).as_bytes());
                        } else {
                            let next = chars.next().ok_or_else(|| invalid("missing key after \\C-"))?;
                            out.push(control(next, spec)?);
                        }
                    }
                    'e' => out.push(0x1b),
                    't' => out.push(b'\t'),
                    'n' => out.push(b'\n'),
                    'r' => out.push(b'\r'),
                    'x' => {
                        let hex: String = (0..2).filter_map(|_| chars.next_if(|c| c.is_ascii_hexdigit())).collect();
                        let byte = u8::from_str_radix(&hex, 16).map_err(|_| invalid("\\x needs hex digits"))?;
                        out.push(byte);
                    }
                    '\\' | '"' | '\'' => out.push(esc as u8),
                    _ => return Err(invalid("unknown escape")),
                }
            }
            _ => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }

    if out.is_empty() {
        return Err(BindError::EmptySequence);
    }
    Ok(out)
}

/// Render bytes as readable key names, e.g. `C-x C-r` or `M-f`.
pub fn describe_keyseq(bytes: &[u8]) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut i = 0;
    'outer: while i < bytes.len() {
        for (seq, name) in NAMED {
            if bytes[i..].starts_with(seq) {
                parts.push(name.to_string());
                i += seq.len();
                continue 'outer;
            }
        }
        let b = bytes[i];
        i += 1;
        let part = match b {
            0x1b if i < bytes.len() && bytes[i] != 0x1b => {
                let next = bytes[i];
                i += 1;
                match next {
                    0x00..=0x1f => format!("M-C-{}", ((next ^ 0x40) as char).to_ascii_lowercase()),
                    _ => format!("M-{}", next as char),
                }
            }
            0x1b => "Esc".to_string(),
            0x7f => "C-Backspace".to_string(),
            0x00..=0x1f => format!("C-{}", ((b ^ 0x40) as char).to_ascii_lowercase()),
            0x20..=0x7e => (b as char).to_string(),
            _ => {
                // Reassemble a UTF-8 character.
                let start = i - 1;
                let mut end = i;
                while end < bytes.len() && end - start < 4 && (bytes[end] & 0xc0) == 0x80 {
                    end += 1;
                }
                i = end;
                String::from_utf8_lossy(&bytes[start..end]).into_owned()
            }
        };
        parts.push(part);
    }
    parts.join(" ")
}
