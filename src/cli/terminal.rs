//! Terminal input via crossterm
//!
//! Translates crossterm key events into the byte sequences a VT terminal
//! would send, so that bindings can be written as plain key sequences.

use crate::cli::input::{InputEvent, InputSource};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::warn;

/// Sequence delivered for a lone Esc key. It is not a prefix of any other
/// terminal sequence, so it can be bound without ambiguity.
pub const BINDABLE_ESC: &[u8] = b"\x1b[27;27~";

/// Raw-mode keyboard input from the controlling terminal.
#[derive(Debug, Default)]
pub struct TerminalInput {
    pending: VecDeque<u8>,
    idle_due: bool,
    raw_mode: bool,
}

impl TerminalInput {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Drop for TerminalInput {
    fn drop(&mut self) {
        self.end();
    }
}

impl InputSource for TerminalInput {
    fn begin(&mut self) {
        match enable_raw_mode() {
            Ok(()) => self.raw_mode = true,
            Err(e) => warn!("cannot enable raw mode: {}", e),
        }
    }

    fn end(&mut self) {
        if self.raw_mode {
            let _ = disable_raw_mode();
            self.raw_mode = false;
        }
    }

    fn read(&mut self) -> InputEvent {
        if let Some(byte) = self.pending.pop_front() {
            return InputEvent::Byte(byte);
        }
        if self.idle_due {
            self.idle_due = false;
            match event::poll(Duration::ZERO) {
                Ok(false) => return InputEvent::Idle,
                Ok(true) => {}
                Err(e) => {
                    warn!("terminal poll failed: {}", e);
                    return InputEvent::Eof;
                }
            }
        }
        loop {
            let bytes = match event::read() {
                Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => key_to_bytes(&key),
                Ok(Event::Paste(text)) => text.into_bytes(),
                Ok(Event::Resize(_, _)) => return InputEvent::Resize,
                Ok(_) => continue,
                Err(e) => {
                    warn!("terminal read failed: {}", e);
                    return InputEvent::Eof;
                }
            };
            self.pending.extend(bytes);
            if let Some(byte) = self.pending.pop_front() {
                self.idle_due = true;
                return InputEvent::Byte(byte);
            }
        }
    }
}

fn modifier_param(modifiers: KeyModifiers) -> u8 {
    let mut param = 1;
    if modifiers.contains(KeyModifiers::SHIFT) {
        param += 1;
    }
    if modifiers.contains(KeyModifiers::ALT) {
        param += 2;
    }
    if modifiers.contains(KeyModifiers::CONTROL) {
        param += 4;
    }
    param
}

/// `ESC [ <final>` or `ESC [ 1 ; <mod> <final>` when modifiers are held.
fn csi_letter(letter: char, modifiers: KeyModifiers) -> Vec<u8> {
    match modifier_param(modifiers) {
        1 => format!("\x1b[{}", letter).into_bytes(),
        m => format!("\x1b[1;{}{}", m, letter).into_bytes(),
    }
}

/// `ESC [ <n> ~` or `ESC [ <n> ; <mod> ~` when modifiers are held.
fn csi_tilde(n: u8, modifiers: KeyModifiers) -> Vec<u8> {
    match modifier_param(modifiers) {
        1 => format!("\x1b[{}~", n).into_bytes(),
        m => format!("\x1b[{};{}~", n, m).into_bytes(),
    }
}

fn control_byte(c: char) -> Option<u8> {
    match c.to_ascii_uppercase() {
        c @ '@'..='_' => Some(c as u8 ^ 0x40),
        ' ' => Some(0),
        '?' => Some(0x7f),
        _ => None,
    }
}

/// Bytes a VT-style terminal sends for `key`.
pub fn key_to_bytes(key: &KeyEvent) -> Vec<u8> {
    let mods = key.modifiers;
    match key.code {
        KeyCode::Char(c) => {
            let mut bytes = Vec::new();
            if mods.contains(KeyModifiers::ALT) {
                bytes.push(0x1b);
            }
            match mods.contains(KeyModifiers::CONTROL).then(|| control_byte(c)).flatten() {
                Some(b) => bytes.push(b),
                None => bytes.extend(c.to_string().into_bytes()),
            }
            bytes
        }
        KeyCode::Enter => b"\r".to_vec(),
        KeyCode::Tab => b"\t".to_vec(),
        KeyCode::BackTab => b"\x1b[Z".to_vec(),
        KeyCode::Backspace if mods.contains(KeyModifiers::CONTROL) => vec![0x7f],
        KeyCode::Backspace => vec![0x08],
        KeyCode::Esc => BINDABLE_ESC.to_vec(),
        KeyCode::Up => csi_letter('A', mods),
        KeyCode::Down => csi_letter('B', mods),
        KeyCode::Right => csi_letter('C', mods),
        KeyCode::Left => csi_letter('D', mods),
        KeyCode::Home => csi_letter('H', mods),
        KeyCode::End => csi_letter('F', mods),
        KeyCode::Insert => csi_tilde(2, mods),
        KeyCode::Delete => csi_tilde(3, mods),
        KeyCode::PageUp => csi_tilde(5, mods),
        KeyCode::PageDown => csi_tilde(6, mods),
        KeyCode::F(n @ 1..=4) => format!("\x1bO{}", (b'P' + n - 1) as char).into_bytes(),
        KeyCode::F(n @ 5..=12) => {
            const CODES: [u8; 8] = [15, 17, 18, 19, 20, 21, 23, 24];
            csi_tilde(CODES[(n - 5) as usize], mods)
        }
        _ => Vec::new(),
    }
}
