//! Raw key input
//!
//! The editing session reads one byte at a time. Bytes of one physical key
//! arrive back to back; when none are pending the source reports
//! [`InputEvent::Idle`], which is what finalises an incomplete escape sequence.

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Byte(u8),
    /// No further input is pending right now.
    Idle,
    /// The terminal was resized.
    Resize,
    /// Input is exhausted or failed.
    Eof,
}

/// Source of raw key bytes.
pub trait InputSource {
    /// Called when an edit starts, e.g. to enter raw mode.
    fn begin(&mut self) {}

    /// Called when an edit ends.
    fn end(&mut self) {}

    /// Block until the next event.
    fn read(&mut self) -> InputEvent;
}

/// Replays a fixed list of keys. Each key's bytes are delivered together and
/// followed by [`InputEvent::Idle`]; after the last key the source reports
/// [`InputEvent::Eof`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    keys: VecDeque<Vec<u8>>,
    pending: VecDeque<u8>,
    idle_due: bool,
}

impl ScriptedInput {
    /// One entry per physical key
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        Self {
            keys: keys.into_iter().map(|k| k.as_ref().to_vec()).collect(),
            pending: VecDeque::new(),
            idle_due: false,
        }
    }

    /// One key per char of `text`
    pub fn typed(text: &str) -> Self {
        Self::new(text.chars().map(|c| c.to_string().into_bytes()))
    }

    /// Append more keys after the ones already queued
    pub fn push_key(&mut self, key: impl AsRef<[u8]>) {
        self.keys.push_back(key.as_ref().to_vec());
    }

    pub fn is_exhausted(&self) -> bool {
        self.keys.is_empty() && self.pending.is_empty()
    }
}

impl InputSource for ScriptedInput {
    fn read(&mut self) -> InputEvent {
        if let Some(byte) = self.pending.pop_front() {
            return InputEvent::Byte(byte);
        }
        if self.idle_due {
            self.idle_due = false;
            return InputEvent::Idle;
        }
        match self.keys.pop_front() {
            Some(key) => {
                self.pending.extend(key);
                self.idle_due = true;
                match self.pending.pop_front() {
                    Some(byte) => InputEvent::Byte(byte),
                    None => InputEvent::Idle,
                }
            }
            None => InputEvent::Eof,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_keys_are_separated_by_idle() {
        let mut input = ScriptedInput::new(["\x1b[A", "x"]);
        let events: Vec<InputEvent> = std::iter::from_fn(|| match input.read() {
            InputEvent::Eof => None,
            event => Some(event),
        })
        .collect();

        assert_eq!(
            events,
            vec![
                InputEvent::Byte(0x1b),
                InputEvent::Byte(b'['),
                InputEvent::Byte(b'A'),
                InputEvent::Idle,
                InputEvent::Byte(b'x'),
                InputEvent::Idle,
            ]
        );
        assert!(input.is_exhausted());
    }

    #[test]
    fn test_typed_splits_chars() {
        let mut input = ScriptedInput::typed("é");
        assert_eq!(input.read(), InputEvent::Byte(0xc3));
        assert_eq!(input.read(), InputEvent::Byte(0xa9));
        assert_eq!(input.read(), InputEvent::Idle);
        assert_eq!(input.read(), InputEvent::Eof);
    }
}
