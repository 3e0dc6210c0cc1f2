//! Bind Resolver
//!
//! Feeds input bytes one at a time through the active bind group.

use crate::binder::binder::{Binder, Binding, GroupId, Lookup};

/// Outcome of consuming one byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The bytes so far are a prefix of a binding.
    NeedMore,
    Resolved { binding: Binding, chord: Vec<u8> },
    /// No binding; the caller decides whether to insert `chord`.
    Unbound { chord: Vec<u8> },
    /// Swallowed: the rest of a key sequence that already went unbound.
    Discarded,
}

/// Per-edit resolver state. Unbound is sticky: once a multi-byte sequence
/// fails to resolve, its remaining bytes are discarded until the input
/// source reports that nothing more is pending.
#[derive(Debug, Clone)]
pub struct BindResolver {
    group: GroupId,
    chord: Vec<u8>,
    utf8_remaining: usize,
    discarding: bool,
}

fn utf8_len(lead: u8) -> usize {
    match lead {
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        _ => 1,
    }
}

impl BindResolver {
    pub fn new(group: GroupId) -> Self {
        Self {
            group,
            chord: Vec::new(),
            utf8_remaining: 0,
            discarding: false,
        }
    }

    pub fn group(&self) -> GroupId {
        self.group
    }

    /// Switch to another group, dropping any partial sequence.
    pub fn set_group(&mut self, group: GroupId) {
        self.group = group;
        self.reset();
    }

    /// Cancel any partial sequence.
    pub fn reset(&mut self) {
        self.chord.clear();
        self.utf8_remaining = 0;
        self.discarding = false;
    }

    pub fn is_accumulating(&self) -> bool {
        !self.chord.is_empty()
    }

    pub fn consume(&mut self, binder: &Binder, byte: u8) -> Resolution {
        if self.discarding {
            return Resolution::Discarded;
        }

        if self.utf8_remaining > 0 {
            if byte & 0xc0 != 0x80 {
                // Malformed continuation: give up on the character.
                self.utf8_remaining = 0;
                self.discarding = true;
                return Resolution::Unbound { chord: std::mem::take(&mut self.chord) };
            }
            self.chord.push(byte);
            self.utf8_remaining -= 1;
            if self.utf8_remaining == 0 {
                return Resolution::Unbound { chord: std::mem::take(&mut self.chord) };
            }
            return Resolution::NeedMore;
        }

        self.chord.push(byte);
        match binder.lookup(self.group, &self.chord) {
            Lookup::Bound(binding) => Resolution::Resolved {
                binding: binding.clone(),
                chord: std::mem::take(&mut self.chord),
            },
            Lookup::Prefix => Resolution::NeedMore,
            Lookup::Unbound => {
                if self.chord.len() == 1 && utf8_len(byte) > 1 {
                    self.utf8_remaining = utf8_len(byte) - 1;
                    return Resolution::NeedMore;
                }
                let chord = std::mem::take(&mut self.chord);
                if chord.len() > 1 || chord[0] == 0x1b {
                    self.discarding = true;
                }
                Resolution::Unbound { chord }
            }
        }
    }

    /// Called when no more input is pending. A partial escape sequence
    /// arrives from the terminal as one key, so it is final at this point and
    /// resolves as unbound. Any other partial chord was typed key by key and
    /// keeps accumulating.
    pub fn finish(&mut self) -> Option<Resolution> {
        self.discarding = false;
        if self.chord.first() != Some(&0x1b) {
            return None;
        }
        self.utf8_remaining = 0;
        Some(Resolution::Unbound { chord: std::mem::take(&mut self.chord) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::EditCommand;

    fn binder() -> (Binder, GroupId) {
        let mut binder = Binder::new();
        let g = binder.create_group("default");
        binder.bind(g, b"\x1b[A", Binding::Command(EditCommand::PreviousHistory)).unwrap();
        binder.bind(g, b"\x01", Binding::Command(EditCommand::BeginningOfLine)).unwrap();
        binder.bind(g, b"\x1b.", Binding::Macro("..\\".into())).unwrap();
        (binder, g)
    }

    fn feed(resolver: &mut BindResolver, binder: &Binder, bytes: &[u8]) -> Vec<Resolution> {
        bytes.iter().map(|b| resolver.consume(binder, *b)).collect()
    }

    #[test]
    fn test_single_and_multi_byte_bindings() {
        let (binder, g) = binder();
        let mut resolver = BindResolver::new(g);

        assert_eq!(
            resolver.consume(&binder, 0x01),
            Resolution::Resolved {
                binding: Binding::Command(EditCommand::BeginningOfLine),
                chord: vec![0x01]
            }
        );

        let out = feed(&mut resolver, &binder, b"\x1b[A");
        assert_eq!(out[0], Resolution::NeedMore);
        assert_eq!(out[1], Resolution::NeedMore);
        assert!(matches!(out[2], Resolution::Resolved { .. }));
        assert!(!resolver.is_accumulating());
    }

    #[test]
    fn test_plain_char_is_unbound() {
        let (binder, g) = binder();
        let mut resolver = BindResolver::new(g);
        assert_eq!(resolver.consume(&binder, b'x'), Resolution::Unbound { chord: vec![b'x'] });
        assert_eq!(resolver.consume(&binder, b'y'), Resolution::Unbound { chord: vec![b'y'] });
    }

    #[test]
    fn test_unbound_is_sticky_until_finish() {
        let (binder, g) = binder();
        let mut resolver = BindResolver::new(g);

        let out = feed(&mut resolver, &binder, b"\x1b[1;5Q");
        assert_eq!(out[0], Resolution::NeedMore);
        assert_eq!(out[1], Resolution::NeedMore);
        assert_eq!(out[2], Resolution::Unbound { chord: b"\x1b[1".to_vec() });
        assert!(out[3..].iter().all(|r| *r == Resolution::Discarded));

        assert_eq!(resolver.finish(), None);
        assert_eq!(resolver.consume(&binder, b'x'), Resolution::Unbound { chord: vec![b'x'] });
    }

    #[test]
    fn test_finish_finalises_partial_sequence() {
        let (binder, g) = binder();
        let mut resolver = BindResolver::new(g);
        assert_eq!(resolver.consume(&binder, 0x1b), Resolution::NeedMore);
        assert_eq!(resolver.finish(), Some(Resolution::Unbound { chord: vec![0x1b] }));
        assert!(!resolver.is_accumulating());
    }

    #[test]
    fn test_typed_chord_survives_finish() {
        let (mut binder, g) = binder();
        binder.bind(g, b"\x18\x12", Binding::Macro("CHORD".into())).unwrap();
        let mut resolver = BindResolver::new(g);

        assert_eq!(resolver.consume(&binder, 0x18), Resolution::NeedMore);
        assert_eq!(resolver.finish(), None);
        assert!(resolver.is_accumulating());
        assert_eq!(
            resolver.consume(&binder, 0x12),
            Resolution::Resolved {
                binding: Binding::Macro("CHORD".into()),
                chord: vec![0x18, 0x12]
            }
        );
    }

    #[test]
    fn test_utf8_characters_are_collected() {
        let (binder, g) = binder();
        let mut resolver = BindResolver::new(g);
        let out = feed(&mut resolver, &binder, "é".as_bytes());
        assert_eq!(out, vec![Resolution::NeedMore, Resolution::Unbound { chord: "é".as_bytes().to_vec() }]);
    }

    #[test]
    fn test_set_group_resets() {
        let (mut binder, g) = binder();
        let popup = binder.create_group("selectcomplete");
        let mut resolver = BindResolver::new(g);
        resolver.consume(&binder, 0x1b);
        resolver.set_group(popup);
        assert_eq!(resolver.group(), popup);
        assert!(!resolver.is_accumulating());
    }
}
