//! Doskey aliases
//!
//! An alias expands the first word of a line into one or more command
//! lines. Expansions are handed out one at a time through [`DoskeyAlias`];
//! `$T` separates commands, `$1`-`$9` and `$*` insert arguments, and `$G`,
//! `$L`, `$B`, `$$` produce `>`, `<`, `|`, `$`.

use std::collections::{BTreeMap, VecDeque};

/// Pending commands of an expanded alias.
#[derive(Debug, Clone, Default)]
pub struct DoskeyAlias {
    commands: VecDeque<String>,
}

impl DoskeyAlias {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether more commands remain.
    pub fn is_pending(&self) -> bool {
        !self.commands.is_empty()
    }

    /// Take the next command.
    pub fn next(&mut self) -> Option<String> {
        self.commands.pop_front()
    }

    pub fn reset(&mut self) {
        self.commands.clear();
    }
}

#[derive(Debug, Clone, Default)]
pub struct Doskey {
    aliases: BTreeMap<String, String>,
}

impl Doskey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the alias table. Names compare case-insensitively.
    pub fn set_aliases<I, K, V>(&mut self, aliases: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        self.aliases = aliases
            .into_iter()
            .map(|(name, text)| (name.as_ref().to_lowercase(), text.into()))
            .collect();
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Expand `line` into `out` if its first word names an alias. A line
    /// starting with a space is never expanded.
    pub fn resolve(&self, line: &str, out: &mut DoskeyAlias) -> bool {
        out.reset();
        if line.starts_with([' ', '\t']) {
            return false;
        }
        let (name, rest) = match line.find([' ', '\t']) {
            Some(i) => (&line[..i], &line[i..]),
            None => (line, ""),
        };
        let Some(template) = self.aliases.get(&name.to_lowercase()) else {
            return false;
        };

        let rest = rest.trim_start_matches([' ', '\t']);
        let args: Vec<&str> = rest.split_whitespace().collect();
        let mut current = String::new();
        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '$' {
                current.push(c);
                continue;
            }
            match chars.peek().copied() {
                Some(d @ '1'..='9') => {
                    chars.next();
                    let index = d as usize - '1' as usize;
                    current.push_str(args.get(index).copied().unwrap_or(""));
                }
                Some('*') => {
                    chars.next();
                    current.push_str(rest);
                }
                Some('T' | 't') => {
                    chars.next();
                    out.commands.push_back(std::mem::take(&mut current));
                }
                Some('G' | 'g') => {
                    chars.next();
                    current.push('>');
                }
                Some('L' | 'l') => {
                    chars.next();
                    current.push('<');
                }
                Some('B' | 'b') => {
                    chars.next();
                    current.push('|');
                }
                Some('$') => {
                    chars.next();
                    current.push('$');
                }
                _ => current.push('$'),
            }
        }
        out.commands.push_back(current);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doskey() -> Doskey {
        let mut doskey = Doskey::new();
        doskey.set_aliases([
            ("ll", "dir /w $*"),
            ("Both", "echo $1$techo $2"),
            ("save", "type $1 $g $2$$"),
        ]);
        doskey
    }

    #[test]
    fn test_expands_arguments() {
        let mut alias = DoskeyAlias::new();
        assert!(doskey().resolve("LL  src  docs", &mut alias));
        assert_eq!(alias.next().as_deref(), Some("dir /w src  docs"));
        assert!(!alias.is_pending());

        assert!(doskey().resolve("save a.txt b.txt", &mut alias));
        assert_eq!(alias.next().as_deref(), Some("type a.txt > b.txt$"));
    }

    #[test]
    fn test_command_separator_queues_commands() {
        let mut alias = DoskeyAlias::new();
        assert!(doskey().resolve("both one", &mut alias));
        assert_eq!(alias.next().as_deref(), Some("echo one"));
        assert!(alias.is_pending());
        assert_eq!(alias.next().as_deref(), Some("echo "));
        assert_eq!(alias.next(), None);
    }

    #[test]
    fn test_leading_space_and_unknown_names_are_not_expanded() {
        let mut alias = DoskeyAlias::new();
        assert!(!doskey().resolve(" ll", &mut alias));
        assert!(!doskey().resolve("llama", &mut alias));
        assert!(!alias.is_pending());
    }
}
