//! Key Binder
//!
//! One byte trie per named bind group. Leaves hold a command or a macro
//! string. Within a group no bound sequence may be a prefix of another bound
//! sequence; [`Binder::bind`] refuses such registrations and
//! [`Binder::rebind`] is the explicit path that replaces them.

use crate::binder::keyseq::describe_keyseq;
use crate::cli::commands::EditCommand;
use crate::error::BindError;
use std::collections::BTreeMap;
use std::str::FromStr;

/// What a key sequence is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Command(EditCommand),
    /// Text inserted as if typed.
    Macro(String),
}

impl Binding {
    /// Parse a binding target: a quoted string is a macro, anything else a
    /// command name.
    pub fn parse(target: &str) -> Result<Self, BindError> {
        let target = target.trim();
        if let Some(text) = target.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
            return Ok(Self::Macro(text.replace("\\\"", "\"")));
        }
        EditCommand::from_str(target)
            .map(Self::Command)
            .map_err(|_| BindError::UnknownCommand(target.to_string()))
    }

    /// Short label for listings.
    pub fn label(&self) -> String {
        match self {
            Self::Command(cmd) => cmd.name().to_string(),
            Self::Macro(text) => format!("\"{}\"", text),
        }
    }
}

/// Handle to a bind group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(usize);

/// Result of looking up a partial or complete key sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    Bound(&'a Binding),
    /// The sequence is a strict prefix of at least one binding.
    Prefix,
    Unbound,
}

#[derive(Debug, Clone, Default)]
struct TrieNode {
    children: BTreeMap<u8, TrieNode>,
    binding: Option<Binding>,
}

impl TrieNode {
    fn collect(&self, prefix: &mut Vec<u8>, out: &mut Vec<(Vec<u8>, Binding)>) {
        if let Some(binding) = &self.binding {
            out.push((prefix.clone(), binding.clone()));
        }
        for (byte, child) in &self.children {
            prefix.push(*byte);
            child.collect(prefix, out);
            prefix.pop();
        }
    }

    fn take(&mut self, seq: &[u8]) -> Option<Binding> {
        match seq.split_first() {
            None => self.binding.take(),
            Some((byte, rest)) => {
                let child = self.children.get_mut(byte)?;
                let taken = child.take(rest);
                if child.binding.is_none() && child.children.is_empty() {
                    self.children.remove(byte);
                }
                taken
            }
        }
    }

    fn first_bound_descendant(&self, prefix: &mut Vec<u8>) -> bool {
        for (byte, child) in &self.children {
            prefix.push(*byte);
            if child.binding.is_some() || child.first_bound_descendant(prefix) {
                return true;
            }
            prefix.pop();
        }
        false
    }
}

#[derive(Debug, Clone)]
struct BindGroup {
    name: String,
    root: TrieNode,
}

/// Forest of bind groups.
#[derive(Debug, Clone, Default)]
pub struct Binder {
    groups: Vec<BindGroup>,
}

impl Binder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a group, or return the existing group of that name.
    pub fn create_group(&mut self, name: &str) -> GroupId {
        if let Some(id) = self.get_group(name) {
            return id;
        }
        self.groups.push(BindGroup {
            name: name.to_string(),
            root: TrieNode::default(),
        });
        GroupId(self.groups.len() - 1)
    }

    pub fn get_group(&self, name: &str) -> Option<GroupId> {
        self.groups.iter().position(|g| g.name == name).map(GroupId)
    }

    pub fn group_name(&self, group: GroupId) -> Option<&str> {
        self.groups.get(group.0).map(|g| g.name.as_str())
    }

    fn root_mut(&mut self, group: GroupId) -> Result<&mut TrieNode, BindError> {
        self.groups
            .get_mut(group.0)
            .map(|g| &mut g.root)
            .ok_or(BindError::UnknownGroup(group.0))
    }

    /// Bind `seq` in `group`. Fails on an empty sequence, an already bound
    /// sequence, or when `seq` and an existing binding are prefixes of one
    /// another.
    pub fn bind(&mut self, group: GroupId, seq: &[u8], binding: Binding) -> Result<(), BindError> {
        if seq.is_empty() {
            return Err(BindError::EmptySequence);
        }
        let ambiguous = |existing: &[u8]| BindError::Ambiguous {
            sequence: describe_keyseq(seq),
            existing: describe_keyseq(existing),
        };

        let mut node = self.root_mut(group)?;
        for (i, byte) in seq.iter().enumerate() {
            node = node.children.entry(*byte).or_default();
            if node.binding.is_some() {
                return Err(ambiguous(&seq[..=i]));
            }
        }
        let mut longer = seq.to_vec();
        if node.first_bound_descendant(&mut longer) {
            return Err(ambiguous(&longer));
        }
        node.binding = Some(binding);
        Ok(())
    }

    /// Bind `seq`, replacing the binding on `seq` itself and every binding
    /// that is a prefix or an extension of it. Returns what was replaced.
    pub fn rebind(&mut self, group: GroupId, seq: &[u8], binding: Binding) -> Result<Vec<(Vec<u8>, Binding)>, BindError> {
        if seq.is_empty() {
            return Err(BindError::EmptySequence);
        }
        let mut replaced = Vec::new();
        let mut node = self.root_mut(group)?;
        for (i, byte) in seq.iter().enumerate() {
            node = node.children.entry(*byte).or_default();
            if i + 1 < seq.len() {
                if let Some(old) = node.binding.take() {
                    replaced.push((seq[..=i].to_vec(), old));
                }
            }
        }
        let mut prefix = seq.to_vec();
        node.collect(&mut prefix, &mut replaced);
        node.children.clear();
        node.binding = Some(binding);
        Ok(replaced)
    }

    /// Remove the binding on exactly `seq`, pruning emptied branches.
    pub fn unbind(&mut self, group: GroupId, seq: &[u8]) -> Option<Binding> {
        let root = self.groups.get_mut(group.0).map(|g| &mut g.root)?;
        root.take(seq)
    }

    pub fn lookup(&self, group: GroupId, seq: &[u8]) -> Lookup<'_> {
        let mut node = match self.groups.get(group.0) {
            Some(g) => &g.root,
            None => return Lookup::Unbound,
        };
        for byte in seq {
            node = match node.children.get(byte) {
                Some(child) => child,
                None => return Lookup::Unbound,
            };
        }
        match &node.binding {
            Some(binding) => Lookup::Bound(binding),
            None if !node.children.is_empty() => Lookup::Prefix,
            None => Lookup::Unbound,
        }
    }

    /// All bindings in `group`, ordered by key bytes.
    pub fn bindings(&self, group: GroupId) -> Vec<(Vec<u8>, Binding)> {
        let mut out = Vec::new();
        if let Some(g) = self.groups.get(group.0) {
            g.root.collect(&mut Vec::new(), &mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(c: EditCommand) -> Binding {
        Binding::Command(c)
    }

    #[test]
    fn test_groups_are_named_once() {
        let mut binder = Binder::new();
        let a = binder.create_group("default");
        let b = binder.create_group("pager");
        assert_ne!(a, b);
        assert_eq!(binder.create_group("default"), a);
        assert_eq!(binder.get_group("pager"), Some(b));
        assert_eq!(binder.group_name(b), Some("pager"));
        assert_eq!(binder.get_group("missing"), None);
    }

    #[test]
    fn test_bind_rejects_empty_and_duplicates() {
        let mut binder = Binder::new();
        let g = binder.create_group("default");
        assert!(matches!(binder.bind(g, b"", cmd(EditCommand::Undo)), Err(BindError::EmptySequence)));
        binder.bind(g, b"x", cmd(EditCommand::Undo)).unwrap();
        assert!(matches!(binder.bind(g, b"x", cmd(EditCommand::Yank)), Err(BindError::Ambiguous { .. })));
        assert_eq!(binder.lookup(g, b"x"), Lookup::Bound(&cmd(EditCommand::Undo)));
    }

    #[test]
    fn test_bind_rejects_longer_sequence_over_prefix() {
        let mut binder = Binder::new();
        let g = binder.create_group("default");
        binder.bind(g, b"a", cmd(EditCommand::Undo)).unwrap();
        assert!(matches!(binder.bind(g, b"ab", cmd(EditCommand::Yank)), Err(BindError::Ambiguous { .. })));
        assert_eq!(binder.lookup(g, b"ab"), Lookup::Unbound);
    }

    #[test]
    fn test_bind_rejects_prefix_of_longer_sequence() {
        let mut binder = Binder::new();
        let g = binder.create_group("default");
        binder.bind(g, b"ab", cmd(EditCommand::Yank)).unwrap();
        let err = binder.bind(g, b"a", cmd(EditCommand::Undo)).unwrap_err();
        assert_eq!(err.to_string(), "key sequence a conflicts with bound sequence a b");
        assert_eq!(binder.lookup(g, b"a"), Lookup::Prefix);
    }

    #[test]
    fn test_groups_do_not_conflict() {
        let mut binder = Binder::new();
        let g = binder.create_group("default");
        let p = binder.create_group("selectcomplete");
        binder.bind(g, b"a", cmd(EditCommand::Undo)).unwrap();
        binder.bind(p, b"ab", cmd(EditCommand::PopupNext)).unwrap();
        assert_eq!(binder.lookup(p, b"a"), Lookup::Prefix);
    }

    #[test]
    fn test_rebind_replaces_conflicts() {
        let mut binder = Binder::new();
        let g = binder.create_group("default");
        binder.bind(g, b"ab", cmd(EditCommand::Yank)).unwrap();
        binder.bind(g, b"ac", cmd(EditCommand::Undo)).unwrap();

        let replaced = binder.rebind(g, b"a", Binding::Macro("hi".into())).unwrap();
        assert_eq!(replaced.len(), 2);
        assert_eq!(binder.lookup(g, b"a"), Lookup::Bound(&Binding::Macro("hi".into())));

        let replaced = binder.rebind(g, b"ax", cmd(EditCommand::Abort)).unwrap();
        assert_eq!(replaced, vec![(b"a".to_vec(), Binding::Macro("hi".into()))]);
        assert_eq!(binder.lookup(g, b"a"), Lookup::Prefix);
    }

    #[test]
    fn test_unbind_and_listing() {
        let mut binder = Binder::new();
        let g = binder.create_group("default");
        binder.bind(g, b"\x1b[A", cmd(EditCommand::PreviousHistory)).unwrap();
        binder.bind(g, b"\x01", cmd(EditCommand::BeginningOfLine)).unwrap();

        let listed: Vec<Vec<u8>> = binder.bindings(g).into_iter().map(|(seq, _)| seq).collect();
        assert_eq!(listed, vec![b"\x01".to_vec(), b"\x1b[A".to_vec()]);

        assert_eq!(binder.unbind(g, b"\x01"), Some(cmd(EditCommand::BeginningOfLine)));
        assert_eq!(binder.unbind(g, b"\x01"), None);
        assert_eq!(binder.lookup(g, b"\x01"), Lookup::Unbound);
    }

    #[test]
    fn test_binding_parse() {
        assert_eq!(Binding::parse("undo").unwrap(), cmd(EditCommand::Undo));
        assert_eq!(Binding::parse("\"cd ..\"").unwrap(), Binding::Macro("cd ..".into()));
        assert!(matches!(Binding::parse("frobnicate"), Err(BindError::UnknownCommand(_))));
    }
}
