//! Key binding
//!
//! - `keyseq` - key sequence notation
//! - `binder` - bind groups and their tries
//! - `bind_resolver` - byte-at-a-time resolution against a group

pub mod binder;
pub mod bind_resolver;
pub mod keyseq;

pub use binder::{Binder, Binding, GroupId, Lookup};
pub use bind_resolver::{BindResolver, Resolution};
pub use keyseq::{describe_keyseq, parse_keyseq};
