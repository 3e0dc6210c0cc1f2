//! Completion matches
//!
//! - `matches` - match entries and folding
//! - `generator` - the generator trait and builder
//! - `file_generator` - directory listing generator
//! - `engine` - generation cache, selection, sorting and restriction

pub mod engine;
pub mod file_generator;
pub mod generator;
pub mod matches;

pub use engine::{CacheCheck, GenerationKey, MatchEngine};
pub use file_generator::FileMatchGenerator;
pub use generator::{MatchBuilder, MatchGenerator};
pub use matches::{MatchEntry, MatchFolding, MatchKind, Matches};
