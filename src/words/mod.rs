//! Words
//!
//! - `line_state` - words and the line they were collected from
//! - `collector` - shell-style word collection
//! - `classifier` - word classes and the classification cache

pub mod classifier;
pub mod collector;
pub mod line_state;

pub use classifier::{Classifier, ClassifierCache, ClassifyKey, WordClass, WordClassifications};
pub use collector::{apply_word_break, widest_word_break, CollectMode, WordCollector};
pub use line_state::{LineState, Word, WordBreakInfo};
