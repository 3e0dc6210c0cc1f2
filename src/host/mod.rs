//! Host
//!
//! - `driver` - the per-prompt state machine
//! - `doskey` - alias expansion
//! - `dir_shortcut` - directory shortcut rewrite
//! - `errorlevel` - exit status probe
//! - `scripts` - script engine interface and the builtin engine
//! - `environment` - process facts

pub mod dir_shortcut;
pub mod doskey;
pub mod driver;
pub mod environment;
pub mod errorlevel;
pub mod scripts;

pub use doskey::{Doskey, DoskeyAlias};
pub use driver::{CycleOutcome, PromptDriver, ScriptFactory};
pub use environment::{HostEnvironment, SystemEnvironment};
pub use errorlevel::ErrorlevelPhase;
pub use scripts::{BuiltinScripts, ScriptEngine};
