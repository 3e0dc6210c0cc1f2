//! Line editor
//!
//! - `session` - the per-line edit loop
//! - `context` - state shared by command handlers
//! - `handlers` - command registry
//! - `module` / `modules` - the module stack: core, popup and pager
//! - `default_bindings` - built-in key bindings

pub mod context;
pub mod default_bindings;
pub mod handlers;
pub mod module;
pub mod modules;
pub mod session;

pub use context::{CommandResult, EditContext, EditFlags};
pub use default_bindings::{apply_user_bindings, install_default_bindings};
pub use handlers::{registry, CommandEntry};
pub use module::{EditorModule, UnboundAction};
pub use session::EditingSession;
