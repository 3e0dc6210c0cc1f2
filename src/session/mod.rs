pub mod dir_history;
pub mod session;

pub use dir_history::{DirectoryHistory, MAX_DIR_HISTORY};
pub use session::{HistoryNav, Session};
