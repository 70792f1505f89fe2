// Denylist infra layer.
// - `file_source.rs` reads the denylist text from disk.
// - `file_watcher.rs` reloads the store whenever that file changes.

#[path = "file_source.rs"]
pub mod file_source;

#[path = "file_watcher.rs"]
pub mod file_watcher;

pub use file_source::FileDenylistSource;
pub use file_watcher::{DenylistWatcher, WatcherState};
