//! The three command frontends.

mod connect;
mod host;
mod join;

pub use connect::connect;
pub use host::host;
pub use join::join;

use std::path::PathBuf;

/// Resolves the directory received files are saved under.
fn resolve_save_dir(save_dir: Option<PathBuf>) -> PathBuf {
    save_dir.unwrap_or_else(engine::storage::default_save_dir)
}
