//! The sender's unit of work.

use std::path::PathBuf;

use tracing::warn;
use walkdir::WalkDir;

/// One queued file transfer.
///
/// Jobs are streamed strictly in insertion order; the first job's
/// `session_id` names the session.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransferJob {
    /// Local path the bytes are read from.
    pub source_path: PathBuf,
    /// Receiver-relative path announced in the file metadata.
    pub logical_filename: String,
    /// Session the job belongs to.
    pub session_id: u32,
}

/// Expands caller-supplied paths into a FIFO job list.
///
/// A plain file becomes one job named by its file name. A directory expands
/// into one job per regular file beneath it, in a deterministic walk order,
/// with the logical name preserving the relative subpath under the
/// directory's base name. Anything else is skipped with a warning.
#[must_use]
pub fn expand_paths(paths: &[PathBuf], session_id: u32) -> Vec<TransferJob> {
    let mut jobs = Vec::new();
    for path in paths {
        if path.is_dir() {
            let base = path.file_name().map_or_else(PathBuf::new, PathBuf::from);
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(error) => {
                        warn!(%error, "skipping unreadable directory entry");
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                let Ok(relative) = entry.path().strip_prefix(path) else {
                    continue;
                };
                let logical = base.join(relative);
                jobs.push(TransferJob {
                    source_path: entry.into_path(),
                    logical_filename: logical.to_string_lossy().into_owned(),
                    session_id,
                });
            }
        } else if path.is_file() {
            let logical = path
                .file_name()
                .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
            jobs.push(TransferJob {
                source_path: path.clone(),
                logical_filename: logical,
                session_id,
            });
        } else {
            warn!(path = %path.display(), "skipping path that is neither a file nor a directory");
        }
    }
    jobs
}
