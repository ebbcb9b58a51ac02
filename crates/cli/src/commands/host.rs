//! `fluxdrop host` - serve a queue of files to one receiver.

use std::path::PathBuf;

use engine::{InstanceId, SenderSession, SessionError, expand_paths};
use rand::Rng;
use rand::rngs::OsRng;
use tracing::info;

use crate::console;

/// Queues the given paths under a fresh session id and serves them.
pub fn host(paths: &[PathBuf], instance_id: InstanceId) -> Result<(), SessionError> {
    // Six digits keeps the id easy to read out loud next to the PIN.
    let session_id: u32 = OsRng.gen_range(100_000..=999_999);
    let jobs = expand_paths(paths, session_id);
    if jobs.is_empty() {
        eprintln!("fluxdrop: no transferable files in the given paths");
        return Err(SessionError::NoWork);
    }

    info!(session_id, jobs = jobs.len(), "hosting session");
    println!("Session {session_id}: {} file(s) queued", jobs.len());
    SenderSession::new(jobs, console::sender_callbacks(), instance_id).run()
}
