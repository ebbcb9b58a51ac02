//! Receiving a file body into a resumable partial file.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use protocol::Command;
use tracing::{debug, warn};

use crate::progress::ProgressGate;
use crate::stream::{CHUNK_LEN, FramedStream};
use crate::TransferError;

/// Suffix appended to the destination name while a download is in flight.
pub const PARTIAL_SUFFIX: &str = ".fluxpart";

/// How a single file stream ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransferOutcome {
    /// Every byte arrived and the partial was renamed into place.
    Completed,
    /// The sender cancelled mid-stream; the partial was deleted.
    CancelledBySender,
    /// The local cancel flag was set; the partial is retained for resume.
    CancelledLocally,
}

/// Returns the partial-file sibling for a destination path.
#[must_use]
pub fn partial_path(final_path: &Path) -> PathBuf {
    let mut name = final_path.as_os_str().to_owned();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

/// Consumes one file's chunk stream into `<final_path>.fluxpart`.
///
/// The partial is appended from `start_offset` (which must equal its current
/// length) and renamed to `final_path` once `expected_size` bytes are on
/// disk. Mid-stream `CANCEL` from the sender deletes the partial; a set
/// `cancel` flag answers with `CANCEL` and keeps it. An all-zero header here
/// is a mid-file disconnect, not orderly termination, and also keeps the
/// partial.
pub fn receive_file(
    stream: &mut FramedStream,
    final_path: &Path,
    expected_size: u64,
    start_offset: u64,
    session_id: u32,
    cancel: Option<&AtomicBool>,
    mut progress: impl FnMut(u64, u64, f64),
) -> Result<TransferOutcome, TransferError> {
    let part_path = partial_path(final_path);
    if let Some(parent) = final_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let mut file = if start_offset > 0 {
        OpenOptions::new().append(true).open(&part_path)?
    } else {
        File::create(&part_path)?
    };
    debug!(
        part = %part_path.display(),
        expected_size,
        start_offset,
        "receiving file body"
    );

    let mut gate = ProgressGate::new(start_offset);
    let mut received = start_offset;
    let mut buffer = vec![0u8; CHUNK_LEN];
    while received < expected_size {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            stream.send_control(Command::Cancel, 0, session_id)?;
            debug!(part = %part_path.display(), received, "local cancel, partial retained");
            return Ok(TransferOutcome::CancelledLocally);
        }

        let header = stream.recv_header()?;
        if header.is_disconnect() {
            return Err(TransferError::PeerDisconnected);
        }
        match header.command() {
            Some(Command::FileChunk) => {
                let mut remaining = header.payload_size as usize;
                while remaining > 0 {
                    let take = remaining.min(buffer.len());
                    stream.recv_exact(&mut buffer[..take])?;
                    file.write_all(&buffer[..take])?;
                    remaining -= take;
                }
                received += u64::from(header.payload_size);
                if let Some(mibps) = gate.poll(received, expected_size) {
                    progress(received, expected_size, mibps);
                }
            }
            Some(Command::Cancel) => {
                drop(file);
                fs::remove_file(&part_path)?;
                debug!(part = %part_path.display(), "sender cancelled, partial deleted");
                return Ok(TransferOutcome::CancelledBySender);
            }
            Some(Command::Ping) => {
                stream.send_control(Command::Pong, 0, header.session_id)?;
            }
            _ => {
                warn!(command = header.command, "ignoring unexpected packet mid-stream");
            }
        }
    }
    file.sync_all()?;
    drop(file);

    if let Some(mibps) = gate.poll(received, expected_size) {
        progress(received, expected_size, mibps);
    }
    fs::rename(&part_path, final_path)?;
    Ok(TransferOutcome::Completed)
}
