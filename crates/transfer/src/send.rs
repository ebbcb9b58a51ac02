//! Sending a file body as a chunk stream.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use protocol::{Command, PacketHeader};
use tracing::debug;

use crate::progress::ProgressGate;
use crate::stream::{CHUNK_LEN, FramedStream};
use crate::TransferError;

/// Streams `source` over the socket as `FILE_CHUNK` frames.
///
/// Reading starts at `start_offset` (the receiver's resume point); the bytes
/// before it are assumed to already be on the receiver's disk. `progress`
/// receives `(bytes_done, bytes_total, mibps)` at most every 300 ms plus once
/// on completion, where `bytes_done` includes the skipped prefix.
pub fn send_file(
    stream: &mut FramedStream,
    source: &Path,
    session_id: u32,
    start_offset: u64,
    mut progress: impl FnMut(u64, u64, f64),
) -> Result<(), TransferError> {
    let mut file = File::open(source)?;
    let file_size = file.metadata()?.len();
    file.seek(SeekFrom::Start(start_offset))?;
    debug!(
        source = %source.display(),
        file_size,
        start_offset,
        "streaming file body"
    );

    let mut gate = ProgressGate::new(start_offset);
    let mut sent = start_offset;
    let mut buffer = vec![0u8; CHUNK_LEN];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        stream.send_header(&PacketHeader::new(
            Command::FileChunk,
            read as u32,
            session_id,
        ))?;
        stream.send_bytes(&buffer[..read])?;
        sent += read as u64;
        if let Some(mibps) = gate.poll(sent, file_size) {
            progress(sent, file_size, mibps);
        }
    }
    // Zero-length files and offset==size resumes produce no chunks; the
    // completion report still has to fire.
    if let Some(mibps) = gate.poll(sent, file_size) {
        progress(sent, file_size, mibps);
    }
    Ok(())
}
