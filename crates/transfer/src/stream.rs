//! Exact-length frame I/O over a blocking TCP stream.

use std::io::{self, Read, Write};
use std::net::TcpStream;

use protocol::{Command, FileInfo, HEADER_LEN, PacketHeader};

use crate::TransferError;

/// Buffer size for file body chunks.
pub const CHUNK_LEN: usize = 64 * 1024;

/// Ceiling on control payloads (metadata, digests).
///
/// File chunks are streamed through a fixed buffer and are not subject to
/// this limit; it only stops a malformed control frame from driving a large
/// allocation.
pub const MAX_CONTROL_PAYLOAD: u32 = 64 * 1024;

/// A connected socket that speaks in whole frames.
///
/// The stream is owned exclusively by one session thread; all reads and
/// writes are synchronous and unbounded, relying on TCP liveness plus the
/// protocol's `PING`/`PONG` exchange.
#[derive(Debug)]
pub struct FramedStream {
    inner: TcpStream,
}

impl FramedStream {
    /// Wraps a connected stream.
    #[must_use]
    pub fn new(stream: TcpStream) -> Self {
        Self { inner: stream }
    }

    /// Returns the underlying socket, e.g. for peer address queries.
    #[must_use]
    pub fn get_ref(&self) -> &TcpStream {
        &self.inner
    }

    /// Writes a header frame.
    pub fn send_header(&mut self, header: &PacketHeader) -> io::Result<()> {
        self.inner.write_all(&header.to_bytes())
    }

    /// Writes a header-only control frame.
    pub fn send_control(
        &mut self,
        command: Command,
        payload_size: u32,
        session_id: u32,
    ) -> io::Result<()> {
        self.send_header(&PacketHeader::new(command, payload_size, session_id))
    }

    /// Writes raw payload bytes following a previously sent header.
    pub fn send_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes)
    }

    /// Reads exactly one 16-byte header.
    ///
    /// A clean peer close at any point of the read yields the
    /// [`PacketHeader::DISCONNECT`] sentinel; other I/O failures propagate.
    pub fn recv_header(&mut self) -> io::Result<PacketHeader> {
        let mut buffer = [0u8; HEADER_LEN];
        match self.inner.read_exact(&mut buffer) {
            Ok(()) => Ok(PacketHeader::from_bytes(&buffer)),
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                Ok(PacketHeader::DISCONNECT)
            }
            Err(error) => Err(error),
        }
    }

    /// Fills `buffer` from the stream, mapping EOF to
    /// [`TransferError::PeerDisconnected`].
    pub fn recv_exact(&mut self, buffer: &mut [u8]) -> Result<(), TransferError> {
        self.inner.read_exact(buffer).map_err(|error| {
            if error.kind() == io::ErrorKind::UnexpectedEof {
                TransferError::PeerDisconnected
            } else {
                TransferError::Io(error)
            }
        })
    }

    /// Reads a control payload of exactly `len` bytes.
    pub fn recv_control_payload(&mut self, len: u32) -> Result<Vec<u8>, TransferError> {
        if len > MAX_CONTROL_PAYLOAD {
            return Err(TransferError::OversizePayload {
                got: len,
                max: MAX_CONTROL_PAYLOAD,
            });
        }
        let mut payload = vec![0u8; len as usize];
        self.recv_exact(&mut payload)?;
        Ok(payload)
    }

    /// Encodes `info` as JSON and writes a `FILE_META` frame carrying it.
    pub fn send_file_meta(&mut self, info: &FileInfo, session_id: u32) -> Result<(), TransferError> {
        let payload = info.to_json()?;
        self.send_header(&PacketHeader::new(
            Command::FileMeta,
            payload.len() as u32,
            session_id,
        ))?;
        self.send_bytes(payload.as_bytes())?;
        Ok(())
    }

    /// Reads and parses a `FILE_META` payload of the announced size.
    pub fn recv_file_meta(&mut self, payload_size: u32) -> Result<FileInfo, TransferError> {
        let payload = self.recv_control_payload(payload_size)?;
        Ok(FileInfo::from_json(&payload)?)
    }
}
