#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `transfer` owns the byte-moving half of a FluxDrop session: exact-length
//! framed reads and writes over a blocking TCP stream, and the chunked file
//! streaming engine with resumable partial files.
//!
//! # Design
//!
//! - [`FramedStream`] wraps a connected socket and speaks in whole frames. A
//!   clean peer close during a header read surfaces as the all-zero
//!   [`PacketHeader::DISCONNECT`](protocol::PacketHeader::DISCONNECT)
//!   sentinel rather than an error, so session loops can distinguish orderly
//!   termination from I/O failure.
//! - [`send_file`] and [`receive_file`] move file bodies in
//!   [`CHUNK_LEN`]-sized `FILE_CHUNK` frames. The receiver appends to a
//!   `.fluxpart` sibling and renames it into place on completion, which is
//!   what makes interrupted downloads resumable.
//! - Progress callbacks are throttled by [`ProgressGate`] so hosts see at
//!   most one report per 300 ms plus a final one per file.
//!
//! # Invariants
//!
//! - A `FILE_CHUNK` header's `payload_size` is followed by exactly that many
//!   body bytes.
//! - Control payloads (metadata, digests) never exceed
//!   [`MAX_CONTROL_PAYLOAD`]; larger claims are a protocol violation, not an
//!   allocation.

mod progress;
mod receive;
mod send;
mod stream;

use std::io;

use thiserror::Error;

pub use progress::{PROGRESS_INTERVAL, ProgressGate};
pub use receive::{PARTIAL_SUFFIX, TransferOutcome, partial_path, receive_file};
pub use send::send_file;
pub use stream::{CHUNK_LEN, FramedStream, MAX_CONTROL_PAYLOAD};

/// Failures while moving frames or file bodies.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The peer closed the connection in the middle of a frame or file.
    #[error("peer disconnected mid-transfer")]
    PeerDisconnected,
    /// A control frame claimed a payload larger than the protocol allows.
    #[error("control payload of {got} bytes exceeds the {max}-byte limit")]
    OversizePayload {
        /// Claimed payload length.
        got: u32,
        /// Enforced ceiling, [`MAX_CONTROL_PAYLOAD`].
        max: u32,
    },
    /// File metadata failed to decode or validate.
    #[error(transparent)]
    Meta(#[from] protocol::MetaError),
    /// Underlying socket or file I/O failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}
