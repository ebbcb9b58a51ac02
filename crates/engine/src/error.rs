//! Session error kinds.

use std::io;

use thiserror::Error;

use transfer::TransferError;

/// Terminal and per-file failures raised by the session state machines.
///
/// Sessions report their terminal error through `on_error` exactly once;
/// recoverable per-file conditions never reach the caller as a variant of
/// this type.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The sender was started with an empty job queue.
    #[error("no transfer jobs were queued")]
    NoWork,

    /// The session listener could not be bound.
    #[error("failed to bind the session listener: {0}")]
    BindFailed(#[source] io::Error),

    /// The cancel flag was set while waiting for a peer to connect.
    #[error("cancelled while waiting for a peer to connect")]
    AcceptCancelled,

    /// The peer broke the wire contract.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// The presented PIN digest did not match.
    #[error("peer rejected the supplied PIN")]
    AuthRejected,

    /// The save directory cannot hold the announced file.
    #[error("not enough free space for {filename}: {needed} bytes needed, {available} available")]
    InsufficientSpace {
        /// Announced filename.
        filename: String,
        /// Announced file size.
        needed: u64,
        /// Free bytes observed in the save directory.
        available: u64,
    },

    /// Socket or file I/O failed.
    #[error("I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The peer disconnected in the middle of the session.
    #[error("peer disconnected mid-session")]
    PeerDisconnected,

    /// The local cancel flag ended the session.
    #[error("session cancelled locally")]
    LocalCancel,
}

impl From<TransferError> for SessionError {
    fn from(error: TransferError) -> Self {
        match error {
            TransferError::PeerDisconnected => Self::PeerDisconnected,
            TransferError::OversizePayload { .. } => Self::ProtocolViolation(error.to_string()),
            TransferError::Meta(meta) => Self::ProtocolViolation(meta.to_string()),
            TransferError::Io(io) => Self::Io(io),
        }
    }
}
