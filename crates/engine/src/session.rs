//! Session lifecycle states.

use std::fmt;

/// Stages a session moves through, used for status reporting and tracing.
///
/// Both halves follow `Listening/Broadcasting → AwaitingAuth →
/// Authenticated → PerFileHandshake ⇄ Streaming → terminal`; a receiver
/// starts at `AwaitingAuth` since it never listens.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionState {
    /// Sender is accepting and broadcasting beacons.
    Listening,
    /// Waiting for the AUTH exchange to conclude.
    AwaitingAuth,
    /// PIN digest verified; no file negotiated yet.
    Authenticated,
    /// A `FILE_META` is outstanding, awaiting accept/resume/decline.
    PerFileHandshake,
    /// File chunks are moving.
    Streaming,
    /// Terminal: all jobs finished or the peer closed in an orderly way.
    Completed,
    /// Terminal: a cancel flag or a peer cancel ended the session.
    Cancelled,
    /// Terminal: an unrecoverable error ended the session.
    Failed,
}

impl SessionState {
    /// Short name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Listening => "listening",
            Self::AwaitingAuth => "awaiting-auth",
            Self::Authenticated => "authenticated",
            Self::PerFileHandshake => "per-file-handshake",
            Self::Streaming => "streaming",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
