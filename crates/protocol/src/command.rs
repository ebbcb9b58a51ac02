//! The closed command tag set carried in packet headers.

/// Commands understood by both ends of a FluxDrop session.
///
/// Values are fixed by the wire contract; zero is never assigned because the
/// all-zero header doubles as the disconnect sentinel.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u32)]
pub enum Command {
    /// JSON file metadata follows as the payload.
    FileMeta = 1,
    /// Raw file body bytes follow as the payload.
    FileChunk = 2,
    /// Decline or abort the current file; never fatal to the session.
    Cancel = 3,
    /// Liveness probe; the peer must answer with [`Command::Pong`].
    Ping = 4,
    /// Liveness answer. In the per-file handshake this doubles as
    /// [`Command::ACCEPT`].
    Pong = 5,
    /// PIN digest follows as the payload; first packet a receiver sends.
    Auth = 6,
    /// The presented PIN digest matched.
    AuthOk = 7,
    /// The presented PIN digest did not match; the sender closes.
    AuthFail = 8,
    /// Accept the announced file from the byte offset carried in
    /// `payload_size`.
    Resume = 9,
}

impl Command {
    /// Wire alias: a `Pong` answering a `FILE_META` means "accept from byte
    /// zero". The duplicate value is kept for compatibility; code paths that
    /// mean acceptance should use this name.
    pub const ACCEPT: Self = Self::Pong;

    /// Returns the numeric wire value for this command.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    /// Decodes a wire value, or `None` when it is outside the tag set.
    #[must_use]
    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::FileMeta),
            2 => Some(Self::FileChunk),
            3 => Some(Self::Cancel),
            4 => Some(Self::Ping),
            5 => Some(Self::Pong),
            6 => Some(Self::Auth),
            7 => Some(Self::AuthOk),
            8 => Some(Self::AuthFail),
            9 => Some(Self::Resume),
            _ => None,
        }
    }

    /// Canonical upper-case name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FileMeta => "FILE_META",
            Self::FileChunk => "FILE_CHUNK",
            Self::Cancel => "CANCEL",
            Self::Ping => "PING",
            Self::Pong => "PONG",
            Self::Auth => "AUTH",
            Self::AuthOk => "AUTH_OK",
            Self::AuthFail => "AUTH_FAIL",
            Self::Resume => "RESUME",
        }
    }
}
