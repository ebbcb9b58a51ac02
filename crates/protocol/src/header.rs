//! Fixed-size packet header codec.
//!
//! Every frame on the TCP session starts with this 16-byte header. The four
//! fields are unsigned 32-bit integers written in declaration order, each in
//! network byte order, with no padding. Deserialization is total: the codec
//! never rejects a 16-byte input, and command validation is left to the
//! session layer.

use crate::command::Command;

/// Exact size of a serialized [`PacketHeader`] on the wire.
pub const HEADER_LEN: usize = 16;

/// The fixed header preceding every framed payload.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct PacketHeader {
    /// Command tag; see [`Command`] for the assigned values.
    pub command: u32,
    /// Number of payload bytes immediately following the header.
    pub payload_size: u32,
    /// Session the frame belongs to.
    pub session_id: u32,
    /// Reserved for future use; always zero when sent.
    pub reserved: u32,
}

impl PacketHeader {
    /// The all-zero header, reserved as an orderly-disconnect sentinel.
    ///
    /// Framed readers return this value when the peer closes the connection
    /// cleanly; it never appears as a legitimate frame.
    pub const DISCONNECT: Self = Self {
        command: 0,
        payload_size: 0,
        session_id: 0,
        reserved: 0,
    };

    /// Builds a header for `command` with the given payload length.
    #[must_use]
    pub const fn new(command: Command, payload_size: u32, session_id: u32) -> Self {
        Self {
            command: command.as_u32(),
            payload_size,
            session_id,
            reserved: 0,
        }
    }

    /// Decodes the command field, or `None` for values outside the tag set.
    #[must_use]
    pub const fn command(&self) -> Option<Command> {
        Command::from_u32(self.command)
    }

    /// Reports whether this is the disconnect sentinel.
    #[must_use]
    pub const fn is_disconnect(&self) -> bool {
        self.command == 0 && self.payload_size == 0 && self.session_id == 0 && self.reserved == 0
    }

    /// Serializes the header into its exact wire form.
    #[must_use]
    pub fn to_bytes(self) -> [u8; HEADER_LEN] {
        let mut buffer = [0u8; HEADER_LEN];
        buffer[0..4].copy_from_slice(&self.command.to_be_bytes());
        buffer[4..8].copy_from_slice(&self.payload_size.to_be_bytes());
        buffer[8..12].copy_from_slice(&self.session_id.to_be_bytes());
        buffer[12..16].copy_from_slice(&self.reserved.to_be_bytes());
        buffer
    }

    /// Deserializes a header from its wire form. Total; never fails.
    #[must_use]
    pub fn from_bytes(buffer: &[u8; HEADER_LEN]) -> Self {
        let field = |offset: usize| {
            let mut word = [0u8; 4];
            word.copy_from_slice(&buffer[offset..offset + 4]);
            u32::from_be_bytes(word)
        };

        Self {
            command: field(0),
            payload_size: field(4),
            session_id: field(8),
            reserved: field(12),
        }
    }
}
