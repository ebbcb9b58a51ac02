#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `protocol` defines everything that crosses a wire in FluxDrop: the fixed
//! 16-byte packet header and its command tag set for the framed TCP session,
//! the JSON file-metadata payload announced before each transfer, and the
//! pipe-delimited UDP beacon text used for LAN discovery.
//!
//! # Design
//!
//! - [`PacketHeader`] is a total codec: any 16-byte input deserializes, and
//!   unknown command values are deliberately not an error at this layer. The
//!   session layer decides what an unexpected command means in its state.
//! - [`Command`] is the closed tag set carried in the header's `command`
//!   field. The all-zero header is reserved as a disconnect sentinel and is
//!   never a legitimate command.
//! - [`FileInfo`] is textual JSON on the wire; [`sanitize_filename`] must be
//!   applied before a received name is turned into a filesystem path.
//! - [`Beacon`] is the discovery datagram. The current form carries four
//!   fields; the legacy three-field form (no instance id) is still parsed.
//!
//! # Invariants
//!
//! - A serialized header is exactly [`HEADER_LEN`] bytes, fields in
//!   declaration order, each network byte order.
//! - Beacon fields never contain the `|` separator.

mod beacon;
mod command;
mod header;
mod meta;

pub use beacon::{BEACON_MAGIC, BEACON_PORT, Beacon};
pub use command::Command;
pub use header::{HEADER_LEN, PacketHeader};
pub use meta::{FileInfo, MetaError, OCTET_STREAM, sanitize_filename};
