//! Command-line grammar.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level invocation.
#[derive(Debug, Parser)]
#[command(
    name = "fluxdrop",
    version,
    about = "LAN peer-to-peer file drop with discovery, PIN pairing, and resumable transfers"
)]
pub struct Cli {
    /// Requested operation.
    #[command(subcommand)]
    pub command: Commands,
}

/// The three frontends.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve files or directories to one receiver on the LAN.
    Host {
        /// Files or directories to send, streamed in the given order.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Discover a session by id and download its files.
    Join {
        /// Session id shown by the sender.
        session_id: u32,
        /// Directory to save into; defaults to Downloads.
        #[arg(long)]
        save_dir: Option<PathBuf>,
        /// Accept every offered file without prompting.
        #[arg(long)]
        yes: bool,
    },
    /// Connect directly to a sender, skipping discovery.
    Connect {
        /// Sender address shown next to the PIN.
        ip: IpAddr,
        /// Sender TCP port.
        port: u16,
        /// Directory to save into; defaults to Downloads.
        #[arg(long)]
        save_dir: Option<PathBuf>,
        /// Accept every offered file without prompting.
        #[arg(long)]
        yes: bool,
    },
}
