//! `fluxdrop connect` - connect directly to a sender, skipping discovery.

use std::net::IpAddr;
use std::path::PathBuf;

use engine::{ReceiverSession, SessionError};

use crate::console;

use super::resolve_save_dir;

/// Connects to `ip:port` and downloads whatever the sender offers.
pub fn connect(
    ip: IpAddr,
    port: u16,
    save_dir: Option<PathBuf>,
    auto_accept: bool,
) -> Result<(), SessionError> {
    let pin = console::prompt_pin()?;
    ReceiverSession::new(
        resolve_save_dir(save_dir),
        pin,
        console::receiver_callbacks(auto_accept),
    )
    .run(ip, port)
}
