//! `fluxdrop join` - discover a session by id and download its files.

use std::io;
use std::path::PathBuf;
use std::sync::mpsc;

use engine::{InstanceId, Listener, ReceiverSession, SessionError};
use protocol::BEACON_PORT;
use tracing::debug;

use crate::console;

use super::resolve_save_dir;

/// Waits for a beacon carrying `session_id`, then connects to its sender.
pub fn join(
    session_id: u32,
    save_dir: Option<PathBuf>,
    auto_accept: bool,
    instance_id: InstanceId,
) -> Result<(), SessionError> {
    let (found_tx, found_rx) = mpsc::channel();
    let mut listener = Listener::start(
        instance_id,
        BEACON_PORT,
        Box::new(move |device| {
            let _ = found_tx.send(device.clone());
        }),
    )?;

    eprintln!("Searching for session {session_id} on the local network...");
    let device = loop {
        match found_rx.recv() {
            Ok(device) if device.session_id == session_id => break device,
            Ok(other) => {
                debug!(session_id = other.session_id, ip = %other.ip, "ignoring other session");
            }
            Err(_) => {
                return Err(SessionError::Io(io::Error::other(
                    "discovery listener stopped unexpectedly",
                )));
            }
        }
    };
    listener.stop();
    eprintln!("Found sender at {}:{}", device.ip, device.port);

    let pin = console::prompt_pin()?;
    ReceiverSession::new(
        resolve_save_dir(save_dir),
        pin,
        console::receiver_callbacks(auto_accept),
    )
    .with_session_id(session_id)
    .run(device.ip, device.port)
}
