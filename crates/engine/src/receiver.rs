//! The receiver side of a session: connect, authenticate, persist files.

use std::fs;
use std::net::{IpAddr, TcpStream};
use std::path::PathBuf;

use protocol::{Command, sanitize_filename};
use tracing::{debug, info, warn};
use transfer::{FramedStream, TransferOutcome};

use crate::auth;
use crate::callbacks::ReceiverCallbacks;
use crate::error::SessionError;
use crate::session::SessionState;
use crate::storage;

/// Downloads every file a sender offers into a save directory.
///
/// The receiver owns the connecting socket exclusively, answers the PIN
/// handshake first, then consumes `FILE_META`/chunk streams until the sender
/// closes. It terminates with exactly one of `on_complete` or `on_error`.
pub struct ReceiverSession {
    save_dir: PathBuf,
    pin: u16,
    session_id: u32,
    callbacks: ReceiverCallbacks,
}

impl ReceiverSession {
    /// Creates a session saving under `save_dir` and pairing with `pin`.
    #[must_use]
    pub fn new(save_dir: PathBuf, pin: u16, callbacks: ReceiverCallbacks) -> Self {
        Self {
            save_dir,
            pin,
            session_id: 0,
            callbacks,
        }
    }

    /// Tags outgoing frames with a known session id (from discovery).
    #[must_use]
    pub fn with_session_id(mut self, session_id: u32) -> Self {
        self.session_id = session_id;
        self
    }

    /// Runs the session against the given endpoint to a terminal state.
    pub fn run(mut self, ip: IpAddr, port: u16) -> Result<(), SessionError> {
        let result = self.receive(ip, port);
        match &result {
            Ok(()) => {
                info!(state = %SessionState::Completed, "receiver session finished");
                self.callbacks.complete();
            }
            Err(error) => {
                let state = match error {
                    SessionError::LocalCancel => SessionState::Cancelled,
                    _ => SessionState::Failed,
                };
                info!(state = %state, %error, "receiver session finished");
                self.callbacks.error(&error.to_string());
            }
        }
        result
    }

    fn receive(&mut self, ip: IpAddr, port: u16) -> Result<(), SessionError> {
        let stream = TcpStream::connect((ip, port))?;
        debug!(%ip, port, state = %SessionState::AwaitingAuth, "connected");
        self.callbacks.status(&format!("Connected to {ip}:{port}"));
        let mut stream = FramedStream::new(stream);

        self.authenticate(&mut stream)?;

        loop {
            if self.callbacks.cancelled() {
                stream.send_control(Command::Cancel, 0, self.session_id)?;
                return Err(SessionError::LocalCancel);
            }
            let header = stream.recv_header()?;
            if header.is_disconnect() {
                // Orderly termination: the sender's queue is exhausted.
                return Ok(());
            }
            match header.command() {
                Some(Command::Ping) => {
                    stream.send_control(Command::Pong, 0, header.session_id)?;
                }
                Some(Command::FileMeta) => self.handle_file(&mut stream, header.payload_size)?,
                Some(other) => {
                    warn!(command = other.name(), "ignoring unexpected packet between files");
                }
                None => {
                    warn!(command = header.command, "ignoring unknown packet");
                }
            }
        }
    }

    /// Sends the PIN digest and waits for the verdict.
    fn authenticate(&self, stream: &mut FramedStream) -> Result<(), SessionError> {
        let digest = auth::hash_pin(self.pin);
        stream.send_control(Command::Auth, digest.len() as u32, self.session_id)?;
        stream.send_bytes(digest.as_bytes())?;

        let header = stream.recv_header()?;
        if header.command() == Some(Command::AuthOk) {
            debug!(state = %SessionState::Authenticated, "authenticated");
            self.callbacks.status("Authenticated");
            Ok(())
        } else {
            // AUTH_FAIL, disconnect, and anything else all mean rejection.
            Err(SessionError::AuthRejected)
        }
    }

    /// Negotiates and receives one announced file.
    fn handle_file(
        &self,
        stream: &mut FramedStream,
        payload_size: u32,
    ) -> Result<(), SessionError> {
        let info = stream.recv_file_meta(payload_size)?;
        debug!(filename = %info.filename, size = info.size, state = %SessionState::PerFileHandshake, "file announced");
        let relative = sanitize_filename(&info.filename)
            .map_err(|error| SessionError::ProtocolViolation(error.to_string()))?;

        match storage::available_space(&self.save_dir) {
            Ok(available) if available < info.size => {
                let refusal = SessionError::InsufficientSpace {
                    filename: info.filename.clone(),
                    needed: info.size,
                    available,
                };
                warn!(%refusal, "declining file");
                self.callbacks.status(&refusal.to_string());
                stream.send_control(Command::Cancel, 0, self.session_id)?;
                return Ok(());
            }
            Ok(_) => {}
            Err(error) => {
                // Proceed without the check; a real shortage still surfaces
                // as a write error.
                warn!(%error, "free-space probe failed");
            }
        }

        let final_path = self.save_dir.join(relative);
        let part_path = transfer::partial_path(&final_path);
        let mut resume_offset = match fs::metadata(&part_path) {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => 0,
        };
        // A partial larger than the announced file (or beyond the resume
        // field's range) cannot be resumed; start over.
        if resume_offset > info.size || resume_offset > u64::from(u32::MAX) {
            warn!(part = %part_path.display(), resume_offset, "discarding unusable partial");
            fs::remove_file(&part_path)?;
            resume_offset = 0;
        }

        if !self.callbacks.file_request(&info.filename, info.size) {
            self.callbacks
                .status(&format!("Declined {}", info.filename));
            stream.send_control(Command::Cancel, 0, self.session_id)?;
            return Ok(());
        }

        if resume_offset > 0 {
            self.callbacks.status(&format!(
                "Resuming {} from byte {resume_offset}",
                info.filename
            ));
            stream.send_control(Command::Resume, resume_offset as u32, self.session_id)?;
        } else {
            self.callbacks
                .status(&format!("Receiving {} ({} bytes)", info.filename, info.size));
            stream.send_control(Command::ACCEPT, 0, self.session_id)?;
        }

        debug!(filename = %info.filename, resume_offset, state = %SessionState::Streaming, "receiving");
        let outcome = {
            let callbacks = &self.callbacks;
            let name = info.filename.as_str();
            transfer::receive_file(
                stream,
                &final_path,
                info.size,
                resume_offset,
                self.session_id,
                self.callbacks.cancel_flag.as_deref(),
                |done, total, mibps| callbacks.progress(name, done, total, mibps),
            )?
        };
        match outcome {
            TransferOutcome::Completed => {
                self.callbacks
                    .status(&format!("Received {}", info.filename));
                Ok(())
            }
            TransferOutcome::CancelledBySender => {
                // A normal end of the current file, not a session error.
                self.callbacks
                    .status(&format!("Sender cancelled {}", info.filename));
                Ok(())
            }
            TransferOutcome::CancelledLocally => Err(SessionError::LocalCancel),
        }
    }
}
