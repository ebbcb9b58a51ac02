//! The sender side of a session: accept one peer, authenticate, stream jobs.

use std::collections::VecDeque;
use std::fs;
use std::io;
use std::net::{IpAddr, Ipv4Addr, TcpListener, TcpStream, UdpSocket};
use std::thread;
use std::time::Duration;

use protocol::{Command, FileInfo};
use tracing::{debug, info, warn};
use transfer::FramedStream;

use crate::auth;
use crate::callbacks::SenderCallbacks;
use crate::discovery::{Broadcaster, DiscoveryConfig, InstanceId};
use crate::error::SessionError;
use crate::job::TransferJob;
use crate::session::SessionState;

/// How often the accept loop checks the cancel flag.
pub const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Address probed to learn which local interface routes outward.
const ROUTE_PROBE_ADDR: (&str, u16) = ("8.8.8.8", 53);

/// How the receiver answered a `FILE_META`.
enum FileAnswer {
    /// Stream from this byte offset (zero for a fresh accept).
    From(u64),
    /// The receiver declined the file.
    Declined,
}

/// Serves one queue of jobs to a single authenticated peer.
///
/// The session binds an ephemeral TCP port, announces itself over UDP until
/// a peer connects, runs the PIN handshake, then streams every job in FIFO
/// order. It terminates with exactly one of `on_complete` or `on_error`.
pub struct SenderSession {
    jobs: VecDeque<TransferJob>,
    callbacks: SenderCallbacks,
    instance_id: InstanceId,
    discovery: DiscoveryConfig,
}

impl SenderSession {
    /// Creates a session over the given job queue.
    #[must_use]
    pub fn new(jobs: Vec<TransferJob>, callbacks: SenderCallbacks, instance_id: InstanceId) -> Self {
        Self {
            jobs: jobs.into(),
            callbacks,
            instance_id,
            discovery: DiscoveryConfig::default(),
        }
    }

    /// Overrides where discovery beacons are sent. Used by tests.
    #[must_use]
    pub fn with_discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.discovery = discovery;
        self
    }

    /// Runs the session to a terminal state.
    pub fn run(mut self) -> Result<(), SessionError> {
        let result = self.serve();
        match &result {
            Ok(()) => {
                info!(state = %SessionState::Completed, "sender session finished");
                self.callbacks.complete();
            }
            Err(error) => {
                let state = match error {
                    SessionError::AcceptCancelled | SessionError::LocalCancel => {
                        SessionState::Cancelled
                    }
                    _ => SessionState::Failed,
                };
                info!(state = %state, %error, "sender session finished");
                self.callbacks.error(&error.to_string());
            }
        }
        result
    }

    fn serve(&mut self) -> Result<(), SessionError> {
        let Some(first) = self.jobs.front() else {
            return Err(SessionError::NoWork);
        };
        let session_id = first.session_id;

        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0))
            .map_err(SessionError::BindFailed)?;
        let port = listener
            .local_addr()
            .map_err(SessionError::BindFailed)?
            .port();
        let ip = local_ip();

        let pin = auth::generate_pin();
        let pin_digest = auth::hash_pin(pin);
        info!(%ip, port, session_id, state = %SessionState::Listening, "sender session ready");
        self.callbacks.ready(ip, port, pin);
        self.callbacks
            .status(&format!("Listening on {ip}:{port}, session {session_id}"));

        let mut broadcaster =
            Broadcaster::start(session_id, port, &self.instance_id, self.discovery)?;
        let accepted = self.accept_peer(&listener);
        broadcaster.stop();
        let stream = accepted?;
        stream.set_nonblocking(false)?;

        let peer = stream.peer_addr()?;
        debug!(%peer, state = %SessionState::AwaitingAuth, "peer connected");
        self.callbacks.status(&format!("Peer connected from {peer}"));
        let mut stream = FramedStream::new(stream);

        self.authenticate(&mut stream, &pin_digest, session_id)?;
        self.stream_jobs(&mut stream, session_id)
    }

    /// Waits for a connection, polling the cancel flag every 200 ms.
    fn accept_peer(&self, listener: &TcpListener) -> Result<TcpStream, SessionError> {
        listener.set_nonblocking(true)?;
        loop {
            if self.callbacks.cancelled() {
                return Err(SessionError::AcceptCancelled);
            }
            match listener.accept() {
                Ok((stream, _)) => return Ok(stream),
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(error) => return Err(SessionError::Io(error)),
            }
        }
    }

    /// Runs the AUTH exchange; the first real packet must be the PIN digest.
    fn authenticate(
        &self,
        stream: &mut FramedStream,
        expected_digest: &str,
        session_id: u32,
    ) -> Result<(), SessionError> {
        let header = loop {
            let header = stream.recv_header()?;
            if header.is_disconnect() {
                return Err(SessionError::PeerDisconnected);
            }
            match header.command() {
                Some(Command::Auth) => break header,
                // Liveness probes are answered in every state.
                Some(Command::Ping) => {
                    stream.send_control(Command::Pong, 0, header.session_id)?;
                }
                Some(Command::Pong) => {}
                _ => {
                    return Err(SessionError::ProtocolViolation(format!(
                        "expected AUTH, received command {}",
                        header.command
                    )));
                }
            }
        };
        let payload = stream.recv_control_payload(header.payload_size)?;
        let digest = String::from_utf8_lossy(&payload);

        if auth::verify_digest(&digest, expected_digest) {
            stream.send_control(Command::AuthOk, 0, session_id)?;
            debug!(state = %SessionState::Authenticated, "peer authenticated");
            self.callbacks.status("Peer authenticated");
            Ok(())
        } else {
            stream.send_control(Command::AuthFail, 0, session_id)?;
            Err(SessionError::AuthRejected)
        }
    }

    /// Streams every queued job in FIFO order.
    fn stream_jobs(
        &mut self,
        stream: &mut FramedStream,
        session_id: u32,
    ) -> Result<(), SessionError> {
        while let Some(job) = self.jobs.pop_front() {
            let size = match fs::metadata(&job.source_path) {
                Ok(meta) if meta.is_file() => meta.len(),
                _ => {
                    warn!(source = %job.source_path.display(), "skipping missing source");
                    self.callbacks.status(&format!(
                        "Skipping missing source {}",
                        job.source_path.display()
                    ));
                    continue;
                }
            };

            let info = FileInfo::new(job.logical_filename.clone(), size);
            debug!(filename = %info.filename, size, state = %SessionState::PerFileHandshake, "announcing file");
            stream.send_file_meta(&info, session_id)?;

            match self.await_file_answer(stream)? {
                FileAnswer::Declined => {
                    self.callbacks
                        .status(&format!("Receiver declined {}", info.filename));
                    continue;
                }
                FileAnswer::From(offset) => {
                    debug!(filename = %info.filename, offset, state = %SessionState::Streaming, "streaming");
                    self.callbacks.status(&format!(
                        "Sending {} ({size} bytes, from offset {offset})",
                        info.filename
                    ));
                    let callbacks = &self.callbacks;
                    let name = info.filename.as_str();
                    transfer::send_file(
                        stream,
                        &job.source_path,
                        session_id,
                        offset,
                        |done, total, mibps| callbacks.progress(name, done, total, mibps),
                    )?;
                    self.callbacks.status(&format!("Sent {}", info.filename));
                }
            }
        }
        Ok(())
    }

    /// Reads control packets after a `FILE_META` until the receiver decides.
    fn await_file_answer(&self, stream: &mut FramedStream) -> Result<FileAnswer, SessionError> {
        loop {
            let header = stream.recv_header()?;
            if header.is_disconnect() {
                return Err(SessionError::PeerDisconnected);
            }
            match header.command() {
                Some(Command::Ping) => {
                    stream.send_control(Command::Pong, 0, header.session_id)?;
                }
                Some(Command::ACCEPT) => return Ok(FileAnswer::From(0)),
                Some(Command::Resume) => {
                    return Ok(FileAnswer::From(u64::from(header.payload_size)));
                }
                Some(Command::Cancel) => return Ok(FileAnswer::Declined),
                Some(other) => {
                    return Err(SessionError::ProtocolViolation(format!(
                        "unexpected {} during the per-file handshake",
                        other.name()
                    )));
                }
                None => {
                    return Err(SessionError::ProtocolViolation(format!(
                        "unknown command {} during the per-file handshake",
                        header.command
                    )));
                }
            }
        }
    }
}

/// Best local IP for display: the interface that routes outward, else
/// loopback.
#[must_use]
pub fn local_ip() -> IpAddr {
    probe_local_ip().unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

fn probe_local_ip() -> io::Result<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    // Connecting a UDP socket sends nothing; it only fixes the local route.
    socket.connect(ROUTE_PROBE_ADDR)?;
    Ok(socket.local_addr()?.ip())
}
