//! Periodic beacon broadcasting for a serving sender.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use protocol::Beacon;
use tracing::{debug, warn};

use super::{DiscoveryConfig, InstanceId};

/// Interval between beacon datagrams.
pub const BEACON_INTERVAL: Duration = Duration::from_secs(1);

/// Step size for the interval sleep, so stopping is prompt.
const STOP_POLL: Duration = Duration::from_millis(200);

/// Emits one beacon per second until stopped.
///
/// The owning sender stops the broadcaster the moment a peer connects; it is
/// also stopped on drop.
#[derive(Debug)]
pub struct Broadcaster {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Broadcaster {
    /// Spawns the broadcast thread announcing `(session_id, tcp_port)`.
    pub fn start(
        session_id: u32,
        tcp_port: u16,
        instance_id: &InstanceId,
        config: DiscoveryConfig,
    ) -> io::Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.set_broadcast(true)?;

        let payload = Beacon {
            session_id,
            port: tcp_port,
            instance_id: Some(instance_id.as_str().to_owned()),
        }
        .encode();
        let target = SocketAddr::from((config.broadcast_addr, config.beacon_port));

        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let handle = thread::Builder::new()
            .name("flux-beacon".to_owned())
            .spawn(move || {
                debug!(%target, %payload, "beacon broadcast started");
                while flag.load(Ordering::Relaxed) {
                    if let Err(error) = socket.send_to(payload.as_bytes(), target) {
                        warn!(%error, "beacon send failed");
                    }
                    let mut slept = Duration::ZERO;
                    while slept < BEACON_INTERVAL && flag.load(Ordering::Relaxed) {
                        thread::sleep(STOP_POLL);
                        slept += STOP_POLL;
                    }
                }
                debug!("beacon broadcast stopped");
            })?;

        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Clears the running flag and joins the broadcast thread.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Broadcaster {
    fn drop(&mut self) {
        self.stop();
    }
}
