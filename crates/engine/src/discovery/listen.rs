//! Beacon listening and device deduplication.

use std::collections::HashMap;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use protocol::Beacon;
use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, warn};

use super::{DiscoveredDevice, InstanceId};

/// Back-off between polls when no datagram is pending.
pub const LISTEN_BACKOFF: Duration = Duration::from_millis(200);

/// Invoked from the listener thread for each newly observed device.
pub type DeviceFoundFn = Box<dyn Fn(&DiscoveredDevice) + Send>;

type SeenDevices = Arc<Mutex<HashMap<(IpAddr, u16), DiscoveredDevice>>>;

/// Receives beacons on the discovery port until stopped.
///
/// Devices are deduplicated by `(ip, tcp_port)`, first observation wins, and
/// the map is written only by the listener thread. Beacons carrying this
/// process's own instance id are discarded; legacy three-field beacons have
/// no id and are always surfaced.
pub struct Listener {
    running: Arc<AtomicBool>,
    devices: SeenDevices,
    handle: Option<JoinHandle<()>>,
}

impl Listener {
    /// Binds the discovery port and spawns the listener thread.
    ///
    /// The port is bound with address reuse enabled so a listener can start
    /// while a terminating one still holds the socket.
    pub fn start(
        instance_id: InstanceId,
        beacon_port: u16,
        on_device_found: DeviceFoundFn,
    ) -> io::Result<Self> {
        let socket = bind_reusable(beacon_port)?;
        debug!(port = beacon_port, instance = %instance_id, "beacon listener started");
        let running = Arc::new(AtomicBool::new(true));
        let devices: SeenDevices = Arc::new(Mutex::new(HashMap::new()));

        let flag = Arc::clone(&running);
        let seen = Arc::clone(&devices);
        let handle = thread::Builder::new()
            .name("flux-listen".to_owned())
            .spawn(move || {
                let mut buffer = [0u8; 512];
                while flag.load(Ordering::Relaxed) {
                    match socket.recv_from(&mut buffer) {
                        Ok((len, source)) => {
                            handle_datagram(
                                &buffer[..len],
                                source,
                                &instance_id,
                                &seen,
                                &on_device_found,
                            );
                        }
                        Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                            thread::sleep(LISTEN_BACKOFF);
                        }
                        Err(error) => {
                            warn!(%error, "beacon receive failed");
                            thread::sleep(LISTEN_BACKOFF);
                        }
                    }
                }
                debug!("beacon listener stopped");
            })?;

        Ok(Self {
            running,
            devices,
            handle: Some(handle),
        })
    }

    /// Snapshot of every device observed so far, in no particular order.
    #[must_use]
    pub fn devices(&self) -> Vec<DiscoveredDevice> {
        self.devices
            .lock()
            .map(|seen| seen.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Clears the running flag and joins the listener thread.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.stop();
    }
}

fn bind_reusable(port: u16) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)).into())?;
    socket.set_nonblocking(true)?;
    Ok(socket.into())
}

fn handle_datagram(
    datagram: &[u8],
    source: SocketAddr,
    instance_id: &InstanceId,
    seen: &SeenDevices,
    on_device_found: &DeviceFoundFn,
) {
    let Ok(text) = std::str::from_utf8(datagram) else {
        return;
    };
    let Some(beacon) = Beacon::parse(text) else {
        return;
    };
    if beacon.instance_id.as_deref() == Some(instance_id.as_str()) {
        return;
    }

    let device = DiscoveredDevice {
        ip: source.ip(),
        port: beacon.port,
        session_id: beacon.session_id,
        instance_id: beacon.instance_id,
    };
    {
        let Ok(mut devices) = seen.lock() else {
            return;
        };
        let key = (device.ip, device.port);
        if devices.contains_key(&key) {
            return;
        }
        devices.insert(key, device.clone());
    }
    debug!(ip = %device.ip, port = device.port, session_id = device.session_id, "device found");
    on_device_found(&device);
}
