//! LAN discovery: beacon broadcasting and listening.
//!
//! A serving sender announces `(session_id, tcp_port, instance_id)` once a
//! second as a UDP broadcast; receivers listen on the well-known port,
//! deduplicate announcements, and surface each new device through a
//! callback. Both halves run on their own worker threads and stop when
//! their owner clears the running flag.

mod broadcast;
mod listen;

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

use protocol::BEACON_PORT;
use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;

pub use broadcast::Broadcaster;
pub use listen::{DeviceFoundFn, Listener};

/// Length of the per-process instance token.
pub const INSTANCE_ID_LEN: usize = 16;

/// A stable random token identifying this process in beacons.
///
/// Generated once at startup and passed explicitly to the broadcaster and
/// listener; a listener discards beacons carrying its own token so a process
/// never discovers itself.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceId(String);

impl InstanceId {
    /// Draws a fresh 16-character alphanumeric token from the OS CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let token = OsRng
            .sample_iter(&Alphanumeric)
            .take(INSTANCE_ID_LEN)
            .map(char::from)
            .collect();
        Self(token)
    }

    /// The token text as it appears in beacons.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A sender observed on the LAN.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DiscoveredDevice {
    /// Source address of the beacon datagram.
    pub ip: IpAddr,
    /// TCP port the sender accepts on.
    pub port: u16,
    /// Session the sender is serving.
    pub session_id: u32,
    /// Announcing process's token; absent for legacy beacons.
    pub instance_id: Option<String>,
}

/// Where beacons are sent and received.
///
/// The defaults implement the wire contract; tests substitute a loopback
/// target and a scratch port so suites do not collide on 45454.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DiscoveryConfig {
    /// UDP port beacons are addressed to and bound on.
    pub beacon_port: u16,
    /// Destination address for outgoing beacons.
    pub broadcast_addr: Ipv4Addr,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            beacon_port: BEACON_PORT,
            broadcast_addr: Ipv4Addr::BROADCAST,
        }
    }
}
