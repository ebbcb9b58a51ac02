//! Beacon broadcasting and listening over loopback UDP.
//!
//! Each test uses its own scratch port so suites can run in parallel
//! without fighting over the well-known discovery port.

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use engine::{Broadcaster, DiscoveryConfig, InstanceId, Listener};

fn loopback_config(port: u16) -> DiscoveryConfig {
    DiscoveryConfig {
        beacon_port: port,
        broadcast_addr: Ipv4Addr::LOCALHOST,
    }
}

#[test]
fn own_beacons_are_never_surfaced() {
    let config = loopback_config(45_631);
    let instance = InstanceId::generate();

    let surfaced = Arc::new(AtomicUsize::new(0));
    let count = Arc::clone(&surfaced);
    let mut listener = Listener::start(
        instance.clone(),
        config.beacon_port,
        Box::new(move |_| {
            count.fetch_add(1, Ordering::SeqCst);
        }),
    )
    .expect("listener");

    let mut broadcaster =
        Broadcaster::start(500, 40_000, &instance, config).expect("broadcaster");

    // At least two beacons go out in this window.
    thread::sleep(Duration::from_secs(2));
    broadcaster.stop();
    listener.stop();

    assert_eq!(surfaced.load(Ordering::SeqCst), 0);
    assert!(listener.devices().is_empty());
}

#[test]
fn foreign_beacons_surface_once_per_endpoint() {
    let config = loopback_config(45_632);
    let local = InstanceId::generate();
    let remote = InstanceId::generate();

    let (found_tx, found_rx) = mpsc::channel();
    let surfaced = Arc::new(AtomicUsize::new(0));
    let count = Arc::clone(&surfaced);
    let mut listener = Listener::start(
        local,
        config.beacon_port,
        Box::new(move |device| {
            count.fetch_add(1, Ordering::SeqCst);
            let _ = found_tx.send(device.clone());
        }),
    )
    .expect("listener");

    let mut broadcaster =
        Broadcaster::start(600, 41_000, &remote, config).expect("broadcaster");

    let device = found_rx
        .recv_timeout(Duration::from_secs(3))
        .expect("device found");
    assert_eq!(device.session_id, 600);
    assert_eq!(device.port, 41_000);
    assert_eq!(device.instance_id.as_deref(), Some(remote.as_str()));

    // Further beacons from the same (ip, port) are deduplicated.
    thread::sleep(Duration::from_millis(1500));
    broadcaster.stop();
    listener.stop();

    assert_eq!(surfaced.load(Ordering::SeqCst), 1);
    assert_eq!(listener.devices().len(), 1);
}

#[test]
fn legacy_three_field_beacons_are_accepted() {
    use std::net::UdpSocket;

    use protocol::Beacon;

    let config = loopback_config(45_633);
    let (found_tx, found_rx) = mpsc::channel();
    let mut listener = Listener::start(
        InstanceId::generate(),
        config.beacon_port,
        Box::new(move |device| {
            let _ = found_tx.send(device.clone());
        }),
    )
    .expect("listener");

    let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).expect("bind");
    let datagram = Beacon {
        session_id: 700,
        port: 42_000,
        instance_id: None,
    }
    .encode();
    socket
        .send_to(datagram.as_bytes(), (Ipv4Addr::LOCALHOST, config.beacon_port))
        .expect("send legacy beacon");

    let device = found_rx
        .recv_timeout(Duration::from_secs(3))
        .expect("device found");
    assert_eq!(device.session_id, 700);
    assert_eq!(device.port, 42_000);
    assert_eq!(device.instance_id, None);
    listener.stop();
}

#[test]
fn foreign_datagrams_are_ignored() {
    use std::net::UdpSocket;

    let config = loopback_config(45_634);
    let surfaced = Arc::new(AtomicUsize::new(0));
    let count = Arc::clone(&surfaced);
    let mut listener = Listener::start(
        InstanceId::generate(),
        config.beacon_port,
        Box::new(move |_| {
            count.fetch_add(1, Ordering::SeqCst);
        }),
    )
    .expect("listener");

    let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).expect("bind");
    for datagram in [b"SSDP hello".as_slice(), b"FLUXDROP|broken".as_slice(), b"\xff\xfe".as_slice()] {
        socket
            .send_to(datagram, (Ipv4Addr::LOCALHOST, config.beacon_port))
            .expect("send noise");
    }

    thread::sleep(Duration::from_millis(800));
    listener.stop();
    assert_eq!(surfaced.load(Ordering::SeqCst), 0);
}
