//! End-to-end sender/receiver sessions over loopback TCP.

use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use engine::{
    DiscoveryConfig, InstanceId, ReceiverCallbacks, ReceiverSession, SenderCallbacks,
    SenderSession, SessionError, TransferJob,
};

/// Discovery target for sessions under test: loopback, scratch port.
fn test_discovery(port: u16) -> DiscoveryConfig {
    DiscoveryConfig {
        beacon_port: port,
        broadcast_addr: Ipv4Addr::LOCALHOST,
    }
}

fn job(source: &Path, logical: &str, session_id: u32) -> TransferJob {
    TransferJob {
        source_path: source.to_path_buf(),
        logical_filename: logical.to_owned(),
        session_id,
    }
}

/// Spawns a sender session and returns its ready signal and join handle.
fn spawn_sender(
    jobs: Vec<TransferJob>,
    beacon_port: u16,
    completions: Arc<AtomicUsize>,
    errors: Arc<AtomicUsize>,
) -> (
    mpsc::Receiver<(IpAddr, u16, u16)>,
    thread::JoinHandle<Result<(), SessionError>>,
) {
    let (ready_tx, ready_rx) = mpsc::channel();
    let callbacks = SenderCallbacks {
        on_ready: Some(Box::new(move |ip, port, pin| {
            let _ = ready_tx.send((ip, port, pin));
        })),
        on_complete: Some(Box::new(move || {
            completions.fetch_add(1, Ordering::SeqCst);
        })),
        on_error: Some(Box::new(move |_| {
            errors.fetch_add(1, Ordering::SeqCst);
        })),
        ..SenderCallbacks::default()
    };
    let session = SenderSession::new(jobs, callbacks, InstanceId::generate())
        .with_discovery(test_discovery(beacon_port));
    let handle = thread::spawn(move || session.run());
    (ready_rx, handle)
}

#[test]
fn single_small_file_happy_path() {
    let scratch = tempfile::tempdir().expect("tempdir");
    let source = scratch.path().join("a.bin");
    fs::write(&source, b"HELLO").expect("write source");
    let save_dir = scratch.path().join("downloads");
    fs::create_dir_all(&save_dir).expect("mkdir save");

    let sender_completions = Arc::new(AtomicUsize::new(0));
    let sender_errors = Arc::new(AtomicUsize::new(0));
    let (ready, sender) = spawn_sender(
        vec![job(&source, "a.bin", 100)],
        45_611,
        Arc::clone(&sender_completions),
        Arc::clone(&sender_errors),
    );
    let (_ip, port, pin) = ready.recv_timeout(Duration::from_secs(5)).expect("ready");

    let receiver_completions = Arc::new(AtomicUsize::new(0));
    let receiver_count = Arc::clone(&receiver_completions);
    let callbacks = ReceiverCallbacks {
        on_complete: Some(Box::new(move || {
            receiver_count.fetch_add(1, Ordering::SeqCst);
        })),
        ..ReceiverCallbacks::default()
    };
    let receiver = ReceiverSession::new(save_dir.clone(), pin, callbacks).with_session_id(100);
    receiver
        .run(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
        .expect("receiver session");
    sender.join().expect("sender thread").expect("sender session");

    let dest = save_dir.join("a.bin");
    assert_eq!(fs::read(&dest).expect("dest"), [0x48, 0x45, 0x4C, 0x4C, 0x4F]);
    assert!(!save_dir.join("a.bin.fluxpart").exists());
    assert_eq!(sender_completions.load(Ordering::SeqCst), 1);
    assert_eq!(sender_errors.load(Ordering::SeqCst), 0);
    assert_eq!(receiver_completions.load(Ordering::SeqCst), 1);
}

#[test]
fn wrong_pin_is_rejected_on_both_ends() {
    let scratch = tempfile::tempdir().expect("tempdir");
    let source = scratch.path().join("a.bin");
    fs::write(&source, b"secret").expect("write source");

    let completions = Arc::new(AtomicUsize::new(0));
    let errors = Arc::new(AtomicUsize::new(0));
    let (ready, sender) = spawn_sender(
        vec![job(&source, "a.bin", 5)],
        45_612,
        Arc::clone(&completions),
        Arc::clone(&errors),
    );
    let (_ip, port, pin) = ready.recv_timeout(Duration::from_secs(5)).expect("ready");

    let wrong_pin = if pin == 9999 { 1000 } else { pin + 1 };
    let receiver = ReceiverSession::new(scratch.path().to_path_buf(), wrong_pin, ReceiverCallbacks::default());
    let result = receiver.run(IpAddr::V4(Ipv4Addr::LOCALHOST), port);
    assert!(matches!(result, Err(SessionError::AuthRejected)));

    let sender_result = sender.join().expect("sender thread");
    assert!(matches!(sender_result, Err(SessionError::AuthRejected)));
    assert_eq!(completions.load(Ordering::SeqCst), 0);
    assert_eq!(errors.load(Ordering::SeqCst), 1);
}

#[test]
fn resume_streams_only_the_missing_tail() {
    let scratch = tempfile::tempdir().expect("tempdir");
    let source = scratch.path().join("ten.bin");
    fs::write(&source, b"0123456789").expect("write source");
    let save_dir = scratch.path().join("downloads");
    fs::create_dir_all(&save_dir).expect("mkdir save");
    // A previous run got four bytes onto disk before aborting.
    fs::write(save_dir.join("ten.bin.fluxpart"), b"0123").expect("seed partial");

    let (ready, sender) = spawn_sender(
        vec![job(&source, "ten.bin", 3)],
        45_613,
        Arc::new(AtomicUsize::new(0)),
        Arc::new(AtomicUsize::new(0)),
    );
    let (_ip, port, pin) = ready.recv_timeout(Duration::from_secs(5)).expect("ready");

    let receiver = ReceiverSession::new(save_dir.clone(), pin, ReceiverCallbacks::default());
    receiver
        .run(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
        .expect("receiver session");
    sender.join().expect("sender thread").expect("sender session");

    assert_eq!(fs::read(save_dir.join("ten.bin")).expect("dest"), b"0123456789");
    assert!(!save_dir.join("ten.bin.fluxpart").exists());
}

#[test]
fn two_file_session_with_mid_session_rejection() {
    let scratch = tempfile::tempdir().expect("tempdir");
    let source_a = scratch.path().join("a.bin");
    let source_b = scratch.path().join("b.bin");
    fs::write(&source_a, vec![b'a'; 10]).expect("write a");
    fs::write(&source_b, vec![b'b'; 20]).expect("write b");
    let save_dir = scratch.path().join("downloads");
    fs::create_dir_all(&save_dir).expect("mkdir save");

    let (ready, sender) = spawn_sender(
        vec![job(&source_a, "a.bin", 9), job(&source_b, "b.bin", 9)],
        45_614,
        Arc::new(AtomicUsize::new(0)),
        Arc::new(AtomicUsize::new(0)),
    );
    let (_ip, port, pin) = ready.recv_timeout(Duration::from_secs(5)).expect("ready");

    let callbacks = ReceiverCallbacks {
        on_file_request: Some(Box::new(|filename, _size| filename == "a.bin")),
        ..ReceiverCallbacks::default()
    };
    let receiver = ReceiverSession::new(save_dir.clone(), pin, callbacks);
    receiver
        .run(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
        .expect("receiver session");
    sender.join().expect("sender thread").expect("sender session");

    assert_eq!(fs::read(save_dir.join("a.bin")).expect("a"), vec![b'a'; 10]);
    assert!(!save_dir.join("b.bin").exists());
    assert!(!save_dir.join("b.bin.fluxpart").exists());
}

#[test]
fn metas_arrive_in_queue_order() {
    let scratch = tempfile::tempdir().expect("tempdir");
    let names = ["first.bin", "second.bin", "third.bin"];
    let mut jobs = Vec::new();
    for name in names {
        let source = scratch.path().join(name);
        fs::write(&source, name.as_bytes()).expect("write source");
        jobs.push(job(&source, name, 11));
    }
    let save_dir = scratch.path().join("downloads");
    fs::create_dir_all(&save_dir).expect("mkdir save");

    let (ready, sender) = spawn_sender(
        jobs,
        45_615,
        Arc::new(AtomicUsize::new(0)),
        Arc::new(AtomicUsize::new(0)),
    );
    let (_ip, port, pin) = ready.recv_timeout(Duration::from_secs(5)).expect("ready");

    let announced = Arc::new(Mutex::new(Vec::new()));
    let record = Arc::clone(&announced);
    let callbacks = ReceiverCallbacks {
        on_file_request: Some(Box::new(move |filename, _size| {
            record.lock().expect("lock").push(filename.to_owned());
            true
        })),
        ..ReceiverCallbacks::default()
    };
    let receiver = ReceiverSession::new(save_dir, pin, callbacks);
    receiver
        .run(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
        .expect("receiver session");
    sender.join().expect("sender thread").expect("sender session");

    assert_eq!(*announced.lock().expect("lock"), names);
}

#[test]
fn missing_source_is_skipped_not_fatal() {
    let scratch = tempfile::tempdir().expect("tempdir");
    let present = scratch.path().join("real.bin");
    fs::write(&present, b"real").expect("write source");
    let save_dir = scratch.path().join("downloads");
    fs::create_dir_all(&save_dir).expect("mkdir save");

    let jobs = vec![
        job(&scratch.path().join("ghost.bin"), "ghost.bin", 13),
        job(&present, "real.bin", 13),
    ];
    let (ready, sender) = spawn_sender(
        jobs,
        45_616,
        Arc::new(AtomicUsize::new(0)),
        Arc::new(AtomicUsize::new(0)),
    );
    let (_ip, port, pin) = ready.recv_timeout(Duration::from_secs(5)).expect("ready");

    let receiver = ReceiverSession::new(save_dir.clone(), pin, ReceiverCallbacks::default());
    receiver
        .run(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
        .expect("receiver session");
    sender.join().expect("sender thread").expect("sender session");

    assert!(!save_dir.join("ghost.bin").exists());
    assert_eq!(fs::read(save_dir.join("real.bin")).expect("real"), b"real");
}

#[test]
fn cancel_flag_stops_the_accept_loop_promptly() {
    let scratch = tempfile::tempdir().expect("tempdir");
    let source = scratch.path().join("a.bin");
    fs::write(&source, b"x").expect("write source");

    let cancel = Arc::new(AtomicBool::new(true));
    let callbacks = SenderCallbacks {
        cancel_flag: Some(Arc::clone(&cancel)),
        ..SenderCallbacks::default()
    };
    let session = SenderSession::new(
        vec![job(&source, "a.bin", 21)],
        callbacks,
        InstanceId::generate(),
    )
    .with_discovery(test_discovery(45_617));

    let started = Instant::now();
    let result = session.run();
    assert!(matches!(result, Err(SessionError::AcceptCancelled)));
    assert!(
        started.elapsed() < Duration::from_millis(400),
        "accept loop took {:?} to notice the cancel flag",
        started.elapsed()
    );
}

#[test]
fn empty_queue_fails_with_no_work() {
    let session = SenderSession::new(Vec::new(), SenderCallbacks::default(), InstanceId::generate())
        .with_discovery(test_discovery(45_618));
    assert!(matches!(session.run(), Err(SessionError::NoWork)));
}

#[cfg(unix)]
#[test]
fn oversized_file_is_declined_for_lack_of_space() {
    use protocol::{Command, FileInfo};
    use transfer::FramedStream;

    let scratch = tempfile::tempdir().expect("tempdir");
    let save_dir = scratch.path().to_path_buf();

    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();

    // Hand-rolled sender half: authenticate, then advertise a file no disk
    // can hold.
    let fake_sender = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut stream = FramedStream::new(stream);

        let header = stream.recv_header().expect("auth header");
        assert_eq!(header.command(), Some(Command::Auth));
        let _digest = stream
            .recv_control_payload(header.payload_size)
            .expect("auth payload");
        stream.send_control(Command::AuthOk, 0, 17).expect("auth ok");

        stream
            .send_file_meta(&FileInfo::new("huge.bin", u64::MAX), 17)
            .expect("meta");
        let answer = stream.recv_header().expect("answer");
        assert_eq!(answer.command(), Some(Command::Cancel));
        // Orderly close ends the session.
    });

    let receiver = ReceiverSession::new(save_dir.clone(), 1234, ReceiverCallbacks::default());
    receiver
        .run(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
        .expect("receiver session");
    fake_sender.join().expect("fake sender");

    assert!(!save_dir.join("huge.bin").exists());
    assert!(!save_dir.join("huge.bin.fluxpart").exists());
}

#[test]
fn traversal_filenames_terminate_the_session() {
    use protocol::{Command, FileInfo};
    use transfer::FramedStream;

    let scratch = tempfile::tempdir().expect("tempdir");

    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();

    let fake_sender = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut stream = FramedStream::new(stream);
        let header = stream.recv_header().expect("auth header");
        let _digest = stream
            .recv_control_payload(header.payload_size)
            .expect("auth payload");
        stream.send_control(Command::AuthOk, 0, 3).expect("auth ok");
        stream
            .send_file_meta(&FileInfo::new("../escape.bin", 4), 3)
            .expect("meta");
        // The receiver drops the connection; nothing more to read.
    });

    let receiver = ReceiverSession::new(scratch.path().to_path_buf(), 4321, ReceiverCallbacks::default());
    let result = receiver.run(IpAddr::V4(Ipv4Addr::LOCALHOST), port);
    assert!(matches!(result, Err(SessionError::ProtocolViolation(_))));
    fake_sender.join().expect("fake sender");
}
