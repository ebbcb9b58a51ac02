//! Console presentation of session callbacks.

use std::io::{self, Write};

use engine::auth::{PIN_MAX, PIN_MIN};
use engine::{ReceiverCallbacks, SenderCallbacks};

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Sender callbacks rendering to the terminal.
pub fn sender_callbacks() -> SenderCallbacks {
    SenderCallbacks {
        on_ready: Some(Box::new(|ip, port, pin| {
            println!("Serving on {ip}:{port}");
            println!("Share this PIN with the receiver: {pin}");
        })),
        on_status: Some(Box::new(|message| eprintln!("{message}"))),
        on_progress: Some(Box::new(progress_meter)),
        on_complete: Some(Box::new(|| println!("All files sent."))),
        on_error: Some(Box::new(|message| eprintln!("fluxdrop: {message}"))),
        cancel_flag: None,
    }
}

/// Receiver callbacks rendering to the terminal.
///
/// With `auto_accept` the per-file prompt is left unset, which the session
/// treats as accept-everything.
pub fn receiver_callbacks(auto_accept: bool) -> ReceiverCallbacks {
    ReceiverCallbacks {
        on_status: Some(Box::new(|message| eprintln!("{message}"))),
        on_progress: Some(Box::new(progress_meter)),
        on_complete: Some(Box::new(|| println!("All files received."))),
        on_error: Some(Box::new(|message| eprintln!("fluxdrop: {message}"))),
        on_file_request: if auto_accept {
            None
        } else {
            Some(Box::new(prompt_accept))
        },
        cancel_flag: None,
    }
}

/// Single-line progress meter: percent, throughput, and an mm:ss ETA.
fn progress_meter(filename: &str, done: u64, total: u64, mibps: f64) {
    let percent = if total == 0 {
        100
    } else {
        done.saturating_mul(100) / total
    };
    let eta_seconds = if mibps > 0.0 {
        ((total.saturating_sub(done)) as f64 / (mibps * BYTES_PER_MIB)) as u64
    } else {
        0
    };
    eprint!(
        "\r{filename}: {percent:>3}% | {mibps:.1} MiB/s | ETA {:02}:{:02}  ",
        eta_seconds / 60,
        eta_seconds % 60
    );
    let _ = io::stderr().flush();
    if done >= total {
        eprintln!();
    }
}

/// Reads the 4-digit PIN from stdin, retrying on malformed input.
pub fn prompt_pin() -> io::Result<u16> {
    loop {
        eprint!("PIN: ");
        io::stderr().flush()?;
        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "no PIN supplied",
            ));
        }
        match line.trim().parse::<u16>() {
            Ok(pin) if (PIN_MIN..=PIN_MAX).contains(&pin) => return Ok(pin),
            _ => eprintln!("Enter the 4-digit PIN shown on the sender."),
        }
    }
}

/// Synchronous per-file accept prompt; default answer is yes.
fn prompt_accept(filename: &str, size: u64) -> bool {
    eprint!("Accept {filename} ({size} bytes)? [Y/n] ");
    if io::stderr().flush().is_err() {
        return false;
    }
    let mut line = String::new();
    match io::stdin().read_line(&mut line) {
        Ok(0) | Err(_) => false,
        Ok(_) => matches!(line.trim().to_ascii_lowercase().as_str(), "" | "y" | "yes"),
    }
}
