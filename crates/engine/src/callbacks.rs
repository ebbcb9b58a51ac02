//! Host callback contracts.
//!
//! Hosts (a GUI, the CLI, a test harness) observe a session through optional
//! callables. Every callback is invoked from the session thread; hosts that
//! marshal to another thread own that bridging, including for
//! `on_file_request`, which is synchronous: the session blocks until the
//! answer comes back. Each unset field is simply skipped, and an unset
//! `on_file_request` means auto-accept.

use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// `(message)` status line.
pub type StatusFn = Box<dyn Fn(&str) + Send>;
/// `(filename, bytes_done, bytes_total, mibps)` rate-limited progress.
pub type ProgressFn = Box<dyn Fn(&str, u64, u64, f64) + Send>;
/// `()` exactly once on successful termination.
pub type CompleteFn = Box<dyn Fn() + Send>;
/// `(ip, port, pin)` once the sender is ready to be joined.
pub type ReadyFn = Box<dyn Fn(IpAddr, u16, u16) + Send>;
/// `(filename, size) -> accept` synchronous per-file prompt.
pub type FileRequestFn = Box<dyn Fn(&str, u64) -> bool + Send>;

/// Callbacks a sender host may provide.
#[derive(Default)]
pub struct SenderCallbacks {
    /// Invoked with the endpoint and PIN once the listener is up.
    pub on_ready: Option<ReadyFn>,
    /// Human-readable session status lines.
    pub on_status: Option<StatusFn>,
    /// Per-file transfer progress.
    pub on_progress: Option<ProgressFn>,
    /// Successful termination; mutually exclusive with `on_error`.
    pub on_complete: Option<CompleteFn>,
    /// Failed termination; mutually exclusive with `on_complete`.
    pub on_error: Option<StatusFn>,
    /// Set by the host to request cooperative cancellation.
    pub cancel_flag: Option<Arc<AtomicBool>>,
}

/// Callbacks a receiver host may provide.
#[derive(Default)]
pub struct ReceiverCallbacks {
    /// Human-readable session status lines.
    pub on_status: Option<StatusFn>,
    /// Per-file transfer progress.
    pub on_progress: Option<ProgressFn>,
    /// Successful termination; mutually exclusive with `on_error`.
    pub on_complete: Option<CompleteFn>,
    /// Failed termination; mutually exclusive with `on_complete`.
    pub on_error: Option<StatusFn>,
    /// Synchronous accept prompt; absent means auto-accept.
    pub on_file_request: Option<FileRequestFn>,
    /// Set by the host to request cooperative cancellation.
    pub cancel_flag: Option<Arc<AtomicBool>>,
}

macro_rules! forward {
    ($self:ident . $field:ident ( $($arg:expr),* )) => {
        if let Some(callback) = &$self.$field {
            callback($($arg),*);
        }
    };
}

impl SenderCallbacks {
    pub(crate) fn ready(&self, ip: IpAddr, port: u16, pin: u16) {
        forward!(self.on_ready(ip, port, pin));
    }

    pub(crate) fn status(&self, message: &str) {
        forward!(self.on_status(message));
    }

    pub(crate) fn progress(&self, filename: &str, done: u64, total: u64, mibps: f64) {
        forward!(self.on_progress(filename, done, total, mibps));
    }

    pub(crate) fn complete(&self) {
        forward!(self.on_complete());
    }

    pub(crate) fn error(&self, message: &str) {
        forward!(self.on_error(message));
    }

    pub(crate) fn cancelled(&self) -> bool {
        self.cancel_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

impl ReceiverCallbacks {
    pub(crate) fn status(&self, message: &str) {
        forward!(self.on_status(message));
    }

    pub(crate) fn progress(&self, filename: &str, done: u64, total: u64, mibps: f64) {
        forward!(self.on_progress(filename, done, total, mibps));
    }

    pub(crate) fn complete(&self) {
        forward!(self.on_complete());
    }

    pub(crate) fn error(&self, message: &str) {
        forward!(self.on_error(message));
    }

    /// Asks the host whether to accept a file; auto-accepts when no prompt
    /// callback is installed.
    pub(crate) fn file_request(&self, filename: &str, size: u64) -> bool {
        self.on_file_request
            .as_ref()
            .is_none_or(|callback| callback(filename, size))
    }

    pub(crate) fn cancelled(&self) -> bool {
        self.cancel_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}
