#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `engine` drives a FluxDrop session from discovery to the last byte. It owns
//! the PIN credential primitive, the UDP beacon broadcaster and listener,
//! the FIFO job queue, and the sender/receiver session state machines that
//! run the framed protocol from [`transfer`] over one exclusively owned TCP
//! socket per side.
//!
//! # Design
//!
//! - Sessions run synchronously on the caller's thread with blocking I/O;
//!   discovery runs on its own worker threads. Hosts observe everything
//!   through the callback structs in [`callbacks`] and cancel through a
//!   shared atomic flag.
//! - A session is bound to one `session_id` and one socket; neither half
//!   reconnects mid-session. Terminal states surface as exactly one of
//!   `on_complete` or `on_error`.
//! - The process-wide [`InstanceId`] is generated once at startup and passed
//!   explicitly to the broadcaster and listener so a process never discovers
//!   itself.
//!
//! # Errors
//!
//! Every failure funnels into [`SessionError`]; recoverable per-file
//! conditions (missing source, declined file, insufficient space) are
//! handled inside the job loop and never terminate the session.

pub mod auth;
pub mod callbacks;
pub mod discovery;
pub mod job;
pub mod receiver;
pub mod sender;
pub mod session;
pub mod storage;

mod error;

pub use callbacks::{ReceiverCallbacks, SenderCallbacks};
pub use discovery::{Broadcaster, DiscoveredDevice, DiscoveryConfig, InstanceId, Listener};
pub use error::SessionError;
pub use job::{TransferJob, expand_paths};
pub use receiver::ReceiverSession;
pub use sender::SenderSession;
pub use session::SessionState;
