#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! The `fluxdrop` command-line frontend: argument parsing, console
//! presentation of session callbacks, and exit-code mapping. All transfer
//! behavior lives in [`engine`]; this crate only wires stdin/stderr to the
//! session callback contract.

mod args;
mod commands;
mod console;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

pub use args::{Cli, Commands};

/// Parses `std::env::args`, runs the requested command, and maps the result
/// to a process exit code.
#[must_use]
pub fn run() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let instance_id = engine::InstanceId::generate();

    let result = match cli.command {
        Commands::Host { paths } => commands::host(&paths, instance_id),
        Commands::Join {
            session_id,
            save_dir,
            yes,
        } => commands::join(session_id, save_dir, yes, instance_id),
        Commands::Connect {
            ip,
            port,
            save_dir,
            yes,
        } => commands::connect(ip, port, save_dir, yes),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        // The session already reported the failure through on_error.
        Err(_) => ExitCode::FAILURE,
    }
}

/// Installs the stderr tracing subscriber, honouring `RUST_LOG`.
fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
