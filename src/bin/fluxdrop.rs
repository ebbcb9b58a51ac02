//! `fluxdrop` binary entry point.

use std::process::ExitCode;

fn main() -> ExitCode {
    cli::run()
}
