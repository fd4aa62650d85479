//! `fernet-tool` — binary entry point.
//!
//! Startup sequence:
//! 1. Parse the command from the arguments.
//! 2. Load and validate [`Config`] from environment variables.
//! 3. Initialise structured JSON logging on stderr.
//! 4. Run the command over stdin/stdout.

mod commands;
mod config;
mod report;
mod telemetry;

use std::io;

use anyhow::Result;
use fernet::{OsRandom, SystemClock};
use tracing::info;

use config::Config;

fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Command
    // -----------------------------------------------------------------------
    let command = commands::parse_args(std::env::args().skip(1)).map_err(|e| {
        eprintln!("ERROR: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 3. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init(&cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        command = %command,
        "fernet-tool starting"
    );

    // -----------------------------------------------------------------------
    // 4. Command
    // -----------------------------------------------------------------------
    let mut stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    commands::run(command, &cfg, SystemClock, OsRandom, &mut stdin, &mut stdout)
}
