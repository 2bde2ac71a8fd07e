//! taskm - task manager CLI
//!
//! Adds, lists, completes and deletes prioritised tasks stored under a local
//! directory, archiving completed ones in the background.

use clap::error::ErrorKind;
use taskm::cli::Invocation;
use taskm::error::exit_codes;
use taskm::output::emit_error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    // Diagnostics go to stderr; RUST_LOG overrides the default level.
    // Ignore invalid/huge filters so a bad environment cannot stop startup.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() || raw.len() > 4096 {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let invocation = match Invocation::try_parse_from(std::env::args_os()) {
        Ok(invocation) => invocation,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => exit_codes::SUCCESS,
                _ => exit_codes::USER_ERROR,
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    let command = invocation.command_name();
    let json = invocation.json();
    if let Err(err) = invocation.run().await {
        let _ = emit_error(command, &err, json);
        std::process::exit(err.exit_code());
    }
}
