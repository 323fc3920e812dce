//! Gemini bridge binary
//!
//! Run with: cargo run -- --PROMPT "..." --cd <workspace>
//!
//! For help: cargo run -- --help

use clap::Parser;
use gemini_bridge::{cli::Cli, run_with_cli, shutdown_otel};
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Dropping the run on a signal drops the CLI process group with it
    let result = tokio::select! {
        result = run_with_cli(&cli) => result,
        _ = signal::ctrl_c() => {
            eprintln!("Received SIGINT, shutting down...");
            Ok(())
        }
        () = terminate_signal() => {
            eprintln!("Received SIGTERM, shutting down...");
            Ok(())
        }
    };

    shutdown_otel();

    if let Err(e) = result {
        // stdout is reserved for the JSON report
        eprintln!("Error: {}", e);
        eprintln!("\nFor debugging, run with --diagnostic to log to a file.");
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(unix)]
async fn terminate_signal() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            eprintln!("Failed to register SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate_signal() {
    std::future::pending::<()>().await;
}
