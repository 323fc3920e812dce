//! Command-line interface definitions
//!
//! Provides CLI argument parsing using clap for the Gemini bridge. The
//! upper-case `--PROMPT` and `--SESSION_ID` flags are part of the interface
//! calling agents already use, so they are kept verbatim.

use std::path::PathBuf;

use clap::Parser;

use crate::types::BridgeRequest;

/// Gemini bridge - run one Gemini CLI turn and report the reply as JSON
#[derive(Parser, Debug, Clone)]
#[command(name = "gemini-bridge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Instruction for the task to send to gemini
    #[arg(long = "PROMPT", value_name = "PROMPT")]
    pub prompt: String,

    /// Workspace root for gemini; the CLI runs in this directory
    #[arg(long = "cd", value_name = "DIR")]
    pub cd: PathBuf,

    /// Run gemini in sandbox mode
    #[arg(long)]
    pub sandbox: bool,

    /// Resume the given gemini session (empty starts a new session)
    #[arg(long = "SESSION_ID", value_name = "SESSION_ID", default_value = "")]
    pub session_id: String,

    /// Return every event from the session (tool calls, traces), not only the reply text
    #[arg(long)]
    pub return_all_messages: bool,

    /// Model override (only when explicitly requested by the user)
    #[arg(long, value_name = "MODEL", default_value = "")]
    pub model: String,

    /// Enable diagnostic mode (auto-log to temp file)
    #[arg(short, long)]
    pub diagnostic: bool,

    /// Log directory (implies diagnostic mode)
    #[arg(short = 'l', long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Log file name (implies diagnostic mode)
    #[arg(short = 'f', long, value_name = "FILE")]
    pub log_file: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    /// Note: RUST_LOG env var takes priority over this flag
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (only errors)
    /// Note: RUST_LOG env var takes priority over this flag
    #[arg(short, long)]
    pub quiet: bool,

    /// OpenTelemetry OTLP endpoint (e.g., http://localhost:4317)
    /// When otel feature is disabled, this argument is accepted but ignored.
    #[arg(long, value_name = "URL", env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otel_endpoint: Option<String>,

    /// OpenTelemetry service name
    #[arg(long, value_name = "NAME", default_value = "gemini-bridge")]
    pub otel_service_name: String,
}

impl Cli {
    /// Check if diagnostic mode is enabled (output to file)
    ///
    /// Returns true if `--diagnostic` is set, or if `--log-dir` or `--log-file` is specified.
    pub fn is_diagnostic(&self) -> bool {
        self.diagnostic || self.log_dir.is_some() || self.log_file.is_some()
    }

    /// Check if OpenTelemetry tracing is enabled
    #[cfg(feature = "otel")]
    pub fn is_otel_enabled(&self) -> bool {
        self.otel_endpoint.is_some()
    }

    /// Check if OpenTelemetry tracing is enabled (always false without otel feature)
    #[cfg(not(feature = "otel"))]
    pub fn is_otel_enabled(&self) -> bool {
        if self.otel_endpoint.is_some() {
            tracing::warn!("--otel-endpoint specified but otel feature is not enabled, ignoring");
        }
        false
    }

    /// Get the log level based on CLI arguments
    ///
    /// stdout carries the JSON report and callers usually capture stderr too,
    /// so the default stays at WARN.
    ///
    /// - `--quiet`: ERROR
    /// - default: WARN
    /// - `-v`: INFO
    /// - `-vv`: DEBUG
    /// - `-vvv` or more: TRACE
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else {
            match self.verbose {
                0 => tracing::Level::WARN,
                1 => tracing::Level::INFO,
                2 => tracing::Level::DEBUG,
                _ => tracing::Level::TRACE,
            }
        }
    }

    /// Get the log file path for diagnostic mode
    ///
    /// Uses the specified log directory and file name, or defaults to:
    /// - Directory: system temp directory
    /// - File: `gemini-bridge-{timestamp}.log`
    pub fn log_path(&self) -> PathBuf {
        let dir = self.log_dir.clone().unwrap_or_else(std::env::temp_dir);

        let filename = self.log_file.clone().unwrap_or_else(|| {
            let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            format!("gemini-bridge-{timestamp}.log")
        });

        dir.join(filename)
    }

    /// Build the bridge request from the parsed flags
    pub fn to_request(&self) -> BridgeRequest {
        BridgeRequest::new(self.prompt.clone(), self.cd.clone())
            .with_sandbox(self.sandbox)
            .with_session_id(self.session_id.clone())
            .with_model(self.model.clone())
            .with_all_messages(self.return_all_messages)
    }
}
