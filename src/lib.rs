//! Gemini bridge
//!
//! Runs the Gemini CLI for a single turn in `stream-json` mode and reduces its
//! event stream to one JSON report: the assistant's reply plus the session id
//! needed to continue the conversation.
//!
//! ## Features
//!
//! - Process-group spawning with kill-on-drop
//! - Line streaming with `turn.completed` detection
//! - Grace-period shutdown that escalates to a kill
//! - Tolerant parsing of non-JSON output
//!
//! ## Quick Start
//!
//! ```no_run
//! use gemini_bridge::{BridgeConfig, BridgeRequest, run_bridge};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let request = BridgeRequest::new("Summarize src/main.rs", ".");
//!     let report = run_bridge(&request, &BridgeConfig::from_env()).await;
//!     println!("{}", report.to_json_pretty()?);
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! - `GEMINI_BRIDGE_BINARY`: CLI binary name or path (default: `gemini`)
//! - `GEMINI_BRIDGE_GRACE_MS`: delay between `turn.completed` and SIGTERM (default: 300)
//! - `GEMINI_BRIDGE_POLL_MS`: bounded wait on the output queue (default: 500)
//! - `GEMINI_BRIDGE_EXIT_TIMEOUT_MS`: wait for exit before killing (default: 5000)
//! - `GEMINI_BRIDGE_JOIN_TIMEOUT_MS`: wait for reader tasks (default: 5000)
//! - `RUST_LOG`: log filter, overrides `-v`/`-q`

pub mod bridge;
pub mod cli;
pub mod process;
pub mod tracing;
pub mod types;

pub use bridge::{LaunchSpec, TurnAggregator, aggregate, run_bridge, run_with_cli, shutdown_otel};
pub use cli::Cli;
pub use process::{LineStream, is_turn_completed, spawn_lines};
pub use types::{BridgeConfig, BridgeError, BridgeReport, BridgeRequest, Result};
