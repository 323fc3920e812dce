//! Gemini bridge
//!
//! This module ties the pieces together:
//! - building the gemini command line for a request
//! - reducing the CLI's `stream-json` output to a report
//! - logging setup and the top-level run

mod aggregator;
mod command;
mod runner;

pub use aggregator::{TurnAggregator, aggregate};
pub use command::{LaunchSpec, build_args, escape_prompt, resolve_program, windows_escape};
pub use runner::{run_bridge, run_with_cli, shutdown_otel};
