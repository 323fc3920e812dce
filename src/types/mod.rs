//! Public types for the Gemini bridge
//!
//! This module contains all the shared types used across the crate.

mod config;
mod error;
mod report;
mod request;

pub use config::{
    BridgeConfig, DEFAULT_BINARY, DEFAULT_EXIT_TIMEOUT, DEFAULT_GRACE_DELAY,
    DEFAULT_JOIN_TIMEOUT, DEFAULT_POLL_INTERVAL,
};
pub use error::{BridgeError, Result};
pub use report::BridgeReport;
pub use request::BridgeRequest;
