//! Bridge configuration from environment variables

use std::time::Duration;

use super::error::{BridgeError, Result};

/// Default CLI binary name
pub const DEFAULT_BINARY: &str = "gemini";
/// Delay between seeing `turn.completed` and asking the CLI to exit
pub const DEFAULT_GRACE_DELAY: Duration = Duration::from_millis(300);
/// Bounded wait on the line queue before checking process liveness
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// How long to wait for the CLI to exit before killing it
pub const DEFAULT_EXIT_TIMEOUT: Duration = Duration::from_secs(5);
/// How long to wait for the reader tasks to finish
pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Bridge configuration loaded from environment variables
///
/// Everything here has a sensible default; the environment only exists so the
/// binary location and shutdown timings can be tuned without new CLI flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// CLI binary name or path
    /// Environment variable: `GEMINI_BRIDGE_BINARY`
    pub binary: String,

    /// Grace delay after the turn completes
    /// Environment variable: `GEMINI_BRIDGE_GRACE_MS`
    pub grace_delay: Duration,

    /// Queue poll interval
    /// Environment variable: `GEMINI_BRIDGE_POLL_MS`
    pub poll_interval: Duration,

    /// Exit wait before a forced kill
    /// Environment variable: `GEMINI_BRIDGE_EXIT_TIMEOUT_MS`
    pub exit_timeout: Duration,

    /// Reader join timeout
    /// Environment variable: `GEMINI_BRIDGE_JOIN_TIMEOUT_MS`
    pub join_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            binary: DEFAULT_BINARY.to_string(),
            grace_delay: DEFAULT_GRACE_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            exit_timeout: DEFAULT_EXIT_TIMEOUT,
            join_timeout: DEFAULT_JOIN_TIMEOUT,
        }
    }
}

impl BridgeConfig {
    /// Create a configuration with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    ///
    /// Unset or empty variables keep their defaults. Durations are whole
    /// milliseconds; values that fail to parse are logged and ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let binary = std::env::var("GEMINI_BRIDGE_BINARY")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.binary);

        Self {
            binary,
            grace_delay: duration_from_env("GEMINI_BRIDGE_GRACE_MS", defaults.grace_delay),
            poll_interval: duration_from_env("GEMINI_BRIDGE_POLL_MS", defaults.poll_interval),
            exit_timeout: duration_from_env("GEMINI_BRIDGE_EXIT_TIMEOUT_MS", defaults.exit_timeout),
            join_timeout: duration_from_env("GEMINI_BRIDGE_JOIN_TIMEOUT_MS", defaults.join_timeout),
        }
    }
}

fn duration_from_env(key: &str, default: Duration) -> Duration {
    let Ok(raw) = std::env::var(key) else {
        return default;
    };

    match parse_millis(key, &raw) {
        Ok(Some(duration)) => duration,
        Ok(None) => default,
        Err(e) => {
            tracing::warn!(
                error = %e,
                default_ms = default.as_millis(),
                "Ignoring invalid duration in environment"
            );
            default
        }
    }
}

/// Parse a whole number of milliseconds; blank means unset
fn parse_millis(key: &str, raw: &str) -> Result<Option<Duration>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    raw.parse::<u64>()
        .map(|ms| Some(Duration::from_millis(ms)))
        .map_err(|e| BridgeError::config_error(format!("{key}={raw:?}: {e}")))
}
