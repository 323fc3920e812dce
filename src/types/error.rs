//! Error types for the Gemini bridge

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the bridge
#[derive(Debug, Error)]
pub enum BridgeError {
    // === Request errors ===
    /// Workspace root does not exist
    #[error("Workspace root not found: {}", .0.display())]
    WorkspaceNotFound(PathBuf),

    /// Invalid value in the environment configuration
    #[error("Configuration error: {0}")]
    Config(String),

    // === Process errors ===
    /// The CLI could not be spawned
    #[error("Failed to spawn {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A piped stdio handle was not available after spawn
    #[error("Child process has no {0} pipe")]
    MissingPipe(&'static str),

    // === External errors ===
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for the bridge
pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    /// Check if this error is a client error (caused by invalid input)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BridgeError::WorkspaceNotFound(_) | BridgeError::Config(_)
        )
    }

    // === Constructor helpers ===

    /// Create a configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        BridgeError::Config(msg.into())
    }

    /// Create a spawn failure for the given program
    pub fn spawn_failed(program: impl Into<String>, source: std::io::Error) -> Self {
        BridgeError::SpawnFailed {
            program: program.into(),
            source,
        }
    }

    /// Create a workspace not found error
    pub fn workspace_not_found(path: impl Into<PathBuf>) -> Self {
        BridgeError::WorkspaceNotFound(path.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = BridgeError::workspace_not_found("/nope");
        assert_eq!(err.to_string(), "Workspace root not found: /nope");

        let err = BridgeError::MissingPipe("stdout");
        assert_eq!(err.to_string(), "Child process has no stdout pipe");

        let err = BridgeError::config_error("GEMINI_BRIDGE_POLL_MS=fast");
        assert_eq!(err.to_string(), "Configuration error: GEMINI_BRIDGE_POLL_MS=fast");
    }

    #[test]
    fn test_spawn_failed_keeps_source() {
        let err = BridgeError::spawn_failed(
            "gemini",
            std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
        );
        assert_eq!(
            err.to_string(),
            "Failed to spawn gemini: No such file or directory"
        );
        assert!(err.source().is_some());
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_is_client_error() {
        assert!(BridgeError::workspace_not_found("/x").is_client_error());
        assert!(BridgeError::config_error("bad value").is_client_error());
        assert!(!BridgeError::MissingPipe("stderr").is_client_error());
    }

    #[test]
    fn test_from_conversions() {
        let io: BridgeError = std::io::Error::other("boom").into();
        assert!(matches!(io, BridgeError::Io(_)));

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let json: BridgeError = json_err.into();
        assert!(matches!(json, BridgeError::Json(_)));
    }
}
