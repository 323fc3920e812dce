//! A single bridge invocation

use std::path::PathBuf;

/// Everything needed to run one gemini turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeRequest {
    /// Instruction sent to gemini
    pub prompt: String,
    /// Workspace root, used as the child's working directory
    pub workspace: PathBuf,
    /// Run gemini with `--sandbox`
    pub sandbox: bool,
    /// Session to resume; `None` starts a new one
    pub session_id: Option<String>,
    /// Model override
    pub model: Option<String>,
    /// Include every parsed event in the report
    pub return_all_messages: bool,
}

impl BridgeRequest {
    /// Create a request for a fresh session with no overrides
    pub fn new(prompt: impl Into<String>, workspace: impl Into<PathBuf>) -> Self {
        Self {
            prompt: prompt.into(),
            workspace: workspace.into(),
            sandbox: false,
            session_id: None,
            model: None,
            return_all_messages: false,
        }
    }

    /// Resume the given session; an empty id means a new session
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = non_empty(session_id.into());
        self
    }

    /// Override the model; an empty name keeps the CLI default
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = non_empty(model.into());
        self
    }

    pub fn with_sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    pub fn with_all_messages(mut self, return_all_messages: bool) -> Self {
        self.return_all_messages = return_all_messages;
        self
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_request_defaults() {
        let request = BridgeRequest::new("hi", "/tmp");
        assert_eq!(request.prompt, "hi");
        assert_eq!(request.workspace, PathBuf::from("/tmp"));
        assert!(!request.sandbox);
        assert!(request.session_id.is_none());
        assert!(request.model.is_none());
        assert!(!request.return_all_messages);
    }

    #[test]
    fn test_empty_strings_normalize_to_none() {
        let request = BridgeRequest::new("hi", "/tmp")
            .with_session_id("")
            .with_model("");
        assert!(request.session_id.is_none());
        assert!(request.model.is_none());

        let request = BridgeRequest::new("hi", "/tmp")
            .with_session_id("abc-123")
            .with_model("gemini-2.5-pro");
        assert_eq!(request.session_id.as_deref(), Some("abc-123"));
        assert_eq!(request.model.as_deref(), Some("gemini-2.5-pro"));
    }
}
