//! The JSON document printed at the end of a run

use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use super::error::BridgeError;

/// Final result of a bridge run
///
/// Field order is the order keys appear in the printed JSON. Exactly one of
/// `agent_messages` or `error` is set, matching `success`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BridgeReport {
    /// Session to pass back via `--SESSION_ID` to continue the conversation,
    /// kept exactly as the CLI reported it
    #[serde(rename = "SESSION_ID", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Value>,

    /// Concatenated assistant text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_messages: Option<String>,

    /// Explanation of what went wrong
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub success: bool,

    /// Every parsed event, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_messages: Option<Vec<Value>>,
}

impl BridgeReport {
    /// A failure report carrying only an error message
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            session_id: None,
            agent_messages: None,
            error: Some(error.into()),
            success: false,
            all_messages: None,
        }
    }

    /// Report for a workspace root that does not exist
    pub fn workspace_missing(path: &Path) -> Self {
        Self::failure(format!(
            "The workspace root directory `{}` does not exist. Please check the path and try again.",
            posix_absolute(path)
        ))
    }

    /// Report for a CLI that could not be started
    pub fn launch_failed(err: &BridgeError) -> Self {
        Self::failure(format!(
            "Failed to launch the gemini CLI: {err}. Make sure `gemini` is installed and on PATH."
        ))
    }

    /// Render as pretty-printed JSON (two-space indent, UTF-8 kept as-is)
    pub fn to_json_pretty(&self) -> Result<String, BridgeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn posix_absolute(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    absolute.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_success_report_key_order() {
        let report = BridgeReport {
            session_id: Some(json!("s-1")),
            agent_messages: Some("héllo".to_string()),
            error: None,
            success: true,
            all_messages: None,
        };

        let rendered = report.to_json_pretty().unwrap();
        assert_eq!(
            rendered,
            "{\n  \"SESSION_ID\": \"s-1\",\n  \"agent_messages\": \"héllo\",\n  \"success\": true\n}"
        );
    }

    #[test]
    fn test_failure_omits_absent_fields() {
        let value = serde_json::to_value(BridgeReport::failure("boom")).unwrap();
        assert_eq!(value, json!({ "error": "boom", "success": false }));
    }

    #[test]
    fn test_all_messages_serialized_last() {
        let report = BridgeReport {
            all_messages: Some(vec![json!({ "type": "init" })]),
            ..BridgeReport::failure("x")
        };
        let rendered = report.to_json_pretty().unwrap();
        let success_at = rendered.find("\"success\"").unwrap();
        let all_at = rendered.find("\"all_messages\"").unwrap();
        assert!(success_at < all_at);
    }

    #[test]
    fn test_workspace_missing_message() {
        let report = BridgeReport::workspace_missing(Path::new("/definitely/not/here"));
        assert!(!report.success);
        assert_eq!(
            report.error.as_deref(),
            Some(
                "The workspace root directory `/definitely/not/here` does not exist. Please check the path and try again."
            )
        );
    }

    #[test]
    fn test_workspace_missing_relative_path_is_absolutized() {
        let report = BridgeReport::workspace_missing(Path::new("missing-dir"));
        let error = report.error.unwrap();
        let cwd = std::env::current_dir().unwrap();
        assert!(error.contains(&cwd.join("missing-dir").to_string_lossy().replace('\\', "/")));
    }

    #[test]
    fn test_launch_failed_mentions_cause() {
        let err = BridgeError::spawn_failed(
            "gemini",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        let report = BridgeReport::launch_failed(&err);
        assert!(!report.success);
        assert!(report.error.unwrap().contains("Failed to spawn gemini: not found"));
    }
}
