//! Reduce gemini's `stream-json` events to a single report

use std::ops::ControlFlow;

use futures::{Stream, StreamExt};
use serde_json::{Map, Value};

use crate::types::BridgeReport;

const MISSING_SESSION_PREFIX: &str = "Failed to get `SESSION_ID` from the gemini session.\n\n";

const MISSING_MESSAGES_PREFIX: &str = "Failed to retrieve `agent_messages` from the Gemini session. \
This might be due to Gemini performing a tool call. \
You can continue using the `SESSION_ID` to proceed with the conversation.\n\n";

/// Accumulates one turn of gemini output
#[derive(Debug, Default)]
pub struct TurnAggregator {
    all_messages: Vec<Value>,
    agent_messages: String,
    session_id: Option<Value>,
    errors: String,
}

impl TurnAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one output line into the aggregate
    ///
    /// Lines that are not JSON, blank ones included, are recorded and skipped.
    /// A line that is JSON but cannot be an event is kept in `all_messages`
    /// and breaks the loop: the rest of the stream is not trustworthy.
    pub fn push_line(&mut self, line: &str) -> ControlFlow<()> {
        let line = line.trim();

        let value = match serde_json::from_str::<Value>(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(error = %e, line = %line, "Skipping non-JSON output line");
                self.errors.push_str("\n\n[json decode error] ");
                self.errors.push_str(line);
                return ControlFlow::Continue(());
            }
        };

        let Value::Object(event) = value else {
            self.all_messages.push(value);
            return self.halt("event is not a JSON object", line);
        };

        if let Err(reason) = self.absorb(&event) {
            self.all_messages.push(Value::Object(event));
            return self.halt(reason, line);
        }

        self.all_messages.push(Value::Object(event));
        ControlFlow::Continue(())
    }

    fn absorb(&mut self, event: &Map<String, Value>) -> Result<(), &'static str> {
        let event_type = event.get("type").and_then(Value::as_str).unwrap_or("");
        let role = event.get("role").and_then(Value::as_str).unwrap_or("");

        if event_type == "message" && role == "assistant" {
            match event.get("content") {
                None => {}
                Some(Value::String(text)) => self.agent_messages.push_str(text),
                Some(_) => return Err("assistant content is not a string"),
            }
        }

        match event.get("session_id") {
            None | Some(Value::Null) => {}
            Some(id) => self.session_id = Some(id.clone()),
        }

        Ok(())
    }

    fn halt(&mut self, reason: &str, line: &str) -> ControlFlow<()> {
        tracing::warn!(reason = %reason, "Stopping on unexpected CLI output");
        self.errors.push_str(&format!(
            "\n\n[unexpected error] Unexpected error: {reason}. Line: {line:?}"
        ));
        ControlFlow::Break(())
    }

    /// Session id seen so far, as the CLI sent it
    pub fn session_id(&self) -> Option<&Value> {
        self.session_id.as_ref()
    }

    /// Assistant text accumulated so far
    pub fn agent_messages(&self) -> &str {
        &self.agent_messages
    }

    /// Build the final report
    ///
    /// Success needs both a non-empty session id and some assistant text;
    /// anything recorded along the way is only reported on failure.
    pub fn finish(self, return_all_messages: bool) -> BridgeReport {
        let all_messages = return_all_messages.then_some(self.all_messages);

        // An empty string cannot resume anything
        let session_id = self.session_id.filter(|id| id.as_str() != Some(""));
        let Some(session_id) = session_id else {
            return BridgeReport {
                all_messages,
                ..BridgeReport::failure(format!("{MISSING_SESSION_PREFIX}{}", self.errors))
            };
        };

        if self.agent_messages.is_empty() {
            return BridgeReport {
                session_id: Some(session_id),
                all_messages,
                ..BridgeReport::failure(format!("{MISSING_MESSAGES_PREFIX}{}", self.errors))
            };
        }

        BridgeReport {
            session_id: Some(session_id),
            agent_messages: Some(self.agent_messages),
            error: None,
            success: true,
            all_messages,
        }
    }
}

/// Consume a line stream and build the report
///
/// Stops reading early if the aggregator gives up; dropping the stream then
/// takes care of the process.
pub async fn aggregate<S>(lines: S, return_all_messages: bool) -> BridgeReport
where
    S: Stream<Item = String>,
{
    let mut lines = std::pin::pin!(lines);
    let mut aggregator = TurnAggregator::new();
    let mut count = 0usize;

    while let Some(line) = lines.next().await {
        count += 1;
        if aggregator.push_line(&line).is_break() {
            break;
        }
    }

    tracing::debug!(
        lines = count,
        has_session = aggregator.session_id().is_some(),
        text_len = aggregator.agent_messages().len(),
        "Finished reading CLI output"
    );

    aggregator.finish(return_all_messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const INIT: &str = r#"{"type":"init","timestamp":"2025-01-01T00:00:00Z","session_id":"a1b2","model":"gemini-2.5-pro"}"#;
    const USER: &str = r#"{"type":"message","role":"user","content":"say hi"}"#;
    const DELTA_1: &str = r#"{"type":"message","role":"assistant","content":"Hel","delta":true}"#;
    const DELTA_2: &str = r#"{"type":"message","role":"assistant","content":"lo!","delta":true}"#;
    const DONE: &str = r#"{"type":"turn.completed"}"#;

    fn run(lines: &[&str], return_all: bool) -> BridgeReport {
        let mut aggregator = TurnAggregator::new();
        for line in lines {
            if aggregator.push_line(line).is_break() {
                break;
            }
        }
        aggregator.finish(return_all)
    }

    #[test]
    fn test_successful_turn() {
        let report = run(&[INIT, USER, DELTA_1, DELTA_2, DONE], false);
        assert_eq!(
            report,
            BridgeReport {
                session_id: Some(json!("a1b2")),
                agent_messages: Some("Hello!".to_string()),
                error: None,
                success: true,
                all_messages: None,
            }
        );
    }

    #[test]
    fn test_user_messages_are_not_collected() {
        let report = run(&[INIT, USER], false);
        assert!(!report.success);
        assert_eq!(report.session_id, Some(json!("a1b2")));
    }

    #[test]
    fn test_missing_session_id() {
        let report = run(&[DELTA_1, DELTA_2], false);
        assert!(!report.success);
        assert!(report.session_id.is_none());
        assert!(report.agent_messages.is_none());
        assert_eq!(report.error.as_deref(), Some(MISSING_SESSION_PREFIX));
    }

    #[test]
    fn test_tool_call_without_text() {
        let tool = r#"{"type":"tool_use","tool_name":"read_file","parameters":{"path":"a.rs"}}"#;
        let report = run(&[INIT, tool, DONE], false);

        assert!(!report.success);
        assert_eq!(report.session_id, Some(json!("a1b2")));
        let error = report.error.unwrap();
        assert!(error.starts_with("Failed to retrieve `agent_messages`"));
        assert!(error.contains("tool call"));
    }

    #[test]
    fn test_decode_errors_are_recorded_and_skipped() {
        let report = run(&["Loaded cached credentials.", DELTA_1], false);
        assert_eq!(
            report.error.as_deref(),
            Some(
                "Failed to get `SESSION_ID` from the gemini session.\n\n\n\n[json decode error] Loaded cached credentials."
            )
        );
    }

    #[test]
    fn test_decode_errors_do_not_block_success() {
        let report = run(&["[WARN] something noisy", INIT, DELTA_1, DELTA_2], false);
        assert!(report.success);
        assert_eq!(report.agent_messages.as_deref(), Some("Hello!"));
        assert!(report.error.is_none());
    }

    #[test]
    fn test_blank_lines_are_decode_errors() {
        let report = run(&["", "   ", DELTA_1], false);
        assert_eq!(
            report.error.as_deref(),
            Some(
                "Failed to get `SESSION_ID` from the gemini session.\n\n\n\n[json decode error] \n\n[json decode error] "
            )
        );

        let report = run(&["", INIT, DELTA_1], false);
        assert!(report.success);
    }

    #[test]
    fn test_empty_session_id_is_not_success() {
        let report = run(
            &[
                r#"{"type":"init","session_id":""}"#,
                r#"{"type":"message","role":"assistant","content":"hi"}"#,
            ],
            false,
        );

        assert!(!report.success);
        assert!(report.session_id.is_none());
        assert!(report.agent_messages.is_none());
        assert_eq!(report.error.as_deref(), Some(MISSING_SESSION_PREFIX));
    }

    #[test]
    fn test_non_object_json_halts() {
        let mut aggregator = TurnAggregator::new();
        assert!(aggregator.push_line(INIT).is_continue());
        assert!(aggregator.push_line("42").is_break());

        let report = aggregator.finish(false);
        let error = report.error.unwrap();
        assert!(error.contains(
            "[unexpected error] Unexpected error: event is not a JSON object. Line: \"42\""
        ));
    }

    #[test]
    fn test_non_object_json_is_kept_in_all_messages() {
        let report = run(&[r#"{"type":"init","session_id":"s"}"#, "[1,2]", DELTA_1], true);

        assert!(!report.success);
        assert_eq!(
            report.all_messages,
            Some(vec![
                json!({ "type": "init", "session_id": "s" }),
                json!([1, 2]),
            ])
        );
    }

    #[test]
    fn test_non_string_content_halts() {
        let mut aggregator = TurnAggregator::new();
        let bad = r#"{"type":"message","role":"assistant","content":["x"]}"#;
        assert!(aggregator.push_line(bad).is_break());
        assert!(aggregator.agent_messages().is_empty());
    }

    #[test]
    fn test_latest_session_id_wins_and_keeps_its_json_type() {
        let mut aggregator = TurnAggregator::new();
        let _ = aggregator.push_line(r#"{"type":"init","session_id":"first"}"#);
        let _ = aggregator.push_line(r#"{"type":"result","session_id":null}"#);
        assert_eq!(aggregator.session_id(), Some(&json!("first")));

        let _ = aggregator.push_line(r#"{"type":"result","session_id":12345}"#);
        let _ = aggregator.push_line(DELTA_1);
        assert_eq!(aggregator.session_id(), Some(&json!(12345)));

        let rendered = aggregator.finish(false).to_json_pretty().unwrap();
        assert!(rendered.contains("\"SESSION_ID\": 12345,"));
    }

    #[test]
    fn test_return_all_messages() {
        let report = run(&[INIT, "garbage", DELTA_1, DONE], true);
        assert!(report.success);
        let all = report.all_messages.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0]["type"], json!("init"));
        assert_eq!(all[2], json!({ "type": "turn.completed" }));
    }

    #[test]
    fn test_return_all_messages_on_failure() {
        let report = run(&[USER], true);
        assert!(!report.success);
        assert_eq!(report.all_messages.map(|m| m.len()), Some(1));
    }

    #[tokio::test]
    async fn test_aggregate_stream_stops_on_break() {
        let lines = futures::stream::iter(
            [INIT, DELTA_1, "[1]", DELTA_2]
                .into_iter()
                .map(String::from),
        );
        let report = aggregate(lines, false).await;

        assert!(report.success);
        assert_eq!(report.agent_messages.as_deref(), Some("Hel"));
    }
}
