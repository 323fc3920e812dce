//! Turn-completion detection

use serde_json::Value;

/// Event type gemini emits once the assistant turn is over
pub const TURN_COMPLETED: &str = "turn.completed";

/// Check whether a line is the `turn.completed` event
///
/// Anything that is not a JSON object with a matching `type` is simply not the
/// sentinel; this never fails.
pub fn is_turn_completed(line: &str) -> bool {
    let Ok(value) = serde_json::from_str::<Value>(line) else {
        return false;
    };
    value.get("type").and_then(Value::as_str) == Some(TURN_COMPLETED)
}
