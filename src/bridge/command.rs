//! Gemini CLI invocation

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::types::{BridgeConfig, BridgeRequest};

/// A fully resolved command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    /// Program to execute
    pub program: PathBuf,
    /// Arguments, not including the program
    pub args: Vec<String>,
    /// Working directory; inherits ours when `None`
    pub cwd: Option<PathBuf>,
}

impl LaunchSpec {
    /// Build the gemini command line for a request
    pub fn for_request(request: &BridgeRequest, config: &BridgeConfig) -> Self {
        Self {
            program: resolve_program(&config.binary),
            args: build_args(request),
            cwd: Some(absolute(&request.workspace)),
        }
    }
}

/// Locate `name` on PATH, falling back to the bare name
///
/// The fallback lets spawning produce the real "not found" error instead of
/// failing here.
pub fn resolve_program(name: &str) -> PathBuf {
    which::which(name).unwrap_or_else(|e| {
        tracing::debug!(program = %name, error = %e, "Program not found on PATH");
        PathBuf::from(name)
    })
}

/// Arguments for a `stream-json` run of gemini
///
/// The prompt goes last as a positional argument; newer gemini-cli releases
/// deprecate the `--prompt` flag form.
pub fn build_args(request: &BridgeRequest) -> Vec<String> {
    let mut args = vec!["-o".to_string(), "stream-json".to_string()];

    if request.sandbox {
        args.push("--sandbox".to_string());
    }

    if let Some(model) = &request.model {
        args.push("--model".to_string());
        args.push(model.clone());
    }

    if let Some(session_id) = &request.session_id {
        args.push("--resume".to_string());
        args.push(session_id.clone());
    }

    args.push(escape_prompt(&request.prompt).into_owned());
    args
}

/// Escape the prompt for the current platform
///
/// Only Windows needs it: the prompt passes through a command line that
/// gemini's launcher re-parses there.
pub fn escape_prompt(prompt: &str) -> Cow<'_, str> {
    if cfg!(windows) {
        Cow::Owned(windows_escape(prompt))
    } else {
        Cow::Borrowed(prompt)
    }
}

/// Backslash-escape quotes and control characters
pub fn windows_escape(prompt: &str) -> String {
    let mut escaped = String::with_capacity(prompt.len());
    for ch in prompt.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '\u{8}' => escaped.push_str("\\b"),
            '\u{c}' => escaped.push_str("\\f"),
            '\'' => escaped.push_str("\\'"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
