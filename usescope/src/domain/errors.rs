//! Structured error types for usescope
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! Each pipeline stage has its own enum so the CLI can tell a tool failure
//! apart from a capture that succeeded but produced nothing to draw.

use thiserror::Error;

/// Errors from the capture stage (external profiler invocation).
#[derive(Error, Debug)]
pub enum ProfilerError {
    #[error("{tool} not found on PATH: {hint}")]
    ToolUnavailable { tool: String, hint: String },

    #[error("{tool} failed ({status}): {stderr}")]
    CaptureFailed { tool: String, status: String, stderr: String },

    #[error("{tool} permission denied (run with sudo or lower perf_event_paranoid): {stderr}")]
    PermissionDenied { tool: String, stderr: String },

    #[error("{tool} capture cancelled")]
    Cancelled { tool: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors from folding, tree building and rendering.
#[derive(Error, Debug)]
pub enum FlameError {
    #[error("profiler output contained no parseable stack records")]
    EmptyInput,

    #[error("no samples found in collapsed stacks")]
    EmptyTree,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_failed_surfaces_stderr() {
        let err = ProfilerError::CaptureFailed {
            tool: "perf record".to_string(),
            status: "exit status: 255".to_string(),
            stderr: "invalid event".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("perf record"));
        assert!(msg.contains("invalid event"));
    }

    #[test]
    fn test_tool_unavailable_display() {
        let err = ProfilerError::ToolUnavailable {
            tool: "perf".to_string(),
            hint: "install linux-tools-common or equivalent".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "perf not found on PATH: install linux-tools-common or equivalent"
        );
    }

    #[test]
    fn test_permission_denied_mentions_permission() {
        let err = ProfilerError::PermissionDenied {
            tool: "dtrace".to_string(),
            stderr: "dtrace: failed to initialize dtrace: DTrace requires additional privileges"
                .to_string(),
        };
        assert!(err.to_string().to_lowercase().contains("permission denied"));
    }
}
