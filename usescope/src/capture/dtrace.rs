//! macOS capture strategies: `dtrace` and the `sample` fallback
//!
//! `dtrace` aggregates `ustack()` per profile tick and prints each unique stack
//! root-first followed by its count. `sample` is process-scoped; its report is
//! folded with the same root-first parser, which is only an approximation of
//! its real layout.

use log::{info, warn};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::command::run_tool;
use super::CaptureRequest;
use crate::domain::ProfilerError;

/// D program sampling user stacks at the requested frequency.
#[must_use]
pub fn dtrace_script(request: &CaptureRequest) -> String {
    let probe = format!("profile-{}", request.frequency().0);
    match request.pid() {
        Some(pid) => format!("{probe} /pid == {}/ {{ @[ustack()] = count(); }}", pid.0),
        None => format!("{probe} {{ @[ustack()] = count(); }}"),
    }
}

/// # Errors
/// Returns an error if dtrace fails (commonly for lack of root) or is cancelled.
pub async fn capture_dtrace(
    cancel: &CancellationToken,
    request: &CaptureRequest,
) -> Result<Vec<u8>, ProfilerError> {
    let script = dtrace_script(request);
    info!("Running dtrace -n '{script}'");
    let mut cmd = Command::new("dtrace");
    cmd.arg("-n").arg(&script).arg("-c").arg(format!("sleep {}", request.whole_seconds()));
    Ok(run_tool("dtrace", &mut cmd, cancel).await?.stdout)
}

/// # Errors
/// Returns an error if no target PID was given, or if `sample` fails.
pub async fn capture_sample(
    cancel: &CancellationToken,
    request: &CaptureRequest,
) -> Result<Vec<u8>, ProfilerError> {
    let Some(pid) = request.pid() else {
        return Err(ProfilerError::ToolUnavailable {
            tool: "sample".to_string(),
            hint: "sample requires a target PID".to_string(),
        });
    };
    warn!("Using sample fallback: frame order in the flame graph is approximate");

    let mut cmd = Command::new("sample");
    cmd.arg(pid.0.to_string()).arg(request.whole_seconds().to_string());
    Ok(run_tool("sample", &mut cmd, cancel).await?.stdout)
}
