//! External profiler process runner
//!
//! Spawns one tool invocation, collects its stdout in full and its stderr into
//! a bounded buffer, and kills the child if the capture is cancelled. The child
//! is spawned with `kill_on_drop`, so an aborted capture never leaks it.

use log::{debug, info};
use std::io;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;

use crate::domain::ProfilerError;

/// Maximum stderr bytes kept for diagnostics.
pub const STDERR_LIMIT: usize = 64 * 1024;

/// Output of a successful tool run.
#[derive(Debug)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
}

/// Run `command` to completion unless `cancel` fires first.
///
/// `label` names the invocation in errors and logs (e.g. `"perf record"`).
///
/// # Errors
/// - [`ProfilerError::ToolUnavailable`] if the executable cannot be found
/// - [`ProfilerError::PermissionDenied`] if it exits non-zero citing privileges
/// - [`ProfilerError::CaptureFailed`] for any other non-zero exit
/// - [`ProfilerError::Cancelled`] if the token was cancelled
pub async fn run_tool(
    label: &str,
    command: &mut Command,
    cancel: &CancellationToken,
) -> Result<ToolOutput, ProfilerError> {
    command.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped()).kill_on_drop(true);

    debug!("Spawning {label}: {command:?}");
    let mut child = command.spawn().map_err(|e| spawn_error(label, e))?;
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let finished = tokio::select! {
        res = collect(&mut child, stdout, stderr) => Some(res),
        () = cancel.cancelled() => None,
    };

    let Some(res) = finished else {
        info!("Cancelling {label}");
        // kill() also reaps the child
        if let Err(e) = child.kill().await {
            debug!("Failed to kill {label}: {e}");
        }
        return Err(ProfilerError::Cancelled { tool: label.to_string() });
    };

    let (stdout, stderr, status) = res?;
    if !status.success() {
        return Err(failure(label, status, stderr));
    }
    if !stderr.is_empty() {
        debug!("{label} stderr: {}", stderr.trim_end());
    }
    Ok(ToolOutput { stdout, stderr })
}

async fn collect<O, E>(
    child: &mut Child,
    stdout: Option<O>,
    stderr: Option<E>,
) -> io::Result<(Vec<u8>, String, ExitStatus)>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let (out, err, status) =
        tokio::join!(read_all(stdout), read_bounded(stderr, STDERR_LIMIT), child.wait());
    Ok((out?, err?, status?))
}

async fn read_all<R: AsyncRead + Unpin>(reader: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        reader.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Keep the first `limit` bytes; keep draining past it so the child never
/// blocks on a full pipe.
async fn read_bounded<R: AsyncRead + Unpin>(reader: Option<R>, limit: usize) -> io::Result<String> {
    let Some(mut reader) = reader else {
        return Ok(String::new());
    };

    let mut kept = Vec::new();
    let mut discarded = 0usize;
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        let room = limit.saturating_sub(kept.len());
        let take = room.min(n);
        kept.extend_from_slice(&chunk[..take]);
        discarded += n - take;
    }

    let mut text = String::from_utf8_lossy(&kept).into_owned();
    if discarded > 0 {
        text.push_str(&format!("\n[truncated {discarded} bytes]"));
    }
    Ok(text)
}

fn spawn_error(label: &str, err: io::Error) -> ProfilerError {
    if err.kind() == io::ErrorKind::NotFound {
        ProfilerError::ToolUnavailable {
            tool: label.to_string(),
            hint: "executable not found".to_string(),
        }
    } else {
        ProfilerError::Io(err)
    }
}

fn failure(label: &str, status: ExitStatus, stderr: String) -> ProfilerError {
    let stderr = stderr.trim().to_string();
    if looks_like_permission_problem(&stderr) {
        ProfilerError::PermissionDenied { tool: label.to_string(), stderr }
    } else {
        ProfilerError::CaptureFailed { tool: label.to_string(), status: status.to_string(), stderr }
    }
}

/// Privilege failures are only known from the tool's own complaint.
fn looks_like_permission_problem(stderr: &str) -> bool {
    const MARKERS: [&str; 6] = [
        "permission denied",
        "perf_event_paranoid",
        "operation not permitted",
        "requires root",
        "must be root",
        "additional privileges",
    ];
    let lower = stderr.to_lowercase();
    MARKERS.iter().any(|m| lower.contains(m))
}
