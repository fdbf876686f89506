//! Linux `perf` capture strategy
//!
//! `perf record -g` samples kernel and user stacks into a `perf.data` file kept
//! in a private temporary directory, then `perf script` dumps the samples as
//! leaf-first text for [`crate::folding::StackFormat::PerfScript`].

use log::info;
use std::ffi::OsString;
use std::path::Path;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::command::run_tool;
use super::CaptureRequest;
use crate::domain::ProfilerError;

/// Arguments for `perf record`, system-wide unless the request names a PID.
#[must_use]
pub fn record_args(request: &CaptureRequest, data_path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> =
        vec!["record".into(), "-F".into(), request.frequency().0.to_string().into()];
    match request.pid() {
        Some(pid) => {
            args.push("-p".into());
            args.push(pid.0.to_string().into());
        }
        None => args.push("-a".into()),
    }
    args.push("-g".into());
    args.push("-o".into());
    args.push(data_path.as_os_str().to_owned());
    args.push("--".into());
    args.push("sleep".into());
    args.push(request.whole_seconds().to_string().into());
    args
}

/// Record for the requested window and return raw `perf script` output.
///
/// # Errors
/// Returns an error if either perf invocation fails or is cancelled.
pub async fn capture(
    cancel: &CancellationToken,
    request: &CaptureRequest,
) -> Result<Vec<u8>, ProfilerError> {
    let workdir = tempfile::Builder::new().prefix("usescope-perf-").tempdir()?;
    let data_path = workdir.path().join("perf.data");

    let args = record_args(request, &data_path);
    info!("Running perf {}", args.iter().map(|a| a.to_string_lossy()).collect::<Vec<_>>().join(" "));
    let mut record = Command::new("perf");
    record.args(&args);
    run_tool("perf record", &mut record, cancel).await?;

    let mut script = Command::new("perf");
    script.arg("script").arg("-i").arg(&data_path);
    let output = run_tool("perf script", &mut script, cancel).await?;

    info!("perf script produced {} bytes", output.stdout.len());
    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Hertz, Pid};
    use std::path::PathBuf;
    use std::time::Duration;

    fn args_of(request: &CaptureRequest) -> Vec<String> {
        record_args(request, Path::new("/tmp/x/perf.data"))
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_system_wide_args() {
        let request = CaptureRequest::new(
            Duration::from_secs(5),
            Hertz(99),
            None,
            PathBuf::from("flamegraph.svg"),
        );
        assert_eq!(
            args_of(&request),
            ["record", "-F", "99", "-a", "-g", "-o", "/tmp/x/perf.data", "--", "sleep", "5"]
        );
    }

    #[test]
    fn test_pid_scoped_args_and_sub_second_duration() {
        let request = CaptureRequest::new(
            Duration::from_millis(200),
            Hertz(499),
            Some(Pid(4242)),
            PathBuf::from("out.svg"),
        );
        assert_eq!(
            args_of(&request),
            ["record", "-F", "499", "-p", "4242", "-g", "-o", "/tmp/x/perf.data", "--", "sleep", "1"]
        );
    }
}
