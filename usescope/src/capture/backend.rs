//! Profiler backend probing and selection
//!
//! The backend is picked once, before capture starts, from the platform and
//! the tools found on `PATH`:
//!
//! | Platform | Preferred             | Fallback                        |
//! |----------|-----------------------|---------------------------------|
//! | Linux    | `perf` (system-wide)  | none                            |
//! | macOS    | `dtrace` (system-wide)| `sample` (needs a target PID)   |
//!
//! There is no silent fallback after a capture fails; the caller decides
//! whether to retry with other parameters.

use serde::Serialize;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::domain::{Pid, ProfilerError};
use crate::folding::StackFormat;

/// External sampling profiler a capture delegates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Linux `perf record` + `perf script`
    Perf,
    /// `dtrace` profile provider with `ustack()` aggregation
    DTrace,
    /// macOS `sample`, process-scoped and lower fidelity
    Sample,
}

impl Backend {
    /// Executable name probed on `PATH`.
    #[must_use]
    pub fn tool(self) -> &'static str {
        match self {
            Backend::Perf => "perf",
            Backend::DTrace => "dtrace",
            Backend::Sample => "sample",
        }
    }

    /// Raw stack layout this backend emits.
    #[must_use]
    pub fn stack_format(self) -> StackFormat {
        match self {
            Backend::Perf => StackFormat::PerfScript,
            // `sample` output is approximated with the root-first parser
            Backend::DTrace | Backend::Sample => StackFormat::DTrace,
        }
    }

    /// Select a backend for this machine by probing `PATH`.
    ///
    /// # Errors
    /// Returns [`ProfilerError::ToolUnavailable`] if no usable profiler exists.
    pub fn select(pid: Option<Pid>) -> Result<Backend, ProfilerError> {
        select_for(Platform::current(), pid, |tool| find_on_path(tool).is_some())
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tool())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Unsupported,
}

impl Platform {
    #[must_use]
    pub fn current() -> Self {
        if cfg!(target_os = "linux") {
            Platform::Linux
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Unsupported
        }
    }
}

/// Selection policy over an injectable tool probe.
///
/// # Errors
/// Returns [`ProfilerError::ToolUnavailable`] naming the preferred tool and
/// what would make capture possible.
pub fn select_for(
    platform: Platform,
    pid: Option<Pid>,
    is_available: impl Fn(&str) -> bool,
) -> Result<Backend, ProfilerError> {
    match platform {
        Platform::Linux => {
            if is_available(Backend::Perf.tool()) {
                Ok(Backend::Perf)
            } else {
                Err(ProfilerError::ToolUnavailable {
                    tool: "perf".to_string(),
                    hint: "install linux-tools-common or equivalent".to_string(),
                })
            }
        }
        Platform::MacOs => {
            if is_available(Backend::DTrace.tool()) {
                Ok(Backend::DTrace)
            } else if pid.is_some() && is_available(Backend::Sample.tool()) {
                Ok(Backend::Sample)
            } else {
                Err(ProfilerError::ToolUnavailable {
                    tool: "dtrace".to_string(),
                    hint: "no profiling tools available: dtrace is missing and sample requires a PID"
                        .to_string(),
                })
            }
        }
        Platform::Unsupported => Err(ProfilerError::ToolUnavailable {
            tool: "profiler".to_string(),
            hint: format!("CPU profiling is not supported on {}", env::consts::OS),
        }),
    }
}

/// Locate an executable on `PATH`.
#[must_use]
pub fn find_on_path(tool: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path).map(|dir| dir.join(tool)).find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata().is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
