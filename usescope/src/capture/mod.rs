//! Capture backend
//!
//! Runs an external sampling profiler for a bounded window and returns its raw
//! text unchanged; parsing is left to [`crate::folding`].
//!
//! - `backend`: probe `PATH` and pick one [`Backend`] up front
//! - `command`: spawn a tool with bounded stderr and cancellation
//! - `perf`, `dtrace`: per-backend command lines

pub mod backend;
pub mod command;
pub mod dtrace;
pub mod perf;

pub use backend::{find_on_path, select_for, Backend, Platform};

use log::info;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::domain::{Hertz, Pid, ProfilerError};
use crate::folding::StackFormat;

/// One capture invocation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    duration: Duration,
    frequency: Hertz,
    pid: Option<Pid>,
    output: PathBuf,
}

impl CaptureRequest {
    #[must_use]
    pub fn new(duration: Duration, frequency: Hertz, pid: Option<Pid>, output: PathBuf) -> Self {
        Self { duration, frequency, pid, output }
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    #[must_use]
    pub fn frequency(&self) -> Hertz {
        self.frequency
    }

    /// Target process, or `None` for system-wide sampling.
    #[must_use]
    pub fn pid(&self) -> Option<Pid> {
        self.pid
    }

    /// Where the rendered image will be written.
    #[must_use]
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Sampling window in whole seconds; sub-second windows round up to 1.
    #[must_use]
    pub fn whole_seconds(&self) -> u64 {
        self.duration.as_secs().max(1)
    }
}

/// Raw profiler text from a successful capture.
#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    pub backend: Backend,
    pub raw: Vec<u8>,
    pub elapsed: Duration,
}

impl CaptureOutcome {
    /// Layout of [`CaptureOutcome::raw`].
    #[must_use]
    pub fn format(&self) -> StackFormat {
        self.backend.stack_format()
    }
}

impl Backend {
    /// Run one capture with this backend. Exactly one tool pipeline runs; a
    /// failure is terminal and returns no partial output.
    ///
    /// # Errors
    /// Returns a [`ProfilerError`] if the tool is missing, fails, lacks
    /// privileges, or `cancel` fires.
    pub async fn capture(
        self,
        cancel: &CancellationToken,
        request: &CaptureRequest,
    ) -> Result<CaptureOutcome, ProfilerError> {
        let target = request.pid().map_or_else(|| "system-wide".to_string(), |p| p.to_string());
        info!(
            "Capturing {}s at {} with {self} ({target})",
            request.whole_seconds(),
            request.frequency()
        );

        let started = Instant::now();
        let raw = match self {
            Backend::Perf => perf::capture(cancel, request).await?,
            Backend::DTrace => dtrace::capture_dtrace(cancel, request).await?,
            Backend::Sample => dtrace::capture_sample(cancel, request).await?,
        };
        let elapsed = started.elapsed();

        info!("{self} finished in {:.1}s ({} bytes)", elapsed.as_secs_f64(), raw.len());
        Ok(CaptureOutcome { backend: self, raw, elapsed })
    }
}
