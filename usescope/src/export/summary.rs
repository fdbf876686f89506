use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

use crate::capture::{Backend, CaptureOutcome, CaptureRequest};
use crate::domain::{ExportError, Hertz, Pid};
use crate::folding::FoldedStacks;

/// What a `profile` run captured and where its artifacts went.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub backend: Backend,
    /// Requested sampling window in whole seconds
    pub duration_secs: u64,
    /// Wall-clock time the profiler actually ran
    pub elapsed_secs: f64,
    pub frequency_hz: Hertz,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<Pid>,
    pub samples: u64,
    pub unique_stacks: usize,
    pub folded_path: PathBuf,
    pub image_path: PathBuf,
}

impl RunSummary {
    #[must_use]
    pub fn new(
        request: &CaptureRequest,
        outcome: &CaptureOutcome,
        stacks: &FoldedStacks,
        folded_path: PathBuf,
    ) -> Self {
        Self {
            backend: outcome.backend,
            duration_secs: request.whole_seconds(),
            elapsed_secs: outcome.elapsed.as_secs_f64(),
            frequency_hz: request.frequency(),
            pid: request.pid(),
            samples: stacks.total_samples(),
            unique_stacks: stacks.len(),
            folded_path,
            image_path: request.output().to_path_buf(),
        }
    }

    /// Write the summary as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if serialization or the writer fails.
    pub fn export<W: Write>(&self, mut writer: W) -> Result<(), ExportError> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_export_creates_valid_json() {
        let request = CaptureRequest::new(
            Duration::from_secs(5),
            Hertz(99),
            Some(Pid(77)),
            PathBuf::from("out/flame.svg"),
        );
        let outcome = CaptureOutcome {
            backend: Backend::Perf,
            raw: Vec::new(),
            elapsed: Duration::from_millis(5250),
        };
        let stacks = FoldedStacks::parse("a;b 3\na;c 1\n");
        let summary = RunSummary::new(&request, &outcome, &stacks, PathBuf::from("out/flame.folded"));

        let mut buffer = Vec::new();
        summary.export(&mut buffer).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buffer).unwrap();

        assert_eq!(parsed["backend"], "perf");
        assert_eq!(parsed["duration_secs"], 5);
        assert_eq!(parsed["frequency_hz"], 99);
        assert_eq!(parsed["pid"], 77);
        assert_eq!(parsed["samples"], 4);
        assert_eq!(parsed["unique_stacks"], 2);
        assert_eq!(parsed["image_path"], "out/flame.svg");
    }

    #[test]
    fn test_system_wide_omits_pid() {
        let request =
            CaptureRequest::new(Duration::from_secs(1), Hertz(99), None, PathBuf::from("f.svg"));
        let outcome =
            CaptureOutcome { backend: Backend::DTrace, raw: Vec::new(), elapsed: Duration::ZERO };
        let summary =
            RunSummary::new(&request, &outcome, &FoldedStacks::new(), PathBuf::from("f.folded"));

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("pid").is_none());
        assert_eq!(json["backend"], "dtrace");
    }
}
