//! Pre-flight checks for usescope
//!
//! Validates artifact paths before a capture starts so a long sampling window
//! is not wasted on an output location that cannot be written. Privileges are
//! only hinted at here; the profiler's own exit status is authoritative.

#![allow(unsafe_code)] // geteuid() requires unsafe

use anyhow::{bail, Result};
use log::warn;
use std::path::Path;

/// Run all pre-flight checks before starting a capture
///
/// # Errors
/// Returns an error if any artifact path cannot be written.
pub fn run_preflight_checks(artifacts: &[&Path], quiet: bool) -> Result<()> {
    for path in artifacts {
        check_output_path(path)?;
    }
    if !quiet && !is_root() {
        warn!("Not running as root: the profiler may refuse to sample (try sudo if capture fails)");
    }
    Ok(())
}

fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Check that `path` names a file whose directory exists
///
/// # Errors
/// Returns an error if `path` is a directory or its parent does not exist.
pub fn check_output_path(path: &Path) -> Result<()> {
    if path.is_dir() {
        bail!(
            "Output path is a directory: {}\n\n\
             Pass a file name, e.g. --output flamegraph.svg",
            path.display()
        );
    }
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = parent {
        if !dir.is_dir() {
            bail!(
                "Output directory not found: {}\n\n\
                 Create it first or choose another --output path.",
                dir.display()
            );
        }
    }
    Ok(())
}
