//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers keep a sampling frequency from being passed where a
//! process ID is expected, and make capture signatures more expressive.

use serde::Serialize;
use std::fmt;

/// Process ID
///
/// Represents a process ID in the system. Capture treats an absent PID
/// (or PID 0 on the command line) as system-wide sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Pid(pub u32);

impl Pid {
    /// Interpret a raw command-line PID, where 0 means "no target process".
    #[must_use]
    pub fn from_arg(raw: Option<u32>) -> Option<Self> {
        raw.filter(|&pid| pid != 0).map(Pid)
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PID:{}", self.0)
    }
}

/// Sampling frequency in Hz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Hertz(pub u32);

impl Hertz {
    /// 99 Hz avoids lockstep sampling with timer-driven work at round frequencies.
    pub const DEFAULT: Hertz = Hertz(99);
}

impl Default for Hertz {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Hertz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.0)
    }
}
