//! Collapsers for raw profiler stack dumps
//!
//! Two input families reduce to the same [`FoldedStacks`] shape:
//!
//! - [`StackFormat::PerfScript`]: `perf script` output. Each sample is a header
//!   line followed by indented `address symbol+offset (module)` lines, leaf
//!   first, terminated by a blank line. Frames are reversed to root-first.
//! - [`StackFormat::DTrace`]: `dtrace` `ustack()` aggregations. Frames are one
//!   `module`symbol+offset` per line, root first, terminated by a line holding
//!   only the occurrence count (or by a blank line, meaning a count of 1).
//!
//! A record with no frames before its delimiter is dropped, never an error for
//! the whole stream. The last record is kept even without a trailing delimiter.

use clap::ValueEnum;
use log::debug;
use serde::Serialize;
use std::io::BufRead;

use super::stacks::{FoldedStacks, FRAME_SEPARATOR};
use crate::domain::FlameError;

/// Which raw stack layout the input uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StackFormat {
    /// Leaf-first, blank-line delimited (`perf script`)
    #[value(name = "perf")]
    PerfScript,
    /// Root-first, count-terminated (`dtrace`, `sample`)
    #[value(name = "dtrace")]
    DTrace,
}

/// Per-frame normalization knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollapseOptions {
    /// Demangle Rust symbols and drop their hash suffix.
    pub demangle: bool,
}

/// Fold a complete raw profiler dump.
///
/// Invalid UTF-8 is replaced rather than rejected so one bad symbol cannot
/// discard a whole capture.
///
/// # Errors
/// Returns [`FlameError::EmptyInput`] if no stack record survives parsing, or
/// [`FlameError::Io`] if the reader fails.
pub fn collapse<R: BufRead>(
    mut reader: R,
    format: StackFormat,
    options: CollapseOptions,
) -> Result<FoldedStacks, FlameError> {
    let mut collapser = Collapser::new(format, options);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        collapser.push_line(line.trim_end_matches(['\n', '\r']));
    }

    let folded = collapser.finish();
    if folded.is_empty() {
        return Err(FlameError::EmptyInput);
    }
    Ok(folded)
}

/// Line-at-a-time folding state machine.
struct Collapser {
    format: StackFormat,
    options: CollapseOptions,
    current: Vec<String>,
    stacks: FoldedStacks,
    records: usize,
    dropped: usize,
}

impl Collapser {
    fn new(format: StackFormat, options: CollapseOptions) -> Self {
        Self {
            format,
            options,
            current: Vec::new(),
            stacks: FoldedStacks::new(),
            records: 0,
            dropped: 0,
        }
    }

    fn push_line(&mut self, line: &str) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            self.end_record(1);
            return;
        }

        match self.format {
            StackFormat::PerfScript => {
                // Unindented lines are sample headers ("comm pid [cpu] ts: event:")
                if !line.starts_with(char::is_whitespace) {
                    return;
                }
                if let Some(symbol) = trimmed.split_whitespace().nth(1) {
                    let frame = self.frame_name(symbol);
                    self.current.push(frame);
                }
            }
            StackFormat::DTrace => {
                if is_count_line(trimmed) {
                    if let Ok(count) = trimmed.parse::<u64>() {
                        self.end_record(count);
                    } else {
                        debug!("Dropping record with unrepresentable count {trimmed}");
                        self.current.clear();
                        self.dropped += 1;
                    }
                    return;
                }
                let symbol = trimmed.split_once('`').map_or(trimmed, |(_, func)| func);
                let frame = self.frame_name(symbol);
                self.current.push(frame);
            }
        }
    }

    fn end_record(&mut self, count: u64) {
        if self.current.is_empty() {
            return;
        }
        if count == 0 {
            self.dropped += 1;
            self.current.clear();
            return;
        }
        if self.format == StackFormat::PerfScript {
            self.current.reverse();
        }
        self.stacks.add(self.current.as_slice(), count);
        self.current.clear();
        self.records += 1;
    }

    fn finish(mut self) -> FoldedStacks {
        // Last record may lack a trailing delimiter
        self.end_record(1);
        debug!(
            "Folded {} records into {} unique stacks ({} dropped)",
            self.records,
            self.stacks.len(),
            self.dropped
        );
        self.stacks
    }

    fn frame_name(&self, symbol: &str) -> String {
        let symbol = strip_offset(symbol);
        let name = if self.options.demangle {
            format!("{:#}", rustc_demangle::demangle(symbol))
        } else {
            symbol.to_string()
        };
        // A separator inside a frame would split it into two frames downstream
        if name.contains(FRAME_SEPARATOR) {
            name.replace(FRAME_SEPARATOR, ":")
        } else {
            name
        }
    }
}

/// Strip a trailing `+<hex offset>` (`+0x1a` or `+1a`) from a symbol.
fn strip_offset(symbol: &str) -> &str {
    match symbol.rfind('+') {
        Some(idx) if idx > 0 => {
            let offset = &symbol[idx + 1..];
            let digits = offset.strip_prefix("0x").unwrap_or(offset);
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit()) {
                &symbol[..idx]
            } else {
                symbol
            }
        }
        _ => symbol,
    }
}

fn is_count_line(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
