//! Aggregated folded-stack collection
//!
//! The folded ("collapsed") stack format is one line per unique call path:
//!
//! ```text
//! main;parse;read_line 42
//! main;render 7
//! ```
//!
//! Frames are root-first and joined with `;`; the count follows the last space.
//! Records are kept in a `BTreeMap` so serialization is always sorted by key and
//! byte-for-byte reproducible regardless of the order samples arrived in.

use log::debug;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};

/// Separator between frames in a folded-stack key.
pub const FRAME_SEPARATOR: char = ';';

/// Mapping from `frame;frame;...` key to total occurrence count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FoldedStacks {
    stacks: BTreeMap<String, u64>,
}

impl FoldedStacks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` occurrences of a root-first call path.
    ///
    /// Empty paths and zero counts are ignored; they would serialize into records
    /// the folded format cannot represent.
    pub fn add<S: AsRef<str>>(&mut self, frames: &[S], count: u64) {
        if frames.is_empty() || count == 0 {
            return;
        }
        let key = frames
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(&FRAME_SEPARATOR.to_string());
        self.add_key(key, count);
    }

    fn add_key(&mut self, key: String, count: u64) {
        let entry = self.stacks.entry(key).or_insert(0);
        *entry = entry.saturating_add(count);
    }

    /// Parse folded-stack text (as written by [`FoldedStacks::write_to`] or by
    /// third-party `stackcollapse` tools).
    ///
    /// The count is taken after the *last* space so frames may contain spaces.
    /// Blank lines, `#` comments, lines without a numeric count and zero counts
    /// are skipped. A line whose stack part is empty (`" 5"`) is kept under the
    /// empty key: it contributes samples to the root only.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut folded = Self::new();
        let mut skipped = 0usize;

        for line in text.lines() {
            let line = line.trim_end();
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((stack, count)) = line.rsplit_once(' ') else {
                skipped += 1;
                continue;
            };
            match count.trim().parse::<u64>() {
                Ok(0) | Err(_) => skipped += 1,
                Ok(count) => folded.add_key(stack.to_string(), count),
            }
        }

        if skipped > 0 {
            debug!("Skipped {skipped} malformed folded-stack lines");
        }
        folded
    }

    /// Total number of samples across all records.
    #[must_use]
    pub fn total_samples(&self) -> u64 {
        self.stacks.values().fold(0u64, |acc, &c| acc.saturating_add(c))
    }

    /// Number of distinct call paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Count recorded for an exact key, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<u64> {
        self.stacks.get(key).copied()
    }

    /// Records in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.stacks.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Write one `key count` line per record, sorted by key.
    ///
    /// # Errors
    /// Returns an error if the writer fails.
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for (key, count) in self.iter() {
            writeln!(writer, "{key} {count}")?;
        }
        writer.flush()
    }
}

impl fmt::Display for FoldedStacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, count) in self.iter() {
            writeln!(f, "{key} {count}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_paths_collapse() {
        let mut folded = FoldedStacks::new();
        folded.add(&["main", "work"], 1);
        folded.add(&["main", "work"], 2);
        folded.add(&["main", "idle"], 1);

        assert_eq!(folded.len(), 2);
        assert_eq!(folded.get("main;work"), Some(3));
        assert_eq!(folded.total_samples(), 4);
    }

    #[test]
    fn test_output_sorted_by_key() {
        let mut folded = FoldedStacks::new();
        folded.add(&["b"], 1);
        folded.add(&["a", "z"], 5);
        folded.add(&["a"], 2);

        assert_eq!(folded.to_string(), "a 2\na;z 5\nb 1\n");
    }

    #[test]
    fn test_empty_path_and_zero_count_ignored() {
        let mut folded = FoldedStacks::new();
        folded.add::<&str>(&[], 3);
        folded.add(&["main"], 0);
        assert!(folded.is_empty());
    }

    #[test]
    fn test_parse_splits_at_last_space() {
        let folded = FoldedStacks::parse("main;operator delete(void*) 4\n");
        assert_eq!(folded.get("main;operator delete(void*)"), Some(4));
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let text = "# header\n\nnocount\nmain;a x\nmain;b 0\nmain;c 2\r\n";
        let folded = FoldedStacks::parse(text);
        assert_eq!(folded.len(), 1);
        assert_eq!(folded.get("main;c"), Some(2));
    }

    #[test]
    fn test_parse_tolerates_trailing_whitespace() {
        let folded = FoldedStacks::parse("a;b 2 \na;c 1\t\n 4  \n");
        assert_eq!(folded.to_string(), " 4\na;b 2\na;c 1\n");
    }

    #[test]
    fn test_parse_merges_duplicate_lines() {
        let folded = FoldedStacks::parse("a;b 2\na;b 3\n");
        assert_eq!(folded.get("a;b"), Some(5));
    }

    #[test]
    fn test_write_to_matches_display() {
        let folded = FoldedStacks::parse("x;y 1\nw 2\n");
        let mut buf = Vec::new();
        folded.write_to(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), folded.to_string());
    }
}
