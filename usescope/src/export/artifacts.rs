//! All-or-nothing artifact writes
//!
//! Each artifact is first written to a temporary file in its destination
//! directory, then renamed into place on [`ArtifactSet::commit`]. If any rename
//! fails, the artifacts already moved are removed again, so a failed run leaves
//! no partial folded/SVG/summary set behind.

use log::{debug, warn};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::domain::ExportError;

/// Artifacts staged for a single commit.
#[derive(Debug, Default)]
pub struct ArtifactSet {
    staged: Vec<(NamedTempFile, PathBuf)>,
}

impl ArtifactSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `contents` to a temporary file next to `path`.
    ///
    /// # Errors
    /// Returns an error if the temporary file cannot be created or written.
    pub fn stage(&mut self, path: &Path, contents: &[u8]) -> Result<(), ExportError> {
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(contents)?;
        file.as_file().sync_all()?;
        self.staged.push((file, path.to_path_buf()));
        Ok(())
    }

    /// Move every staged artifact to its destination, in staging order.
    ///
    /// # Errors
    /// Returns the first rename failure after rolling back earlier renames.
    /// Unstaged temporaries are deleted when dropped.
    pub fn commit(self) -> Result<(), ExportError> {
        let mut committed: Vec<PathBuf> = Vec::with_capacity(self.staged.len());
        for (file, path) in self.staged {
            if let Err(e) = file.persist(&path) {
                for done in &committed {
                    if let Err(rm) = fs::remove_file(done) {
                        warn!("Failed to remove {} after aborted write: {rm}", done.display());
                    }
                }
                return Err(ExportError::Io(e.error));
            }
            debug!("Wrote {}", path.display());
            committed.push(path);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_visible_before_commit() {
        let dir = tempfile::tempdir().unwrap();
        let svg = dir.path().join("out.svg");

        let mut set = ArtifactSet::new();
        set.stage(&svg, b"<svg/>").unwrap();
        assert!(!svg.exists());

        set.commit().unwrap();
        assert_eq!(fs::read(&svg).unwrap(), b"<svg/>");
    }

    #[test]
    fn test_dropped_set_leaves_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut set = ArtifactSet::new();
        set.stage(&dir.path().join("a.folded"), b"a 1\n").unwrap();
        drop(set);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_rename_rolls_back_earlier_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let folded = dir.path().join("out.folded");
        let svg = dir.path().join("out.svg");

        let mut set = ArtifactSet::new();
        set.stage(&folded, b"a 1\n").unwrap();
        set.stage(&svg, b"<svg/>").unwrap();
        // A file cannot be renamed over a directory
        fs::create_dir(&svg).unwrap();

        assert!(matches!(set.commit(), Err(ExportError::Io(_))));
        assert!(!folded.exists());
        assert!(svg.is_dir());
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
