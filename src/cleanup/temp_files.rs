//! Temp File Sweep
//!
//! Removes rendered images and other temp data once they outlive the
//! configured lifetime. Works on the local filesystem only, so every instance
//! sweeps its own directory without coordination.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use crate::cleanup::{should_cleanup_temp_file, TempFileSweep};
use crate::error::Result;

// == File Entry ==
/// A directory entry as seen by the sweep.
///
/// The name is kept as the raw OS string so names that aren't valid UTF-8
/// still resolve to the file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: OsString,
    pub modified: DateTime<Utc>,
}

// == File System ==
/// Filesystem operations the sweep depends on.
pub trait FileSystem: Send + Sync {
    /// Lists the regular files directly inside `dir`.
    fn list(&self, dir: &Path) -> io::Result<Vec<FileEntry>>;

    /// Removes a single file.
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn list(&self, dir: &Path) -> io::Result<Vec<FileEntry>> {
        let mut entries = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Failed to read directory entry");
                    continue;
                }
            };

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(file = ?entry.file_name(), error = %e, "Failed to stat temp file");
                    continue;
                }
            };

            if !metadata.is_file() {
                continue;
            }

            let modified = match metadata.modified() {
                Ok(modified) => DateTime::<Utc>::from(modified),
                Err(e) => {
                    warn!(file = ?entry.file_name(), error = %e, "Missing modification time");
                    continue;
                }
            };

            entries.push(FileEntry {
                name: entry.file_name(),
                modified,
            });
        }

        Ok(entries)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

// == Clean Up Temp Files ==
/// Deletes every file in `dir` that is stale at `now`.
///
/// A missing directory is not an error, there is simply nothing to sweep.
/// A failure removing one file is logged and counted, and the remaining
/// stale files are still removed.
///
/// # Errors
/// Returns [`CleanupError::Io`](crate::error::CleanupError::Io) if the
/// directory exists but can't be listed.
pub fn clean_up_temp_files(
    fs: &dyn FileSystem,
    dir: &Path,
    lifetime: std::time::Duration,
    now: DateTime<Utc>,
) -> Result<TempFileSweep> {
    let files = match fs.list(dir) {
        Ok(files) => files,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(TempFileSweep::new()),
        Err(e) => return Err(e.into()),
    };

    let mut sweep = TempFileSweep::new();
    sweep.scanned = files.len();

    let mut to_delete: Vec<PathBuf> = Vec::new();
    for file in &files {
        if should_cleanup_temp_file(file.modified, now, lifetime) {
            to_delete.push(dir.join(&file.name));
        } else {
            sweep.record_kept();
        }
    }

    for path in &to_delete {
        match fs.remove(path) {
            Ok(()) => sweep.record_deleted(),
            // Someone else got there first
            Err(e) if e.kind() == io::ErrorKind::NotFound => sweep.record_deleted(),
            Err(e) => {
                error!(file = %path.display(), error = %e, "Failed to delete temp file");
                sweep.record_failure();
            }
        }
    }

    debug!(
        deleted = sweep.deleted,
        kept = sweep.kept,
        failed = sweep.failed,
        "Found old rendered images to delete"
    );

    Ok(sweep)
}
