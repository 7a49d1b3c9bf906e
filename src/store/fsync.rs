//! fsync helpers for durable installation records.
//!
//! Both the file and its directory are synced: a renamed file's directory
//! entry may not survive a power loss unless the directory is synced too.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

pub fn fsync_file(file: &File) -> io::Result<()> {
    file.sync_all()
}

/// Syncs a directory so that entries created or renamed in it are durable.
pub fn fsync_dir(dir_path: &Path) -> io::Result<()> {
    let dir = OpenOptions::new().read(true).open(dir_path)?;
    dir.sync_all()
}

/// Replaces `path` with `bytes` via write-to-temp, fsync, rename, fsync dir.
///
/// Every call writes its own uniquely named temp file in the target
/// directory, so concurrent writers to one path never share a temp file.
/// Readers see one complete document, never a partial or interleaved write.
/// The file is created readable by its owner only (0600 on Unix).
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    fsync_file(tmp.as_file())?;

    tmp.persist(path).map_err(|e| e.error)?;

    fsync_dir(parent)
}
