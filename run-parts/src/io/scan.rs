//! Directory discovery: list, order, optionally reverse.

use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use tracing::{debug, instrument};

use crate::core::types::DirectoryEntry;
use crate::error::RunPartsError;

/// List every entry of `dir` (files and directories) in byte-wise name order.
///
/// With `reverse` the sorted list is reversed afterwards rather than sorted
/// descending, so the result is always the exact mirror of the forward order.
#[instrument(skip_all, fields(dir = %dir.display(), reverse))]
pub fn scan_directory(dir: &Path, reverse: bool) -> Result<Vec<DirectoryEntry>, RunPartsError> {
    let discovery = |source| RunPartsError::Discovery {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(discovery)? {
        let entry = entry.map_err(discovery)?;
        // Follow symlinks; a dangling link falls back to its own metadata.
        let metadata = match fs::metadata(entry.path()) {
            Ok(metadata) => metadata,
            Err(_) => entry.metadata().map_err(discovery)?,
        };
        entries.push(DirectoryEntry::new(
            entry.file_name(),
            metadata.is_dir(),
            metadata.permissions().mode() & 0o111 != 0,
        ));
    }

    entries.sort_by(|a, b| a.file_name.as_bytes().cmp(b.file_name.as_bytes()));
    if reverse {
        entries.reverse();
    }
    debug!(count = entries.len(), "scanned directory");
    Ok(entries)
}
