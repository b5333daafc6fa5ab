//! Filesystem helpers shared across modules.
//!
//! These helpers provide consistent error context (operation + path).

use std::path::Path;

use crate::{Error, Result};

/// Convert an IO error into an application error with operation + path context.
pub fn io_error(op: &'static str, path: &Path, source: std::io::Error) -> Error {
    Error::io_path(op, path, source)
}

/// Check that `path` is an existing, writable directory.
///
/// Writability is probed by creating (and immediately removing) a temporary
/// file inside it.
pub fn ensure_writable_dir(path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| io_error("inspecting directory", path, e))?;
    if !metadata.is_dir() {
        return Err(Error::config(format!(
            "{} is not a directory",
            path.display()
        )));
    }

    tempfile::Builder::new()
        .prefix(".write-probe")
        .tempfile_in(path)
        .map(drop)
        .map_err(|e| io_error("probing write access", path, e))
}
