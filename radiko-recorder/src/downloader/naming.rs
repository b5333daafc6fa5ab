//! Output naming: where a recording goes and which names it may take.
//!
//! A program yields up to three file names, most descriptive first. Long
//! titles and performer lists can exceed the filesystem's name limit, so
//! placement walks the list and only falls back on "name too long".

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::debug;

use crate::domain::{Job, Program};
use crate::utils::filename::{is_name_too_long, sanitize_component};

/// Timestamp prefix of every recording file name.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H-%M-%S";

pub const EXTENSION: &str = "mp4";

const SEPARATOR: &str = " - ";

/// `out_root/<station>/<title>/`.
pub fn target_dir(out_root: &Path, job: &Job) -> PathBuf {
    out_root
        .join(sanitize_component(&job.station_id))
        .join(sanitize_component(&job.program.title))
}

/// File names for a program, most descriptive first.
///
/// With a performer: `ts - title - performer`, `ts - title`, `ts`.
/// Without one (or with an empty one): `ts - title`, `ts`.
pub fn candidate_file_names(program: &Program) -> Vec<String> {
    let timestamp = program.start_jst().format(TIMESTAMP_FORMAT).to_string();
    let title = sanitize_component(&program.title);

    let mut stems = Vec::with_capacity(3);
    if let Some(performer) = program.performer_name() {
        let performer = sanitize_component(performer);
        stems.push([timestamp.as_str(), title.as_str(), performer.as_str()].join(SEPARATOR));
    }
    stems.push([timestamp.as_str(), title.as_str()].join(SEPARATOR));
    stems.push(timestamp);

    stems
        .into_iter()
        .map(|stem| format!("{}.{}", stem, EXTENSION))
        .collect()
}

/// Candidate paths inside `dir`, most descriptive first.
pub fn candidate_paths(dir: &Path, program: &Program) -> Vec<PathBuf> {
    candidate_file_names(program)
        .into_iter()
        .map(|name| dir.join(name))
        .collect()
}

/// Outcome of placing a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// The file now lives at this path.
    Placed(PathBuf),
    /// Something already exists at this path and was left untouched.
    Occupied(PathBuf),
}

/// Try `rename` with each candidate until one succeeds.
///
/// A "file name too long" error moves on to the next candidate. An existing
/// target stops the walk with [`Placement::Occupied`]. Any other error is
/// returned immediately. If every candidate is too long, the last error is
/// returned.
pub fn rename_with_fallback<F>(candidates: &[PathBuf], mut rename: F) -> io::Result<Placement>
where
    F: FnMut(&Path) -> io::Result<()>,
{
    let mut last_error = None;
    for candidate in candidates {
        match rename(candidate) {
            Ok(()) => return Ok(Placement::Placed(candidate.clone())),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Ok(Placement::Occupied(candidate.clone()));
            }
            Err(e) if is_name_too_long(&e) => {
                debug!("File name too long, trying next: {}", candidate.display());
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_error.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "no candidate file names")
    }))
}

/// Move `source` to the first usable candidate path without replacing
/// anything already there.
///
/// Unless the file is placed, `source` is deleted when this returns.
pub fn place_file(source: TempPath, candidates: &[PathBuf]) -> io::Result<Placement> {
    let mut source = Some(source);
    rename_with_fallback(candidates, |candidate| {
        let temp = source
            .take()
            .ok_or_else(|| io::Error::other("temporary file already placed"))?;
        match temp.persist_noclobber(candidate) {
            Ok(()) => Ok(()),
            Err(e) => {
                source = Some(e.path);
                Err(e.error)
            }
        }
    })
}
