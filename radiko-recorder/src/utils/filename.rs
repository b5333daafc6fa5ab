//! Filename helpers.

use std::io;

/// Full-width solidus used in place of `/` inside path components.
pub const FULLWIDTH_SOLIDUS: char = '\u{FF0F}';

/// Make a title or performer usable as a single path component.
///
/// Only the path separator is replaced; every other character is kept so
/// that file names stay close to what radiko displays.
pub fn sanitize_component(input: &str) -> String {
    input.replace('/', &FULLWIDTH_SOLIDUS.to_string())
}

/// Whether an IO error means the file name exceeded the filesystem limit.
pub fn is_name_too_long(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::InvalidFilename
}
