use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, trace};

pub use crate::line_ending::{LineEnding, LineEndingError};
pub use crate::path::*;

mod line_ending;
mod path;

/// Return a [`NamedTempFile`] in the specified directory.
///
/// Sets the permissions of the temporary file to `0o666`, to match the non-temporary file default.
/// ([`NamedTempfile`] defaults to `0o600`.)
#[cfg(unix)]
pub fn tempfile_in(path: &Path) -> std::io::Result<NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;
    tempfile::Builder::new()
        .permissions(std::fs::Permissions::from_mode(0o666))
        .tempfile_in(path)
}

/// Return a [`NamedTempFile`] in the specified directory.
#[cfg(not(unix))]
pub fn tempfile_in(path: &Path) -> std::io::Result<NamedTempFile> {
    tempfile::Builder::new().tempfile_in(path)
}

/// Write `data` to `path` atomically using a temporary file and atomic rename.
///
/// The temporary file is created next to `path`, so the rename never crosses a filesystem
/// boundary. If any step fails, the destination is left untouched.
pub fn write_atomic_sync(path: impl AsRef<Path>, data: impl AsRef<[u8]>) -> std::io::Result<()> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
        Some(parent) => parent,
        None => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Write path must have a parent: {}", path.user_display()),
            ));
        }
    };
    let temp_file = tempfile_in(parent)?;
    fs_err::write(&temp_file, &data)?;
    temp_file.persist(path).map_err(|err| {
        std::io::Error::other(format!(
            "Failed to persist temporary file to {}: {}",
            path.user_display(),
            err.error
        ))
    })?;
    trace!("Wrote `{}` atomically", path.user_display());
    Ok(())
}

/// Read a UTF-8 text file, returning its contents alongside the line ending it uses.
pub fn read_with_line_ending(path: impl AsRef<Path>) -> std::io::Result<(String, LineEnding)> {
    let path = path.as_ref();
    let contents = fs_err::read_to_string(path)?;
    let line_ending = LineEnding::detect(&contents);
    debug!(
        "Detected `{line_ending}` line endings in `{}`",
        path.user_display()
    );
    Ok((contents, line_ending))
}

/// Detect the line ending of the file at `path`, if it exists.
pub fn detect_line_ending(path: impl AsRef<Path>) -> std::io::Result<Option<LineEnding>> {
    match fs_err::read(path.as_ref()) {
        Ok(contents) => Ok(Some(LineEnding::detect(contents))),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// Atomically write `contents` to `path`, rewriting every line break to `line_ending`.
pub fn write_with_line_ending(
    path: impl AsRef<Path>,
    contents: &str,
    line_ending: LineEnding,
) -> std::io::Result<()> {
    let path = path.as_ref();
    debug!(
        "Writing `{}` with `{line_ending}` line endings",
        path.user_display()
    );
    write_atomic_sync(path, line_ending.normalize(contents))
}
