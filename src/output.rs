//! Writing the generated script to disk.

use crate::Error;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Write the generated script to `path`, creating parent directories as needed.
///
/// The contents are staged in a temporary file next to `path` and moved into place, so a
/// failed write never leaves a partial script behind. An existing file is only replaced
/// when `overwrite` is set.
pub fn write_script(path: impl AsRef<Path>, contents: &str, overwrite: bool) -> Result<PathBuf, Error> {
    let path = path.as_ref();

    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent)?;
            parent
        }
        None => Path::new("."),
    };

    if !overwrite && path.exists() {
        return Err(Error::OutputExists(path.to_path_buf()));
    }

    let mut staged = tempfile::Builder::new()
        .prefix(".dashgen-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    staged.write_all(contents.as_bytes())?;
    staged.flush()?;

    let persisted = if overwrite {
        staged.persist(path)
    } else {
        staged.persist_noclobber(path)
    };
    persisted.map_err(|e| match e.error.kind() {
        ErrorKind::AlreadyExists => Error::OutputExists(path.to_path_buf()),
        _ => Error::Io(e.error),
    })?;

    tracing::debug!(path = %path.display(), bytes = contents.len(), "script written");
    Ok(path.to_path_buf())
}
