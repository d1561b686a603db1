//! Whole-file replacement for the file-backed stores.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Sibling temp file for `path`: the full file name plus `.tmp`, so
/// `state.bin` and `state.json` in one directory never share a temp file.
pub(crate) fn temp_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write `bytes` next to `path` and rename over it.
///
/// Errors carry the path they happened on.
pub(crate) fn replace_file(path: &Path, bytes: &[u8]) -> Result<(), (PathBuf, io::Error)> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| (parent.to_path_buf(), e))?;
        }
    }
    let tmp = temp_path(path);
    fs::write(&tmp, bytes).map_err(|e| (tmp.clone(), e))?;
    fs::rename(&tmp, path).map_err(|e| (path.to_path_buf(), e))
}
