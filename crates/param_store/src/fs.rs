//! Atomic file replacement

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Sibling path used while writing `path`
pub(crate) fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Create parent directories of `path` if missing
pub(crate) fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Replace `path` with `data`: write a temp sibling, fsync, then rename over the target.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    ensure_parent_dir(path)?;

    let temp_path = temp_path_for(path);
    let result = File::create(&temp_path).and_then(|mut f| {
        f.write_all(data)?;
        f.sync_all()
    });
    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    fs::rename(&temp_path, path).inspect_err(|_| {
        let _ = fs::remove_file(&temp_path);
    })
}
