/*!
 * File and directory removal and creation helpers
 *
 * A path that is already gone counts as removed. `force` turns removal
 * errors into logged warnings and a successful result.
 */

use std::fs;
use std::io;
use std::path::Path;

/// Remove a regular file
pub fn remove_file(path: &Path, force: bool) -> bool {
    if fs::symlink_metadata(path).is_err() {
        tracing::warn!("File doesn't exist: {}", path.display());
        return true;
    }

    if !path.is_file() {
        tracing::error!("Path is not a file: {}", path.display());
        return false;
    }

    finish("file", path, force, fs::remove_file(path))
}

/// Remove a directory, with its contents when `recursive`
pub fn remove_directory(path: &Path, recursive: bool, force: bool) -> bool {
    if fs::symlink_metadata(path).is_err() {
        tracing::warn!("Directory doesn't exist: {}", path.display());
        return true;
    }

    if !path.is_dir() {
        tracing::error!("Path is not a directory: {}", path.display());
        return false;
    }

    let result = if recursive {
        fs::remove_dir_all(path)
    } else {
        fs::remove_dir(path)
    };
    finish("directory", path, force, result)
}

fn finish(kind: &str, path: &Path, force: bool, result: io::Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) if force => {
            tracing::warn!(
                "Error removing {} {}, ignored by force: {}",
                kind,
                path.display(),
                e
            );
            true
        }
        Err(e) => {
            tracing::error!("Error removing {} {}: {}", kind, path.display(), e);
            false
        }
    }
}

/// Create `base` and every directory in `dirs` beneath it
///
/// Every entry is attempted; the result is false if any one failed.
pub fn create_directory_structure<P: AsRef<Path>>(base: &Path, dirs: &[P]) -> bool {
    if let Err(e) = fs::create_dir_all(base) {
        tracing::error!(
            "Error creating directory structure at {}: {}",
            base.display(),
            e
        );
        return false;
    }

    let mut success = true;
    for dir in dirs {
        let full = base.join(dir);
        if let Err(e) = fs::create_dir_all(&full) {
            tracing::error!("Error creating directory {}: {}", full.display(), e);
            success = false;
        }
    }
    success
}

/// Create the parent directories of `path`
pub fn create_parent_dirs(path: &Path) -> bool {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => match fs::create_dir_all(parent) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    "Error creating parent directories for {}: {}",
                    path.display(),
                    e
                );
                false
            }
        },
        _ => true,
    }
}
