/*!
 * Disk space checks
 *
 * Usage is reported for the volume holding the nearest existing ancestor
 * of a path, so a destination that does not exist yet can be checked.
 */

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::error::{FileKitError, Result};

/// Default safety margin: 10% on top of the required bytes
pub const DEFAULT_SAFETY_MARGIN: f64 = 0.1;

/// Space on one volume, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiskUsage {
    pub total: u64,
    pub used: u64,
    /// Space available to the current user
    pub free: u64,
}

impl DiskUsage {
    pub fn used_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.used as f64 / self.total as f64 * 100.0
        }
    }

    pub fn free_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.free as f64 / self.total as f64 * 100.0
        }
    }
}

/// Result of a space check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpaceCheck {
    pub has_space: bool,
    pub required_with_margin: u64,
    pub available: u64,
    pub message: String,
}

fn nearest_existing(path: &Path) -> Result<PathBuf> {
    let mut check = path.to_path_buf();

    while !check.exists() {
        match check.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => check = parent.to_path_buf(),
            Some(_) if check.is_relative() && check != Path::new(".") => {
                check = PathBuf::from(".")
            }
            _ => crate::bail!(
                PathNotFound,
                "cannot determine disk usage, no existing path in tree: {}",
                path.display()
            ),
        }
    }

    Ok(check)
}

/// Usage of the volume holding `path` or its nearest existing ancestor
pub fn get_disk_usage(path: &Path) -> Result<DiskUsage> {
    let check = nearest_existing(path)?;

    let total = fs2::total_space(&check)?;
    let free = fs2::available_space(&check)?;
    let unreserved = fs2::free_space(&check)?;

    Ok(DiskUsage {
        total,
        used: total.saturating_sub(unreserved),
        free,
    })
}

/// Check that `dest` can take `required` bytes plus `safety_margin`
///
/// With `strict` set, a shortfall is returned as
/// [`FileKitError::InsufficientSpace`] and a failed usage query as its own
/// error. Otherwise both come back as a `SpaceCheck` with `has_space` unset.
pub fn check_disk_space(
    dest: &Path,
    required: u64,
    safety_margin: f64,
    strict: bool,
) -> Result<SpaceCheck> {
    let usage = match get_disk_usage(dest) {
        Ok(usage) => usage,
        Err(e) => {
            let message = format!("Cannot check disk space: {}", e);
            tracing::error!("{}", message);
            if strict {
                return Err(e);
            }
            return Ok(SpaceCheck {
                has_space: false,
                required_with_margin: required,
                available: 0,
                message,
            });
        }
    };

    let available = usage.free;
    let margin = (required as f64 * safety_margin.max(0.0)) as u64;
    let required_with_margin = required.saturating_add(margin);

    if available >= required_with_margin {
        return Ok(SpaceCheck {
            has_space: true,
            required_with_margin,
            available,
            message: format!(
                "Sufficient space: {} available, {} required ({} + {:.0}% margin)",
                format_bytes(available),
                format_bytes(required_with_margin),
                format_bytes(required),
                safety_margin * 100.0
            ),
        });
    }

    let shortfall = required_with_margin - available;
    let message = format!(
        "Insufficient space: {} available, {} required. Need {} more.",
        format_bytes(available),
        format_bytes(required_with_margin),
        format_bytes(shortfall)
    );

    if strict {
        return Err(FileKitError::InsufficientSpace {
            message,
            required: required_with_margin,
            available,
            shortfall,
            path: dest.to_path_buf(),
        });
    }

    Ok(SpaceCheck {
        has_space: false,
        required_with_margin,
        available,
        message,
    })
}

fn entry_size(path: &Path, follow_symlinks: bool) -> io::Result<u64> {
    let metadata = if follow_symlinks {
        fs::metadata(path)?
    } else {
        let metadata = fs::symlink_metadata(path)?;
        if metadata.file_type().is_symlink() {
            return Ok(0);
        }
        metadata
    };
    Ok(if metadata.is_file() { metadata.len() } else { 0 })
}

/// Total size of the files in `paths`, recursing into directories
///
/// Missing paths and unreadable entries are skipped with a warning. When
/// `follow_symlinks` is off, symbolic links contribute nothing.
pub fn calculate_total_size<P: AsRef<Path>>(paths: &[P], follow_symlinks: bool) -> u64 {
    let mut total = 0;

    for path in paths {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!("Path does not exist, skipping: {}", path.display());
            continue;
        }

        if path.is_dir() {
            for entry in WalkDir::new(path).follow_links(follow_symlinks) {
                match entry {
                    Ok(entry) if !entry.file_type().is_dir() => {
                        match entry_size(entry.path(), follow_symlinks) {
                            Ok(size) => total += size,
                            Err(e) => tracing::warn!(
                                "Cannot get size of {}: {}",
                                entry.path().display(),
                                e
                            ),
                        }
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!("Cannot walk {}: {}", path.display(), e),
                }
            }
        } else {
            match entry_size(path, follow_symlinks) {
                Ok(size) => total += size,
                Err(e) => tracing::warn!("Cannot get size of {}: {}", path.display(), e),
            }
        }
    }

    total
}

/// Whether `dest` can hold everything in `sources`, with a status message
pub fn ensure_disk_space<P: AsRef<Path>>(
    dest: &Path,
    sources: &[P],
    safety_margin: f64,
) -> (bool, String) {
    let total = calculate_total_size(sources, true);
    match check_disk_space(dest, total, safety_margin, false) {
        Ok(check) => (check.has_space, check.message),
        Err(e) => (false, e.to_string()),
    }
}

/// Format a human-readable byte count
pub fn format_bytes(size: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    let mut value = size as f64;
    for unit in UNITS {
        if value < 1024.0 {
            return format!("{:.1} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.1} EB", value)
}
