/*!
 * Metadata capture
 */

use std::fs;
use std::path::Path;

use filetime::FileTime;

use super::{MetadataSnapshot, PlatformExtra, Timestamps};

/// Capture the preservable attributes of `path`
///
/// Never fails: a failed stat yields an empty snapshot, and a failed
/// platform read keeps mode and timestamps with an `Empty` extra.
pub fn collect_file_metadata(path: &Path) -> MetadataSnapshot {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::error!("Failed to read metadata for {}: {}", path.display(), e);
            return MetadataSnapshot::empty();
        }
    };

    MetadataSnapshot {
        mode: Some(mode_of(&metadata)),
        timestamps: Some(Timestamps {
            accessed: FileTime::from_last_access_time(&metadata),
            modified: FileTime::from_last_modification_time(&metadata),
            created: created_of(&metadata),
        }),
        platform_extra: platform_extra_of(path, &metadata),
    }
}

#[cfg(unix)]
fn mode_of(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    metadata.mode()
}

// Windows only knows the read-only bit
#[cfg(not(unix))]
fn mode_of(metadata: &fs::Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o666
    }
}

#[cfg(unix)]
fn created_of(metadata: &fs::Metadata) -> Option<FileTime> {
    use std::os::unix::fs::MetadataExt;
    Some(FileTime::from_unix_time(
        metadata.ctime(),
        metadata.ctime_nsec() as u32,
    ))
}

#[cfg(not(unix))]
fn created_of(metadata: &fs::Metadata) -> Option<FileTime> {
    FileTime::from_creation_time(metadata)
}

#[cfg(unix)]
fn platform_extra_of(_path: &Path, metadata: &fs::Metadata) -> PlatformExtra {
    use std::os::unix::fs::MetadataExt;
    PlatformExtra::Owner {
        uid: metadata.uid(),
        gid: metadata.gid(),
    }
}

#[cfg(windows)]
fn platform_extra_of(path: &Path, _metadata: &fs::Metadata) -> PlatformExtra {
    super::windows::read_attributes(path).unwrap_or_else(|| {
        tracing::warn!("Could not read attributes of {}", path.display());
        PlatformExtra::Empty
    })
}

#[cfg(not(any(unix, windows)))]
fn platform_extra_of(_path: &Path, _metadata: &fs::Metadata) -> PlatformExtra {
    PlatformExtra::Empty
}
