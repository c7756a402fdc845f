/*!
 * Metadata application
 *
 * Families are applied in a fixed order (permissions, timestamps, platform
 * extra) and independently: a failure in one never stops the next.
 */

use std::fs;
use std::io;
use std::path::Path;

use super::{ApplyReport, FieldOutcome, MetadataSnapshot, PlatformExtra, Timestamps};

/// Apply `snapshot` to `path`, returning true only if no family failed
pub fn apply_file_metadata(path: &Path, snapshot: &MetadataSnapshot) -> bool {
    let report = apply_with_report(path, snapshot);
    for (family, reason) in report.failures() {
        tracing::warn!(
            "Failed to apply {} to {}: {}",
            family,
            path.display(),
            reason
        );
    }
    report.is_complete()
}

/// Apply `snapshot` to `path` and report each family's outcome
pub fn apply_with_report(path: &Path, snapshot: &MetadataSnapshot) -> ApplyReport {
    ApplyReport {
        permissions: match snapshot.mode {
            Some(mode) => apply_mode(path, mode),
            None => FieldOutcome::Skipped,
        },
        timestamps: match &snapshot.timestamps {
            Some(timestamps) => apply_times(path, timestamps),
            None => FieldOutcome::Skipped,
        },
        platform_extra: apply_extra(path, &snapshot.platform_extra),
    }
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: u32) -> FieldOutcome {
    use std::os::unix::fs::PermissionsExt;

    match fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777)) {
        Ok(()) => FieldOutcome::Applied,
        Err(e) => FieldOutcome::Failed(format!("chmod {:o}: {}", mode & 0o7777, e)),
    }
}

// Only the owner-write bit maps to anything here
#[cfg(not(unix))]
fn apply_mode(path: &Path, mode: u32) -> FieldOutcome {
    let result = fs::metadata(path).and_then(|metadata| {
        let mut permissions = metadata.permissions();
        permissions.set_readonly(mode & 0o200 == 0);
        fs::set_permissions(path, permissions)
    });

    match result {
        Ok(()) => FieldOutcome::Applied,
        Err(e) => FieldOutcome::Failed(format!("set read-only: {}", e)),
    }
}

#[cfg(unix)]
fn while_writable<F: FnOnce() -> io::Result<()>>(_path: &Path, f: F) -> io::Result<()> {
    f()
}

// Setting times opens the file for writing, which a read-only file refuses
#[cfg(not(unix))]
fn while_writable<F: FnOnce() -> io::Result<()>>(path: &Path, f: F) -> io::Result<()> {
    let original = fs::metadata(path)?.permissions();
    if !original.readonly() {
        return f();
    }

    let mut writable = original.clone();
    writable.set_readonly(false);
    fs::set_permissions(path, writable)?;
    let result = f();
    let restored = fs::set_permissions(path, original);
    result.and(restored)
}

fn apply_times(path: &Path, timestamps: &Timestamps) -> FieldOutcome {
    let result = while_writable(path, || {
        filetime::set_file_times(path, timestamps.accessed, timestamps.modified)
    });
    match result {
        Ok(()) => FieldOutcome::Applied,
        Err(e) => FieldOutcome::Failed(format!("set times: {}", e)),
    }
}

fn apply_extra(path: &Path, extra: &PlatformExtra) -> FieldOutcome {
    match extra {
        PlatformExtra::Empty => FieldOutcome::Skipped,
        PlatformExtra::Owner { uid, gid } => apply_owner(path, *uid, *gid),
        PlatformExtra::Attributes { bits } => apply_attributes(path, *bits, false),
        PlatformExtra::AttribListing { listing } => {
            let bits = super::windows::parse_attrib_flags(listing);
            apply_attributes(path, bits, true)
        }
    }
}

#[cfg(unix)]
fn apply_owner(path: &Path, uid: u32, gid: u32) -> FieldOutcome {
    match std::os::unix::fs::chown(path, Some(uid), Some(gid)) {
        Ok(()) => FieldOutcome::Applied,
        Err(e) => {
            tracing::warn!(
                "Could not set owner {}:{} on {}: {}",
                uid,
                gid,
                path.display(),
                e
            );
            FieldOutcome::Failed(format!("chown {}:{}: {}", uid, gid, e))
        }
    }
}

#[cfg(not(unix))]
fn apply_owner(path: &Path, _uid: u32, _gid: u32) -> FieldOutcome {
    tracing::debug!("Ignoring POSIX owner for {}", path.display());
    FieldOutcome::Skipped
}

fn apply_attributes(path: &Path, bits: u32, degraded: bool) -> FieldOutcome {
    if !cfg!(windows) {
        tracing::debug!("Ignoring Windows attributes for {}", path.display());
        return FieldOutcome::Skipped;
    }

    let target = super::windows::AttributeTarget { path, bits };
    let chain = if degraded {
        super::windows::listing_chain()
    } else {
        super::windows::attribute_chain()
    };

    let outcome = chain.run(&target);
    if outcome.succeeded() {
        FieldOutcome::Applied
    } else {
        FieldOutcome::Failed(format!("attributes {:#x}: {}", bits, outcome))
    }
}
