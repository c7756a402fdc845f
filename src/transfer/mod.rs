/*!
 * Copy and move with metadata preservation
 *
 * Each transfer checks its preconditions before touching anything, takes
 * a metadata snapshot of the source, performs the transfer, and applies
 * the snapshot to the destination. A metadata failure is logged but does
 * not fail the transfer.
 */

mod batch;
mod copy;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::chain::Chain;
use crate::error::{FileKitError, Result, ResultExt};
use crate::metadata::{apply_file_metadata, collect_file_metadata};
use crate::platform::Platform;

pub use batch::{copy_files_with_path, move_files_with_path, BatchOptions, BatchReport, Operation};
pub use copy::{default_copy_chain, CopyJob, FsCopy, Robocopy};

/// Rename primitive used by moves
pub type RenameFn = dyn Fn(&Path, &Path) -> io::Result<()> + Send + Sync;

/// Per-transfer switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferOptions {
    /// Capture metadata before and reapply it after
    pub preserve_attrs: bool,
    /// Replace an existing destination
    pub overwrite: bool,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            preserve_attrs: true,
            overwrite: false,
        }
    }
}

/// Outcome of one transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferResult {
    pub success: bool,
    pub destination: PathBuf,
}

/// Whether `err` is the OS refusing to rename across volumes
pub fn is_cross_device(err: &io::Error) -> bool {
    #[cfg(unix)]
    {
        err.raw_os_error() == Some(libc::EXDEV)
    }
    #[cfg(windows)]
    {
        // ERROR_NOT_SAME_DEVICE
        err.raw_os_error() == Some(17)
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = err;
        false
    }
}

/// Whether `a` and `b` name the same file (hard links included)
fn same_file(a: &Path, b: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        match (fs::metadata(a), fs::metadata(b)) {
            (Ok(x), Ok(y)) => x.dev() == y.dev() && x.ino() == y.ino(),
            _ => false,
        }
    }
    #[cfg(not(unix))]
    {
        match (fs::canonicalize(a), fs::canonicalize(b)) {
            (Ok(x), Ok(y)) => x == y,
            _ => false,
        }
    }
}

/// Transfer orchestrator
pub struct Transfer {
    rename: Arc<RenameFn>,
    copy_chain: Chain<CopyJob>,
}

impl Default for Transfer {
    fn default() -> Self {
        Self::new()
    }
}

impl Transfer {
    pub fn new() -> Self {
        Self {
            rename: Arc::new(|from: &Path, to: &Path| fs::rename(from, to)),
            copy_chain: default_copy_chain(Platform::current()),
        }
    }

    /// Replace the rename primitive
    pub fn with_rename<F>(mut self, rename: F) -> Self
    where
        F: Fn(&Path, &Path) -> io::Result<()> + Send + Sync + 'static,
    {
        self.rename = Arc::new(rename);
        self
    }

    /// Replace the copy chain
    pub fn with_copy_chain(mut self, chain: Chain<CopyJob>) -> Self {
        self.copy_chain = chain;
        self
    }

    fn check_preconditions(source: &Path, dest: &Path, overwrite: bool) -> Result<()> {
        let metadata = fs::metadata(source)
            .map_err(|_| crate::error!(PathNotFound, "{}", source.display()))?;
        crate::ensure!(metadata.is_file(), NotAFile, "{}", source.display());
        crate::ensure!(
            overwrite || fs::symlink_metadata(dest).is_err(),
            AlreadyExists,
            "{} (overwrite not requested)",
            dest.display()
        );
        // copying a file onto itself truncates it before reading
        crate::ensure!(
            !same_file(source, dest),
            InvalidArgument,
            "{} and {} are the same file",
            source.display(),
            dest.display()
        );
        Ok(())
    }

    fn create_parents(dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        Ok(())
    }

    fn copy_bytes(&self, source: &Path, dest: &Path, preserve_attrs: bool) -> Result<()> {
        let job = CopyJob {
            source: source.to_path_buf(),
            dest: dest.to_path_buf(),
            preserve_attrs,
        };

        let outcome = self.copy_chain.run(&job);
        if outcome.succeeded() {
            Ok(())
        } else {
            Err(FileKitError::Unexpected(format!(
                "copy {} -> {} failed: {}",
                source.display(),
                dest.display(),
                outcome
            )))
        }
    }

    /// Copy `source` to `dest`, returning the destination
    pub fn try_copy(&self, source: &Path, dest: &Path, options: TransferOptions) -> Result<PathBuf> {
        Self::check_preconditions(source, dest, options.overwrite)?;
        Self::create_parents(dest)?;

        let snapshot = options
            .preserve_attrs
            .then(|| collect_file_metadata(source));

        self.copy_bytes(source, dest, options.preserve_attrs)?;

        if let Some(snapshot) = snapshot {
            if !apply_file_metadata(dest, &snapshot) {
                tracing::warn!("Copied {} with incomplete metadata", dest.display());
            }
        }

        tracing::debug!("Copied {} -> {}", source.display(), dest.display());
        Ok(dest.to_path_buf())
    }

    /// Move `source` to `dest`, copying then deleting across volumes
    pub fn try_move(&self, source: &Path, dest: &Path, options: TransferOptions) -> Result<PathBuf> {
        Self::check_preconditions(source, dest, options.overwrite)?;
        Self::create_parents(dest)?;

        let snapshot = options
            .preserve_attrs
            .then(|| collect_file_metadata(source));

        match (self.rename)(source, dest) {
            Ok(()) => {}
            Err(e) if is_cross_device(&e) => {
                tracing::debug!(
                    "Cross-device move of {}, falling back to copy and delete",
                    source.display()
                );
                self.copy_bytes(source, dest, options.preserve_attrs)?;
                fs::remove_file(source).with_context(|| {
                    format!(
                        "copied to {} but could not remove source {}",
                        dest.display(),
                        source.display()
                    )
                })?;
            }
            Err(e) => return Err(e.into()),
        }

        if let Some(snapshot) = snapshot {
            if !apply_file_metadata(dest, &snapshot) {
                tracing::warn!("Moved {} with incomplete metadata", dest.display());
            }
        }

        tracing::debug!("Moved {} -> {}", source.display(), dest.display());
        Ok(dest.to_path_buf())
    }

    pub fn copy(&self, source: &Path, dest: &Path, options: TransferOptions) -> TransferResult {
        Self::to_result("copying", dest, self.try_copy(source, dest, options))
    }

    pub fn move_file(&self, source: &Path, dest: &Path, options: TransferOptions) -> TransferResult {
        Self::to_result("moving", dest, self.try_move(source, dest, options))
    }

    fn to_result(verb: &str, dest: &Path, result: Result<PathBuf>) -> TransferResult {
        match result {
            Ok(destination) => TransferResult {
                success: true,
                destination,
            },
            Err(e) => {
                tracing::error!("Error {} to {}: {}", verb, dest.display(), e);
                TransferResult {
                    success: false,
                    destination: dest.to_path_buf(),
                }
            }
        }
    }
}

/// Copy a single file, preserving metadata when asked
pub fn copy_file(source: &Path, dest: &Path, preserve_attrs: bool, overwrite: bool) -> bool {
    let options = TransferOptions {
        preserve_attrs,
        overwrite,
    };
    Transfer::new().copy(source, dest, options).success
}

/// Move a single file, preserving metadata when asked
pub fn move_file(source: &Path, dest: &Path, preserve_attrs: bool, overwrite: bool) -> bool {
    let options = TransferOptions {
        preserve_attrs,
        overwrite,
    };
    Transfer::new().move_file(source, dest, options).success
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{Attempt, BoxedStrategy, Strategy};
    use filetime::FileTime;
    use tempfile::tempdir;

    struct BrokenCopy;

    impl Strategy<CopyJob> for BrokenCopy {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn attempt(&self, _job: &CopyJob) -> Attempt {
            Attempt::Fatal("disk on fire".to_string())
        }
    }

    fn cross_device_error() -> io::Error {
        #[cfg(unix)]
        {
            io::Error::from_raw_os_error(libc::EXDEV)
        }
        #[cfg(not(unix))]
        {
            io::Error::from_raw_os_error(17)
        }
    }

    #[test]
    fn test_copy_preserves_content_and_mtime() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("src.txt");
        fs::write(&source, "payload").unwrap();
        let mtime = FileTime::from_unix_time(1_300_000_000, 0);
        filetime::set_file_mtime(&source, mtime).unwrap();

        let dest = dir.path().join("out").join("deep").join("src.txt");
        assert!(copy_file(&source, &dest, true, false));
        assert_eq!(fs::read_to_string(&dest).unwrap(), "payload");

        let copied = FileTime::from_last_modification_time(&fs::metadata(&dest).unwrap());
        assert_eq!(copied.unix_seconds(), mtime.unix_seconds());
        assert!(source.exists());
    }

    #[test]
    fn test_copy_refuses_existing_destination() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("a.txt");
        let dest = dir.path().join("b.txt");
        fs::write(&source, "new").unwrap();
        fs::write(&dest, "old").unwrap();

        assert!(!copy_file(&source, &dest, true, false));
        assert_eq!(fs::read_to_string(&dest).unwrap(), "old");

        assert!(copy_file(&source, &dest, true, true));
        assert_eq!(fs::read_to_string(&dest).unwrap(), "new");
    }

    #[test]
    fn test_precondition_errors() {
        let dir = tempdir().unwrap();
        let transfer = Transfer::new();
        let options = TransferOptions::default();

        let err = transfer
            .try_copy(&dir.path().join("missing"), &dir.path().join("x"), options)
            .unwrap_err();
        assert!(matches!(err, FileKitError::PathNotFound(_)));

        let err = transfer
            .try_move(dir.path(), &dir.path().join("x"), options)
            .unwrap_err();
        assert!(matches!(err, FileKitError::NotAFile(_)));
        assert!(!dir.path().join("x").exists());
    }

    #[test]
    fn test_move_renames() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("a.txt");
        fs::write(&source, "moving").unwrap();
        let dest = dir.path().join("sub").join("a.txt");

        assert!(move_file(&source, &dest, true, false));
        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&dest).unwrap(), "moving");
    }

    #[test]
    fn test_forced_cross_device_move() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("a.bin");
        fs::write(&source, [0u8, 1, 2, 3, 255]).unwrap();
        let mtime = FileTime::from_unix_time(1_234_567_890, 0);
        filetime::set_file_mtime(&source, mtime).unwrap();
        let before = collect_file_metadata(&source);

        let transfer = Transfer::new().with_rename(|_: &Path, _: &Path| Err(cross_device_error()));
        let dest = dir.path().join("other").join("a.bin");
        let result = transfer.move_file(&source, &dest, TransferOptions::default());

        assert!(result.success);
        assert_eq!(result.destination, dest);
        assert!(!source.exists());
        assert_eq!(fs::read(&dest).unwrap(), vec![0u8, 1, 2, 3, 255]);

        let after = collect_file_metadata(&dest);
        assert_eq!(before.mode, after.mode);
        assert_eq!(
            after.timestamps.unwrap().modified.unix_seconds(),
            mtime.unix_seconds()
        );
    }

    #[test]
    fn test_other_rename_errors_keep_source() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("a.txt");
        fs::write(&source, "stay").unwrap();

        let transfer = Transfer::new().with_rename(|_: &Path, _: &Path| {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        });
        let dest = dir.path().join("b.txt");
        assert!(!transfer.move_file(&source, &dest, TransferOptions::default()).success);
        assert!(source.exists());
        assert!(!dest.exists());
    }

    #[test]
    fn test_failed_cross_device_copy_keeps_source() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("a.txt");
        fs::write(&source, "only copy").unwrap();

        let transfer = Transfer::new()
            .with_rename(|_: &Path, _: &Path| Err(cross_device_error()))
            .with_copy_chain(Chain::new(vec![Box::new(BrokenCopy) as BoxedStrategy<CopyJob>]));
        let dest = dir.path().join("other").join("a.txt");

        let result = transfer.move_file(&source, &dest, TransferOptions::default());
        assert!(!result.success);
        assert_eq!(fs::read_to_string(&source).unwrap(), "only copy");
        assert!(!dest.exists());
    }

    #[test]
    fn test_same_file_is_rejected() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("a.txt");
        fs::write(&source, "precious").unwrap();

        assert!(!copy_file(&source, &source, true, true));
        assert!(!move_file(&source, &source, true, true));

        // the same file reached through a different spelling
        let detour = dir.path().join("sub").join("..").join("a.txt");
        fs::create_dir(dir.path().join("sub")).unwrap();
        let options = TransferOptions {
            preserve_attrs: false,
            overwrite: true,
        };
        let err = Transfer::new()
            .try_copy(&source, &detour, options)
            .unwrap_err();
        assert!(matches!(err, FileKitError::InvalidArgument(_)));

        assert_eq!(fs::read_to_string(&source).unwrap(), "precious");
    }

    #[cfg(unix)]
    #[test]
    fn test_hard_link_counts_as_same_file() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("a.txt");
        let link = dir.path().join("b.txt");
        fs::write(&source, "shared").unwrap();
        fs::hard_link(&source, &link).unwrap();

        assert!(!copy_file(&source, &link, false, true));
        assert_eq!(fs::read_to_string(&source).unwrap(), "shared");
    }

    #[test]
    fn test_is_cross_device() {
        assert!(is_cross_device(&cross_device_error()));
        assert!(!is_cross_device(&io::Error::new(io::ErrorKind::Other, "x")));
    }
}
