/*!
 * Bulk copy strategies
 */

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use crate::chain::{Attempt, BoxedStrategy, Chain, Strategy};
use crate::command::{command_exists, run_command};
use crate::platform::Platform;

/// One file copy handed to the copy chain
#[derive(Debug, Clone)]
pub struct CopyJob {
    pub source: PathBuf,
    pub dest: PathBuf,
    pub preserve_attrs: bool,
}

/// `robocopy` keeps attributes and timestamps natively
///
/// It copies by file name between directories, so it declines when the
/// destination name differs from the source name.
pub struct Robocopy;

fn dir_or_current(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// robocopy exit codes below 8 report success
fn robocopy_succeeded(code: Option<i32>) -> bool {
    matches!(code, Some(code) if (0..8).contains(&code))
}

impl Strategy<CopyJob> for Robocopy {
    fn name(&self) -> &'static str {
        "robocopy"
    }

    fn is_available(&self) -> bool {
        cfg!(windows) && command_exists("robocopy")
    }

    fn attempt(&self, job: &CopyJob) -> Attempt {
        if !job.preserve_attrs {
            return Attempt::Declined("attribute preservation not requested".to_string());
        }

        let (Some(source_name), Some(dest_name)) = (job.source.file_name(), job.dest.file_name())
        else {
            return Attempt::Declined("missing file name".to_string());
        };
        if source_name != dest_name {
            return Attempt::Declined("destination renames the file".to_string());
        }

        let args = [
            dir_or_current(&job.source).as_os_str(),
            dir_or_current(&job.dest).as_os_str(),
            source_name,
            OsStr::new("/COPY:DAT"),
            // include "same" files so an existing destination is still replaced
            OsStr::new("/IS"),
            OsStr::new("/R:3"),
            OsStr::new("/W:1"),
        ];

        match run_command("robocopy", &args) {
            Ok(output) if robocopy_succeeded(output.status.code()) && job.dest.exists() => {
                tracing::debug!(
                    "robocopy exit {:?} for {}",
                    output.status.code(),
                    job.dest.display()
                );
                Attempt::Succeeded
            }
            Ok(output) => Attempt::Declined(format!("robocopy exit {:?}", output.status.code())),
            Err(e) => Attempt::Declined(e.to_string()),
        }
    }
}

/// Portable byte copy; the last resort, so its failure ends the chain
pub struct FsCopy;

impl Strategy<CopyJob> for FsCopy {
    fn name(&self) -> &'static str {
        "copy"
    }

    fn attempt(&self, job: &CopyJob) -> Attempt {
        match fs::copy(&job.source, &job.dest) {
            Ok(bytes) => {
                tracing::debug!(
                    "copied {} bytes {} -> {}",
                    bytes,
                    job.source.display(),
                    job.dest.display()
                );
                Attempt::Succeeded
            }
            Err(e) => Attempt::Fatal(e.to_string()),
        }
    }
}

/// Default copy chain for `platform`
pub fn default_copy_chain(platform: Platform) -> Chain<CopyJob> {
    let mut strategies: Vec<BoxedStrategy<CopyJob>> = Vec::new();
    if platform.is_windows() {
        strategies.push(Box::new(Robocopy));
    }
    strategies.push(Box::new(FsCopy));
    Chain::new(strategies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_chain_order() {
        assert_eq!(
            default_copy_chain(Platform::Windows).names(),
            vec!["robocopy", "copy"]
        );
        assert_eq!(default_copy_chain(Platform::Posix).names(), vec!["copy"]);
    }

    #[test]
    fn test_robocopy_declines_renames_and_plain_copies() {
        let renamed = CopyJob {
            source: PathBuf::from(r"C:\a\one.txt"),
            dest: PathBuf::from(r"D:\b\two.txt"),
            preserve_attrs: true,
        };
        assert!(matches!(Robocopy.attempt(&renamed), Attempt::Declined(_)));

        let plain = CopyJob {
            preserve_attrs: false,
            ..renamed
        };
        assert!(matches!(Robocopy.attempt(&plain), Attempt::Declined(_)));
    }

    #[test]
    fn test_robocopy_exit_codes() {
        assert!(robocopy_succeeded(Some(0)));
        assert!(robocopy_succeeded(Some(1)));
        assert!(robocopy_succeeded(Some(7)));
        assert!(!robocopy_succeeded(Some(8)));
        assert!(!robocopy_succeeded(Some(16)));
        assert!(!robocopy_succeeded(Some(-1)));
        assert!(!robocopy_succeeded(None));
    }

    #[test]
    fn test_fs_copy_failure_is_fatal() {
        let dir = tempdir().unwrap();
        let job = CopyJob {
            source: dir.path().join("missing.txt"),
            dest: dir.path().join("out.txt"),
            preserve_attrs: false,
        };
        assert!(matches!(FsCopy.attempt(&job), Attempt::Fatal(_)));

        fs::write(&job.source, "data").unwrap();
        assert_eq!(FsCopy.attempt(&job), Attempt::Succeeded);
        assert_eq!(fs::read_to_string(&job.dest).unwrap(), "data");
    }

    #[test]
    fn test_dir_or_current() {
        assert_eq!(dir_or_current(Path::new("file.txt")), Path::new("."));
        assert_eq!(dir_or_current(Path::new("a/file.txt")), Path::new("a"));
    }
}
