/*!
 * Symbolic link creation
 *
 * POSIX uses the native primitive only. Elsewhere a chain is tried in
 * order: the native call, an optional registered [`LinkHelper`], then the
 * shell's `mklink`. If all of them decline, the error lists the ways to
 * make link creation possible.
 */

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::chain::{Attempt, BoxedStrategy, Chain, Strategy};
use crate::error::{FileKitError, Result};
use crate::platform::Platform;

/// Windows `ERROR_PRIVILEGE_NOT_HELD`
pub const PRIVILEGE_NOT_HELD: i32 = 1314;

/// A request to create `link` pointing at `target`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymlinkRequest {
    pub target: PathBuf,
    pub link: PathBuf,
    /// Replace whatever already exists at `link`
    pub force: bool,
    /// `None` means detect from the target at creation time
    pub target_is_directory: Option<bool>,
}

impl SymlinkRequest {
    pub fn new<T: Into<PathBuf>, L: Into<PathBuf>>(target: T, link: L) -> Self {
        Self {
            target: target.into(),
            link: link.into(),
            force: false,
            target_is_directory: None,
        }
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn directory(mut self, is_directory: bool) -> Self {
        self.target_is_directory = Some(is_directory);
        self
    }

    /// Whether the link should be a directory link
    ///
    /// A relative target is looked up next to the link, where it will be
    /// resolved. A dangling target counts as a file.
    pub fn is_directory(&self) -> bool {
        if let Some(is_dir) = self.target_is_directory {
            return is_dir;
        }

        let resolved = if self.target.is_absolute() {
            self.target.clone()
        } else {
            self.link
                .parent()
                .map(|parent| parent.join(&self.target))
                .unwrap_or_else(|| self.target.clone())
        };
        resolved.is_dir()
    }
}

/// A fully resolved link to create, handed to each strategy
#[derive(Debug, Clone)]
pub struct LinkSpec {
    pub target: PathBuf,
    pub link: PathBuf,
    pub is_directory: bool,
}

/// External link-creation capability that can be registered on a creator
pub trait LinkHelper: Send + Sync {
    fn name(&self) -> &'static str {
        "helper"
    }

    /// Whether the helper is installed and usable
    fn is_available(&self) -> bool;

    fn create_link(&self, target: &Path, link: &Path, is_directory: bool) -> io::Result<()>;
}

struct NativeSymlink;

impl Strategy<LinkSpec> for NativeSymlink {
    fn name(&self) -> &'static str {
        "native"
    }

    fn attempt(&self, spec: &LinkSpec) -> Attempt {
        match native_symlink(&spec.target, &spec.link, spec.is_directory) {
            Ok(()) => Attempt::Succeeded,
            Err(e) if e.raw_os_error() == Some(PRIVILEGE_NOT_HELD) && cfg!(windows) => {
                tracing::debug!("Symlink privilege not held for {}", spec.link.display());
                Attempt::Declined("privilege not held".to_string())
            }
            Err(e) => {
                tracing::warn!(
                    "Native symlink {} -> {} failed: {}",
                    spec.link.display(),
                    spec.target.display(),
                    e
                );
                Attempt::Declined(e.to_string())
            }
        }
    }
}

#[cfg(unix)]
fn native_symlink(target: &Path, link: &Path, _is_directory: bool) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn native_symlink(target: &Path, link: &Path, is_directory: bool) -> io::Result<()> {
    if is_directory {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}

#[cfg(not(any(unix, windows)))]
fn native_symlink(_target: &Path, _link: &Path, _is_directory: bool) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symbolic links are not supported on this platform",
    ))
}

struct HelperSymlink(Arc<dyn LinkHelper>);

impl Strategy<LinkSpec> for HelperSymlink {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn is_available(&self) -> bool {
        self.0.is_available()
    }

    fn attempt(&self, spec: &LinkSpec) -> Attempt {
        match self.0.create_link(&spec.target, &spec.link, spec.is_directory) {
            Ok(()) => Attempt::Succeeded,
            Err(e) => Attempt::Declined(e.to_string()),
        }
    }
}

struct MklinkSymlink;

/// Command line passed to `cmd /c`
#[cfg_attr(not(windows), allow(dead_code))]
fn mklink_command_line(spec: &LinkSpec) -> String {
    format!(
        "mklink {}{} {}",
        if spec.is_directory { "/D " } else { "" },
        crate::command::quote_for_cmd(&spec.link),
        crate::command::quote_for_cmd(&spec.target)
    )
}

impl Strategy<LinkSpec> for MklinkSymlink {
    fn name(&self) -> &'static str {
        "mklink"
    }

    fn is_available(&self) -> bool {
        cfg!(windows)
    }

    #[cfg(windows)]
    fn attempt(&self, spec: &LinkSpec) -> Attempt {
        use std::os::windows::process::CommandExt;
        use std::process::{Command, Stdio};

        let output = Command::new("cmd")
            .arg("/c")
            .raw_arg(mklink_command_line(spec))
            .stdin(Stdio::null())
            .output();

        match output {
            Ok(output) if output.status.success() => Attempt::Succeeded,
            Ok(output) => Attempt::Declined(format!(
                "exit status {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )),
            Err(e) => Attempt::Declined(e.to_string()),
        }
    }

    #[cfg(not(windows))]
    fn attempt(&self, _spec: &LinkSpec) -> Attempt {
        Attempt::Declined("mklink requires cmd.exe".to_string())
    }
}

fn remedies(spec: &LinkSpec) -> String {
    format!(
        "cannot create {} -> {}. To allow symbolic links, either: \
         (1) enable Developer Mode in Windows settings, \
         (2) run this program as Administrator, or \
         (3) install a link helper such as dazzlelink",
        spec.link.display(),
        spec.target.display()
    )
}

/// Creates symbolic links through an ordered strategy chain
pub struct SymlinkCreator {
    chain: Chain<LinkSpec>,
    platform: Platform,
}

impl Default for SymlinkCreator {
    fn default() -> Self {
        Self::new()
    }
}

impl SymlinkCreator {
    /// Creator for the running platform, without a helper
    pub fn new() -> Self {
        Self::for_platform(Platform::current(), None)
    }

    /// Creator for the running platform with `helper` after the native call
    pub fn with_helper(helper: Arc<dyn LinkHelper>) -> Self {
        Self::for_platform(Platform::current(), Some(helper))
    }

    pub fn for_platform(platform: Platform, helper: Option<Arc<dyn LinkHelper>>) -> Self {
        let mut chain: Chain<LinkSpec> = Chain::default();
        chain.push(Box::new(NativeSymlink));

        if platform.is_windows() {
            if let Some(helper) = helper {
                chain.push(Box::new(HelperSymlink(helper)));
            }
            chain.push(Box::new(MklinkSymlink));
        }

        Self { chain, platform }
    }

    /// Creator using exactly `strategies`, in order
    pub fn with_strategies(platform: Platform, strategies: Vec<BoxedStrategy<LinkSpec>>) -> Self {
        Self {
            chain: Chain::new(strategies),
            platform,
        }
    }

    /// Strategy names in the order they are tried
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.chain.names()
    }

    pub fn create(&self, request: &SymlinkRequest) -> Result<()> {
        let link = &request.link;

        if let Ok(existing) = fs::symlink_metadata(link) {
            crate::ensure!(
                request.force,
                AlreadyExists,
                "{} (use force to replace it)",
                link.display()
            );
            remove_existing(link, &existing)?;
        }

        if let Some(parent) = link.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let spec = LinkSpec {
            target: request.target.clone(),
            link: link.clone(),
            is_directory: request.is_directory(),
        };

        let outcome = self.chain.run(&spec);
        if outcome.succeeded() {
            tracing::debug!(
                "Created symlink {} -> {} via {}",
                link.display(),
                request.target.display(),
                outcome.winner().unwrap_or("unknown")
            );
            return Ok(());
        }

        if let Some(reason) = outcome.fatal() {
            return Err(FileKitError::SymlinkUnavailable(reason.to_string()));
        }

        if self.platform.is_windows() {
            Err(FileKitError::SymlinkUnavailable(remedies(&spec)))
        } else {
            Err(FileKitError::SymlinkUnavailable(format!(
                "{} -> {}: {}",
                link.display(),
                request.target.display(),
                outcome
            )))
        }
    }
}

fn remove_existing(link: &Path, existing: &fs::Metadata) -> Result<()> {
    let file_type = existing.file_type();

    let result = if file_type.is_symlink() {
        // directory symlinks on Windows are removed as directories
        fs::remove_file(link).or_else(|e| {
            if cfg!(windows) {
                fs::remove_dir(link)
            } else {
                Err(e)
            }
        })
    } else if file_type.is_dir() {
        fs::remove_dir_all(link)
    } else {
        fs::remove_file(link)
    };

    result.map_err(|e| {
        crate::error!(
            Unexpected,
            "failed to remove existing {}: {}",
            link.display(),
            e
        )
    })
}

/// Create `link` pointing at `target`, logging instead of returning errors
pub fn create_symlink(
    target: &Path,
    link: &Path,
    force: bool,
    target_is_directory: Option<bool>,
) -> bool {
    let request = SymlinkRequest {
        target: target.to_path_buf(),
        link: link.to_path_buf(),
        force,
        target_is_directory,
    };

    match SymlinkCreator::new().create(&request) {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Error creating symlink {}: {}", link.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    struct FakeHelper {
        available: bool,
        calls: AtomicUsize,
    }

    impl LinkHelper for FakeHelper {
        fn name(&self) -> &'static str {
            "fake-helper"
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn create_link(&self, _target: &Path, link: &Path, _is_directory: bool) -> io::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            fs::write(link, "helper-made")
        }
    }

    struct Decline(&'static str);

    impl Strategy<LinkSpec> for Decline {
        fn name(&self) -> &'static str {
            self.0
        }

        fn attempt(&self, _spec: &LinkSpec) -> Attempt {
            Attempt::Declined("no".into())
        }
    }

    #[test]
    fn test_chain_order_per_platform() {
        let helper = Arc::new(FakeHelper {
            available: true,
            calls: AtomicUsize::new(0),
        });

        let windows = SymlinkCreator::for_platform(Platform::Windows, Some(helper.clone() as Arc<dyn LinkHelper>));
        assert_eq!(
            windows.strategy_names(),
            vec!["native", "fake-helper", "mklink"]
        );

        let windows_plain = SymlinkCreator::for_platform(Platform::Windows, None);
        assert_eq!(windows_plain.strategy_names(), vec!["native", "mklink"]);

        let posix = SymlinkCreator::for_platform(Platform::Posix, Some(helper as Arc<dyn LinkHelper>));
        assert_eq!(posix.strategy_names(), vec!["native"]);
    }

    #[test]
    fn test_helper_runs_after_native_declines() {
        let dir = tempdir().unwrap();
        let helper = Arc::new(FakeHelper {
            available: true,
            calls: AtomicUsize::new(0),
        });
        let creator = SymlinkCreator::with_strategies(
            Platform::Windows,
            vec![
                Box::new(Decline("native")),
                Box::new(HelperSymlink(helper.clone())),
                Box::new(Decline("mklink")),
            ],
        );

        let link = dir.path().join("nested").join("link");
        creator
            .create(&SymlinkRequest::new(dir.path().join("target"), &link))
            .unwrap();
        assert_eq!(helper.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fs::read_to_string(&link).unwrap(), "helper-made");
    }

    #[test]
    fn test_all_declined_lists_remedies() {
        let dir = tempdir().unwrap();
        let helper = Arc::new(FakeHelper {
            available: false,
            calls: AtomicUsize::new(0),
        });
        let creator = SymlinkCreator::with_strategies(
            Platform::Windows,
            vec![
                Box::new(Decline("native")),
                Box::new(HelperSymlink(helper.clone())),
                Box::new(Decline("mklink")),
            ],
        );

        let err = creator
            .create(&SymlinkRequest::new("target", dir.path().join("link")))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Developer Mode"));
        assert!(message.contains("Administrator"));
        assert!(message.contains("link helper"));
        assert_eq!(helper.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_existing_link_without_force_is_untouched() {
        let dir = tempdir().unwrap();
        let link = dir.path().join("link");
        fs::write(&link, "keep me").unwrap();

        let creator = SymlinkCreator::with_strategies(Platform::Posix, vec![]);
        let err = creator
            .create(&SymlinkRequest::new("target", &link))
            .unwrap_err();
        assert!(matches!(err, FileKitError::AlreadyExists(_)));
        assert_eq!(fs::read_to_string(&link).unwrap(), "keep me");
    }

    #[test]
    fn test_directory_detection() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let relative = SymlinkRequest::new("sub", dir.path().join("link"));
        assert!(relative.is_directory());

        let dangling = SymlinkRequest::new(dir.path().join("nowhere"), dir.path().join("l2"));
        assert!(!dangling.is_directory());

        assert!(dangling.clone().directory(true).is_directory());
    }

    #[test]
    fn test_mklink_command_line() {
        let spec = LinkSpec {
            target: PathBuf::from(r"C:\data dir"),
            link: PathBuf::from(r"C:\link"),
            is_directory: true,
        };
        assert_eq!(
            mklink_command_line(&spec),
            r#"mklink /D "C:\link" "C:\data dir""#
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_force_replaces_dangling_symlink() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target.txt");
        fs::write(&target, "content").unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(dir.path().join("gone"), &link).unwrap();

        assert!(!create_symlink(&target, &link, false, None));
        assert!(create_symlink(&target, &link, true, None));
        assert_eq!(fs::read_link(&link).unwrap(), target);
        assert_eq!(fs::read_to_string(&link).unwrap(), "content");
    }

    #[cfg(unix)]
    #[test]
    fn test_force_replaces_real_directory() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target");
        fs::create_dir(&target).unwrap();
        let link = dir.path().join("link");
        fs::create_dir(&link).unwrap();
        fs::write(link.join("inner.txt"), "x").unwrap();

        assert!(create_symlink(&target, &link, true, None));
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    }
}
