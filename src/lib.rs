/*!
 * filekit - Cross-platform file operations with metadata preservation
 *
 * Normalizes paths between Windows, UNC, Git-Bash, WSL and POSIX forms,
 * copies and moves files while keeping their permissions, timestamps and
 * platform attributes, and creates symbolic links through a fallback chain
 * where the native call is not permitted.
 */

pub mod chain;
pub mod command;
pub mod config;
pub mod disk;
pub mod error;
pub mod fsops;
pub mod metadata;
pub mod path;
pub mod platform;
pub mod report;
pub mod select;
pub mod symlink;
pub mod transfer;

#[cfg(test)]
mod tests;

// Re-export main components for easier access
pub use config::Config;
pub use disk::{
    calculate_total_size, check_disk_space, ensure_disk_space, format_bytes, get_disk_usage,
    DiskUsage, SpaceCheck,
};
pub use error::{FileKitError, Result};
pub use fsops::{create_directory_structure, create_parent_dirs, remove_directory, remove_file};
pub use metadata::{
    apply_file_metadata, apply_with_report, collect_file_metadata, ApplyReport, FieldOutcome,
    MetadataSnapshot, PlatformExtra, Timestamps,
};
pub use path::{
    create_dest_path, ensure_unique_path, expand_user, fix_path_separators, normalize,
    normalize_path, path_exists_cross_platform, CanonicalPath, PathStyle,
};
pub use platform::{is_unix, is_windows, Platform};
pub use symlink::{create_symlink, LinkHelper, SymlinkCreator, SymlinkRequest};
pub use transfer::{
    copy_file, copy_files_with_path, move_file, move_files_with_path, BatchOptions, BatchReport,
    Transfer, TransferOptions, TransferResult,
};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
