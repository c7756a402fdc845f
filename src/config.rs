/*!
 * Configuration handling for filekit
 */

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use crate::disk::DEFAULT_SAFETY_MARGIN;
use crate::path::{normalize_path, PathStyle};
use crate::platform::Platform;
use crate::transfer::{BatchOptions, TransferOptions};

/// Largest accepted safety margin (1000%)
const MAX_SAFETY_MARGIN: f64 = 10.0;

/// Path arguments may be written in any supported convention
fn native_path(arg: &str) -> Result<PathBuf, String> {
    Ok(normalize_path(arg).to_path_buf())
}

/// Command-line arguments for filekit
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "filekit",
    version = env!("CARGO_PKG_VERSION"),
    about = "Cross-platform file operations with metadata preservation",
    long_about = "Copies, moves and links files while keeping permissions, timestamps and platform attributes, and normalizes paths between Windows, Git-Bash, WSL and POSIX conventions."
)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Option<Command>,

    /// Log debug details to stderr
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Do not capture and reapply file metadata
    #[clap(long, global = true)]
    pub no_preserve: bool,

    /// Replace existing destinations
    #[clap(long, global = true)]
    pub overwrite: bool,

    /// Number of threads to use for parallel batches
    #[clap(long, default_value = "4", global = true)]
    pub threads: usize,

    /// Generate shell completions
    #[clap(long = "generate", value_enum)]
    pub generate: Option<Shell>,
}

/// filekit subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print a path in the form native to a platform
    Normalize {
        path: String,

        /// Target platform (windows or posix); defaults to this host
        #[clap(long)]
        target: Option<Platform>,

        /// Expand a leading `~` first
        #[clap(long)]
        expand: bool,
    },

    /// Check whether a path exists under any of its spellings
    Exists { path: String },

    /// Copy one file
    Copy {
        #[clap(value_parser = native_path)]
        source: PathBuf,
        #[clap(value_parser = native_path)]
        dest: PathBuf,
    },

    /// Move one file
    Move {
        #[clap(value_parser = native_path)]
        source: PathBuf,
        #[clap(value_parser = native_path)]
        dest: PathBuf,
    },

    /// Create a symbolic link
    Link {
        #[clap(value_parser = native_path)]
        target: PathBuf,
        #[clap(value_parser = native_path)]
        link: PathBuf,

        /// Replace an existing file, link or directory at the link path
        #[clap(long)]
        force: bool,

        /// Create a directory link even if the target does not exist yet
        #[clap(long)]
        dir: bool,
    },

    /// Show the metadata snapshot of a file
    Meta {
        #[clap(value_parser = native_path)]
        path: PathBuf,

        /// Print the snapshot as JSON
        #[clap(long)]
        json: bool,
    },

    /// Copy many files under a destination directory
    BatchCopy(BatchArgs),

    /// Move many files under a destination directory
    BatchMove(BatchArgs),

    /// Report free space on the volume holding a path
    Space {
        #[clap(value_parser = native_path)]
        dest: PathBuf,

        /// Bytes that must fit
        #[clap(long, conflicts_with = "sources")]
        required: Option<u64>,

        /// Files or directories whose total size must fit
        #[clap(long = "source", value_parser = native_path)]
        sources: Vec<PathBuf>,

        /// Extra fraction on top of the required size
        #[clap(long, default_value_t = DEFAULT_SAFETY_MARGIN)]
        margin: f64,

        /// Fail when space is insufficient
        #[clap(long)]
        strict: bool,
    },
}

/// Arguments shared by the batch subcommands
#[derive(clap::Args, Debug, Clone)]
pub struct BatchArgs {
    /// Files to transfer; directories are walked recursively
    #[clap(required = true, value_parser = native_path)]
    pub sources: Vec<PathBuf>,

    /// Directory the relative layout is computed from
    #[clap(long, short = 'b', default_value = ".", value_parser = native_path)]
    pub source_base: PathBuf,

    /// Destination base directory
    #[clap(long, short = 'd', value_parser = native_path)]
    pub dest: PathBuf,

    /// Destination layout
    #[clap(long, value_enum, default_value_t = PathStyle::default())]
    pub style: PathStyle,

    /// Prefix destinations with the source base directory's name
    #[clap(long)]
    pub include_base: bool,

    /// Comma-separated list of patterns to include when walking directories
    #[clap(long, value_delimiter = ',')]
    pub include_patterns: Vec<String>,

    /// Comma-separated list of patterns to ignore when walking directories
    #[clap(long, value_delimiter = ',')]
    pub ignore_patterns: Vec<String>,

    /// Process files in parallel
    #[clap(long)]
    pub parallel: bool,

    /// Check destination space before transferring
    #[clap(long)]
    pub check_space: bool,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Subcommand to run
    pub command: Option<Command>,

    /// Per-transfer switches from the global flags
    pub transfer: TransferOptions,

    /// Number of threads to use for parallel batches
    pub num_threads: usize,

    /// Debug logging requested
    pub verbose: bool,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args(args: Args) -> Self {
        Self {
            command: args.command,
            transfer: TransferOptions {
                preserve_attrs: !args.no_preserve,
                overwrite: args.overwrite,
            },
            num_threads: args.threads,
            verbose: args.verbose,
        }
    }

    /// Batch settings for `batch` combined with the global flags
    pub fn batch_options(&self, batch: &BatchArgs) -> BatchOptions {
        BatchOptions {
            path_style: batch.style,
            include_base: batch.include_base,
            transfer: self.transfer,
            parallel: batch.parallel,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> io::Result<()> {
        let command = self.command.as_ref().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "No command given (see --help)",
            )
        })?;

        if self.num_threads == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Thread count must be at least 1",
            ));
        }

        match command {
            Command::Space { margin, .. } => {
                if !(0.0..=MAX_SAFETY_MARGIN).contains(margin) {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!(
                            "Safety margin must be between 0 and {}, got {}",
                            MAX_SAFETY_MARGIN, margin
                        ),
                    ));
                }
            }
            Command::BatchCopy(batch) | Command::BatchMove(batch) => {
                if batch.sources.is_empty() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "Batch needs at least one source",
                    ));
                }
                if batch
                    .include_patterns
                    .iter()
                    .chain(&batch.ignore_patterns)
                    .any(|p| p.trim().is_empty())
                {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "Empty include/ignore pattern",
                    ));
                }
            }
            Command::Copy { source, .. } | Command::Move { source, .. } => {
                if !source.exists() {
                    return Err(io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("Source file not found: {}", source.display()),
                    ));
                }
            }
            _ => {}
        }

        Ok(())
    }
}
