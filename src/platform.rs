/*!
 * Host platform identity
 *
 * Every platform branch in the crate gates on [`Platform`]. The host value is
 * resolved once per process; path normalization takes the platform as an
 * explicit argument so both branches can be exercised on any host.
 */

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Operating-system family a path or metadata operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(ascii_case_insensitive)]
pub enum Platform {
    /// Windows (drive letters, backslashes, attribute flags)
    #[strum(serialize = "windows")]
    Windows,
    /// Any POSIX-like system (Linux, macOS, BSD, WSL)
    #[strum(serialize = "posix")]
    Posix,
}

/// Platform detection cache
static CURRENT: OnceLock<Platform> = OnceLock::new();

impl Platform {
    /// The platform this process runs on (cached)
    pub fn current() -> Self {
        *CURRENT.get_or_init(|| {
            if cfg!(windows) {
                Platform::Windows
            } else {
                Platform::Posix
            }
        })
    }

    /// The platform a path written for `self` would be translated to
    pub fn opposite(self) -> Self {
        match self {
            Platform::Windows => Platform::Posix,
            Platform::Posix => Platform::Windows,
        }
    }

    /// Native path separator
    pub fn separator(self) -> char {
        match self {
            Platform::Windows => '\\',
            Platform::Posix => '/',
        }
    }

    /// Whether path comparison ignores ASCII case
    pub fn case_insensitive(self) -> bool {
        matches!(self, Platform::Windows)
    }

    pub fn is_windows(self) -> bool {
        matches!(self, Platform::Windows)
    }
}

/// True when running on Windows
pub fn is_windows() -> bool {
    Platform::current().is_windows()
}

/// True when running on a POSIX system
pub fn is_unix() -> bool {
    !is_windows()
}
