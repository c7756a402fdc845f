/*!
 * Canonical path representation
 */

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use crate::platform::Platform;

/// Root marker of a canonical path
#[derive(Debug, Clone)]
pub enum Root {
    /// Windows drive letter. `anchored` is false for drive-relative forms
    /// such as `C:` or `C:foo`.
    Drive { letter: char, anchored: bool },
    /// UNC share, `\\host\share`
    Unc { host: String, share: String },
    /// Filesystem root with no drive (`/` on POSIX, `\` on Windows)
    Posix,
}

/// A path normalized for a specific target platform
///
/// Built by [`crate::path::normalize`]. On a POSIX target the root is never a
/// [`Root::Drive`]: drive letters are folded into the first segment (`/c/...`).
#[derive(Debug, Clone)]
pub struct CanonicalPath {
    pub(crate) root: Option<Root>,
    pub(crate) segments: Vec<String>,
    pub(crate) platform: Platform,
}

impl CanonicalPath {
    /// The current directory (`.`)
    pub fn current_dir(platform: Platform) -> Self {
        Self {
            root: None,
            segments: Vec::new(),
            platform,
        }
    }

    pub fn root(&self) -> Option<&Root> {
        self.root.as_ref()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Platform this path was normalized for
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Uppercase drive letter, if the path carries one
    pub fn drive_letter(&self) -> Option<char> {
        match self.root {
            Some(Root::Drive { letter, .. }) => Some(letter),
            _ => None,
        }
    }

    /// True for `.` (the empty relative path)
    pub fn is_current_dir(&self) -> bool {
        self.root.is_none() && self.segments.is_empty()
    }

    pub fn is_absolute(&self) -> bool {
        match &self.root {
            None => false,
            Some(Root::Drive { anchored, .. }) => *anchored,
            Some(Root::Unc { .. }) | Some(Root::Posix) => true,
        }
    }

    /// Last segment
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Native string form for the target platform
    pub fn to_native_string(&self) -> String {
        self.to_string()
    }

    pub fn to_path_buf(&self) -> PathBuf {
        PathBuf::from(self.to_native_string())
    }

    fn same_text(&self, a: &str, b: &str) -> bool {
        if self.platform.case_insensitive() {
            a.eq_ignore_ascii_case(b)
        } else {
            a == b
        }
    }

    fn same_root(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (None, None) | (Some(Root::Posix), Some(Root::Posix)) => true,
            (
                Some(Root::Drive { letter: a, anchored: x }),
                Some(Root::Drive { letter: b, anchored: y }),
            ) => a.eq_ignore_ascii_case(b) && x == y,
            (
                Some(Root::Unc { host: h1, share: s1 }),
                Some(Root::Unc { host: h2, share: s2 }),
            ) => h1.eq_ignore_ascii_case(h2) && self.same_text(s1, s2),
            _ => false,
        }
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = self.platform.separator();
        let body = self.segments.join(&sep.to_string());

        match &self.root {
            None if self.segments.is_empty() => write!(f, "."),
            None => write!(f, "{}", body),
            Some(Root::Posix) => write!(f, "{}{}", sep, body),
            Some(Root::Drive { letter, anchored }) => match self.platform {
                Platform::Windows => {
                    write!(f, "{}:", letter)?;
                    if *anchored {
                        write!(f, "{}", sep)?;
                    }
                    write!(f, "{}", body)
                }
                Platform::Posix => {
                    write!(f, "/{}", letter.to_ascii_lowercase())?;
                    if !body.is_empty() {
                        write!(f, "/{}", body)?;
                    }
                    Ok(())
                }
            },
            Some(Root::Unc { host, share }) => {
                write!(f, "{0}{0}{1}{0}{2}", sep, host, share)?;
                if !body.is_empty() {
                    write!(f, "{}{}", sep, body)?;
                }
                Ok(())
            }
        }
    }
}

impl PartialEq for CanonicalPath {
    fn eq(&self, other: &Self) -> bool {
        self.platform == other.platform
            && self.same_root(other)
            && self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| self.same_text(a, b))
    }
}

impl Eq for CanonicalPath {}

impl Hash for CanonicalPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let fold = |s: &str| {
            if self.platform.case_insensitive() {
                s.to_ascii_lowercase()
            } else {
                s.to_string()
            }
        };

        self.platform.hash(state);
        match &self.root {
            None => 0u8.hash(state),
            Some(Root::Posix) => 1u8.hash(state),
            Some(Root::Drive { letter, anchored }) => {
                2u8.hash(state);
                letter.to_ascii_uppercase().hash(state);
                anchored.hash(state);
            }
            Some(Root::Unc { host, share }) => {
                3u8.hash(state);
                host.to_ascii_lowercase().hash(state);
                fold(share).hash(state);
            }
        }
        for segment in &self.segments {
            fold(segment).hash(state);
        }
    }
}
