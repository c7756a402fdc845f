/*!
 * Windows file attributes
 *
 * Native access goes through `GetFileAttributesW`/`SetFileAttributesW`.
 * When that fails the `attrib` command is used instead: its listing is
 * stored verbatim at capture time and its `+X` switches are used on apply.
 * The listing parser is plain text handling and is available everywhere.
 */

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::chain::{Attempt, Chain, Strategy};

pub const FILE_ATTRIBUTE_READONLY: u32 = 0x1;
pub const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
pub const FILE_ATTRIBUTE_SYSTEM: u32 = 0x4;
pub const FILE_ATTRIBUTE_ARCHIVE: u32 = 0x20;

/// Attributes `attrib` can toggle, with their letters
const TOGGLES: [(char, u32); 4] = [
    ('A', FILE_ATTRIBUTE_ARCHIVE),
    ('R', FILE_ATTRIBUTE_READONLY),
    ('H', FILE_ATTRIBUTE_HIDDEN),
    ('S', FILE_ATTRIBUTE_SYSTEM),
];

// Start of the path column in an `attrib` listing line
static PATH_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]:[\\/]|\\\\").unwrap());

/// Attribute bits named in the flag columns of an `attrib` listing
///
/// Only the text before the path is inspected, so letters inside the path
/// itself are never mistaken for flags.
pub fn parse_attrib_flags(listing: &str) -> u32 {
    let mut bits = 0;

    for line in listing.lines() {
        let flags = match PATH_START.find(line) {
            Some(m) => &line[..m.start()],
            None => line,
        };

        for token in flags.split_whitespace() {
            for ch in token.chars() {
                if let Some((_, bit)) = TOGGLES
                    .iter()
                    .find(|(letter, _)| letter.eq_ignore_ascii_case(&ch))
                {
                    bits |= bit;
                }
            }
        }
    }

    bits
}

/// `attrib` switches setting every toggleable bit present in `bits`
pub fn attrib_switches(bits: u32) -> Vec<String> {
    TOGGLES
        .iter()
        .filter(|(_, bit)| bits & bit != 0)
        .map(|(letter, _)| format!("+{}", letter))
        .collect()
}

/// Read attributes, native first, then the `attrib` listing
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) fn read_attributes(path: &Path) -> Option<super::PlatformExtra> {
    match native::get_attributes(path) {
        Ok(bits) => return Some(super::PlatformExtra::Attributes { bits }),
        Err(e) => tracing::debug!(
            "native attribute read failed for {}: {}",
            path.display(),
            e
        ),
    }

    match crate::command::run_checked("attrib", &[path.as_os_str()]) {
        Ok(output) => Some(super::PlatformExtra::AttribListing {
            listing: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        }),
        Err(e) => {
            tracing::debug!("attrib listing failed for {}: {}", path.display(), e);
            None
        }
    }
}

/// Attribute payload for one apply run
pub(crate) struct AttributeTarget<'a> {
    pub path: &'a Path,
    pub bits: u32,
}

struct NativeAttributes;

impl Strategy<AttributeTarget<'_>> for NativeAttributes {
    fn name(&self) -> &'static str {
        "SetFileAttributesW"
    }

    fn is_available(&self) -> bool {
        cfg!(windows)
    }

    fn attempt(&self, target: &AttributeTarget<'_>) -> Attempt {
        match native::set_attributes(target.path, target.bits) {
            Ok(()) => Attempt::Succeeded,
            Err(e) => Attempt::Declined(e.to_string()),
        }
    }
}

struct AttribCommand;

impl Strategy<AttributeTarget<'_>> for AttribCommand {
    fn name(&self) -> &'static str {
        "attrib"
    }

    fn is_available(&self) -> bool {
        cfg!(windows)
    }

    fn attempt(&self, target: &AttributeTarget<'_>) -> Attempt {
        let switches = attrib_switches(target.bits);
        if switches.is_empty() {
            return Attempt::Succeeded;
        }

        // one switch per call so a rejected flag does not block the others
        let mut failed = Vec::new();
        for switch in &switches {
            let args = [std::ffi::OsStr::new(switch), target.path.as_os_str()];
            if let Err(e) = crate::command::run_checked("attrib", &args) {
                failed.push(format!("{}: {}", switch, e));
            }
        }

        if failed.is_empty() {
            Attempt::Succeeded
        } else {
            Attempt::Declined(failed.join(", "))
        }
    }
}

/// Native call first, `attrib` toggles after
pub(crate) fn attribute_chain<'a>() -> Chain<AttributeTarget<'a>> {
    Chain::new(vec![Box::new(NativeAttributes), Box::new(AttribCommand)])
}

/// Reapply a degraded listing through `attrib` only
pub(crate) fn listing_chain<'a>() -> Chain<AttributeTarget<'a>> {
    Chain::new(vec![Box::new(AttribCommand)])
}

#[cfg(windows)]
mod native {
    use std::io;
    use std::os::windows::ffi::OsStrExt;
    use std::path::Path;

    use windows_sys::Win32::Storage::FileSystem::{
        GetFileAttributesW, SetFileAttributesW, INVALID_FILE_ATTRIBUTES,
    };

    fn wide(path: &Path) -> Vec<u16> {
        path.as_os_str()
            .encode_wide()
            .chain(std::iter::once(0))
            .collect()
    }

    pub fn get_attributes(path: &Path) -> io::Result<u32> {
        let name = wide(path);
        // SAFETY: `name` is a NUL-terminated UTF-16 buffer that outlives the call
        let attrs = unsafe { GetFileAttributesW(name.as_ptr()) };
        if attrs == INVALID_FILE_ATTRIBUTES {
            Err(io::Error::last_os_error())
        } else {
            Ok(attrs)
        }
    }

    pub fn set_attributes(path: &Path, attrs: u32) -> io::Result<()> {
        let name = wide(path);
        // SAFETY: as above
        let ok = unsafe { SetFileAttributesW(name.as_ptr(), attrs) };
        if ok == 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }
}

#[cfg(not(windows))]
mod native {
    use std::io;
    use std::path::Path;

    pub fn get_attributes(_path: &Path) -> io::Result<u32> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "file attributes are Windows-only",
        ))
    }

    pub fn set_attributes(_path: &Path, _attrs: u32) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "file attributes are Windows-only",
        ))
    }
}
