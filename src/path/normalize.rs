/*!
 * Cross-platform path normalization
 *
 * Reconciles Windows drive paths, UNC shares, POSIX paths, Git-Bash
 * (`/c/...`) and WSL (`/mnt/c/...`) forms into the representation a target
 * platform expects. Everything here is a pure string transform except
 * [`path_exists_cross_platform`].
 */

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use strum::Display;

use super::canonical::{CanonicalPath, Root};
use crate::platform::Platform;

// `C:`, `c:\foo`, `C:/foo`, `C:foo`
static DRIVE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Za-z]):(.*)$").unwrap());

// `\\?\` and `//?/` verbatim prefixes, optionally followed by `UNC\`
static VERBATIM_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\\/]{2}[?.][\\/](?:(?i:UNC)[\\/])?").unwrap());

/// Recognized source convention of a path string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PathForm {
    /// Empty string
    Empty,
    /// No root marker
    Relative,
    /// Rooted path with no drive, `/home/u`
    Posix,
    /// `/c/Users/...`
    GitBash,
    /// `/mnt/c/Users/...`
    Wsl,
    /// `C:\...`, `C:/...` or drive-relative `C:foo`
    WindowsDrive,
    /// `\\host\share\...` or `//host/share/...`
    Unc,
}

/// Intermediate parse shared by every target platform
struct Parsed {
    form: PathForm,
    drive: Option<(char, bool)>,
    unc: Option<(String, String)>,
    segments: Vec<String>,
}

fn is_sep(c: char) -> bool {
    c == '/' || c == '\\'
}

fn split_segments(s: &str) -> Vec<String> {
    s.split(is_sep)
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .map(str::to_string)
        .collect()
}

fn single_letter(segment: &str) -> Option<char> {
    let mut chars = segment.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Some(c),
        _ => None,
    }
}

/// Strip a `\\?\` / `\\?\UNC\` prefix, keeping UNC paths recognizable
fn strip_verbatim(path: &str) -> String {
    match VERBATIM_REGEX.find(path) {
        Some(m) => {
            let rest = &path[m.end()..];
            let was_unc = m.as_str().len() > 4;
            if was_unc {
                format!(r"\\{}", rest)
            } else {
                rest.to_string()
            }
        }
        None => path.to_string(),
    }
}

fn parse(input: &str) -> Parsed {
    let s = strip_verbatim(input);

    if s.is_empty() {
        return Parsed {
            form: PathForm::Empty,
            drive: None,
            unc: None,
            segments: Vec::new(),
        };
    }

    if let Some(caps) = DRIVE_REGEX.captures(&s) {
        let letter = caps[1].chars().next().unwrap_or('C');
        let rest = &caps[2];
        return Parsed {
            form: PathForm::WindowsDrive,
            drive: Some((letter, rest.starts_with(is_sep))),
            unc: None,
            segments: split_segments(rest),
        };
    }

    let mut chars = s.chars();
    let first = chars.next().map_or(false, is_sep);
    let second = chars.next().map_or(false, is_sep);

    if first && second {
        let mut segments = split_segments(&s);
        if segments.len() >= 2 {
            let host = segments.remove(0);
            let share = segments.remove(0);
            return Parsed {
                form: PathForm::Unc,
                drive: None,
                unc: Some((host, share)),
                segments,
            };
        }
        // `//` or `//host` alone: no share to anchor on
        return Parsed {
            form: PathForm::Posix,
            drive: None,
            unc: None,
            segments,
        };
    }

    if first {
        let segments = split_segments(&s);
        // Drive rewrites only apply to forward-slash forms
        if s.starts_with('/') {
            if let Some(letter) = segments.first().and_then(|seg| single_letter(seg)) {
                return Parsed {
                    form: PathForm::GitBash,
                    drive: Some((letter, segments.len() > 1)),
                    unc: None,
                    segments: segments[1..].to_vec(),
                };
            }
            if segments.len() >= 2 && segments[0] == "mnt" {
                if let Some(letter) = single_letter(&segments[1]) {
                    return Parsed {
                        form: PathForm::Wsl,
                        drive: Some((letter, segments.len() > 2)),
                        unc: None,
                        segments: segments[2..].to_vec(),
                    };
                }
            }
        }
        return Parsed {
            form: PathForm::Posix,
            drive: None,
            unc: None,
            segments,
        };
    }

    Parsed {
        form: PathForm::Relative,
        drive: None,
        unc: None,
        segments: split_segments(&s),
    }
}

/// Classify a path string by its source convention
pub fn detect_form(path: &str) -> PathForm {
    parse(path).form
}

/// Normalize `path` into the canonical form for `target`
///
/// Never fails: input that matches no known convention passes through with
/// only its separators rewritten. The result is idempotent under
/// re-normalization of its string form.
pub fn normalize(path: &str, target: Platform) -> CanonicalPath {
    let parsed = parse(path);

    let (root, segments) = match (parsed.form, target) {
        (PathForm::Empty, _) => (None, parsed.segments),
        (PathForm::Relative, _) => {
            let mut segments = parsed.segments;
            // `./C:/x` must not render as the drive path `C:/x`
            if segments.first().map_or(false, |seg| DRIVE_REGEX.is_match(seg)) {
                segments.insert(0, ".".to_string());
            }
            (None, segments)
        }
        (PathForm::Unc, _) => {
            let (host, share) = parsed.unc.unwrap_or_default();
            (Some(Root::Unc { host, share }), parsed.segments)
        }
        // Git-Bash and WSL forms are left alone on POSIX
        (PathForm::GitBash, Platform::Posix) => {
            let mut segments = parsed.segments;
            if let Some((letter, _)) = parsed.drive {
                segments.insert(0, letter.to_string());
            }
            (Some(Root::Posix), segments)
        }
        (PathForm::Wsl, Platform::Posix) => {
            let mut segments = parsed.segments;
            if let Some((letter, _)) = parsed.drive {
                segments.insert(0, letter.to_string());
                segments.insert(0, "mnt".to_string());
            }
            (Some(Root::Posix), segments)
        }
        (PathForm::WindowsDrive, Platform::Posix) => {
            let mut segments = parsed.segments;
            if let Some((letter, _)) = parsed.drive {
                segments.insert(0, letter.to_ascii_lowercase().to_string());
            }
            (Some(Root::Posix), segments)
        }
        (PathForm::GitBash, Platform::Windows)
        | (PathForm::Wsl, Platform::Windows)
        | (PathForm::WindowsDrive, Platform::Windows) => {
            let (letter, anchored) = parsed.drive.unwrap_or(('C', true));
            (
                Some(Root::Drive {
                    letter: letter.to_ascii_uppercase(),
                    anchored,
                }),
                parsed.segments,
            )
        }
        (PathForm::Posix, _) => (Some(Root::Posix), parsed.segments),
    };

    CanonicalPath {
        root,
        segments,
        platform: target,
    }
}

/// Normalize for the platform this process runs on
pub fn normalize_path(path: &str) -> CanonicalPath {
    normalize(path, Platform::current())
}

/// Rewrite separators only, without interpreting drive or mount prefixes
pub fn fix_path_separators(path: &str, target: Platform) -> String {
    match target {
        Platform::Windows => path.replace('/', "\\"),
        Platform::Posix => path.replace('\\', "/"),
    }
}

/// Expand a leading `~` to the user's home directory
///
/// `~user` forms are returned unchanged.
pub fn expand_user(path: &str) -> String {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with(is_sep) => rest,
        _ => return path.to_string(),
    };

    match dirs::home_dir() {
        Some(home) => format!("{}{}", home.display(), rest),
        None => path.to_string(),
    }
}

/// `/mnt/<drive>/...` spelling of a Windows or Git-Bash drive path
fn wsl_mount_form(path: &str) -> Option<PathBuf> {
    let parsed = parse(path);
    match parsed.form {
        PathForm::WindowsDrive | PathForm::GitBash => {
            let (letter, _) = parsed.drive?;
            let mut out = PathBuf::from("/mnt");
            out.push(letter.to_ascii_lowercase().to_string());
            out.extend(parsed.segments);
            Some(out)
        }
        _ => None,
    }
}

/// Candidate spellings probed by [`path_exists_cross_platform`], in order
pub fn existence_candidates(path: &str, target: Platform) -> Vec<PathBuf> {
    let mut candidates = vec![normalize(path, target).to_path_buf()];

    if !path.is_empty() {
        candidates.push(PathBuf::from(path));
        candidates.push(normalize(path, target.opposite()).to_path_buf());
    }

    if target == Platform::Posix {
        if let Some(mounted) = wsl_mount_form(path) {
            candidates.push(mounted);
        }
    }

    let mut seen = HashSet::new();
    candidates.retain(|candidate| seen.insert(candidate.clone()));
    candidates
}

/// Existence check that tolerates foreign path conventions
///
/// Probes the normalized form first, then the raw string (an emulation layer
/// may resolve a Git-Bash path as-is), then the other platform's spelling,
/// then the WSL mount form on POSIX.
pub fn path_exists_cross_platform(path: &str) -> bool {
    existence_candidates(path, Platform::current())
        .iter()
        .any(|candidate| Path::new(candidate).exists())
}
