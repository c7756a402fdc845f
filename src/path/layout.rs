/*!
 * Destination path layout for batch transfers
 */

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::Result;

/// How a source file's location maps under the destination base
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, ValueEnum, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PathStyle {
    /// Keep the path relative to the source base
    #[default]
    Relative,
    /// Mirror the full source path, root and drive included
    Absolute,
    /// File name only, discarding intermediate directories
    Flat,
}

/// Name of the source base directory itself, resolving `.` and similar
fn base_name(source_base: &Path) -> Option<OsString> {
    if let Some(name) = source_base.file_name() {
        return Some(name.to_os_string());
    }
    fs::canonicalize(source_base)
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_os_string()))
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

fn climbs_out(rel: &Path) -> bool {
    rel.components().any(|c| matches!(c, Component::ParentDir))
}

/// `source` relative to `source_base`, retrying on canonical forms
///
/// A lexical tail containing `..` could leave the destination tree, so it
/// only counts once canonicalization confirms the file is under the base.
fn relative_to_base(source: &Path, source_base: &Path) -> Option<PathBuf> {
    if let Ok(rel) = source.strip_prefix(source_base) {
        if !climbs_out(rel) {
            return Some(rel.to_path_buf());
        }
    }
    let source = fs::canonicalize(source).ok()?;
    let base = fs::canonicalize(source_base).ok()?;
    source
        .strip_prefix(&base)
        .ok()
        .filter(|rel| !climbs_out(rel))
        .map(Path::to_path_buf)
}

/// Source path with its root turned into plain segments (`/a/b` → `a/b`,
/// `C:\a` → `C/a`, `\\host\share\a` → `host/share/a`)
fn mirrored(source: &Path) -> Result<PathBuf> {
    let absolute = absolutize(source)?;
    let mut out = PathBuf::new();

    for component in absolute.components() {
        match component {
            Component::Prefix(prefix) => {
                let text = prefix.as_os_str().to_string_lossy().into_owned();
                let cleaned: Vec<&str> = text
                    .split(|c| c == '\\' || c == '/' || c == ':' || c == '?')
                    .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("UNC"))
                    .collect();
                for part in cleaned {
                    out.push(part);
                }
            }
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }

    Ok(out)
}

/// Compute where `source` lands under `dest_base`
pub fn create_dest_path(
    source: &Path,
    source_base: &Path,
    dest_base: &Path,
    style: PathStyle,
    include_base: bool,
) -> Result<PathBuf> {
    let mut dest = dest_base.to_path_buf();

    if include_base {
        if let Some(name) = base_name(source_base) {
            dest.push(name);
        }
    }

    let file_name = source.file_name().map(PathBuf::from).ok_or_else(|| {
        crate::error!(InvalidArgument, "source has no file name: {}", source.display())
    })?;

    let tail = match style {
        PathStyle::Flat => file_name,
        PathStyle::Relative => match relative_to_base(source, source_base) {
            Some(rel) if !rel.as_os_str().is_empty() => rel,
            _ => {
                tracing::warn!(
                    "{} is outside {}, using file name only",
                    source.display(),
                    source_base.display()
                );
                file_name
            }
        },
        PathStyle::Absolute => mirrored(source)?,
    };

    dest.push(tail);
    Ok(dest)
}

/// First of `path`, `stem_1.ext`, `stem_2.ext`, … that does not exist yet
pub fn ensure_unique_path(path: &Path) -> PathBuf {
    if !path.exists() && !path.is_symlink() {
        return path.to_path_buf();
    }

    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1u64;
    loop {
        let candidate = parent.join(format!("{}_{}{}", stem, counter, ext));
        if !candidate.exists() && !candidate.is_symlink() {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_relative_layout() {
        let dest = create_dest_path(
            Path::new("/src/project/a/b.txt"),
            Path::new("/src/project"),
            Path::new("/backup"),
            PathStyle::Relative,
            false,
        )
        .unwrap();
        assert_eq!(dest, PathBuf::from("/backup/a/b.txt"));
    }

    #[test]
    fn test_relative_layout_with_base() {
        let dest = create_dest_path(
            Path::new("/src/project/a/b.txt"),
            Path::new("/src/project"),
            Path::new("/backup"),
            PathStyle::Relative,
            true,
        )
        .unwrap();
        assert_eq!(dest, PathBuf::from("/backup/project/a/b.txt"));
    }

    #[test]
    fn test_flat_layout() {
        let dest = create_dest_path(
            Path::new("/src/project/a/deep/b.txt"),
            Path::new("/src/project"),
            Path::new("/backup"),
            PathStyle::Flat,
            false,
        )
        .unwrap();
        assert_eq!(dest, PathBuf::from("/backup/b.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_absolute_layout() {
        let dest = create_dest_path(
            Path::new("/src/project/a/b.txt"),
            Path::new("/src/project"),
            Path::new("/backup"),
            PathStyle::Absolute,
            false,
        )
        .unwrap();
        assert_eq!(dest, PathBuf::from("/backup/src/project/a/b.txt"));
    }

    #[cfg(windows)]
    #[test]
    fn test_absolute_layout_keeps_drive() {
        let dest = create_dest_path(
            Path::new(r"C:\src\a\b.txt"),
            Path::new(r"C:\src"),
            Path::new(r"D:\backup"),
            PathStyle::Absolute,
            false,
        )
        .unwrap();
        assert_eq!(dest, PathBuf::from(r"D:\backup\C\src\a\b.txt"));
    }

    #[test]
    fn test_outside_base_falls_back_to_file_name() {
        let dest = create_dest_path(
            Path::new("/elsewhere/b.txt"),
            Path::new("/src/project"),
            Path::new("/backup"),
            PathStyle::Relative,
            false,
        )
        .unwrap();
        assert_eq!(dest, PathBuf::from("/backup/b.txt"));
    }

    #[test]
    fn test_parent_components_never_leave_dest_base() {
        let dest = create_dest_path(
            Path::new("/src/project/../../elsewhere/b.txt"),
            Path::new("/src/project"),
            Path::new("/backup"),
            PathStyle::Relative,
            false,
        )
        .unwrap();
        assert_eq!(dest, PathBuf::from("/backup/b.txt"));
    }

    #[test]
    fn test_parent_components_inside_base_resolve() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("base");
        fs::create_dir_all(base.join("a")).unwrap();
        fs::create_dir_all(base.join("b")).unwrap();
        fs::write(base.join("b").join("f.txt"), "x").unwrap();

        let dest_base = dir.path().join("out");
        let dest = create_dest_path(
            &base.join("a").join("..").join("b").join("f.txt"),
            &base,
            &dest_base,
            PathStyle::Relative,
            false,
        )
        .unwrap();
        assert_eq!(dest, dest_base.join("b").join("f.txt"));
    }

    #[test]
    fn test_style_parsing() {
        assert_eq!("flat".parse::<PathStyle>().unwrap(), PathStyle::Flat);
        assert_eq!("Absolute".parse::<PathStyle>().unwrap(), PathStyle::Absolute);
        assert_eq!(PathStyle::Relative.to_string(), "relative");
        assert!("mirror".parse::<PathStyle>().is_err());
    }

    #[test]
    fn test_ensure_unique_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.txt");
        assert_eq!(ensure_unique_path(&path), path);

        fs::write(&path, "taken").unwrap();
        let unique = ensure_unique_path(&path);
        assert_eq!(unique, dir.path().join("test_1.txt"));

        fs::write(&unique, "also taken").unwrap();
        assert_eq!(ensure_unique_path(&path), dir.path().join("test_2.txt"));
    }
}
