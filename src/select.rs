/*!
 * Batch source selection
 *
 * Expands directory arguments into the files beneath them, filtered by
 * file-name glob patterns. File arguments are passed through untouched,
 * even when missing, so the batch can report them as failures.
 */

use std::path::{Path, PathBuf};

use glob_match::glob_match;
use walkdir::WalkDir;

/// Include/ignore filter for walked files
#[derive(Debug, Clone, Default)]
pub struct SourceSelector {
    include_patterns: Vec<String>,
    ignore_patterns: Vec<String>,
}

impl SourceSelector {
    pub fn new(include_patterns: Vec<String>, ignore_patterns: Vec<String>) -> Self {
        Self {
            include_patterns,
            ignore_patterns,
        }
    }

    /// Check if a file matches an ignore pattern
    pub fn should_ignore(&self, path: &Path) -> bool {
        let file_name = path.file_name().unwrap_or_default().to_string_lossy();
        self.ignore_patterns
            .iter()
            .any(|pattern| glob_match(pattern, &file_name))
    }

    /// Check if a file matches the include patterns (all files when none are set)
    pub fn should_include(&self, path: &Path) -> bool {
        if self.include_patterns.is_empty() {
            return true;
        }

        let file_name = path.file_name().unwrap_or_default().to_string_lossy();
        self.include_patterns
            .iter()
            .any(|pattern| glob_match(pattern, &file_name))
    }

    /// Expand `sources` into a flat list of files
    pub fn expand(&self, sources: &[PathBuf]) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for source in sources {
            if !source.is_dir() {
                files.push(source.clone());
                continue;
            }

            for entry in WalkDir::new(source).sort_by_file_name() {
                match entry {
                    Ok(entry)
                        if entry.file_type().is_file()
                            && !self.should_ignore(entry.path())
                            && self.should_include(entry.path()) =>
                    {
                        files.push(entry.into_path());
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!("Cannot walk {}: {}", source.display(), e),
                }
            }
        }

        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_expand_filters_walked_files() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.rs"), "").unwrap();
        fs::write(dir.path().join("b.txt"), "").unwrap();
        fs::write(dir.path().join("sub").join("c.rs"), "").unwrap();
        fs::write(dir.path().join("sub").join("skip.rs"), "").unwrap();

        let selector = SourceSelector::new(vec!["*.rs".into()], vec!["skip*".into()]);
        let files = selector.expand(&[dir.path().to_path_buf()]);

        assert_eq!(
            files,
            vec![dir.path().join("a.rs"), dir.path().join("sub").join("c.rs")]
        );
    }

    #[test]
    fn test_file_arguments_pass_through() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        let selector = SourceSelector::new(vec!["*.rs".into()], vec![]);
        // explicit files are never filtered
        assert_eq!(selector.expand(&[missing.clone()]), vec![missing]);
    }

    #[test]
    fn test_no_patterns_includes_everything() {
        let selector = SourceSelector::default();
        assert!(selector.should_include(Path::new("anything.bin")));
        assert!(!selector.should_ignore(Path::new("anything.bin")));
    }
}
