/*!
 * Cross-module scenarios for filekit
 */

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use filetime::FileTime;
use tempfile::tempdir;

use crate::metadata::{apply_file_metadata, collect_file_metadata};
use crate::path::{create_dest_path, normalize, PathStyle};
use crate::platform::Platform;
use crate::transfer::{copy_file, copy_files_with_path, move_file, Transfer, TransferOptions};

// Helper function to create a source tree with pinned timestamps
fn setup_source_tree() -> io::Result<(tempfile::TempDir, Vec<PathBuf>)> {
    let temp_dir = tempdir()?;
    fs::create_dir_all(temp_dir.path().join("docs").join("nested"))?;

    let files = vec![
        temp_dir.path().join("readme.txt"),
        temp_dir.path().join("docs").join("guide.md"),
        temp_dir.path().join("docs").join("nested").join("notes.txt"),
    ];

    for (i, path) in files.iter().enumerate() {
        let mut file = File::create(path)?;
        writeln!(file, "file number {}", i)?;
        let time = FileTime::from_unix_time(1_600_000_000 + i as i64 * 1000, 0);
        filetime::set_file_times(path, time, time)?;
    }

    Ok((temp_dir, files))
}

fn mtime(path: &Path) -> i64 {
    FileTime::from_last_modification_time(&fs::metadata(path).unwrap()).unix_seconds()
}

#[test]
fn test_git_bash_and_wsl_forms_agree_on_windows() {
    let from_git_bash = normalize("/c/Users/foo/file.txt", Platform::Windows);
    let from_wsl = normalize("/mnt/c/Users/foo/file.txt", Platform::Windows);

    assert_eq!(from_git_bash.to_string(), r"C:\Users\foo\file.txt");
    assert_eq!(from_git_bash, from_wsl);
    assert_eq!(
        normalize(r"C:\Users\foo\file.txt", Platform::Posix).to_string(),
        "/c/Users/foo/file.txt"
    );
}

#[test]
fn test_metadata_survives_capture_and_apply() {
    let (dir, files) = setup_source_tree().unwrap();
    let other = dir.path().join("other.txt");
    fs::write(&other, "other").unwrap();

    let before = collect_file_metadata(&files[0]);
    assert!(apply_file_metadata(&other, &before));

    let after = collect_file_metadata(&other);
    assert_eq!(before.mode, after.mode);
    assert!((mtime(&files[0]) - mtime(&other)).abs() <= 2);
}

#[test]
fn test_copy_then_move_keeps_content() {
    let (dir, files) = setup_source_tree().unwrap();
    let copied = dir.path().join("out").join("copy.txt");
    let moved = dir.path().join("out").join("moved.txt");

    assert!(copy_file(&files[1], &copied, true, false));
    assert!(move_file(&copied, &moved, true, false));

    assert_eq!(fs::read(&files[1]).unwrap(), fs::read(&moved).unwrap());
    assert!(!copied.exists());
    assert_eq!(mtime(&moved), mtime(&files[1]));
}

#[test]
fn test_overwrite_false_leaves_destination_unchanged() {
    let (dir, files) = setup_source_tree().unwrap();
    let dest = dir.path().join("existing.txt");
    fs::write(&dest, "original").unwrap();

    assert!(!copy_file(&files[0], &dest, true, false));
    assert!(!move_file(&files[0], &dest, true, false));
    assert_eq!(fs::read_to_string(&dest).unwrap(), "original");
    assert!(files[0].exists());
}

#[test]
fn test_cross_device_move_without_preserve() {
    let (dir, files) = setup_source_tree().unwrap();
    let transfer = Transfer::new().with_rename(|_: &Path, _: &Path| {
        #[cfg(unix)]
        let code = libc::EXDEV;
        #[cfg(not(unix))]
        let code = 17;
        Err(io::Error::from_raw_os_error(code))
    });

    let dest = dir.path().join("elsewhere").join("notes.txt");
    let options = TransferOptions {
        preserve_attrs: false,
        overwrite: false,
    };
    let expected = fs::read(&files[2]).unwrap();

    let result = transfer.move_file(&files[2], &dest, options);
    assert!(result.success);
    assert!(!files[2].exists());
    assert_eq!(fs::read(&dest).unwrap(), expected);
}

#[test]
fn test_batch_copy_one_missing_of_three() {
    let (src, files) = setup_source_tree().unwrap();
    let dst = tempdir().unwrap();
    let missing = src.path().join("docs").join("ghost.txt");
    let sources = vec![files[0].clone(), missing.clone(), files[2].clone()];

    let report = copy_files_with_path(
        &sources,
        src.path(),
        dst.path(),
        PathStyle::Relative,
        false,
        true,
        false,
    );

    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);

    let ghost = report.get(&missing).unwrap();
    assert!(!ghost.success);
    assert_eq!(ghost.destination, missing);
    assert!(!dst.path().join("docs").join("ghost.txt").exists());

    let notes = dst.path().join("docs").join("nested").join("notes.txt");
    assert_eq!(report.get(&files[2]).unwrap().destination, notes);
    assert_eq!(mtime(&notes), mtime(&files[2]));
}

#[test]
fn test_batch_destinations_match_layout() {
    let (src, files) = setup_source_tree().unwrap();
    let dst = tempdir().unwrap();

    for style in [PathStyle::Relative, PathStyle::Flat, PathStyle::Absolute] {
        let expected = create_dest_path(&files[1], src.path(), dst.path(), style, false).unwrap();
        let report = copy_files_with_path(
            &files[1..2],
            src.path(),
            dst.path(),
            style,
            false,
            false,
            true,
        );
        assert_eq!(report.get(&files[1]).unwrap().destination, expected);
        assert!(expected.exists(), "{:?} missing for {}", expected, style);
    }
}

#[cfg(unix)]
#[test]
fn test_symlink_force_semantics() {
    use crate::symlink::create_symlink;

    let (dir, files) = setup_source_tree().unwrap();
    let link = dir.path().join("links").join("readme-link");
    fs::create_dir_all(link.parent().unwrap()).unwrap();
    fs::write(&link, "occupied").unwrap();

    assert!(!create_symlink(&files[0], &link, false, None));
    assert_eq!(fs::read_to_string(&link).unwrap(), "occupied");

    assert!(create_symlink(&files[0], &link, true, None));
    assert_eq!(fs::read_link(&link).unwrap(), files[0]);
    assert_eq!(
        fs::read_to_string(&link).unwrap(),
        fs::read_to_string(&files[0]).unwrap()
    );
}
