/*!
 * External command helpers
 *
 * Shared by the shell-level fallbacks (`mklink`, `robocopy`, `attrib`).
 * No timeout is applied: a hung command hangs the caller.
 */

use std::env;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use crate::error::{FileKitError, Result};

/// Check if a command exists on the system
pub fn command_exists(command: &str) -> bool {
    let extensions: Vec<String> = if cfg!(windows) {
        env::var("PATHEXT")
            .unwrap_or_else(|_| ".EXE;.BAT;.CMD;.COM".to_string())
            .split(';')
            .map(|ext| ext.to_ascii_lowercase())
            .chain(std::iter::once(String::new()))
            .collect()
    } else {
        vec![String::new()]
    };

    if let Some(paths) = env::var_os("PATH") {
        for dir in env::split_paths(&paths) {
            for ext in &extensions {
                let candidate = dir.join(format!("{}{}", command, ext));
                if candidate.is_file() {
                    return true;
                }
            }
        }
    }

    false
}

/// Run a command to completion and capture its output
pub fn run_command<S: AsRef<std::ffi::OsStr>>(cmd: &str, args: &[S]) -> Result<Output> {
    Command::new(cmd)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| FileKitError::Command(format!("Failed to spawn {}: {}", cmd, e)))
}

/// Run a command and require a zero exit status
pub fn run_checked<S: AsRef<std::ffi::OsStr>>(cmd: &str, args: &[S]) -> Result<Output> {
    let output = run_command(cmd, args)?;

    if output.status.success() {
        Ok(output)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(FileKitError::Command(format!(
            "{} exited with status {}: {}",
            cmd,
            output.status,
            stderr.trim()
        )))
    }
}

/// Quote a path for a `cmd /c` command line
pub fn quote_for_cmd(path: &Path) -> String {
    format!("\"{}\"", path.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_exists() {
        assert!(!command_exists("nonexistentcommandxyz"));
        #[cfg(unix)]
        assert!(command_exists("sh"));
        #[cfg(windows)]
        assert!(command_exists("cmd"));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_checked_reports_exit_status() {
        let ok = run_checked("sh", &["-c", "echo hi"]).unwrap();
        assert_eq!(String::from_utf8_lossy(&ok.stdout).trim(), "hi");

        let err = run_checked("sh", &["-c", "echo bad >&2; exit 3"]).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("sh exited with status"));
        assert!(message.contains("bad"));
    }

    #[test]
    fn test_spawn_failure_is_command_error() {
        let err = run_command("nonexistentcommandxyz", &["--version"]).unwrap_err();
        assert!(matches!(err, FileKitError::Command(_)));
    }

    #[test]
    fn test_quote_for_cmd() {
        assert_eq!(quote_for_cmd(Path::new("a b")), "\"a b\"");
    }
}
