//! Subprocess plumbing shared by the tool adapters.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;

/// Captured output of a tool invocation.
#[derive(Debug, Default)]
pub struct ToolOutput {
    /// Exit code, or -1 when the tool timed out or could not be spawned.
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Run a command under `cwd`, capturing output with a hard timeout.
///
/// Failure to spawn and timeouts are reported in-band via `code == -1`
/// with the reason in `stderr`, mirroring how a tool's own error output
/// is carried.
pub async fn run(argv: &[&str], cwd: &Path, timeout: Duration) -> ToolOutput {
    let (program, args) = match argv.split_first() {
        Some(split) => split,
        None => {
            return ToolOutput {
                code: -1,
                stderr: "empty command".to_string(),
                ..Default::default()
            }
        }
    };

    let future = Command::new(program).args(args).current_dir(cwd).output();
    match tokio::time::timeout(timeout, future).await {
        Ok(Ok(output)) => ToolOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        },
        Ok(Err(e)) => ToolOutput {
            code: -1,
            stderr: format!("Not found: {program} ({e})"),
            ..Default::default()
        },
        Err(_) => ToolOutput {
            code: -1,
            stderr: format!("Timed out after {}s", timeout.as_secs()),
            ..Default::default()
        },
    }
}

/// Check whether a binary is on `PATH`.
pub fn which(tool: &str) -> bool {
    let Ok(path_var) = std::env::var("PATH") else {
        return false;
    };
    std::env::split_paths(&path_var).any(|dir| dir.join(tool).is_file())
}

/// Locate the best binary for a PHP tool.
///
/// The project's `vendor/bin` copy is preferred because it picks up
/// project-specific extensions (Larastan and friends), then `PATH`.
pub fn find_bin(tool: &str, repo: &Path) -> Option<PathBuf> {
    let vendor_bin = repo.join("vendor").join("bin").join(tool);
    if vendor_bin.is_file() {
        return Some(vendor_bin);
    }
    let path_var = std::env::var("PATH").ok()?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(tool))
        .find(|candidate| candidate.is_file())
}

/// Conventional source directories containing PHP, or `.` when none exist.
pub fn php_dirs(repo: &Path) -> Vec<String> {
    const CANDIDATES: &[&str] = &[
        "app",
        "src",
        "wp-content/themes",
        "wp-content/plugins",
        "public",
        "lib",
        "includes",
        "inc",
    ];
    let found: Vec<String> = CANDIDATES
        .iter()
        .filter(|d| repo.join(d).is_dir())
        .map(|d| d.to_string())
        .collect();
    if found.is_empty() {
        vec![".".to_string()]
    } else {
        found
    }
}

/// Whether any file under `repo` has one of the given extensions,
/// ignoring dependency and VCS directories.
pub fn has_ext(repo: &Path, exts: &[&str]) -> bool {
    walkdir::WalkDir::new(repo)
        .into_iter()
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !matches!(name.as_ref(), "node_modules" | "vendor" | ".git")
        })
        .flatten()
        .filter(|entry| entry.file_type().is_file())
        .any(|entry| {
            let name = entry.file_name().to_string_lossy();
            exts.iter().any(|ext| name.ends_with(ext))
        })
}

/// First matching config file name under `repo`, if any.
pub fn find_config(repo: &Path, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find(|c| repo.join(c).exists())
        .map(|c| c.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_reports_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let out = run(
            &["definitely-not-a-real-tool-xyz"],
            dir.path(),
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(out.code, -1);
        assert!(out.stderr.contains("Not found"));
    }

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let out = run(&["echo", "hello"], dir.path(), Duration::from_secs(5)).await;
        assert_eq!(out.code, 0);
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn timeout_reports_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let out = run(&["sleep", "5"], dir.path(), Duration::from_millis(100)).await;
        assert_eq!(out.code, -1);
        assert!(out.stderr.contains("Timed out"));
    }

    #[test]
    fn php_dirs_falls_back_to_dot() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(php_dirs(dir.path()), vec!["."]);
    }

    #[test]
    fn php_dirs_lists_existing_candidates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("app")).unwrap();
        std::fs::create_dir(dir.path().join("includes")).unwrap();
        assert_eq!(php_dirs(dir.path()), vec!["app", "includes"]);
    }

    #[test]
    fn has_ext_skips_dependency_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("vendor")).unwrap();
        std::fs::write(dir.path().join("vendor/dep.php"), "<?php\n").unwrap();
        assert!(!has_ext(dir.path(), &[".php"]));

        std::fs::write(dir.path().join("index.php"), "<?php\n").unwrap();
        assert!(has_ext(dir.path(), &[".php"]));
    }

    #[test]
    fn find_bin_prefers_vendor() {
        let dir = tempfile::tempdir().unwrap();
        let vendor_bin = dir.path().join("vendor/bin");
        std::fs::create_dir_all(&vendor_bin).unwrap();
        std::fs::write(vendor_bin.join("phpstan"), "#!/bin/sh\n").unwrap();
        assert_eq!(
            find_bin("phpstan", dir.path()),
            Some(vendor_bin.join("phpstan"))
        );
    }
}
