//! Git CLI wrappers.
//!
//! Shells out to `git` via `tokio::process::Command`. Every helper degrades
//! gracefully: a missing `git` binary or a non-repository directory yields
//! `None`/empty output rather than an error, so discovery can fall back to
//! a plain directory walk and PR analysis can report "no changes".

use std::path::Path;

use thiserror::Error;

/// Errors from git plumbing that callers may want to surface.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("failed to run git: {0}")]
    Spawn(std::io::Error),
}

/// Selects which changes a PR review covers.
#[derive(Debug, Clone, Default)]
pub struct ChangeScope {
    /// Branch to compare against the base (`base...branch`).
    pub branch: Option<String>,
    /// Explicit commit range (e.g. `main..feature/x`); takes priority.
    pub range: Option<String>,
    /// Base branch for branch comparison.
    pub base: String,
}

impl ChangeScope {
    fn diff_spec(&self) -> Option<String> {
        if let Some(ref range) = self.range {
            Some(range.clone())
        } else {
            self.branch
                .as_ref()
                .map(|branch| format!("{}...{branch}", self.base))
        }
    }

    /// Short label for report metadata.
    pub fn label(&self) -> String {
        self.range
            .clone()
            .or_else(|| self.branch.clone())
            .unwrap_or_else(|| "HEAD".to_string())
    }
}

async fn run_git(repo: &Path, args: &[&str]) -> Result<std::process::Output, GitError> {
    tokio::process::Command::new("git")
        .args(args)
        .current_dir(repo)
        .output()
        .await
        .map_err(GitError::Spawn)
}

/// Returns the repository toplevel for `dir`, or `None` outside a work tree.
pub async fn repo_root(dir: &Path) -> Option<String> {
    let output = run_git(dir, &["rev-parse", "--show-toplevel"]).await.ok()?;
    if !output.status.success() {
        return None;
    }
    let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!root.is_empty()).then_some(root)
}

/// List tracked plus untracked-but-not-ignored files, repo-relative.
///
/// Returns `None` when `dir` is not version-controlled, which signals the
/// caller to use the directory-walk fallback.
pub async fn ls_files(dir: &Path) -> Option<Vec<String>> {
    repo_root(dir).await?;
    let output = run_git(dir, &["ls-files", "--cached", "--others", "--exclude-standard"])
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let files = String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    Some(files)
}

/// File paths touched by the change scope (`git diff --name-only`).
pub async fn changed_files(repo: &Path, scope: &ChangeScope) -> Vec<String> {
    let spec = scope.diff_spec();
    let mut args = vec!["diff", "--name-only"];
    if let Some(ref s) = spec {
        args.push(s);
    } else {
        args.push("HEAD");
    }
    match run_git(repo, &args).await {
        Ok(output) => String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect(),
        Err(e) => {
            eprintln!("Warning: git diff --name-only failed: {e}");
            Vec::new()
        }
    }
}

/// Unified diff for the change scope, with 5 context lines.
pub async fn diff(repo: &Path, scope: &ChangeScope) -> String {
    let spec = scope.diff_spec();
    let mut args = vec!["diff", "--unified=5"];
    if let Some(ref s) = spec {
        args.push(s);
    } else {
        args.push("HEAD");
    }
    match run_git(repo, &args).await {
        Ok(output) => String::from_utf8_lossy(&output.stdout).into_owned(),
        Err(_) => String::new(),
    }
}

/// One-line commit log for the change scope (last 10 on the worktree default).
pub async fn log_oneline(repo: &Path, scope: &ChangeScope) -> String {
    let spec = if let Some(ref range) = scope.range {
        Some(range.clone())
    } else {
        scope
            .branch
            .as_ref()
            .map(|branch| format!("{}..{branch}", scope.base))
    };
    let mut args = vec!["log", "--oneline"];
    if let Some(ref s) = spec {
        args.push(s);
    } else {
        args.push("-10");
    }
    match run_git(repo, &args).await {
        Ok(output) => String::from_utf8_lossy(&output.stdout).trim().to_string(),
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn init_repo(dir: &Path) {
        for args in [
            vec!["init", "-b", "main"],
            vec!["config", "user.email", "test@test.com"],
            vec!["config", "user.name", "Test"],
        ] {
            run_git(dir, &args).await.unwrap();
        }
    }

    #[tokio::test]
    async fn ls_files_outside_repo_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ls_files(dir.path()).await.is_none());
    }

    #[tokio::test]
    async fn ls_files_respects_gitignore() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path()).await;
        std::fs::write(dir.path().join(".gitignore"), "ignored.php\n").unwrap();
        std::fs::write(dir.path().join("kept.php"), "<?php\n").unwrap();
        std::fs::write(dir.path().join("ignored.php"), "<?php\n").unwrap();

        let files = ls_files(dir.path()).await.unwrap();
        assert!(files.iter().any(|f| f == "kept.php"));
        assert!(!files.iter().any(|f| f == "ignored.php"));
    }

    #[tokio::test]
    async fn changed_files_lists_worktree_changes() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path()).await;
        std::fs::write(dir.path().join("a.php"), "<?php // v1\n").unwrap();
        run_git(dir.path(), &["add", "."]).await.unwrap();
        run_git(dir.path(), &["commit", "-m", "init"]).await.unwrap();
        std::fs::write(dir.path().join("a.php"), "<?php // v2\n").unwrap();

        let scope = ChangeScope {
            base: "main".into(),
            ..Default::default()
        };
        let changed = changed_files(dir.path(), &scope).await;
        assert_eq!(changed, vec!["a.php"]);

        let d = diff(dir.path(), &scope).await;
        assert!(d.contains("v2"));
    }

    #[test]
    fn scope_label_prefers_range() {
        let scope = ChangeScope {
            branch: Some("feature/x".into()),
            range: Some("main..feature/x".into()),
            base: "main".into(),
        };
        assert_eq!(scope.label(), "main..feature/x");
    }
}
