//! Ignore-aware file discovery.
//!
//! Prefers `git ls-files` enumeration (tracked plus untracked-but-not-ignored,
//! so build artifacts never get scanned) and falls back to a directory walk
//! that prunes excluded and dot-directories as it descends. The strategy is
//! picked once per run, never interleaved.
//!
//! Failure policy: a file that cannot be read is silently excluded; nothing
//! here aborts a run.

use std::collections::HashSet;
use std::path::Path;

use walkdir::WalkDir;

use crate::constants::{MAX_FILE_SIZE, MAX_TOTAL_FILES};
use crate::git;

/// One file eligible for review. Immutable once discovered.
#[derive(Debug, Clone)]
pub struct ReviewableFile {
    /// Repo-relative path with `/` separators.
    pub path: String,
    /// File content, lossily decoded (invalid byte sequences dropped).
    pub content: String,
    /// Size in bytes. Always `0 < size <= MAX_FILE_SIZE`.
    pub size: u64,
}

/// Discovery filters, derived from the active profile and project config.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryFilter {
    /// Accepted filename suffixes (e.g. `.php`, `.blade.php`).
    pub extensions: Vec<String>,
    /// Directory names pruned anywhere in the tree.
    pub skip_dirs: HashSet<String>,
    /// Exact basenames always skipped (lockfiles etc.).
    pub skip_files: HashSet<String>,
    /// Extra path-prefix excludes from project config.
    pub extra_excludes: Vec<String>,
    /// When set (PR mode), only these repo-relative paths are accepted.
    pub allow_list: Option<HashSet<String>>,
}

impl DiscoveryFilter {
    fn accepts_name(&self, basename: &str) -> bool {
        !self.skip_files.contains(basename)
            && self.extensions.iter().any(|ext| basename.ends_with(ext.as_str()))
    }

    /// Path-level checks shared by both enumeration modes.
    ///
    /// Rejects when any segment except the filename is an excluded directory
    /// or starts with a dot, or when an extra-exclude prefix matches.
    fn accepts_path(&self, rel_path: &str) -> bool {
        let segments: Vec<&str> = rel_path.split('/').collect();
        for segment in &segments[..segments.len().saturating_sub(1)] {
            if self.skip_dirs.contains(*segment) || segment.starts_with('.') {
                return false;
            }
        }
        for exclude in &self.extra_excludes {
            let prefix = exclude.trim_matches('/');
            if prefix.is_empty() {
                continue;
            }
            if rel_path.starts_with(prefix) || rel_path.contains(&format!("/{prefix}")) {
                return false;
            }
        }
        if let Some(ref allowed) = self.allow_list {
            if !allowed.contains(rel_path) {
                return false;
            }
        }
        true
    }
}

/// How candidate paths are enumerated. Selected once per run.
enum Enumeration {
    /// Version-control listing, already ignore-aware.
    Vcs(Vec<String>),
    /// Plain directory walk with in-walk pruning.
    Walk,
}

/// Discover reviewable files under `root`, newest constraints first.
///
/// The returned list is deterministic for an unchanged tree: VCS paths are
/// sorted lexicographically before the `max_files` truncation, and the walk
/// visits entries in sorted order.
pub async fn discover_files(
    root: &Path,
    filter: &DiscoveryFilter,
    max_files: usize,
) -> Vec<ReviewableFile> {
    let enumeration = match git::ls_files(root).await {
        Some(mut paths) => {
            paths.sort();
            Enumeration::Vcs(paths)
        }
        None => Enumeration::Walk,
    };

    let mut files = Vec::new();
    match enumeration {
        Enumeration::Vcs(paths) => {
            for rel_path in paths {
                if files.len() >= max_files.min(MAX_TOTAL_FILES) {
                    break;
                }
                if let Some(file) = load_candidate(root, &rel_path, filter) {
                    files.push(file);
                }
            }
        }
        Enumeration::Walk => {
            let skip_dirs = filter.skip_dirs.clone();
            let walker = WalkDir::new(root)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(move |entry| {
                    if !entry.file_type().is_dir() {
                        return true;
                    }
                    let name = entry.file_name().to_string_lossy();
                    // Keep the root itself even if it happens to be dotted.
                    entry.depth() == 0 || (!skip_dirs.contains(name.as_ref()) && !name.starts_with('.'))
                });

            for entry in walker.flatten() {
                if files.len() >= max_files.min(MAX_TOTAL_FILES) {
                    break;
                }
                if !entry.file_type().is_file() {
                    continue;
                }
                let rel_path = match entry.path().strip_prefix(root) {
                    Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
                    Err(_) => continue,
                };
                if let Some(file) = load_candidate(root, &rel_path, filter) {
                    files.push(file);
                }
            }
        }
    }

    files
}

/// Apply all per-candidate filters and read the file, or skip it.
fn load_candidate(root: &Path, rel_path: &str, filter: &DiscoveryFilter) -> Option<ReviewableFile> {
    let basename = rel_path.rsplit('/').next().unwrap_or(rel_path);
    if !filter.accepts_name(basename) || !filter.accepts_path(rel_path) {
        return None;
    }

    let full_path = root.join(rel_path);
    let size = std::fs::metadata(&full_path).ok()?.len();
    if size == 0 || size > MAX_FILE_SIZE {
        return None;
    }

    let bytes = std::fs::read(&full_path).ok()?;
    let content = String::from_utf8_lossy(&bytes).into_owned();

    Some(ReviewableFile {
        path: rel_path.to_string(),
        content,
        size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn php_filter() -> DiscoveryFilter {
        DiscoveryFilter {
            extensions: vec![".php".into(), ".js".into()],
            skip_dirs: ["vendor", "node_modules"].iter().map(|s| s.to_string()).collect(),
            skip_files: ["composer.lock"].iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn walk_finds_matching_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.php"), "<?php echo 1;\n").unwrap();
        std::fs::write(dir.path().join("app.js"), "console.log(1);\n").unwrap();
        std::fs::write(dir.path().join("readme.md"), "# nope\n").unwrap();

        let files = discover_files(dir.path(), &php_filter(), 300).await;
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["app.js", "index.php"]);
    }

    #[tokio::test]
    async fn walk_prunes_skip_dirs_and_dot_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("vendor/lib")).unwrap();
        std::fs::create_dir_all(dir.path().join(".hidden")).unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("vendor/lib/dep.php"), "<?php\n").unwrap();
        std::fs::write(dir.path().join(".hidden/secret.php"), "<?php\n").unwrap();
        std::fs::write(dir.path().join("src/main.php"), "<?php\n").unwrap();

        let files = discover_files(dir.path(), &php_filter(), 300).await;
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["src/main.php"]);
    }

    #[tokio::test]
    async fn empty_and_oversized_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("empty.php"), "").unwrap();
        std::fs::write(dir.path().join("big.php"), "x".repeat(MAX_FILE_SIZE as usize + 1)).unwrap();
        std::fs::write(dir.path().join("ok.php"), "<?php\n").unwrap();

        let files = discover_files(dir.path(), &php_filter(), 300).await;
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "ok.php");
        assert!(files[0].size > 0 && files[0].size <= MAX_FILE_SIZE);
    }

    #[tokio::test]
    async fn skip_files_and_extra_excludes_apply() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("lib/legacy")).unwrap();
        std::fs::write(dir.path().join("composer.lock"), "{}").unwrap();
        std::fs::write(dir.path().join("lib/legacy/old.php"), "<?php\n").unwrap();
        std::fs::write(dir.path().join("new.php"), "<?php\n").unwrap();

        let mut filter = php_filter();
        filter.extensions.push(".lock".into());
        filter.extra_excludes = vec!["lib/legacy/".into()];

        let files = discover_files(dir.path(), &filter, 300).await;
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["new.php"]);
    }

    #[tokio::test]
    async fn allow_list_restricts_to_changed_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.php"), "<?php\n").unwrap();
        std::fs::write(dir.path().join("b.php"), "<?php\n").unwrap();

        let mut filter = php_filter();
        filter.allow_list = Some(["a.php".to_string()].into_iter().collect());

        let files = discover_files(dir.path(), &filter, 300).await;
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a.php"]);
    }

    #[tokio::test]
    async fn max_files_caps_the_result() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..5 {
            std::fs::write(dir.path().join(format!("f{i}.php")), "<?php\n").unwrap();
        }
        let files = discover_files(dir.path(), &php_filter(), 3).await;
        assert_eq!(files.len(), 3);
    }

    #[tokio::test]
    async fn invalid_utf8_is_decoded_lossily() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mixed.php"), b"<?php \xFF\xFE echo 1;\n").unwrap();

        let files = discover_files(dir.path(), &php_filter(), 300).await;
        assert_eq!(files.len(), 1);
        assert!(files[0].content.contains("echo 1"));
    }

    #[tokio::test]
    async fn repeated_runs_are_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["z.php", "a.php", "m.php"] {
            std::fs::write(dir.path().join(name), "<?php\n").unwrap();
        }
        let first = discover_files(dir.path(), &php_filter(), 300).await;
        let second = discover_files(dir.path(), &php_filter(), 300).await;
        let p1: Vec<&str> = first.iter().map(|f| f.path.as_str()).collect();
        let p2: Vec<&str> = second.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(p1, p2);
    }
}
