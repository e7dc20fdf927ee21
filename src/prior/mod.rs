//! Prior-report lookup and loading for follow-up reviews.

use std::path::{Path, PathBuf};

use crate::constants::PRIOR_REPORT_MAX_CHARS;

/// Elision marker inserted where a truncated prior report was cut.
pub const TRUNCATION_MARKER: &str =
    "\n\n... [PRIOR REPORT TRUNCATED — middle batches omitted] ...\n\n";

/// Find the most recent report for a project in `reports_dir`.
///
/// Matches `.md` files whose name starts with the project name
/// (case-insensitive) and returns the newest by modification time.
pub fn find_latest_report(reports_dir: &Path, project: &str) -> Option<PathBuf> {
    let needle = project.to_lowercase();
    let mut candidates: Vec<(std::time::SystemTime, PathBuf)> = Vec::new();

    for entry in std::fs::read_dir(reports_dir).ok()?.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.to_lowercase().starts_with(&needle) || !name.ends_with(".md") {
            continue;
        }
        if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
            candidates.push((modified, entry.path()));
        }
    }

    candidates.sort_by(|a, b| b.0.cmp(&a.0));
    candidates.into_iter().next().map(|(_, path)| path)
}

/// Load a prior report, trimming the middle when it exceeds the budget.
///
/// The head carries metadata and the finding list, the tail carries the
/// summary section; the verbose per-batch middle is what gets cut. A
/// report that cannot be read degrades to a placeholder string so the
/// review can still proceed.
pub fn load_prior_report(path: &Path) -> String {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => return format!("(Could not load prior report: {e})"),
    };
    if content.len() <= PRIOR_REPORT_MAX_CHARS {
        return content;
    }

    let half = PRIOR_REPORT_MAX_CHARS / 2;
    let head_end = floor_boundary(&content, half);
    let tail_start = ceil_boundary(&content, content.len() - half);
    format!(
        "{}{TRUNCATION_MARKER}{}",
        &content[..head_end],
        &content[tail_start..]
    )
}

fn floor_boundary(s: &str, mut index: usize) -> usize {
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_boundary(s: &str, mut index: usize) -> usize {
    while !s.is_char_boundary(index) {
        index += 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_report_loads_whole() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        std::fs::write(&path, "# Report\n\nAll good.\n").unwrap();
        assert_eq!(load_prior_report(&path), "# Report\n\nAll good.\n");
    }

    #[test]
    fn oversized_report_keeps_head_and_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        let head = "H".repeat(20_000);
        let tail = "T".repeat(20_000);
        std::fs::write(&path, format!("{head}{tail}")).unwrap();

        let loaded = load_prior_report(&path);
        assert!(loaded.starts_with("HHH"));
        assert!(loaded.ends_with("TTT"));
        assert!(loaded.contains(TRUNCATION_MARKER));
        assert_eq!(
            loaded.len(),
            PRIOR_REPORT_MAX_CHARS + TRUNCATION_MARKER.len()
        );
    }

    #[test]
    fn unreadable_report_degrades_to_placeholder() {
        let loaded = load_prior_report(Path::new("/nonexistent/report.md"));
        assert!(loaded.starts_with("(Could not load prior report:"));
    }

    #[test]
    fn latest_report_matches_project_prefix_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("My-Site-repo-old.md"), "old").unwrap();
        std::fs::write(dir.path().join("other-project.md"), "x").unwrap();
        std::fs::write(dir.path().join("my-site-repo-new.md"), "new").unwrap();

        // Nudge mtimes so "new" is strictly newer.
        let newer = dir.path().join("my-site-repo-new.md");
        let later = std::time::SystemTime::now() + std::time::Duration::from_secs(60);
        let file = std::fs::File::open(&newer).unwrap();
        file.set_modified(later).unwrap();

        let found = find_latest_report(dir.path(), "my-site").unwrap();
        assert_eq!(found, newer);
    }

    #[test]
    fn no_matching_reports_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("unrelated.md"), "x").unwrap();
        assert!(find_latest_report(dir.path(), "my-site").is_none());
        assert!(find_latest_report(Path::new("/nonexistent"), "my-site").is_none());
    }

    #[test]
    fn non_markdown_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("my-site-notes.txt"), "x").unwrap();
        assert!(find_latest_report(dir.path(), "my-site").is_none());
    }
}
