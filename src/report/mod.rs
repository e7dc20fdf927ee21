//! Markdown report assembly and persistence.
//!
//! The report is written for a coding agent to consume: metadata header,
//! usage or follow-up legend, static analysis section, one section per
//! review batch, then a closing summary.

use std::path::{Path, PathBuf};

use chrono::Local;

use crate::git::ChangeScope;
use crate::review::BatchReviewResult;

/// Which pipeline produced the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewMode {
    Repo,
    Pr,
}

/// PR metadata block for the report header.
#[derive(Debug, Clone)]
pub struct PrInfo {
    pub scope: ChangeScope,
    pub changed_count: usize,
    pub commits: String,
}

/// Everything the report header needs about the run.
pub struct ReportMeta<'a> {
    pub mode: ReviewMode,
    pub profile_name: &'a str,
    pub project_name: &'a str,
    pub elapsed_secs: u64,
    pub prior_report_path: Option<&'a Path>,
    pub pr_info: Option<&'a PrInfo>,
}

impl ReportMeta<'_> {
    pub fn is_followup(&self) -> bool {
        self.prior_report_path.is_some()
    }

    fn mode_heading(&self) -> &'static str {
        if self.is_followup() {
            "Follow-up Review"
        } else {
            match self.mode {
                ReviewMode::Repo => "Full Repository Scan",
                ReviewMode::Pr => "Pull Request Review",
            }
        }
    }

    /// Filename component: follow-up runs get their own suffix.
    pub fn mode_suffix(&self) -> &'static str {
        if self.is_followup() {
            "followup"
        } else {
            match self.mode {
                ReviewMode::Repo => "repo",
                ReviewMode::Pr => "pr",
            }
        }
    }
}

/// Assemble the full Markdown report.
pub fn generate_report(
    meta: &ReportMeta,
    results: &[BatchReviewResult],
    analysis_report: &str,
) -> String {
    let now = Local::now().format("%Y-%m-%d %H:%M");
    let total_files: usize = results.iter().map(|r| r.file_count).sum();

    let mut lines = vec![
        format!("# Critique Report: {}", meta.project_name),
        String::new(),
        format!("**Mode:** {}", meta.mode_heading()),
        format!("**Profile:** {}", meta.profile_name),
        format!("**Date:** {now}"),
        format!("**Files reviewed:** {total_files}"),
        format!("**Review batches:** {}", results.len()),
        format!("**Time:** {}s", meta.elapsed_secs),
    ];

    if let Some(prior) = meta.prior_report_path {
        let name = prior
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| prior.display().to_string());
        lines.push(format!("**Prior report:** `{name}`"));
    }

    if let Some(pr) = meta.pr_info {
        lines.push(format!("**Branch:** {}", pr.scope.label()));
        lines.push(format!("**Base:** {}", pr.scope.base));
        lines.push(format!("**Changed files:** {}", pr.changed_count));
        if !pr.commits.is_empty() {
            lines.push(String::new());
            lines.push("**Commits:**".to_string());
            lines.push("```".to_string());
            lines.push(pr.commits.clone());
            lines.push("```".to_string());
        }
    }

    lines.extend([String::new(), "---".to_string(), String::new()]);

    if meta.is_followup() {
        lines.extend(
            [
                "## Follow-up Review",
                "",
                "This review checked whether a developer's changes properly addressed",
                "the findings from the prior report. The review below uses a",
                "finding-by-finding status format:",
                "",
                "- ✅ **FIXED** — the issue was properly addressed",
                "- ⚠️ **PARTIAL** — the fix is incomplete or introduced a new issue",
                "- ❌ **NOT ADDRESSED** — the finding was not fixed in this PR",
                "- 🆕 **NEW ISSUE** — a problem that wasn't in the prior report",
                "",
                "---",
                "",
            ]
            .map(String::from),
        );
    } else {
        lines.extend(
            [
                "## How To Use This Report",
                "",
                "Feed this report to your coding agent:",
                "",
                "```",
                "Read the report at /path/to/this/report.md and fix all",
                "CRITICAL and WARNING issues. For each fix, explain what you changed.",
                "```",
                "",
                "Then review the fixes with a follow-up scan:",
                "",
                "```",
                "critique pr <repo> --branch <fix-branch> --latest",
                "```",
                "",
                "*This tool produces findings only — it does not write code.*",
                "",
                "---",
                "",
            ]
            .map(String::from),
        );
    }

    if !analysis_report.is_empty() {
        lines.extend([
            "## Static Analysis Results".to_string(),
            String::new(),
            analysis_report.to_string(),
            String::new(),
            "---".to_string(),
            String::new(),
        ]);
    }

    if !results.is_empty() {
        lines.push("## LLM Code Review".to_string());
        lines.push(String::new());
        for (i, r) in results.iter().enumerate() {
            let file_list: Vec<String> = r.files.iter().map(|f| format!("`{f}`")).collect();
            lines.push(format!("### Batch {}: {}", i + 1, file_list.join(", ")));
            lines.push(String::new());
            lines.push(r.review.clone());
            lines.push(String::new());
            lines.push("---".to_string());
            lines.push(String::new());
        }
    }

    lines.push("## Summary".to_string());
    lines.push(String::new());
    lines.push(format!(
        "Reviewed {total_files} files in {} batches ({}s).",
        results.len(),
        meta.elapsed_secs
    ));
    lines.push(String::new());
    if meta.is_followup() {
        lines.push(
            "*Follow-up review generated by critique. \
             Any NOT ADDRESSED findings should go back to the developer.*"
                .to_string(),
        );
    } else {
        lines.push(
            "*Generated by critique. Feed to your coding agent for fixes, \
             then use --latest for follow-up review.*"
                .to_string(),
        );
    }
    lines.join("\n")
}

/// Write the report to disk and return its path.
///
/// With no explicit output path the file lands in `reports_dir` as
/// `<slug>-<mode>-<profile>-<timestamp>.md`, where `slug` is the repo
/// directory basename (also what prior-report lookup matches on).
pub fn save_report(
    report: &str,
    slug: &str,
    profile: &str,
    mode_suffix: &str,
    reports_dir: &Path,
    output: Option<&Path>,
) -> std::io::Result<PathBuf> {
    let path = match output {
        Some(path) => path.to_path_buf(),
        None => {
            std::fs::create_dir_all(reports_dir)?;
            let ts = Local::now().format("%Y%m%d-%H%M");
            reports_dir.join(format!("{slug}-{mode_suffix}-{profile}-{ts}.md"))
        }
    };
    std::fs::write(&path, report)?;
    Ok(path)
}
