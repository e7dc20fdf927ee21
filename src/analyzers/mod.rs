//! Static analysis tool orchestration.
//!
//! Runs every applicable tool in parallel and collects structured results.
//! The review model receives tool output as context so it can confirm or
//! dismiss findings, explain why they matter, and catch what tools miss.
//! A missing tool is skipped with a note, never an error.

pub mod adapters;
pub mod compress;
pub mod process;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use colored::Colorize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::constants::{HEARTBEAT_INTERVAL, MAX_TOOL_OUTPUT_CHARS, TOOL_CONCURRENCY};

use adapters::ToolAdapter;

/// Result from a single static analysis tool.
///
/// `success == false` with empty `output` means the tool was skipped
/// (not installed, no config). `success == false` with output preserved
/// means the tool ran but its output could not be interpreted.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerResult {
    pub tool: String,
    pub success: bool,
    pub findings_count: usize,
    pub output: String,
    pub error: String,
    pub summary: String,
}

impl AnalyzerResult {
    pub fn skipped(tool: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            error: error.into(),
            ..Default::default()
        }
    }
}

/// Which tool suite applies to a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteKind {
    /// Full PHP + JS set with the WordPress coding standard.
    WordPress,
    /// Full PHP + JS set with PSR-12.
    Laravel,
    /// JavaScript and CSS tools only.
    React,
    /// Detect the stack and run whatever applies.
    Auto,
}

/// All tool results for one repository.
#[derive(Debug, Default)]
pub struct AnalysisSuite {
    pub results: Vec<AnalyzerResult>,
}

impl AnalysisSuite {
    pub fn has_findings(&self) -> bool {
        self.results.iter().any(|r| r.findings_count > 0)
    }

    /// Format all results as context for the review prompt.
    ///
    /// Per-tool output is capped at [`MAX_TOOL_OUTPUT_CHARS`] so one noisy
    /// tool cannot crowd out the code under review.
    pub fn to_prompt_context(&self) -> String {
        if self.results.is_empty() {
            return String::new();
        }
        let mut sections = vec![
            "# Static Analysis Results".to_string(),
            String::new(),
            "The following tools were run against this codebase before your review.".to_string(),
            "Use these results to inform your review: confirm real issues, dismiss".to_string(),
            "false positives, explain patterns, and find issues the tools missed.".to_string(),
            String::new(),
        ];
        for r in &self.results {
            if !r.success && r.output.is_empty() {
                sections.push(format!("## {}: SKIPPED ({})", r.tool, r.error));
                sections.push(String::new());
                continue;
            }
            sections.push(format!("## {}: {} findings", r.tool, r.findings_count));
            if !r.summary.is_empty() {
                sections.push(r.summary.clone());
            }
            sections.push(String::new());
            if !r.output.is_empty() {
                let mut output = r.output.clone();
                if output.len() > MAX_TOOL_OUTPUT_CHARS {
                    output = format!(
                        "{}\n\n... (truncated, first {MAX_TOOL_OUTPUT_CHARS} chars shown)",
                        truncate_at_boundary(&output, MAX_TOOL_OUTPUT_CHARS)
                    );
                }
                sections.push("```".to_string());
                sections.push(output);
                sections.push("```".to_string());
            }
            sections.push(String::new());
        }
        sections.join("\n")
    }

    /// Format as a standalone report section (tools-only mode).
    pub fn to_report_section(&self) -> String {
        if self.results.is_empty() {
            return "No tools were run.".to_string();
        }
        let mut sections = Vec::new();
        let mut total = 0;
        for r in &self.results {
            if !r.success && r.output.is_empty() {
                sections.push(format!("### ⏭ {}", r.tool));
                sections.push(format!("*Skipped: {}*\n", r.error));
                continue;
            }
            total += r.findings_count;
            let icon = if r.findings_count > 10 {
                "🔴"
            } else if r.findings_count > 0 {
                "🟡"
            } else {
                "🟢"
            };
            sections.push(format!(
                "### {icon} {} — {} findings",
                r.tool, r.findings_count
            ));
            if !r.summary.is_empty() {
                sections.push(format!("*{}*", r.summary));
            }
            sections.push(String::new());
            if !r.output.is_empty() && r.output != "No issues found." {
                sections.push("```".to_string());
                sections.push(r.output.clone());
                sections.push("```".to_string());
            } else if r.findings_count == 0 {
                sections.push("Clean — no issues found.".to_string());
            }
            sections.push(String::new());
        }
        format!(
            "**Total findings across all tools: {total}**\n\n{}",
            sections.join("\n")
        )
    }
}

fn truncate_at_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Assemble the adapter list for a suite kind.
fn suite_adapters(repo: &Path, kind: SuiteKind, phpstan_level: u8) -> Vec<Box<dyn ToolAdapter>> {
    use adapters::{
        ComposerAudit, Eslint, NpmAudit, ParallelLint, Phpcpd, Phpcs, Phpmd, Phpstan, Psalm,
        Rector, Stylelint,
    };

    let php_set = |standard: &'static str| -> Vec<Box<dyn ToolAdapter>> {
        vec![
            Box::new(ParallelLint),
            Box::new(Phpstan {
                level: phpstan_level,
            }),
            Box::new(Psalm),
            Box::new(Phpcs { standard }),
            Box::new(Phpmd),
            Box::new(Phpcpd),
            Box::new(Rector),
            Box::new(ComposerAudit),
        ]
    };
    let js_set = || -> Vec<Box<dyn ToolAdapter>> { vec![Box::new(Eslint), Box::new(NpmAudit)] };

    match kind {
        SuiteKind::WordPress => {
            let mut tools = php_set("WordPress");
            tools.extend(js_set());
            tools.push(Box::new(Stylelint));
            tools
        }
        SuiteKind::Laravel => {
            let mut tools = php_set("PSR12");
            tools.extend(js_set());
            tools.push(Box::new(Stylelint));
            tools
        }
        SuiteKind::React => {
            let mut tools = js_set();
            tools.push(Box::new(Stylelint));
            tools
        }
        SuiteKind::Auto => {
            let mut tools: Vec<Box<dyn ToolAdapter>> = Vec::new();
            if process::has_ext(repo, &[".php"]) {
                let is_wp =
                    repo.join("wp-content").exists() || repo.join("wp-config.php").exists();
                let standard = if is_wp { "WordPress-Security" } else { "PSR12" };
                tools = php_set(standard);
            }
            if repo.join("package.json").exists() {
                tools.extend(js_set());
            }
            if process::has_ext(repo, &[".css", ".scss"]) {
                tools.push(Box::new(Stylelint));
            }
            tools
        }
    }
}

/// Run the tool suite for a profile, bounded to [`TOOL_CONCURRENCY`] slots.
///
/// Every spawned tool yields exactly one result; results come back sorted
/// by tool name. A heartbeat line lists still-running tools every
/// [`HEARTBEAT_INTERVAL`] so long runs are visibly alive.
pub async fn run_suite(repo: &Path, kind: SuiteKind, phpstan_level: u8) -> AnalysisSuite {
    let tools = suite_adapters(repo, kind, phpstan_level);
    let total = tools.len();
    if total == 0 {
        return AnalysisSuite::default();
    }

    let labels: Vec<&'static str> = tools.iter().map(|t| t.label()).collect();
    let pending: Arc<Mutex<HashSet<&'static str>>> =
        Arc::new(Mutex::new(labels.iter().copied().collect()));
    let completed = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let heartbeat = {
        let pending = Arc::clone(&pending);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(HEARTBEAT_INTERVAL);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                let waiting: Vec<&str> = {
                    let set = pending.lock().unwrap();
                    let mut names: Vec<&str> = set.iter().copied().collect();
                    names.sort_unstable();
                    names
                };
                if !waiting.is_empty() {
                    eprintln!(
                        "  ... {}s elapsed, waiting on: {}",
                        start.elapsed().as_secs(),
                        waiting.join(", ")
                    );
                }
            }
        })
    };

    let semaphore = Arc::new(Semaphore::new(TOOL_CONCURRENCY));
    let mut join_set = JoinSet::new();
    for tool in tools {
        let sem = Arc::clone(&semaphore);
        let pending = Arc::clone(&pending);
        let completed = Arc::clone(&completed);
        let repo: PathBuf = repo.to_path_buf();
        join_set.spawn(async move {
            let _permit = sem.acquire().await.expect("semaphore closed");
            let label = tool.label();
            let tool_start = Instant::now();
            let result = tool.run(&repo).await;

            let secs = tool_start.elapsed().as_secs_f64();
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            pending.lock().unwrap().remove(label);
            let status = if result.success && result.findings_count > 0 {
                format!("! {} findings", result.findings_count).yellow().to_string()
            } else if result.success {
                "✓ clean".green().to_string()
            } else {
                format!("— skipped: {}", result.error).dimmed().to_string()
            };
            eprintln!("  [{done}/{total}] {label}: {status} ({secs:.1}s)");
            result
        });
    }

    let mut results = Vec::with_capacity(total);
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(result) => results.push(result),
            Err(e) => {
                eprintln!("Warning: analyzer task panicked: {e}");
                results.push(AnalyzerResult::skipped("(unknown)", format!("panic: {e}")));
            }
        }
    }
    heartbeat.abort();

    results.sort_by(|a, b| a.tool.cmp(&b.tool));
    AnalysisSuite { results }
}
