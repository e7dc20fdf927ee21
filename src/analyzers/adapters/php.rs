//! PHP toolchain adapters: syntax, types, taint, style, complexity,
//! duplication, deprecation, and dependency audit.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

use crate::analyzers::compress::compress_findings;
use crate::analyzers::process::{self, find_bin, find_config, php_dirs, which};
use crate::analyzers::AnalyzerResult;

use super::{rel, ToolAdapter};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);
const LINT_TIMEOUT: Duration = Duration::from_secs(60);
const SLOW_TIMEOUT: Duration = Duration::from_secs(300);
const AUDIT_TIMEOUT: Duration = Duration::from_secs(60);

fn truncate_chars(s: &mut String, max: usize) {
    if s.chars().count() > max {
        *s = s.chars().take(max).collect();
    }
}

fn capture_count(pattern: &str, text: &str) -> usize {
    Regex::new(pattern)
        .ok()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Fast whole-tree PHP syntax check.
pub struct ParallelLint;

#[async_trait]
impl ToolAdapter for ParallelLint {
    fn label(&self) -> &'static str {
        "Parallel Lint"
    }

    async fn run(&self, repo: &Path) -> AnalyzerResult {
        let name = "PHP Parallel Lint";
        if !which("parallel-lint") {
            return AnalyzerResult::skipped(
                name,
                "Not installed (composer global require php-parallel-lint/php-parallel-lint)",
            );
        }
        let dirs = php_dirs(repo);
        let mut argv = vec![
            "parallel-lint",
            "--no-progress",
            "--json",
            "--exclude",
            "vendor",
            "--exclude",
            "node_modules",
        ];
        argv.extend(dirs.iter().map(String::as_str));
        let out = process::run(&argv, repo, LINT_TIMEOUT).await;

        match serde_json::from_str::<Value>(&out.stdout) {
            Ok(data) => {
                let empty = Vec::new();
                let errors = data["results"]["errors"].as_array().unwrap_or(&empty);
                let lines: Vec<String> = errors
                    .iter()
                    .map(|e| {
                        format!(
                            "  {}:{} — {}",
                            rel(repo, e["file"].as_str().unwrap_or("?")),
                            e["line"].as_u64().map_or("?".to_string(), |l| l.to_string()),
                            e["message"].as_str().unwrap_or("Syntax error"),
                        )
                    })
                    .collect();
                let n = errors.len();
                AnalyzerResult {
                    tool: name.to_string(),
                    success: true,
                    findings_count: n,
                    output: non_empty(lines.join("\n"), "No syntax errors."),
                    summary: format!("{n} PHP syntax error(s)."),
                    ..Default::default()
                }
            }
            Err(_) => {
                let n = out.stderr.matches("Parse error").count()
                    + out.stderr.matches("syntax error").count();
                AnalyzerResult {
                    tool: name.to_string(),
                    success: true,
                    findings_count: n,
                    output: first_non_empty(&[&out.stderr, &out.stdout], "No syntax errors."),
                    ..Default::default()
                }
            }
        }
    }
}

/// Static type analysis at a configurable strictness level.
///
/// Exits non-zero when it has findings — only the absence of JSON output
/// means the tool itself errored.
pub struct Phpstan {
    pub level: u8,
}

#[async_trait]
impl ToolAdapter for Phpstan {
    fn label(&self) -> &'static str {
        "PHPStan"
    }

    async fn run(&self, repo: &Path) -> AnalyzerResult {
        let name = format!("PHPStan (Level {})", self.level);
        let Some(bin) = find_bin("phpstan", repo) else {
            return AnalyzerResult::skipped(name, "Not installed");
        };
        let bin = bin.to_string_lossy().into_owned();
        let level_arg = format!("--level={}", self.level);
        let mut argv = vec![
            bin.as_str(),
            "analyse",
            "--no-progress",
            "--error-format=json",
            level_arg.as_str(),
        ];
        let config = find_config(
            repo,
            &["phpstan.neon", "phpstan.neon.dist", "phpstan.dist.neon"],
        );
        let config_arg = config.map(|c| format!("--configuration={c}"));
        let dirs = php_dirs(repo);
        match &config_arg {
            Some(arg) => argv.push(arg.as_str()),
            None => argv.extend(dirs.iter().map(String::as_str)),
        }
        let out = process::run(&argv, repo, DEFAULT_TIMEOUT).await;

        if !out.stdout.trim_start().starts_with('{') {
            let mut error_msg = first_non_empty(&[&out.stderr, &out.stdout], "Unknown error");
            error_msg = error_msg.trim().to_string();
            truncate_chars(&mut error_msg, 500);
            let short: String = error_msg.chars().take(100).collect();
            return AnalyzerResult {
                tool: name,
                output: error_msg,
                error: format!("PHPStan error (check config): {short}"),
                ..Default::default()
            };
        }

        match serde_json::from_str::<Value>(&out.stdout) {
            Ok(data) => {
                let n = (data["totals"]["file_errors"].as_u64().unwrap_or(0)
                    + data["totals"]["errors"].as_u64().unwrap_or(0)) as usize;

                let mut all_lines = Vec::new();
                if let Some(files) = data["files"].as_object() {
                    for (file, per_file) in files {
                        let rp = rel(repo, file);
                        for m in per_file["messages"].as_array().into_iter().flatten() {
                            all_lines.push(format!(
                                "  {rp}:{} — {}",
                                m["line"].as_u64().map_or("?".to_string(), |l| l.to_string()),
                                m["message"].as_str().unwrap_or(""),
                            ));
                        }
                    }
                }
                for e in data["errors"].as_array().into_iter().flatten() {
                    all_lines.push(format!("  [General] {}", e.as_str().unwrap_or("?")));
                }

                let unique: HashSet<&str> = all_lines
                    .iter()
                    .map(|l| l.split_once(" — ").map_or(l.as_str(), |(_, msg)| msg))
                    .collect();
                let compact = compress_findings(&all_lines);

                AnalyzerResult {
                    tool: name,
                    success: true,
                    findings_count: n,
                    output: non_empty(compact.join("\n"), "No issues found."),
                    summary: format!(
                        "{n} issue(s) at level {}/9 ({} unique error types).",
                        self.level,
                        unique.len()
                    ),
                    ..Default::default()
                }
            }
            Err(_) => AnalyzerResult {
                tool: name,
                output: first_non_empty(&[&out.stdout, &out.stderr], ""),
                error: "PHPStan returned invalid JSON".to_string(),
                ..Default::default()
            },
        }
    }
}

/// Taint-aware static analysis: traces user input to dangerous sinks.
pub struct Psalm;

#[async_trait]
impl ToolAdapter for Psalm {
    fn label(&self) -> &'static str {
        "Psalm"
    }

    async fn run(&self, repo: &Path) -> AnalyzerResult {
        let name = "Psalm (Taint Analysis)";
        let Some(bin) = find_bin("psalm", repo) else {
            return AnalyzerResult::skipped(name, "Not installed");
        };
        let bin = bin.to_string_lossy().into_owned();
        if find_config(repo, &["psalm.xml", "psalm.xml.dist"]).is_none() {
            process::run(
                &[bin.as_str(), "--init", ".", "3"],
                repo,
                Duration::from_secs(30),
            )
            .await;
        }

        let mut out = process::run(
            &[
                bin.as_str(),
                "--output-format=json",
                "--no-progress",
                "--taint-analysis",
            ],
            repo,
            SLOW_TIMEOUT,
        )
        .await;
        // Older Psalm builds reject --taint-analysis; fall back to a plain run.
        if out.code != 0 && out.stderr.to_lowercase().contains("taint") {
            out = process::run(
                &[bin.as_str(), "--output-format=json", "--no-progress"],
                repo,
                SLOW_TIMEOUT,
            )
            .await;
        }

        match serde_json::from_str::<Value>(&out.stdout) {
            Ok(Value::Array(items)) => {
                let lines: Vec<String> = items
                    .iter()
                    .map(|item| {
                        format!(
                            "  [{}] {}:{} — {}",
                            item["severity"].as_str().unwrap_or("error").to_uppercase(),
                            item["file_path"].as_str().unwrap_or("?"),
                            item["line_from"]
                                .as_u64()
                                .map_or("?".to_string(), |l| l.to_string()),
                            item["message"].as_str().unwrap_or(""),
                        )
                    })
                    .collect();
                let n = items.len();
                AnalyzerResult {
                    tool: name.to_string(),
                    success: true,
                    findings_count: n,
                    output: non_empty(lines.join("\n"), "No issues found."),
                    summary: format!("{n} issue(s) including taint/security analysis."),
                    ..Default::default()
                }
            }
            _ => AnalyzerResult {
                tool: name.to_string(),
                success: true,
                output: first_non_empty(&[&out.stdout, &out.stderr], ""),
                error: "Parse error".to_string(),
                ..Default::default()
            },
        }
    }
}

/// Coding-standard enforcement (WordPress or PSR-12).
pub struct Phpcs {
    pub standard: &'static str,
}

#[async_trait]
impl ToolAdapter for Phpcs {
    fn label(&self) -> &'static str {
        "PHPCS"
    }

    async fn run(&self, repo: &Path) -> AnalyzerResult {
        let name = format!("PHPCS ({})", self.standard);
        let Some(bin) = find_bin("phpcs", repo) else {
            return AnalyzerResult::skipped(name, "Not installed");
        };
        let bin = bin.to_string_lossy().into_owned();
        let config = find_config(
            repo,
            &[".phpcs.xml", ".phpcs.xml.dist", "phpcs.xml", "phpcs.xml.dist"],
        );
        let standard_arg = match &config {
            Some(c) => format!("--standard={c}"),
            None => format!("--standard={}", self.standard),
        };
        let mut argv = vec![bin.as_str(), "--report=json", "-q", standard_arg.as_str()];
        let dirs = php_dirs(repo);
        if config.is_none() {
            argv.extend(dirs.iter().map(String::as_str));
        }
        argv.extend([
            "--extensions=php",
            "--ignore=vendor/*,node_modules/*,*.min.js,*.min.css",
        ]);
        let out = process::run(&argv, repo, DEFAULT_TIMEOUT).await;

        match serde_json::from_str::<Value>(&out.stdout) {
            Ok(data) => {
                let errs = data["totals"]["errors"].as_u64().unwrap_or(0) as usize;
                let warns = data["totals"]["warnings"].as_u64().unwrap_or(0) as usize;
                let mut lines = Vec::new();
                if let Some(files) = data["files"].as_object() {
                    for (file, per_file) in files {
                        let rp = rel(repo, file);
                        for m in per_file["messages"].as_array().into_iter().flatten() {
                            let level = if m["type"].as_str() == Some("ERROR") {
                                "ERROR"
                            } else {
                                "WARN"
                            };
                            lines.push(format!(
                                "  [{level}] {rp}:{} — {}",
                                m["line"].as_u64().map_or("?".to_string(), |l| l.to_string()),
                                m["message"].as_str().unwrap_or(""),
                            ));
                            if let Some(source) = m["source"].as_str().filter(|s| !s.is_empty()) {
                                lines.push(format!("          Rule: {source}"));
                            }
                        }
                    }
                }
                AnalyzerResult {
                    tool: name,
                    success: true,
                    findings_count: errs + warns,
                    output: non_empty(lines.join("\n"), "No issues found."),
                    summary: format!("{errs} error(s), {warns} warning(s)."),
                    ..Default::default()
                }
            }
            Err(_) => AnalyzerResult {
                tool: name,
                success: true,
                output: first_non_empty(&[&out.stdout, &out.stderr], ""),
                error: "Parse error".to_string(),
                ..Default::default()
            },
        }
    }
}

/// Complexity, design, naming, and unused-code detection.
pub struct Phpmd;

#[async_trait]
impl ToolAdapter for Phpmd {
    fn label(&self) -> &'static str {
        "PHPMD"
    }

    async fn run(&self, repo: &Path) -> AnalyzerResult {
        let name = "PHPMD (Mess Detector)";
        if !which("phpmd") {
            return AnalyzerResult::skipped(name, "Not installed");
        }
        let dirs = php_dirs(repo).join(",");
        let out = process::run(
            &[
                "phpmd",
                dirs.as_str(),
                "json",
                "cleancode,codesize,controversial,design,naming,unusedcode",
                "--exclude",
                "vendor,node_modules",
            ],
            repo,
            DEFAULT_TIMEOUT,
        )
        .await;

        match serde_json::from_str::<Value>(&out.stdout) {
            Ok(data) => {
                let empty = Vec::new();
                let files = data["files"].as_array().unwrap_or(&empty);
                let mut lines = Vec::new();
                let mut n = 0;
                for file_entry in files {
                    let rp = rel(repo, file_entry["file"].as_str().unwrap_or("?"));
                    for v in file_entry["violations"].as_array().into_iter().flatten() {
                        n += 1;
                        let priority = v["priority"].as_u64().unwrap_or(3);
                        let level = if priority <= 2 {
                            "HIGH"
                        } else if priority == 3 {
                            "MED"
                        } else {
                            "LOW"
                        };
                        lines.push(format!(
                            "  [{level}] {rp}:{} — [{}] {}",
                            v["beginLine"]
                                .as_u64()
                                .map_or("?".to_string(), |l| l.to_string()),
                            v["rule"].as_str().unwrap_or("?"),
                            v["description"].as_str().unwrap_or("").trim(),
                        ));
                    }
                }
                AnalyzerResult {
                    tool: name.to_string(),
                    success: true,
                    findings_count: n,
                    output: non_empty(lines.join("\n"), "No issues found."),
                    summary: format!("{n} complexity/design/naming issue(s)."),
                    ..Default::default()
                }
            }
            Err(_) => AnalyzerResult {
                tool: name.to_string(),
                success: true,
                output: first_non_empty(&[&out.stdout, &out.stderr], ""),
                error: "Parse error".to_string(),
                ..Default::default()
            },
        }
    }
}

/// Copy/paste detection.
pub struct Phpcpd;

#[async_trait]
impl ToolAdapter for Phpcpd {
    fn label(&self) -> &'static str {
        "PHPCPD"
    }

    async fn run(&self, repo: &Path) -> AnalyzerResult {
        let name = "PHPCPD (Copy/Paste Detector)";
        if !which("phpcpd") {
            return AnalyzerResult::skipped(name, "Not installed");
        }
        let dirs = php_dirs(repo);
        let mut argv = vec![
            "phpcpd",
            "--min-lines=5",
            "--min-tokens=70",
            "--exclude=vendor",
            "--exclude=node_modules",
        ];
        argv.extend(dirs.iter().map(String::as_str));
        let out = process::run(&argv, repo, DEFAULT_TIMEOUT).await;

        let output = format!("{}\n{}", out.stdout, out.stderr).trim().to_string();
        let n = capture_count(r"Found (\d+) clones", &output);
        AnalyzerResult {
            tool: name.to_string(),
            success: true,
            findings_count: n,
            output: non_empty(output, "No duplicated code found."),
            summary: format!("{n} duplicated code block(s)."),
            ..Default::default()
        }
    }
}

/// Deprecation check: a dry run that reports what it would rewrite.
pub struct Rector;

#[async_trait]
impl ToolAdapter for Rector {
    fn label(&self) -> &'static str {
        "Rector"
    }

    async fn run(&self, repo: &Path) -> AnalyzerResult {
        let name = "Rector (Deprecation Check)";
        let Some(bin) = find_bin("rector", repo) else {
            return AnalyzerResult::skipped(name, "Not installed");
        };
        let bin = bin.to_string_lossy().into_owned();
        let has_config = find_config(repo, &["rector.php", "rector.php.dist"]).is_some();
        let mut argv = vec![bin.as_str(), "process", "--dry-run", "--no-progress-bar"];
        if !has_config {
            argv.push("--no-diffs");
        }
        let out = process::run(&argv, repo, SLOW_TIMEOUT).await;

        let output = first_non_empty(&[&out.stdout, &out.stderr], "");
        let n = capture_count(r"(\d+) file", &output);
        let mut shown = output;
        truncate_chars(&mut shown, crate::constants::MAX_TOOL_OUTPUT_CHARS);
        AnalyzerResult {
            tool: name.to_string(),
            success: true,
            findings_count: n,
            output: non_empty(shown, "No deprecated patterns."),
            summary: format!("{n} file(s) with deprecated/improvable patterns."),
            ..Default::default()
        }
    }
}

/// Known-CVE check for Composer dependencies.
pub struct ComposerAudit;

#[async_trait]
impl ToolAdapter for ComposerAudit {
    fn label(&self) -> &'static str {
        "Composer Audit"
    }

    async fn run(&self, repo: &Path) -> AnalyzerResult {
        let name = "Composer Security Audit";
        if !repo.join("composer.lock").exists() {
            return AnalyzerResult::skipped(name, "No composer.lock");
        }
        if !which("composer") {
            return AnalyzerResult::skipped(name, "composer not found");
        }
        let out = process::run(
            &["composer", "audit", "--format=json", "--no-interaction"],
            repo,
            AUDIT_TIMEOUT,
        )
        .await;

        match serde_json::from_str::<Value>(&out.stdout) {
            Ok(data) => {
                let mut lines = Vec::new();
                let mut n = 0;
                if let Some(advisories) = data["advisories"].as_object() {
                    for (package, vulns) in advisories {
                        for v in vulns.as_array().into_iter().flatten() {
                            n += 1;
                            lines.push(format!(
                                "  [{}] {package}: {} (CVE: {})",
                                v["severity"].as_str().unwrap_or("unknown").to_uppercase(),
                                v["title"].as_str().unwrap_or("?"),
                                v["cve"].as_str().unwrap_or("N/A"),
                            ));
                        }
                    }
                }
                AnalyzerResult {
                    tool: name.to_string(),
                    success: true,
                    findings_count: n,
                    output: non_empty(lines.join("\n"), "No known vulnerabilities."),
                    summary: format!("{n} known vulnerability/ies."),
                    ..Default::default()
                }
            }
            Err(_) => AnalyzerResult {
                tool: name.to_string(),
                success: true,
                output: first_non_empty(&[&out.stdout, &out.stderr], ""),
                ..Default::default()
            },
        }
    }
}

fn non_empty(s: String, fallback: &str) -> String {
    if s.is_empty() {
        fallback.to_string()
    } else {
        s
    }
}

fn first_non_empty(candidates: &[&str], fallback: &str) -> String {
    candidates
        .iter()
        .find(|c| !c.is_empty())
        .map_or_else(|| fallback.to_string(), |c| c.to_string())
}
