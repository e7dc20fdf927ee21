//! JavaScript and CSS toolchain adapters.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::analyzers::process::{self, find_config, which};
use crate::analyzers::AnalyzerResult;

use super::{rel, ToolAdapter};

const LINT_TIMEOUT: Duration = Duration::from_secs(120);
const AUDIT_TIMEOUT: Duration = Duration::from_secs(60);

/// JavaScript/TypeScript linting via the repo's own ESLint setup.
pub struct Eslint;

#[async_trait]
impl ToolAdapter for Eslint {
    fn label(&self) -> &'static str {
        "ESLint"
    }

    async fn run(&self, repo: &Path) -> AnalyzerResult {
        let name = "ESLint";
        if !which("npx") {
            return AnalyzerResult::skipped(name, "npx not found");
        }
        if find_config(
            repo,
            &[
                ".eslintrc",
                ".eslintrc.js",
                ".eslintrc.json",
                ".eslintrc.yml",
                "eslint.config.js",
                "eslint.config.mjs",
                "eslint.config.cjs",
            ],
        )
        .is_none()
        {
            return AnalyzerResult::skipped(name, "No ESLint config in repo");
        }
        let out = process::run(
            &[
                "npx",
                "eslint",
                ".",
                "--format=json",
                "--ignore-pattern=node_modules",
                "--ignore-pattern=vendor",
                "--ignore-pattern=build",
                "--ignore-pattern=dist",
                "--ignore-pattern=*.min.js",
            ],
            repo,
            LINT_TIMEOUT,
        )
        .await;

        match serde_json::from_str::<Value>(&out.stdout) {
            Ok(Value::Array(files)) => {
                let errors: u64 = files
                    .iter()
                    .map(|f| f["errorCount"].as_u64().unwrap_or(0))
                    .sum();
                let warnings: u64 = files
                    .iter()
                    .map(|f| f["warningCount"].as_u64().unwrap_or(0))
                    .sum();
                let mut lines = Vec::new();
                for file in &files {
                    let rp = rel(repo, file["filePath"].as_str().unwrap_or(""));
                    for m in file["messages"].as_array().into_iter().flatten() {
                        let level = if m["severity"].as_u64() == Some(2) {
                            "ERROR"
                        } else {
                            "WARN"
                        };
                        lines.push(format!(
                            "  [{level}] {rp}:{} — {} ({})",
                            m["line"].as_u64().map_or("?".to_string(), |l| l.to_string()),
                            m["message"].as_str().unwrap_or(""),
                            m["ruleId"].as_str().unwrap_or(""),
                        ));
                    }
                }
                AnalyzerResult {
                    tool: name.to_string(),
                    success: true,
                    findings_count: (errors + warnings) as usize,
                    output: or_fallback(lines.join("\n"), "No issues found."),
                    summary: format!("{errors} error(s), {warnings} warning(s)."),
                    ..Default::default()
                }
            }
            _ => AnalyzerResult {
                tool: name.to_string(),
                success: true,
                output: pick(&[&out.stderr, &out.stdout], "Parse error"),
                ..Default::default()
            },
        }
    }
}

/// CSS/SCSS linting via the repo's own Stylelint setup.
pub struct Stylelint;

#[async_trait]
impl ToolAdapter for Stylelint {
    fn label(&self) -> &'static str {
        "Stylelint"
    }

    async fn run(&self, repo: &Path) -> AnalyzerResult {
        let name = "Stylelint";
        if !which("npx") {
            return AnalyzerResult::skipped(name, "npx not found");
        }
        if find_config(
            repo,
            &[
                ".stylelintrc",
                ".stylelintrc.json",
                ".stylelintrc.js",
                ".stylelintrc.yml",
                "stylelint.config.js",
                "stylelint.config.mjs",
            ],
        )
        .is_none()
        {
            return AnalyzerResult::skipped(name, "No Stylelint config in repo");
        }
        let out = process::run(
            &[
                "npx",
                "stylelint",
                "**/*.{css,scss}",
                "--formatter=json",
                "--ignore-pattern=node_modules",
                "--ignore-pattern=vendor",
                "--ignore-pattern=*.min.css",
            ],
            repo,
            LINT_TIMEOUT,
        )
        .await;

        match serde_json::from_str::<Value>(&out.stdout) {
            Ok(Value::Array(files)) => {
                let mut lines = Vec::new();
                let mut n = 0;
                for file in &files {
                    let rp = file["source"]
                        .as_str()
                        .map_or("?".to_string(), |s| rel(repo, s));
                    for w in file["warnings"].as_array().into_iter().flatten() {
                        n += 1;
                        lines.push(format!(
                            "  [{}] {rp}:{} — {} ({})",
                            w["severity"].as_str().unwrap_or("warning").to_uppercase(),
                            w["line"].as_u64().map_or("?".to_string(), |l| l.to_string()),
                            w["text"].as_str().unwrap_or(""),
                            w["rule"].as_str().unwrap_or(""),
                        ));
                    }
                }
                AnalyzerResult {
                    tool: name.to_string(),
                    success: true,
                    findings_count: n,
                    output: or_fallback(lines.join("\n"), "No issues found."),
                    summary: format!("{n} CSS issue(s)."),
                    ..Default::default()
                }
            }
            _ => AnalyzerResult {
                tool: name.to_string(),
                success: true,
                output: pick(&[&out.stderr, &out.stdout], "Parse error"),
                ..Default::default()
            },
        }
    }
}

/// Known-vulnerability check for npm dependencies.
pub struct NpmAudit;

#[async_trait]
impl ToolAdapter for NpmAudit {
    fn label(&self) -> &'static str {
        "npm Audit"
    }

    async fn run(&self, repo: &Path) -> AnalyzerResult {
        let name = "npm Security Audit";
        if !repo.join("package-lock.json").exists() {
            return AnalyzerResult::skipped(name, "No package-lock.json");
        }
        let out = process::run(&["npm", "audit", "--json"], repo, AUDIT_TIMEOUT).await;

        match serde_json::from_str::<Value>(&out.stdout) {
            Ok(data) => {
                let mut lines = Vec::new();
                let mut n = 0;
                if let Some(vulns) = data["vulnerabilities"].as_object() {
                    for (package, info) in vulns {
                        n += 1;
                        let severity =
                            info["severity"].as_str().unwrap_or("unknown").to_uppercase();
                        let title = match info["via"].as_array().and_then(|v| v.first()) {
                            Some(Value::Object(first)) => first
                                .get("title")
                                .and_then(Value::as_str)
                                .unwrap_or("?")
                                .to_string(),
                            Some(other) => other.to_string(),
                            None => "?".to_string(),
                        };
                        lines.push(format!("  [{severity}] {package}: {title}"));
                    }
                }
                AnalyzerResult {
                    tool: name.to_string(),
                    success: true,
                    findings_count: n,
                    output: or_fallback(lines.join("\n"), "No known vulnerabilities."),
                    summary: format!("{n} vulnerable package(s)."),
                    ..Default::default()
                }
            }
            Err(_) => AnalyzerResult {
                tool: name.to_string(),
                success: true,
                output: pick(&[&out.stdout, &out.stderr], ""),
                ..Default::default()
            },
        }
    }
}

fn or_fallback(s: String, fallback: &str) -> String {
    if s.is_empty() {
        fallback.to_string()
    } else {
        s
    }
}

fn pick(candidates: &[&str], fallback: &str) -> String {
    candidates
        .iter()
        .find(|c| !c.is_empty())
        .map_or_else(|| fallback.to_string(), |c| c.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn eslint_without_config_is_skipped() {
        // Holds whether or not npx is installed; the error differs but the
        // adapter never reports success on an unconfigured repo.
        let dir = tempfile::tempdir().unwrap();
        let result = Eslint.run(dir.path()).await;
        assert!(!result.success);
        assert!(result.output.is_empty());
    }

    #[tokio::test]
    async fn npm_audit_requires_lockfile() {
        let dir = tempfile::tempdir().unwrap();
        let result = NpmAudit.run(dir.path()).await;
        assert!(!result.success);
        assert_eq!(result.error, "No package-lock.json");
    }
}
