//! App-wide constants.
//!
//! Centralises size budgets, filenames, and environment variable names so
//! a policy change only requires touching this file.

use std::time::Duration;

/// Display name of the tool (lowercase).
pub const APP_NAME: &str = "critique";

/// Project configuration filename, looked up in the scan directory or its parent.
pub const CONFIG_FILENAME: &str = "critique.json";

/// Files larger than this (bytes) are skipped — usually minified or generated.
pub const MAX_FILE_SIZE: u64 = 50_000;

/// Character budget per review batch (~3K tokens).
pub const MAX_CHARS_PER_BATCH: usize = 12_000;

/// Hard cap on files reviewed in one run.
pub const MAX_TOTAL_FILES: usize = 300;

/// Character budget for prior-report context in follow-up mode.
pub const PRIOR_REPORT_MAX_CHARS: usize = 15_000;

/// Character cap on the diff context injected into the first batch.
pub const MAX_DIFF_CONTEXT_CHARS: usize = 6_000;

/// Character cap per tool's output inside the prompt context.
pub const MAX_TOOL_OUTPUT_CHARS: usize = 8_000;

/// Messages repeated more than this many times get collapsed.
pub const DEDUP_THRESHOLD: usize = 10;

/// Example locations kept for a collapsed message.
pub const DEDUP_EXAMPLE_LOCATIONS: usize = 3;

/// Concurrent analyzer-tool slots.
pub const TOOL_CONCURRENCY: usize = 6;

/// Interval between heartbeat lines while tools are running.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Default OpenAI-compatible completion-engine endpoint (local vLLM).
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/v1";

/// Sampling temperature for review requests.
pub const REVIEW_TEMPERATURE: f64 = 0.1;

/// Output-length cap for review requests.
pub const REVIEW_MAX_TOKENS: u32 = 4096;

/// Default directory for generated reports, relative to the working directory.
pub const REPORTS_DIR: &str = "reports";

// ── Environment variable names ──────────────────────────────────────

pub const ENV_BASE_URL: &str = "CRITIQUE_BASE_URL";
pub const ENV_API_KEY: &str = "CRITIQUE_API_KEY";
