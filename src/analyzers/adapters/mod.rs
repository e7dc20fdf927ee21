//! One adapter per external analysis tool.
//!
//! Adapters never fail the run: a missing binary or config becomes a
//! skipped result, a tool that ran but produced unparseable output keeps
//! the raw text so the report still shows what happened. Non-zero exit
//! codes are normal for linters with findings and are not treated as
//! errors on their own.

mod js;
mod php;

use std::path::Path;

use async_trait::async_trait;

use super::AnalyzerResult;

pub use js::{Eslint, NpmAudit, Stylelint};
pub use php::{ComposerAudit, ParallelLint, Phpcpd, Phpcs, Phpmd, Phpstan, Psalm, Rector};

/// A runnable external analysis tool.
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    /// Short name used in progress and heartbeat lines.
    fn label(&self) -> &'static str;

    /// Run the tool against `repo` and interpret its output.
    async fn run(&self, repo: &Path) -> AnalyzerResult;
}

/// Repo-relative rendering of a path a tool reported, best effort.
pub(crate) fn rel(repo: &Path, path: &str) -> String {
    Path::new(path)
        .strip_prefix(repo)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| path.to_string())
}
