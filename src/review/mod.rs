//! Sequential batch review against the completion engine.
//!
//! Batches are reviewed strictly in order on a single engine slot; local
//! engines serve one request well and context order stays predictable.
//! Run-wide context (tool results, diff, prior report) is injected into
//! the first batch only, so later batches spend their token budget on
//! code. A failed engine call is recorded inline in that batch's review
//! text and the run continues.

use std::sync::Arc;

use crate::batch::Batch;
use crate::constants::{MAX_DIFF_CONTEXT_CHARS, REVIEW_MAX_TOKENS, REVIEW_TEMPERATURE};
use crate::progress::{BatchState, ProgressTracker};
use crate::provider::CompletionProvider;

/// Run-wide context injected into the first batch prompt.
#[derive(Debug, Clone, Default)]
pub struct ReviewContext {
    /// Static analysis results formatted for the prompt.
    pub analysis: String,
    /// Unified diff of the changes under review (PR mode).
    pub diff: String,
    /// A prior report, when this is a follow-up review.
    pub prior_report: String,
}

impl ReviewContext {
    pub fn is_followup(&self) -> bool {
        !self.prior_report.is_empty()
    }
}

/// The reviewed outcome of one batch.
#[derive(Debug, Clone)]
pub struct BatchReviewResult {
    pub files: Vec<String>,
    pub file_count: usize,
    pub review: String,
}

/// Drives batches through the completion engine one at a time.
pub struct ReviewDriver {
    provider: Arc<dyn CompletionProvider>,
    model: String,
    system_prompt: String,
}

impl ReviewDriver {
    pub fn new(provider: Arc<dyn CompletionProvider>, model: String, system_prompt: String) -> Self {
        Self {
            provider,
            model,
            system_prompt,
        }
    }

    /// Review every batch in order, updating `progress` as each one moves.
    ///
    /// Always returns one result per batch; engine failures become an
    /// inline `**Error reviewing batch:**` entry rather than aborting.
    pub async fn review_batches(
        &self,
        batches: &[Batch],
        context: &ReviewContext,
        progress: &ProgressTracker,
    ) -> Vec<BatchReviewResult> {
        let mut results = Vec::with_capacity(batches.len());

        for (index, batch) in batches.iter().enumerate() {
            progress.update(index, BatchState::Submitted);

            let first_batch = index == 0;
            let user_prompt = build_user_prompt(batch, context, first_batch);

            let review = match self
                .provider
                .complete(
                    &self.model,
                    &self.system_prompt,
                    &user_prompt,
                    REVIEW_TEMPERATURE,
                    REVIEW_MAX_TOKENS,
                )
                .await
            {
                Ok(text) => {
                    progress.update(index, BatchState::Complete);
                    text
                }
                Err(e) => {
                    progress.update(index, BatchState::Errored(e.to_string()));
                    format!("**Error reviewing batch:** {e}")
                }
            };

            results.push(BatchReviewResult {
                files: batch.iter().map(|f| f.path.clone()).collect(),
                file_count: batch.len(),
                review,
            });
        }

        results
    }
}

/// Assemble the user prompt for one batch.
///
/// Context sections appear ahead of the task framing, the framing ahead
/// of the code. The follow-up framing travels with the prior report, so
/// both appear on the first batch only.
fn build_user_prompt(batch: &Batch, context: &ReviewContext, include_context: bool) -> String {
    let mut parts = Vec::new();

    if include_context {
        if context.is_followup() {
            parts.push(format!(
                "PRIOR QA REPORT (your previous findings for this codebase):\n\n\
                 The code changes you are reviewing were made IN RESPONSE to this report.\n\
                 For each of your prior findings, determine whether the changes address it.\n\
                 Flag any prior findings that were NOT addressed.\n\
                 Also flag any NEW issues introduced by the changes.\n\n\
                 {}\n\n---\n",
                context.prior_report
            ));
        }
        if !context.analysis.is_empty() {
            parts.push(format!(
                "STATIC ANALYSIS RESULTS:\n\n{}\n\n---\n",
                context.analysis
            ));
        }
        if !context.diff.is_empty() {
            parts.push(format!(
                "GIT DIFF (the changes under review):\n\n```diff\n{}\n```\n\n---\n",
                truncate(&context.diff, MAX_DIFF_CONTEXT_CHARS)
            ));
        }
    }

    if include_context && context.is_followup() {
        parts.push(
            "Review the code below. This is a FOLLOW-UP review. The developer was given \
             your prior report and filed a PR to address your findings. Your job:\n\
             1. For each prior CRITICAL/WARNING finding: was it fixed? Partially fixed? Ignored?\n\
             2. Are there any NEW issues introduced by these changes?\n\
             3. Is the fix correct, or did it introduce a different problem?\n\
             4. Any prior findings that are no longer relevant (code was removed, etc.)?\n\n"
                .to_string(),
        );
    } else {
        parts.push(
            "Review the code below. Reference tool findings where relevant. \
             Confirm real issues, dismiss false positives, find issues tools missed.\n\n"
                .to_string(),
        );
    }

    for file in batch {
        parts.push(format!("--- FILE: {} ---", file.path));
        parts.push(file.content.clone());
        parts.push(String::new());
    }

    parts.join("\n")
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::ReviewableFile;
    use crate::provider::ProviderError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingProvider {
        prompts: Mutex<Vec<String>>,
        fail_on: Option<usize>,
    }

    impl RecordingProvider {
        fn new(fail_on: Option<usize>) -> Arc<Self> {
            Arc::new(Self {
                prompts: Mutex::new(Vec::new()),
                fail_on,
            })
        }
    }

    #[async_trait]
    impl CompletionProvider for RecordingProvider {
        async fn detect_model(&self) -> Result<String, ProviderError> {
            Ok("test-model".to_string())
        }

        async fn complete(
            &self,
            _model: &str,
            _system: &str,
            user: &str,
            _temperature: f64,
            _max_tokens: u32,
        ) -> Result<String, ProviderError> {
            let mut prompts = self.prompts.lock().unwrap();
            let index = prompts.len();
            prompts.push(user.to_string());
            if self.fail_on == Some(index) {
                return Err(ProviderError::EmptyCompletion);
            }
            Ok(format!("Review of batch {index}"))
        }
    }

    fn file(path: &str) -> ReviewableFile {
        ReviewableFile {
            path: path.to_string(),
            content: format!("<?php // {path}\n"),
            size: 10,
        }
    }

    fn batches() -> Vec<Batch> {
        vec![vec![file("a.php"), file("b.php")], vec![file("c.php")]]
    }

    #[tokio::test]
    async fn context_goes_to_first_batch_only() {
        let provider = RecordingProvider::new(None);
        let driver = ReviewDriver::new(
            provider.clone(),
            "test-model".to_string(),
            "sys".to_string(),
        );
        let context = ReviewContext {
            analysis: "# Static Analysis Results\ntool output".to_string(),
            diff: "diff --git a b".to_string(),
            prior_report: String::new(),
        };
        let progress = ProgressTracker::new(&["a.php".to_string(), "c.php".to_string()], false);

        driver
            .review_batches(&batches(), &context, &progress)
            .await;

        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[0].contains("STATIC ANALYSIS RESULTS"));
        assert!(prompts[0].contains("GIT DIFF"));
        assert!(!prompts[1].contains("STATIC ANALYSIS RESULTS"));
        assert!(!prompts[1].contains("GIT DIFF"));
    }

    #[tokio::test]
    async fn file_markers_wrap_each_file() {
        let provider = RecordingProvider::new(None);
        let driver = ReviewDriver::new(
            provider.clone(),
            "test-model".to_string(),
            "sys".to_string(),
        );
        let progress = ProgressTracker::new(&["a.php".to_string(), "c.php".to_string()], false);

        driver
            .review_batches(&batches(), &ReviewContext::default(), &progress)
            .await;

        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[0].contains("--- FILE: a.php ---"));
        assert!(prompts[0].contains("--- FILE: b.php ---"));
        assert!(prompts[1].contains("--- FILE: c.php ---"));
    }

    #[tokio::test]
    async fn followup_framing_replaces_standard_framing() {
        let provider = RecordingProvider::new(None);
        let driver = ReviewDriver::new(
            provider.clone(),
            "test-model".to_string(),
            "sys".to_string(),
        );
        let context = ReviewContext {
            prior_report: "# Prior Report\nFinding 1".to_string(),
            ..Default::default()
        };
        let progress = ProgressTracker::new(&["a.php".to_string(), "c.php".to_string()], false);

        driver
            .review_batches(&batches(), &context, &progress)
            .await;

        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[0].contains("PRIOR QA REPORT"));
        assert!(prompts[0].contains("FOLLOW-UP review"));
        assert!(!prompts[0].contains("dismiss false positives"));
        // Later batches carry neither the report body nor its framing.
        assert!(!prompts[1].contains("FOLLOW-UP review"));
        assert!(!prompts[1].contains("# Prior Report"));
    }

    #[tokio::test]
    async fn engine_failure_is_recorded_inline() {
        let provider = RecordingProvider::new(Some(0));
        let driver = ReviewDriver::new(
            provider.clone(),
            "test-model".to_string(),
            "sys".to_string(),
        );
        let progress = ProgressTracker::new(&["a.php".to_string(), "c.php".to_string()], false);

        let results = driver
            .review_batches(&batches(), &ReviewContext::default(), &progress)
            .await;

        assert_eq!(results.len(), 2);
        assert!(results[0].review.starts_with("**Error reviewing batch:**"));
        assert_eq!(results[1].review, "Review of batch 1");
        assert_eq!(results[0].file_count, 2);
        assert_eq!(results[0].files, vec!["a.php", "b.php"]);
    }

    #[tokio::test]
    async fn oversized_diff_is_capped() {
        let provider = RecordingProvider::new(None);
        let driver = ReviewDriver::new(
            provider.clone(),
            "test-model".to_string(),
            "sys".to_string(),
        );
        let context = ReviewContext {
            diff: "d".repeat(MAX_DIFF_CONTEXT_CHARS * 2),
            ..Default::default()
        };
        let progress = ProgressTracker::new(&["a.php".to_string()], false);

        driver
            .review_batches(&batches()[..1], &context, &progress)
            .await;

        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[0].len() < MAX_DIFF_CONTEXT_CHARS * 2);
    }
}
