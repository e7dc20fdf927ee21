//! Live terminal progress for the batch review loop.
//!
//! Renders one line per batch with colored status markers, rewriting in
//! place as batches move through the pipeline. Interactive-terminal
//! affordance only; silenced with `--no-progress`.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::Mutex;

use colored::Colorize;

/// Lifecycle of a single review batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchState {
    /// Queued, waiting for its turn.
    Pending,
    /// Sent to the completion engine.
    Submitted,
    /// Review text received.
    Complete,
    /// The engine call failed; the error is recorded in the report.
    Errored(String),
}

/// Tracks and renders per-batch progress.
pub struct ProgressTracker {
    inner: Mutex<ProgressState>,
    /// If false, all output is suppressed.
    enabled: bool,
}

struct ProgressState {
    /// batch index → (label, state), ordered for stable rendering.
    batches: BTreeMap<usize, (String, BatchState)>,
    /// Number of lines last printed (for clearing).
    rendered_lines: usize,
}

impl ProgressTracker {
    /// `labels` is one display label per batch, usually the first file path.
    pub fn new(labels: &[String], enabled: bool) -> Self {
        let batches = labels
            .iter()
            .enumerate()
            .map(|(i, label)| (i, (label.clone(), BatchState::Pending)))
            .collect();
        Self {
            inner: Mutex::new(ProgressState {
                batches,
                rendered_lines: 0,
            }),
            enabled,
        }
    }

    /// Print the initial batch listing.
    pub fn start(&self) {
        if !self.enabled {
            return;
        }
        let mut state = self.inner.lock().unwrap();
        Self::render(&mut state);
    }

    /// Update one batch and re-render.
    pub fn update(&self, index: usize, new_state: BatchState) {
        let mut state = self.inner.lock().unwrap();
        if let Some(entry) = state.batches.get_mut(&index) {
            entry.1 = new_state;
        }
        if self.enabled {
            Self::render(&mut state);
        }
    }

    /// Clear the live display and print the final per-batch status.
    pub fn finish(&self) {
        if !self.enabled {
            return;
        }
        let mut state = self.inner.lock().unwrap();
        Self::clear_lines(state.rendered_lines);
        state.rendered_lines = 0;

        let stderr = io::stderr();
        let mut handle = stderr.lock();
        for (label, batch_state) in state.batches.values() {
            let (icon, text) = match batch_state {
                BatchState::Errored(reason) => {
                    ("✖".red().bold().to_string(), reason.red().to_string())
                }
                _ => ("✔".green().bold().to_string(), "done".green().to_string()),
            };
            let _ = writeln!(handle, "  {icon} {} {text}", label.dimmed());
        }
    }

    fn render(state: &mut ProgressState) {
        let stderr = io::stderr();
        let mut handle = stderr.lock();

        Self::clear_lines(state.rendered_lines);

        let total = state.batches.len();
        let done = state
            .batches
            .values()
            .filter(|(_, s)| matches!(s, BatchState::Complete | BatchState::Errored(_)))
            .count();
        let _ = writeln!(
            handle,
            "  {} Reviewing {total} batch(es) [{done}/{total}]",
            "▸".cyan().bold()
        );
        let mut lines = 1;

        for (index, (label, batch_state)) in &state.batches {
            let (icon, text) = match batch_state {
                BatchState::Pending => ("○".dimmed().to_string(), "waiting".dimmed().to_string()),
                BatchState::Submitted => {
                    ("◌".cyan().bold().to_string(), "reviewing…".cyan().to_string())
                }
                BatchState::Complete => ("✔".green().bold().to_string(), "done".green().to_string()),
                BatchState::Errored(reason) => {
                    ("✖".red().bold().to_string(), reason.red().to_string())
                }
            };
            let _ = writeln!(
                handle,
                "    {icon} Batch {}: {} {text}",
                index + 1,
                label.dimmed()
            );
            lines += 1;
        }

        let _ = handle.flush();
        state.rendered_lines = lines;
    }

    /// Move cursor up and clear `n` lines.
    fn clear_lines(n: usize) {
        if n == 0 {
            return;
        }
        let stderr = io::stderr();
        let mut handle = stderr.lock();
        for _ in 0..n {
            let _ = write!(handle, "\x1b[1A\x1b[2K");
        }
        let _ = handle.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_tracker_never_panics() {
        let tracker = ProgressTracker::new(&["a.php".to_string()], false);
        tracker.start();
        tracker.update(0, BatchState::Submitted);
        tracker.update(0, BatchState::Complete);
        tracker.finish();
    }

    #[test]
    fn tracker_records_state_transitions() {
        let tracker = ProgressTracker::new(&["a.php".to_string(), "b.php".to_string()], false);
        tracker.update(0, BatchState::Complete);
        tracker.update(1, BatchState::Errored("connection refused".to_string()));

        let state = tracker.inner.lock().unwrap();
        assert_eq!(state.batches[&0].1, BatchState::Complete);
        assert!(matches!(state.batches[&1].1, BatchState::Errored(_)));
    }

    #[test]
    fn unknown_index_is_ignored() {
        let tracker = ProgressTracker::new(&["a.php".to_string()], false);
        tracker.update(5, BatchState::Complete);
        let state = tracker.inner.lock().unwrap();
        assert_eq!(state.batches.len(), 1);
    }
}
