//! critique — code review pipeline for local completion engines.
//!
//! Scans a repository (or a PR's changed files), runs the stack's static
//! analysis tools in parallel, batches source files by architectural role,
//! and drives them through an OpenAI-compatible engine one batch at a
//! time. The output is a Markdown findings report for a coding agent to
//! act on; this crate never modifies the code it reviews.

pub mod analyzers;
pub mod batch;
pub mod config;
pub mod constants;
pub mod discovery;
pub mod env;
pub mod git;
pub mod prior;
pub mod profiles;
pub mod progress;
pub mod provider;
pub mod report;
pub mod review;
