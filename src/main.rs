//! critique — code review pipeline CLI.
//!
//! Entry point and error handling boundary. Uses `anyhow` for
//! ergonomic error propagation and user-facing messages.

mod cli;

use std::path::PathBuf;
use std::process;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Parser;
use colored::Colorize;

use cli::args::{Cli, Command, CommonArgs, PrArgs};
use critique::analyzers::{self, AnalysisSuite};
use critique::batch;
use critique::config::ProjectConfig;
use critique::constants::CONFIG_FILENAME;
use critique::discovery;
use critique::env::Env;
use critique::git::{self, ChangeScope};
use critique::prior;
use critique::profiles::{self, ProfileId};
use critique::progress::ProgressTracker;
use critique::provider::{CompletionProvider, OpenAiCompatProvider};
use critique::report::{self, PrInfo, ReportMeta, ReviewMode};
use critique::review::{ReviewContext, ReviewDriver};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{} {err:#}", "Error:".red().bold());
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Repo(args) => run_review(ReviewMode::Repo, *args, None).await,
        Command::Pr(args) => {
            let PrArgs {
                common,
                branch,
                base,
                range,
            } = *args;
            let scope = ChangeScope {
                branch,
                range,
                base,
            };
            run_review(ReviewMode::Pr, common, Some(scope)).await
        }
    }
}

async fn run_review(mode: ReviewMode, args: CommonArgs, scope: Option<ChangeScope>) -> Result<()> {
    if !args.repo_path.is_dir() {
        bail!("{} is not a directory", args.repo_path.display());
    }
    let repo = args
        .repo_path
        .canonicalize()
        .with_context(|| format!("cannot resolve {}", args.repo_path.display()))?;

    // ---- Project config ----
    eprintln!("{}", "Loading project config...".cyan());
    let config = ProjectConfig::load(&repo);
    let repo = config.effective_root(&repo);
    let project_name = config.display_name(&repo);
    let slug = repo
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| project_name.clone());

    if !config.exclude.is_empty() {
        eprintln!("  Excluding: {}", config.exclude.join(", "));
    }
    if config.name.is_none() && config.profile.is_none() && config.root.is_none() {
        eprintln!("  No {CONFIG_FILENAME} found (using defaults)");
        eprintln!(
            "  {}",
            format!("Tip: Add a {CONFIG_FILENAME} to your repo root to configure reviews").dimmed()
        );
    }

    // ---- Profile resolution ----
    let requested = args.profile.or_else(|| config_profile(&config)).unwrap_or(ProfileId::General);
    let (resolved_id, profile) = profiles::resolve(requested, &repo);
    let phpstan_level = args
        .phpstan_level
        .or(config.phpstan_level)
        .unwrap_or(profile.default_phpstan_level);

    let mode_label = match mode {
        ReviewMode::Repo => "Full Repository Scan",
        ReviewMode::Pr => "Pull Request Review",
    };
    let detected =
        (requested == ProfileId::Wordpress).then(|| resolved_id.to_string());
    cli::print_header(
        mode_label,
        profile.name,
        &project_name,
        &repo,
        phpstan_level,
        detected.as_deref(),
    );

    let start = Instant::now();

    // ---- Prior report (follow-up context) ----
    let mut prior_report_path: Option<PathBuf> = None;
    let mut prior_report_ctx = String::new();
    if let Some(ref path) = args.prior_report {
        prior_report_path = Some(path.clone());
    } else if args.latest {
        prior_report_path = prior::find_latest_report(&args.reports_dir, &slug);
        if prior_report_path.is_none() {
            eprintln!(
                "{} No previous reports found for this repo",
                "Warning:".yellow()
            );
        }
    }
    if let Some(ref path) = prior_report_path {
        if path.is_file() {
            prior_report_ctx = prior::load_prior_report(path);
            eprintln!("{} loaded prior report", "Follow-up mode:".magenta());
            eprintln!("  {}", path.display().to_string().dimmed());
            eprintln!(
                "  {}",
                format!("{} chars of context", prior_report_ctx.len()).dimmed()
            );
        } else {
            eprintln!(
                "{} Prior report not found: {}",
                "Warning:".yellow(),
                path.display()
            );
            prior_report_path = None;
        }
    }

    // ---- Static analysis ----
    let suite = if args.no_tools {
        eprintln!("{}", "Skipping static analysis (--no-tools)".dimmed());
        AnalysisSuite::default()
    } else {
        eprintln!("{}", "Running static analysis tools (parallel)...".cyan());
        analyzers::run_suite(&repo, profile.suite, phpstan_level).await
    };
    let analysis_ctx = suite.to_prompt_context();
    let analysis_rpt = suite.to_report_section();

    if args.tools_only {
        let now = Local::now().format("%Y-%m-%d %H:%M");
        let report = format!(
            "# Critique Report: {project_name}\n\n\
             **Mode:** Tools Only\n**Profile:** {}\n**Date:** {now}\n\n---\n\n\
             ## Static Analysis Results\n\n{analysis_rpt}\n",
            profile.name
        );
        let path = report::save_report(
            &report,
            &slug,
            &resolved_id.to_string(),
            "tools",
            &args.reports_dir,
            args.output.as_deref(),
        )
        .context("failed to save report")?;
        eprintln!("\n{} {}", "Report saved:".green(), path.display());
        return Ok(());
    }

    // ---- PR analysis ----
    let mut allow_list = None;
    let mut diff_ctx = String::new();
    let mut pr_info = None;
    if let Some(ref scope) = scope {
        eprintln!("{}", "Analyzing PR...".cyan());
        let changed = git::changed_files(&repo, scope).await;
        if changed.is_empty() {
            eprintln!("{}", "No changed files found.".yellow());
            return Ok(());
        }
        eprintln!("  Changed files: {}", changed.len().to_string().bold());
        for path in changed.iter().take(20) {
            eprintln!("    {path}");
        }
        if changed.len() > 20 {
            eprintln!("    ... and {} more", changed.len() - 20);
        }
        diff_ctx = git::diff(&repo, scope).await;
        let commits = git::log_oneline(&repo, scope).await;
        pr_info = Some(PrInfo {
            scope: scope.clone(),
            changed_count: changed.len(),
            commits,
        });
        allow_list = Some(changed);
    }

    // ---- Discover and batch ----
    eprintln!("{}", "Scanning files...".cyan());
    let filter = profile.discovery_filter(&config.exclude, allow_list);
    let files = discovery::discover_files(&repo, &filter, args.max_files).await;
    eprintln!(
        "  Found {} reviewable files",
        files.len().to_string().bold()
    );
    if files.is_empty() {
        eprintln!("{}", "No matching files found.".yellow());
        return Ok(());
    }

    let batches = batch::plan_batches(files, profile.group_strategy);
    eprintln!(
        "  Organized into {} review batches",
        batches.len().to_string().bold()
    );

    // ---- Connect to the completion engine ----
    eprintln!("{}", "Connecting to completion engine...".cyan());
    let provider = Arc::new(OpenAiCompatProvider::from_env(&args.base_url, &Env::real()));
    let model = provider.detect_model().await.with_context(|| {
        format!(
            "cannot reach the completion engine at {} (is it running?)",
            args.base_url
        )
    })?;
    eprintln!("  Model: {}", model.green());

    // ---- Review ----
    eprintln!("{}", "Running LLM review...".cyan());
    let labels: Vec<String> = batches
        .iter()
        .map(|b| b.first().map(|f| f.path.clone()).unwrap_or_default())
        .collect();
    let tracker = ProgressTracker::new(&labels, !args.no_progress);
    tracker.start();

    let context = ReviewContext {
        analysis: analysis_ctx,
        diff: diff_ctx,
        prior_report: prior_report_ctx,
    };
    let driver = ReviewDriver::new(provider, model, profile.system_prompt.clone());
    let results = driver.review_batches(&batches, &context, &tracker).await;
    tracker.finish();

    // ---- Report ----
    let elapsed_secs = start.elapsed().as_secs();
    let meta = ReportMeta {
        mode,
        profile_name: profile.name,
        project_name: &project_name,
        elapsed_secs,
        prior_report_path: prior_report_path.as_deref(),
        pr_info: pr_info.as_ref(),
    };
    let report = report::generate_report(&meta, &results, &analysis_rpt);
    let path = report::save_report(
        &report,
        &slug,
        &resolved_id.to_string(),
        meta.mode_suffix(),
        &args.reports_dir,
        args.output.as_deref(),
    )
    .context("failed to save report")?;

    let total_files: usize = results.iter().map(|r| r.file_count).sum();
    eprintln!("\n{}", "Review complete!".green().bold());
    eprintln!("  Report: {}", path.display().to_string().bold());
    eprintln!("  Time: {elapsed_secs}s | Files: {total_files}");
    eprintln!(
        "\n  {}",
        format!(
            "Next: \"Read {} and fix all CRITICAL and WARNING issues.\"",
            path.display()
        )
        .dimmed()
    );

    Ok(())
}

/// Parse the config file's profile string, warning on unknown names.
fn config_profile(config: &ProjectConfig) -> Option<ProfileId> {
    let name = config.profile.as_deref()?;
    match ProfileId::from_str(name) {
        Ok(id) => Some(id),
        Err(_) => {
            eprintln!(
                "  {} Unknown profile '{name}' in {CONFIG_FILENAME}, ignoring",
                "Warning:".yellow()
            );
            None
        }
    }
}
