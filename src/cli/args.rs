//! Clap argument types for the two review modes.

use clap::Parser;
use std::path::PathBuf;

use critique::constants::{DEFAULT_BASE_URL, ENV_BASE_URL, MAX_TOTAL_FILES, REPORTS_DIR};
use critique::profiles::ProfileId;

/// Code review pipeline — findings only, no code changes.
#[derive(Parser, Debug)]
#[command(name = "critique", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Full repository scan.
    Repo(Box<CommonArgs>),

    /// Review a PR / branch diff.
    Pr(Box<PrArgs>),
}

/// Arguments shared by both review modes.
#[derive(clap::Args, Debug)]
pub struct CommonArgs {
    /// Path to the repository to review.
    pub repo_path: PathBuf,

    /// Review profile. Defaults to the project config's profile, else `general`.
    #[arg(long, short = 'p', value_enum)]
    pub profile: Option<ProfileId>,

    /// Write the report to this exact path instead of the reports directory.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Cap on the number of files reviewed.
    #[arg(long, default_value_t = MAX_TOTAL_FILES)]
    pub max_files: usize,

    /// Skip static analysis tools.
    #[arg(long, default_value_t = false)]
    pub no_tools: bool,

    /// Run static analysis only, no LLM review.
    #[arg(long, default_value_t = false, conflicts_with = "no_tools")]
    pub tools_only: bool,

    /// Override the PHPStan strictness level (0-9).
    #[arg(long)]
    pub phpstan_level: Option<u8>,

    /// Path to a previous report for follow-up review.
    #[arg(long)]
    pub prior_report: Option<PathBuf>,

    /// Auto-load the most recent report for this repo as follow-up context.
    #[arg(long, default_value_t = false, conflicts_with = "prior_report")]
    pub latest: bool,

    /// Base URL of the OpenAI-compatible completion engine.
    #[arg(long, env = ENV_BASE_URL, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Directory where generated reports are stored.
    #[arg(long, default_value = REPORTS_DIR)]
    pub reports_dir: PathBuf,

    /// Disable the live progress display.
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

/// Arguments for the `pr` subcommand.
#[derive(clap::Args, Debug)]
pub struct PrArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Branch to review (compared as `<base>...<branch>`).
    #[arg(long, short = 'b')]
    pub branch: Option<String>,

    /// Base branch for the comparison.
    #[arg(long, default_value = "main")]
    pub base: String,

    /// Explicit commit range (e.g. `main..feature/x`); overrides --branch.
    #[arg(long)]
    pub range: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_mode_parses_with_defaults() {
        let cli = Cli::try_parse_from(["critique", "repo", "/tmp/site"]).unwrap();
        let Command::Repo(args) = cli.command else {
            panic!("expected repo mode");
        };
        assert_eq!(args.repo_path, PathBuf::from("/tmp/site"));
        assert!(args.profile.is_none());
        assert_eq!(args.max_files, MAX_TOTAL_FILES);
        assert!(!args.tools_only);
    }

    #[test]
    fn pr_mode_parses_branch_and_range() {
        let cli = Cli::try_parse_from([
            "critique",
            "pr",
            "/tmp/site",
            "--branch",
            "feature/x",
            "--range",
            "main..feature/x",
            "--latest",
        ])
        .unwrap();
        let Command::Pr(args) = cli.command else {
            panic!("expected pr mode");
        };
        assert_eq!(args.branch.as_deref(), Some("feature/x"));
        assert_eq!(args.range.as_deref(), Some("main..feature/x"));
        assert_eq!(args.base, "main");
        assert!(args.common.latest);
    }

    #[test]
    fn profile_accepts_kebab_case_names() {
        let cli =
            Cli::try_parse_from(["critique", "repo", ".", "--profile", "wp-theme"]).unwrap();
        let Command::Repo(args) = cli.command else {
            panic!("expected repo mode");
        };
        assert_eq!(args.profile, Some(ProfileId::WpTheme));
    }

    #[test]
    fn latest_conflicts_with_prior_report() {
        assert!(Cli::try_parse_from([
            "critique",
            "repo",
            ".",
            "--latest",
            "--prior-report",
            "r.md",
        ])
        .is_err());
    }

    #[test]
    fn tools_only_conflicts_with_no_tools() {
        assert!(
            Cli::try_parse_from(["critique", "repo", ".", "--tools-only", "--no-tools"]).is_err()
        );
    }
}
