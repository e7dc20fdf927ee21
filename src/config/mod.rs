//! Project configuration (`critique.json`) loading.
//!
//! The config file lives in the scan directory or one level above it (for
//! repos where a `root` subdirectory is scanned). Unknown keys are ignored
//! and a malformed file degrades to the empty configuration with a warning
//! on stderr — configuration problems are never fatal.

use std::path::{Path, PathBuf};

use colored::Colorize;
use serde::Deserialize;

use crate::constants::CONFIG_FILENAME;

/// Per-project review configuration.
///
/// ```json
/// {
///     "name": "My Plugin",
///     "profile": "wp-plugin",
///     "root": "plugin/",
///     "exclude": ["plugin-update-checker/", "lib/legacy/"],
///     "phpstan_level": 5
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectConfig {
    /// Display name used in reports. Falls back to the directory basename.
    pub name: Option<String>,
    /// Default review profile (CLI `--profile` overrides).
    pub profile: Option<String>,
    /// Subdirectory to scope discovery to, relative to the repo root.
    pub root: Option<String>,
    /// Additional path-prefix excludes on top of the profile's skip list.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Override for the PHPStan strictness level.
    pub phpstan_level: Option<u8>,
}

impl ProjectConfig {
    /// Load `critique.json` from `repo` or its parent directory.
    ///
    /// Returns the default (empty) config when no file exists or when the
    /// file cannot be parsed.
    pub fn load(repo: &Path) -> Self {
        let mut candidates = vec![repo.to_path_buf()];
        if let Some(parent) = repo.parent() {
            candidates.push(parent.to_path_buf());
        }

        for dir in candidates {
            let path = dir.join(CONFIG_FILENAME);
            if !path.is_file() {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(text) => match serde_json::from_str::<ProjectConfig>(&text) {
                    Ok(config) => {
                        eprintln!("  Loaded {} from {}", CONFIG_FILENAME.bold(), dir.display());
                        return config;
                    }
                    Err(e) => {
                        eprintln!(
                            "  {} Invalid {CONFIG_FILENAME}: {e}",
                            "Warning:".yellow()
                        );
                        return Self::default();
                    }
                },
                Err(e) => {
                    eprintln!(
                        "  {} Could not read {CONFIG_FILENAME}: {e}",
                        "Warning:".yellow()
                    );
                    return Self::default();
                }
            }
        }

        Self::default()
    }

    /// Resolve the effective scan root.
    ///
    /// When `root` names an existing subdirectory the scan is redirected
    /// there; a missing subdirectory warns and falls back to the full repo.
    pub fn effective_root(&self, repo: &Path) -> PathBuf {
        if let Some(ref sub) = self.root {
            let candidate = repo.join(sub);
            if candidate.is_dir() {
                eprintln!("  Scan root: {}", sub.bold());
                return candidate;
            }
            eprintln!(
                "  {} root '{sub}' not found, scanning full repo",
                "Warning:".yellow()
            );
        }
        repo.to_path_buf()
    }

    /// Display name for reports: configured name or the directory basename.
    pub fn display_name(&self, repo: &Path) -> String {
        self.name.clone().unwrap_or_else(|| {
            repo.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| repo.display().to_string())
        })
    }
}
