//! Review profiles: prompt, file filters, grouping, and tool suite per stack.

mod prompts;

use std::path::Path;

use strum::{Display, EnumString, VariantArray};

use crate::analyzers::SuiteKind;
use crate::batch::GroupStrategy;
use crate::discovery::DiscoveryFilter;

/// Profile selector. `Wordpress` auto-resolves to theme or plugin at runtime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, VariantArray, clap::ValueEnum,
)]
#[strum(serialize_all = "kebab-case")]
pub enum ProfileId {
    Wordpress,
    WpTheme,
    WpPlugin,
    Laravel,
    React,
    Security,
    Performance,
    General,
}

/// A fully-resolved review profile.
#[derive(Debug, Clone)]
pub struct Profile {
    pub id: ProfileId,
    /// Human-readable name used in report headers.
    pub name: &'static str,
    pub system_prompt: String,
    pub extensions: &'static [&'static str],
    pub skip_dirs: &'static [&'static str],
    pub skip_files: &'static [&'static str],
    pub group_strategy: GroupStrategy,
    pub suite: SuiteKind,
    pub default_phpstan_level: u8,
}

impl Profile {
    /// Build the discovery filter for this profile plus project overrides.
    pub fn discovery_filter(
        &self,
        extra_excludes: &[String],
        allow_list: Option<Vec<String>>,
    ) -> DiscoveryFilter {
        DiscoveryFilter {
            extensions: self.extensions.iter().map(|s| s.to_string()).collect(),
            skip_dirs: self.skip_dirs.iter().map(|s| s.to_string()).collect(),
            skip_files: self.skip_files.iter().map(|s| s.to_string()).collect(),
            extra_excludes: extra_excludes.to_vec(),
            allow_list: allow_list.map(|paths| paths.into_iter().collect()),
        }
    }
}

const WP_SKIP_DIRS: &[&str] = &[
    "node_modules",
    "vendor",
    ".git",
    "wp-admin",
    "wp-includes",
    "uploads",
    "cache",
    ".svn",
    "backups",
];
const LOCKFILES: &[&str] = &["package-lock.json", "composer.lock", "yarn.lock"];

/// Look up the static definition for a profile.
///
/// `Wordpress` returns a placeholder with the theme prompt; callers should
/// go through [`resolve`] so auto-detection runs first.
pub fn lookup(id: ProfileId) -> Profile {
    match id {
        ProfileId::Wordpress => Profile {
            name: "WordPress (auto-detect theme/plugin)",
            ..lookup(ProfileId::WpTheme)
        },
        ProfileId::WpTheme => Profile {
            id,
            name: "WordPress Theme Review",
            system_prompt: prompts::wp_theme(),
            extensions: &[".php", ".js", ".css", ".html", ".htm", ".twig"],
            skip_dirs: WP_SKIP_DIRS,
            skip_files: LOCKFILES,
            group_strategy: GroupStrategy::WpTheme,
            suite: SuiteKind::WordPress,
            default_phpstan_level: 5,
        },
        ProfileId::WpPlugin => Profile {
            id,
            name: "WordPress Plugin Review",
            system_prompt: prompts::wp_plugin(),
            extensions: &[".php", ".js", ".css", ".html", ".htm"],
            skip_dirs: WP_SKIP_DIRS,
            skip_files: LOCKFILES,
            group_strategy: GroupStrategy::WpPlugin,
            suite: SuiteKind::WordPress,
            default_phpstan_level: 5,
        },
        ProfileId::Laravel => Profile {
            id,
            name: "Laravel Review (Filament + API aware)",
            system_prompt: prompts::laravel(),
            extensions: &[
                ".php",
                ".blade.php",
                ".js",
                ".jsx",
                ".ts",
                ".tsx",
                ".vue",
                ".css",
            ],
            skip_dirs: &[
                "node_modules",
                "vendor",
                ".git",
                "storage",
                "bootstrap/cache",
                "public/build",
                "public/hot",
                "public/vendor",
            ],
            skip_files: &[
                "package-lock.json",
                "composer.lock",
                "yarn.lock",
                ".env",
                ".env.example",
            ],
            group_strategy: GroupStrategy::Laravel,
            suite: SuiteKind::Laravel,
            default_phpstan_level: 6,
        },
        ProfileId::React => Profile {
            id,
            name: "React Review",
            system_prompt: prompts::react(),
            extensions: &[
                ".js",
                ".jsx",
                ".ts",
                ".tsx",
                ".css",
                ".scss",
                ".module.css",
                ".json",
            ],
            skip_dirs: &[
                "node_modules",
                ".git",
                "build",
                "dist",
                ".next",
                "coverage",
                "public/static",
            ],
            skip_files: &["package-lock.json", "yarn.lock", ".env", ".env.local"],
            group_strategy: GroupStrategy::Flat,
            suite: SuiteKind::React,
            default_phpstan_level: 5,
        },
        ProfileId::Security => Profile {
            id,
            name: "Security Audit",
            system_prompt: prompts::security(),
            extensions: &[
                ".php",
                ".js",
                ".jsx",
                ".ts",
                ".tsx",
                ".py",
                ".html",
                ".htm",
                ".twig",
                ".blade.php",
                ".env",
                ".htaccess",
                ".conf",
                ".json",
                ".yml",
                ".yaml",
            ],
            skip_dirs: &["node_modules", "vendor", ".git"],
            skip_files: &["package-lock.json", "composer.lock"],
            group_strategy: GroupStrategy::Flat,
            suite: SuiteKind::Auto,
            default_phpstan_level: 5,
        },
        ProfileId::Performance => Profile {
            id,
            name: "Performance Review",
            system_prompt: prompts::performance(),
            extensions: &[
                ".php", ".js", ".jsx", ".ts", ".tsx", ".css", ".scss", ".sql", ".html",
            ],
            skip_dirs: &["node_modules", "vendor", ".git", "build", "dist"],
            skip_files: LOCKFILES,
            group_strategy: GroupStrategy::Flat,
            suite: SuiteKind::Auto,
            default_phpstan_level: 5,
        },
        ProfileId::General => Profile {
            id,
            name: "General Code Review",
            system_prompt: prompts::general(),
            extensions: &[
                ".php",
                ".js",
                ".jsx",
                ".ts",
                ".tsx",
                ".py",
                ".css",
                ".scss",
                ".html",
                ".htm",
                ".sql",
                ".blade.php",
                ".twig",
                ".vue",
            ],
            skip_dirs: &[
                "node_modules",
                "vendor",
                ".git",
                "build",
                "dist",
                "cache",
                "storage",
                "uploads",
            ],
            skip_files: LOCKFILES,
            group_strategy: GroupStrategy::Flat,
            suite: SuiteKind::Auto,
            default_phpstan_level: 5,
        },
    }
}

/// Resolve a profile, running theme-vs-plugin detection for `wordpress`.
///
/// Returns the resolved id (never `Wordpress`) and its full definition.
pub fn resolve(id: ProfileId, repo: &Path) -> (ProfileId, Profile) {
    if id == ProfileId::Wordpress {
        let detected = detect_wp_type(repo);
        return (detected, lookup(detected));
    }
    (id, lookup(id))
}

fn read_head(path: &Path, limit: usize) -> Option<String> {
    let bytes = std::fs::read(path).ok()?;
    let head = &bytes[..bytes.len().min(limit)];
    Some(String::from_utf8_lossy(head).into_owned())
}

/// Detect whether a WordPress checkout is a theme or a plugin.
///
/// Order of evidence: a `style.css` with a `Theme Name` header, a top-level
/// PHP file with a `Plugin Name` header, the presence of template hierarchy
/// files, then an includes/admin layout without templates. Themes are the
/// default when nothing matches.
pub fn detect_wp_type(repo: &Path) -> ProfileId {
    if let Some(head) = read_head(&repo.join("style.css"), 2_000) {
        if head.contains("Theme Name") {
            return ProfileId::WpTheme;
        }
    }

    if let Ok(entries) = std::fs::read_dir(repo) {
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.ends_with(".php") {
                continue;
            }
            if let Some(head) = read_head(&entry.path(), 3_000) {
                if head.contains("Plugin Name") {
                    return ProfileId::WpPlugin;
                }
            }
        }
    }

    let has_templates = [
        "index.php",
        "single.php",
        "page.php",
        "header.php",
        "footer.php",
        "archive.php",
        "functions.php",
    ]
    .iter()
    .any(|t| repo.join(t).is_file());
    let has_plugin_dirs = ["admin", "includes", "public", "assets"]
        .iter()
        .any(|d| repo.join(d).is_dir());

    if has_templates {
        ProfileId::WpTheme
    } else if has_plugin_dirs {
        ProfileId::WpPlugin
    } else {
        ProfileId::WpTheme
    }
}
