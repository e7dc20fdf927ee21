//! CLI command definitions and argument parsing.
//!
//! Uses clap derive macros for ergonomic argument definitions.

pub mod args;

use colored::Colorize;

use critique::constants::APP_NAME;

/// Print the run header: mode, profile, project, and engine settings.
pub fn print_header(
    mode_label: &str,
    profile_name: &str,
    project_name: &str,
    repo: &std::path::Path,
    phpstan_level: u8,
    detected: Option<&str>,
) {
    use std::io::Write;
    let stderr = std::io::stderr();
    let mut handle = stderr.lock();
    let _ = writeln!(handle);
    let _ = writeln!(
        handle,
        "  {} {}",
        APP_NAME.bold(),
        format!("· {mode_label} — {profile_name}").dimmed()
    );
    let _ = writeln!(handle, "  {} {project_name}", "Project:".dimmed());
    let _ = writeln!(handle, "  {} {}", "Repo:".dimmed(), repo.display());
    let _ = writeln!(handle, "  {} {phpstan_level}", "PHPStan Level:".dimmed());
    if let Some(name) = detected {
        let _ = writeln!(handle, "  {} {}", "Auto-detected:".dimmed(), name.green().bold());
    }
    let _ = writeln!(handle);
    let _ = handle.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_header_does_not_panic() {
        print_header(
            "Full Repository Scan",
            "General Code Review",
            "my-site",
            std::path::Path::new("/tmp/site"),
            5,
            Some("wp-theme"),
        );
    }
}
