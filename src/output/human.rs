//! Human-friendly terminal output using console.

use std::fmt::Display;
use std::path::Path;

use console::{StyledObject, style};
use tracing::{debug, instrument};

use crate::engine::DispatchReport;
use crate::error::BravoError;
use crate::profile::ProfilesStatus;

use super::{CheckSummary, IssueSeverity, Output, ProfileCheck, Selection, VersionInfo};

/// Styled terminal output implementation for human users.
pub struct HumanOutput {
    color: bool,
}

impl HumanOutput {
    #[instrument]
    pub fn new(color: bool) -> Self {
        debug!("Creating HumanOutput");
        Self { color }
    }

    fn paint<D: Display>(&self, value: D) -> StyledObject<D> {
        style(value).force_styling(self.color)
    }

    fn tag(&self, label: &str) -> StyledObject<String> {
        self.paint(format!("[{label}]")).bold()
    }

    /// Lines printed for a check run, without trailing newlines.
    pub fn check_lines(&self, checks: &[ProfileCheck], summary: &CheckSummary) -> Vec<String> {
        let mut lines = Vec::new();
        for check in checks {
            let status = if check.valid {
                self.tag("OK").green()
            } else {
                self.tag("ERR").red()
            };
            let name = check
                .name
                .as_deref()
                .map(|n| format!(" ({n})"))
                .unwrap_or_default();
            lines.push(format!("{status} {}{name}", check.file));

            for issue in &check.issues {
                let marker = match issue.severity {
                    IssueSeverity::Error => self.paint("error").red(),
                    IssueSeverity::Warning => self.paint("warning").yellow(),
                };
                lines.push(format!("    {marker}: {}", issue.message));
                if let Some(suggestion) = &issue.suggestion {
                    lines.push(format!("      {}", self.paint(suggestion).dim()));
                }
            }
        }
        lines.push(format!(
            "{} profiles checked, {} valid, {} invalid",
            summary.total, summary.valid, summary.invalid
        ));
        lines
    }
}

impl Output for HumanOutput {
    fn success(&self, message: &str) {
        println!("{} {message}", self.tag("OK").green());
    }

    #[instrument(skip(self))]
    fn error(&self, error: &BravoError) {
        debug!(
            error = %error,
            recoverable = error.is_user_recoverable(),
            "Outputting error"
        );
        eprintln!("{} {}", self.tag("ERR").red(), self.paint(error).bold());
        if let Some(suggestion) = error.suggestion() {
            eprintln!("  {}: {}", self.paint("Hint").yellow(), suggestion);
        }
    }

    fn warning(&self, message: &str) {
        println!("{} {message}", self.tag("WARN").yellow());
    }

    fn info(&self, message: &str) {
        println!("{} {message}", self.tag("INFO").cyan());
    }

    fn profiles_status(&self, status: &ProfilesStatus) {
        println!(
            "{} {} ({} profiles)",
            self.paint("Profiles:").bold(),
            status.profiles_dir.display(),
            status.profiles_count
        );
    }

    fn check_results(&self, checks: &[ProfileCheck], summary: &CheckSummary) {
        for line in self.check_lines(checks, summary) {
            println!("{line}");
        }
    }

    fn selection(&self, selection: &Selection) {
        println!(
            "{} {} -> {} [{}]",
            self.tag("MATCH").green(),
            self.paint(&selection.identity).cyan(),
            self.paint(&selection.name).bold(),
            selection.file
        );
    }

    fn profile_created(&self, path: &Path) {
        self.success(&format!("Created {}", path.display()));
    }

    fn profile_activated(&self, name: &str, identity: Option<&str>) {
        match identity {
            Some(identity) => self.info(&format!("Active profile: {name} (aircraft {identity})")),
            None => self.info(&format!("Active profile: {name}")),
        }
    }

    fn dispatch(&self, target: &str, report: &DispatchReport) {
        let line = format!(
            "{target}: {} invoked, {} written, {} failed",
            report.invoked, report.written, report.failed
        );
        if report.failed == 0 {
            self.success(&line);
        } else {
            self.warning(&line);
        }
    }

    fn version_info(&self, info: &VersionInfo) {
        println!("bravo {}", info.version);
        println!(
            "git: {}{}",
            info.git_sha,
            if info.git_dirty { " (dirty)" } else { "" }
        );
        println!("built: {}", info.build_timestamp);
        println!("rustc: {}", info.rustc_version);
        println!("target: {}", info.target);
    }
}
