//! Output mode abstraction for robot and human output.

use std::path::Path;

use serde::Serialize;

use crate::cli::Cli;
use crate::engine::DispatchReport;
use crate::error::BravoError;
use crate::profile::ProfilesStatus;

pub mod human;
pub mod robot;

pub use human::HumanOutput;
pub use robot::RobotOutput;

// === Check Result Types ===

/// Severity level for profile issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    /// The profile would be rejected at load.
    Error,
    /// The profile loads but something looks off.
    Warning,
}

/// A single problem found in a profile.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileIssue {
    pub message: String,
    pub severity: IssueSeverity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ProfileIssue {
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: IssueSeverity::Error,
            suggestion: None,
        }
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: IssueSeverity::Warning,
            suggestion: None,
        }
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Check outcome for one profile file.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileCheck {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub valid: bool,
    pub issues: Vec<ProfileIssue>,
}

impl ProfileCheck {
    #[must_use]
    pub fn new(file: &Path) -> Self {
        Self {
            file: file.display().to_string(),
            name: None,
            valid: true,
            issues: Vec::new(),
        }
    }

    pub fn add_error(&mut self, issue: ProfileIssue) {
        self.valid = false;
        self.issues.push(issue);
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.issues.push(ProfileIssue::warning(message));
    }
}

/// Totals across a `check` run.
#[derive(Debug, Clone, Serialize)]
pub struct CheckSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
}

impl CheckSummary {
    #[must_use]
    pub fn from_checks(checks: &[ProfileCheck]) -> Self {
        let valid = checks.iter().filter(|c| c.valid).count();
        Self {
            total: checks.len(),
            valid,
            invalid: checks.len() - valid,
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.invalid == 0
    }
}

/// Which profile an aircraft identity selects.
#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    pub identity: String,
    pub index: usize,
    pub name: String,
    pub file: String,
}

/// Build metadata for `version`.
#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    pub version: &'static str,
    pub git_sha: &'static str,
    pub git_dirty: bool,
    pub build_timestamp: &'static str,
    pub rustc_version: &'static str,
    pub target: &'static str,
}

/// JSON formatting options for robot mode.
#[derive(Debug, Clone, Copy)]
pub enum RobotFormat {
    /// Pretty-printed JSON (default for --robot).
    Json,
    /// Single-line JSON (--format=json-compact).
    JsonCompact,
}

/// Determines how command output is rendered.
#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    /// JSON output for agents and scripting.
    Robot(RobotFormat),
    /// Styled terminal output; the flag enables color.
    Human { color: bool },
}

impl OutputMode {
    /// Create OutputMode from CLI arguments.
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.use_json() {
            let format = if cli.use_compact_json() {
                RobotFormat::JsonCompact
            } else {
                RobotFormat::Json
            };
            Self::Robot(format)
        } else {
            Self::Human {
                color: !cli.no_color && console::colors_enabled(),
            }
        }
    }

    #[must_use]
    pub const fn is_robot(&self) -> bool {
        matches!(self, Self::Robot(_))
    }

    #[must_use]
    pub fn into_output(self) -> Box<dyn Output> {
        match self {
            Self::Robot(format) => Box::new(RobotOutput::new(format)),
            Self::Human { color } => Box::new(HumanOutput::new(color)),
        }
    }
}

/// Trait for all output operations.
///
/// Commands call these methods without knowing the output mode.
pub trait Output {
    // Basic messages
    fn success(&self, message: &str);
    fn error(&self, error: &BravoError);
    fn warning(&self, message: &str);
    fn info(&self, message: &str);

    // Profiles
    fn profiles_status(&self, status: &ProfilesStatus);
    fn check_results(&self, checks: &[ProfileCheck], summary: &CheckSummary);
    fn selection(&self, selection: &Selection);
    fn profile_created(&self, path: &Path);

    // Runtime
    fn profile_activated(&self, name: &str, identity: Option<&str>);
    fn dispatch(&self, target: &str, report: &DispatchReport);

    // Metadata
    fn version_info(&self, info: &VersionInfo);
}
