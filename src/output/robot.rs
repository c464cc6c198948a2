//! Robot mode JSON output implementation.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::engine::DispatchReport;
use crate::error::BravoError;
use crate::profile::ProfilesStatus;

use super::{CheckSummary, Output, ProfileCheck, RobotFormat, Selection, VersionInfo};

/// JSON output implementation for agents and scripting.
pub struct RobotOutput {
    format: RobotFormat,
}

impl RobotOutput {
    #[instrument]
    pub fn new(format: RobotFormat) -> Self {
        debug!(?format, "Creating RobotOutput");
        Self { format }
    }

    /// Serialize `data` in the configured format.
    pub fn render<T: Serialize + ?Sized>(&self, data: &T) -> String {
        let rendered = match self.format {
            RobotFormat::Json => serde_json::to_string_pretty(data),
            RobotFormat::JsonCompact => serde_json::to_string(data),
        };
        rendered.expect("serialization failed")
    }

    fn output_json<T: Serialize + ?Sized>(&self, data: &T) {
        let json = self.render(data);
        trace!(json_len = json.len(), "JSON serialized");
        println!("{json}");
    }
}

/// JSON body describing an error, shared with the binary's fallback path.
pub fn error_json(error: &BravoError) -> serde_json::Value {
    serde_json::json!({
        "error": true,
        "message": error.to_string(),
        "suggestion": error.suggestion(),
        "recoverable": error.is_user_recoverable(),
    })
}

impl Output for RobotOutput {
    fn success(&self, message: &str) {
        self.output_json(&serde_json::json!({
            "success": true,
            "message": message
        }));
    }

    #[instrument(skip(self))]
    fn error(&self, error: &BravoError) {
        debug!(error = %error, "Robot: error");
        let json = serde_json::to_string_pretty(&error_json(error)).expect("serialization failed");
        eprintln!("{json}");
    }

    fn warning(&self, message: &str) {
        self.output_json(&serde_json::json!({
            "warning": true,
            "message": message
        }));
    }

    fn info(&self, message: &str) {
        self.output_json(&serde_json::json!({
            "info": true,
            "message": message
        }));
    }

    fn profiles_status(&self, status: &ProfilesStatus) {
        self.output_json(status);
    }

    #[instrument(skip_all, fields(total = summary.total, invalid = summary.invalid))]
    fn check_results(&self, checks: &[ProfileCheck], summary: &CheckSummary) {
        debug!("Robot: check_results");
        self.output_json(&serde_json::json!({
            "command": "check",
            "ok": summary.is_success(),
            "profiles": checks,
            "summary": summary,
        }));
    }

    fn selection(&self, selection: &Selection) {
        self.output_json(selection);
    }

    fn profile_created(&self, path: &Path) {
        self.output_json(&serde_json::json!({
            "created": path.display().to_string(),
            "ok": true
        }));
    }

    fn profile_activated(&self, name: &str, identity: Option<&str>) {
        self.output_json(&serde_json::json!({
            "event": "profile_activated",
            "profile": name,
            "identity": identity,
        }));
    }

    fn dispatch(&self, target: &str, report: &DispatchReport) {
        self.output_json(&serde_json::json!({
            "target": target,
            "ok": report.failed == 0,
            "invoked": report.invoked,
            "written": report.written,
            "failed": report.failed,
        }));
    }

    fn version_info(&self, info: &VersionInfo) {
        self.output_json(info);
    }
}
