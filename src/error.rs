//! Error types for profile loading, telemetry and dispatch.

use thiserror::Error;

/// Primary error type for the Bravo synchronization engine.
#[derive(Error, Debug)]
pub enum BravoError {
    // Profile load errors
    #[error("Failed to parse profile '{path}': {reason}")]
    ProfileParse { path: String, reason: String },

    #[error("Invalid condition expression in {context}: {reason}")]
    ExpressionCompile { context: String, reason: String },

    #[error("Unsupported operator '{operator}' in {context}")]
    InvalidOperator { operator: String, context: String },

    #[error("Unknown variable '{name}' in {context}")]
    UnknownVariable { name: String, context: String },

    // Profile store errors
    #[error("Profiles folder not found: {path}")]
    ProfilesDirNotFound { path: String },

    #[error("No profiles folder could be resolved")]
    ProfilesDirUnresolved,

    #[error("Profiles folder does not contain any .yaml files: {path}")]
    NoProfilesInDir { path: String },

    #[error("Profile index {index} out of range ({len} profiles loaded)")]
    ProfileIndexOutOfRange { index: usize, len: usize },

    #[error("Template default.yaml not found in {dir}")]
    TemplateMissing { dir: String },

    #[error("Profile already exists: {path}")]
    ProfileExists { path: String },

    // Selection errors
    #[error("No profile matches aircraft '{identity}'")]
    NoMatchingProfile { identity: String },

    #[error("No profile is active")]
    NoActiveProfile,

    // Telemetry errors
    #[error("Unknown simulator reference: {name}")]
    Resolution { name: String },

    #[error("Simulator transport error: {0}")]
    Transport(String),

    #[error("Command '{command}' failed: {reason}")]
    Dispatch { command: String, reason: String },

    // Panel errors
    #[error("Honeycomb Bravo panel not found")]
    PanelNotFound,

    #[error("Panel communication error: {0}")]
    PanelCommunication(String),

    // Configuration errors
    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl BravoError {
    /// Returns true for errors that reject a profile at load time.
    ///
    /// The previously active profile stays in effect when one of these
    /// is raised.
    pub const fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::ProfileParse { .. }
                | Self::ExpressionCompile { .. }
                | Self::InvalidOperator { .. }
                | Self::UnknownVariable { .. }
        )
    }

    /// Returns true if the error is recoverable by the user.
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ProfilesDirNotFound { .. }
                | Self::ProfilesDirUnresolved
                | Self::NoProfilesInDir { .. }
                | Self::TemplateMissing { .. }
                | Self::ProfileExists { .. }
                | Self::NoMatchingProfile { .. }
                | Self::PanelNotFound
        ) || self.is_load_error()
    }

    /// Returns a suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::ProfilesDirUnresolved | Self::ProfilesDirNotFound { .. } => {
                Some("Pass --profiles-dir or set BRAVO_PROFILES_DIR")
            }
            Self::TemplateMissing { .. } => Some("Add a default.yaml profile to the folder"),
            Self::NoMatchingProfile { .. } => Some("Add the aircraft ICAO code to a profile's selectors"),
            Self::PanelNotFound => Some("Ensure the Bravo throttle quadrant is connected via USB"),
            Self::Transport(_) => Some("Ensure the simulator is running with its web API enabled"),
            _ => None,
        }
    }
}

/// Convenience type alias for Results using BravoError.
pub type Result<T> = std::result::Result<T, BravoError>;

/// Extension trait for adding context to errors.
pub trait ResultExt<T> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| BravoError::Other(format!("{}: {e}", f().into())))
    }
}
