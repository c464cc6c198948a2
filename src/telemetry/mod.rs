//! Simulator telemetry access.
//!
//! [`TelemetryService`] abstracts the simulator so the engine can run
//! against the live web API ([`http::XPlaneWebApi`]) or the in-memory
//! [`mock::MockSim`] used by tests.

pub mod http;
pub mod mock;
pub mod resolver;

pub use resolver::Resolver;

use crate::error::Result;

/// Opaque id of a resolved dataref.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DatarefHandle(pub u64);

/// Opaque id of a resolved command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandHandle(pub u64);

/// Raw value returned by the simulator.
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    Number(f64),
    Array(Vec<f64>),
    Text(String),
}

impl Sample {
    /// Numeric reading at `index`.
    ///
    /// Scalars only answer index 0. Text is parsed as a number when it
    /// looks like one.
    pub fn at(&self, index: u32) -> Reading {
        match self {
            Self::Number(v) if index == 0 => Reading::Value(*v),
            Self::Array(values) => values
                .get(index as usize)
                .copied()
                .map_or(Reading::Missing, Reading::Value),
            Self::Text(text) if index == 0 => text
                .trim()
                .parse::<f64>()
                .map_or(Reading::Missing, Reading::Value),
            _ => Reading::Missing,
        }
    }

    /// Text form of the sample, for identity datarefs.
    pub fn text(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Number(v) => Some(v.to_string()),
            Self::Array(_) => None,
        }
    }
}

/// A numeric reading, or the absence of one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Value(f64),
    Missing,
}

impl Reading {
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::Missing => None,
        }
    }

    pub const fn is_missing(self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// Operations the engine needs from the simulator.
///
/// Every method may block for at most the transport's timeout. Failures
/// are reported per call; callers decide whether to cache them.
pub trait TelemetryService: Send + Sync {
    /// Look up a dataref id by its full name.
    fn lookup_dataref(&self, name: &str) -> Result<DatarefHandle>;

    /// Look up a command id by its full name.
    fn lookup_command(&self, name: &str) -> Result<CommandHandle>;

    /// Read the current value of a dataref.
    fn read(&self, handle: DatarefHandle) -> Result<Sample>;

    /// Write a dataref, or one element of an array dataref.
    fn write(&self, handle: DatarefHandle, index: Option<u32>, value: f64) -> Result<()>;

    /// Trigger a command once.
    fn invoke(&self, handle: CommandHandle) -> Result<()>;
}
