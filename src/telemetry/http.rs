//! X-Plane web API client.
//!
//! Talks to the simulator's built-in REST server (`/api/v1`). Every call
//! is a blocking request bounded by the configured timeout.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use super::{CommandHandle, DatarefHandle, Sample, TelemetryService};
use crate::error::{BravoError, Result};

/// Default address of the simulator's web server.
pub const DEFAULT_API_URL: &str = "http://localhost:8086";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct ListResponse {
    data: Vec<ListEntry>,
}

#[derive(Debug, Deserialize)]
struct ListEntry {
    id: u64,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ValueResponse {
    data: Value,
}

/// [`TelemetryService`] backed by the simulator's REST API.
pub struct XPlaneWebApi {
    http: Client,
    base: String,
}

impl XPlaneWebApi {
    /// Build a client for `api_url` (e.g. `http://localhost:8086`).
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BravoError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base: format!("{}/api/v1", api_url.trim_end_matches('/')),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn lookup(&self, collection: &str, name: &str) -> Result<u64> {
        let url = format!("{}/{collection}", self.base);
        let response = self
            .http
            .get(&url)
            .query(&[("filter[name]", name)])
            .header("Accept", "application/json")
            .send()
            .map_err(transport)?;
        let list: ListResponse = check(response)?.json().map_err(transport)?;

        list.data
            .iter()
            .find(|entry| entry.name.is_empty() || entry.name == name)
            .map(|entry| entry.id)
            .ok_or_else(|| BravoError::Resolution {
                name: name.to_string(),
            })
    }
}

fn transport(e: reqwest::Error) -> BravoError {
    BravoError::Transport(e.to_string())
}

fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else if status == StatusCode::NOT_FOUND {
        Err(BravoError::Resolution {
            name: response.url().path().to_string(),
        })
    } else {
        Err(BravoError::Transport(format!(
            "{} returned {status}",
            response.url().path()
        )))
    }
}

/// Decode the `data` field of a value response.
///
/// Numbers and numeric arrays map directly; strings are base64 byte
/// datarefs, decoded up to the first NUL.
pub fn decode_value(value: &Value) -> Result<Sample> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .map(Sample::Number)
            .ok_or_else(|| BravoError::Transport(format!("unrepresentable number {n}"))),
        Value::Bool(b) => Ok(Sample::Number(if *b { 1.0 } else { 0.0 })),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_f64()
                    .ok_or_else(|| BravoError::Transport(format!("non-numeric array item {item}")))
            })
            .collect::<Result<Vec<_>>>()
            .map(Sample::Array),
        Value::String(encoded) => {
            let bytes = STANDARD
                .decode(encoded.trim())
                .map_err(|e| BravoError::Transport(format!("invalid base64 value: {e}")))?;
            let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
            Ok(Sample::Text(
                String::from_utf8_lossy(&bytes[..end]).into_owned(),
            ))
        }
        Value::Null | Value::Object(_) => Err(BravoError::Transport(format!(
            "unexpected value shape: {value}"
        ))),
    }
}

impl TelemetryService for XPlaneWebApi {
    #[instrument(level = "debug", skip(self))]
    fn lookup_dataref(&self, name: &str) -> Result<DatarefHandle> {
        self.lookup("datarefs", name).map(DatarefHandle)
    }

    #[instrument(level = "debug", skip(self))]
    fn lookup_command(&self, name: &str) -> Result<CommandHandle> {
        self.lookup("commands", name).map(CommandHandle)
    }

    fn read(&self, handle: DatarefHandle) -> Result<Sample> {
        let url = format!("{}/datarefs/{}/value", self.base, handle.0);
        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .map_err(transport)?;
        let body: ValueResponse = check(response)?.json().map_err(transport)?;
        decode_value(&body.data)
    }

    fn write(&self, handle: DatarefHandle, index: Option<u32>, value: f64) -> Result<()> {
        let url = format!("{}/datarefs/{}/value", self.base, handle.0);
        let mut request = self.http.patch(&url).json(&json!({ "data": value }));
        if let Some(index) = index {
            request = request.query(&[("index", index)]);
        }
        check(request.send().map_err(transport)?)?;
        debug!(handle = handle.0, ?index, value, "Dataref written");
        Ok(())
    }

    fn invoke(&self, handle: CommandHandle) -> Result<()> {
        let url = format!("{}/command/{}/activate", self.base, handle.0);
        let response = self
            .http
            .post(&url)
            .json(&json!({ "duration": 0 }))
            .send()
            .map_err(|e| BravoError::Dispatch {
                command: format!("#{}", handle.0),
                reason: e.to_string(),
            })?;
        check(response)?;
        Ok(())
    }
}
