//! Memoized name resolution on top of a [`TelemetryService`].
//!
//! Lookups are cached for the whole session, including failures: an
//! unknown dataref is reported once and then reads as missing without
//! hitting the simulator again. Reads, writes and command invocations are
//! never cached.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, trace, warn};

use super::{CommandHandle, DatarefHandle, Reading, Sample, TelemetryService};
use crate::error::Result;

/// Caches dataref and command lookups in separate namespaces.
pub struct Resolver {
    service: Arc<dyn TelemetryService>,
    datarefs: RwLock<HashMap<String, Option<DatarefHandle>>>,
    commands: RwLock<HashMap<String, Option<CommandHandle>>>,
}

impl Resolver {
    pub fn new(service: Arc<dyn TelemetryService>) -> Self {
        Self {
            service,
            datarefs: RwLock::new(HashMap::new()),
            commands: RwLock::new(HashMap::new()),
        }
    }

    pub fn service(&self) -> &Arc<dyn TelemetryService> {
        &self.service
    }

    /// Resolve a dataref name, at most once per session.
    pub fn resolve_dataref(&self, name: &str) -> Option<DatarefHandle> {
        memoized(&self.datarefs, name, "dataref", |n| self.service.lookup_dataref(n))
    }

    /// Resolve a command name, at most once per session.
    pub fn resolve_command(&self, name: &str) -> Option<CommandHandle> {
        memoized(&self.commands, name, "command", |n| self.service.lookup_command(n))
    }

    /// Read element `index` of a dataref. Transport failures read as missing.
    pub fn read(&self, handle: DatarefHandle, index: u32) -> Reading {
        match self.service.read(handle) {
            Ok(sample) => sample.at(index),
            Err(e) => {
                debug!(handle = handle.0, error = %e, "Dataref read failed");
                Reading::Missing
            }
        }
    }

    /// Read a dataref by name as text.
    pub fn read_text(&self, name: &str) -> Option<String> {
        let handle = self.resolve_dataref(name)?;
        match self.service.read(handle) {
            Ok(sample) => sample.text().map(|t| t.trim().to_string()),
            Err(e) => {
                debug!(name, error = %e, "Dataref read failed");
                None
            }
        }
    }

    /// Read a dataref by name, resolving it first.
    pub fn read_named(&self, name: &str, index: u32) -> Reading {
        self.resolve_dataref(name)
            .map_or(Reading::Missing, |handle| self.read(handle, index))
    }

    /// Raw sample of a dataref.
    pub fn sample(&self, handle: DatarefHandle) -> Result<Sample> {
        self.service.read(handle)
    }

    pub fn write(&self, handle: DatarefHandle, index: Option<u32>, value: f64) -> Result<()> {
        trace!(handle = handle.0, ?index, value, "Writing dataref");
        self.service.write(handle, index, value)
    }

    pub fn invoke(&self, handle: CommandHandle) -> Result<()> {
        trace!(handle = handle.0, "Invoking command");
        self.service.invoke(handle)
    }

    /// Forget every cached lookup, successful or not.
    pub fn clear(&self) {
        self.datarefs.write().expect("dataref cache lock poisoned").clear();
        self.commands.write().expect("command cache lock poisoned").clear();
        debug!("Resolver cache cleared");
    }

    /// Number of cached dataref and command entries.
    pub fn cached(&self) -> (usize, usize) {
        (
            self.datarefs.read().expect("dataref cache lock poisoned").len(),
            self.commands.read().expect("command cache lock poisoned").len(),
        )
    }
}

fn memoized<H: Copy>(
    cache: &RwLock<HashMap<String, Option<H>>>,
    name: &str,
    kind: &str,
    lookup: impl FnOnce(&str) -> Result<H>,
) -> Option<H> {
    if let Some(entry) = cache.read().expect("resolver cache lock poisoned").get(name) {
        return *entry;
    }

    // Lookups run without the lock held; a concurrent duplicate lookup
    // resolves to the same id and the first insert wins.
    let resolved = match lookup(name) {
        Ok(handle) => {
            trace!(kind, name, "Resolved");
            Some(handle)
        }
        Err(e) => {
            warn!(kind, name, error = %e, "Could not resolve, treating as missing");
            None
        }
    };

    *cache
        .write()
        .expect("resolver cache lock poisoned")
        .entry(name.to_string())
        .or_insert(resolved)
}
