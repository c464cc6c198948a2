//! In-memory simulator for unit and integration tests.
//!
//! Records every call for later assertion and can be taken offline or
//! told to fail specific commands.
//!
//! ```
//! use bravo::telemetry::mock::{MockSim, Operation};
//! use bravo::telemetry::{Sample, TelemetryService};
//!
//! let sim = MockSim::new().with_command("sim/autopilot/heading");
//! let handle = sim.lookup_command("sim/autopilot/heading").unwrap();
//! sim.invoke(handle).unwrap();
//! assert_eq!(sim.invocations(), vec!["sim/autopilot/heading".to_string()]);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tracing::trace;

use super::{CommandHandle, DatarefHandle, Sample, TelemetryService};
use crate::error::{BravoError, Result};

/// Recorded call for assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    LookupDataref { name: String },
    LookupCommand { name: String },
    Read { name: String },
    Write { name: String, index: Option<u32>, value: f64 },
    Invoke { name: String },
}

#[derive(Default)]
struct SimState {
    dataref_ids: HashMap<String, u64>,
    dataref_names: HashMap<u64, String>,
    values: HashMap<u64, Sample>,
    command_ids: HashMap<String, u64>,
    command_names: HashMap<u64, String>,
    next_id: u64,
}

impl SimState {
    fn add_dataref(&mut self, name: &str, sample: Sample) {
        let id = match self.dataref_ids.get(name) {
            Some(id) => *id,
            None => {
                self.next_id += 1;
                self.dataref_ids.insert(name.to_string(), self.next_id);
                self.dataref_names.insert(self.next_id, name.to_string());
                self.next_id
            }
        };
        self.values.insert(id, sample);
    }

    fn add_command(&mut self, name: &str) {
        if !self.command_ids.contains_key(name) {
            self.next_id += 1;
            self.command_ids.insert(name.to_string(), self.next_id);
            self.command_names.insert(self.next_id, name.to_string());
        }
    }
}

/// Simulator double holding datarefs and commands in memory.
pub struct MockSim {
    state: Mutex<SimState>,
    operation_log: Mutex<Vec<Operation>>,
    failing_commands: Mutex<Vec<String>>,
    error_injection: Mutex<Option<BravoError>>,
    offline: AtomicBool,
}

impl Default for MockSim {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSim {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState::default()),
            operation_log: Mutex::new(Vec::new()),
            failing_commands: Mutex::new(Vec::new()),
            error_injection: Mutex::new(None),
            offline: AtomicBool::new(false),
        }
    }

    // === Configuration ===

    #[must_use]
    pub fn with_dataref(self, name: &str, sample: Sample) -> Self {
        self.state.lock().unwrap().add_dataref(name, sample);
        self
    }

    #[must_use]
    pub fn with_command(self, name: &str) -> Self {
        self.state.lock().unwrap().add_command(name);
        self
    }

    /// Set a dataref's value, creating it when unknown.
    pub fn set(&self, name: &str, sample: Sample) {
        self.state.lock().unwrap().add_dataref(name, sample);
    }

    /// Current value of a dataref.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Sample> {
        let state = self.state.lock().unwrap();
        let id = state.dataref_ids.get(name)?;
        state.values.get(id).cloned()
    }

    /// Make every invocation of `name` fail.
    pub fn fail_command(&self, name: &str) {
        self.failing_commands.lock().unwrap().push(name.to_string());
    }

    /// Fail the next call with `error`.
    pub fn inject_error(&self, error: BravoError) {
        *self.error_injection.lock().unwrap() = Some(error);
    }

    /// Simulate the simulator going away (every call fails).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    // === Assertions ===

    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        self.operation_log.lock().unwrap().clone()
    }

    /// Number of recorded operations matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&Operation) -> bool) -> usize {
        self.operation_log
            .lock()
            .unwrap()
            .iter()
            .filter(|op| predicate(op))
            .count()
    }

    /// Names of invoked commands, in call order.
    #[must_use]
    pub fn invocations(&self) -> Vec<String> {
        self.operation_log
            .lock()
            .unwrap()
            .iter()
            .filter_map(|op| match op {
                Operation::Invoke { name } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Recorded dataref writes as `(name, index, value)`.
    #[must_use]
    pub fn writes(&self) -> Vec<(String, Option<u32>, f64)> {
        self.operation_log
            .lock()
            .unwrap()
            .iter()
            .filter_map(|op| match op {
                Operation::Write { name, index, value } => Some((name.clone(), *index, *value)),
                _ => None,
            })
            .collect()
    }

    /// # Panics
    ///
    /// Panics if `expected` was never recorded.
    pub fn assert_contains(&self, expected: &Operation) {
        let ops = self.operations();
        assert!(
            ops.contains(expected),
            "Expected operation {expected:?} not found in: {ops:#?}",
        );
    }

    pub fn clear_operations(&self) {
        self.operation_log.lock().unwrap().clear();
    }

    // === Internal Helpers ===

    fn record_op(&self, op: Operation) {
        trace!(?op, "Recording operation");
        self.operation_log.lock().unwrap().push(op);
    }

    fn check_error(&self) -> Result<()> {
        if let Some(error) = self.error_injection.lock().unwrap().take() {
            return Err(error);
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(BravoError::Transport("mock simulator offline".to_string()));
        }
        Ok(())
    }

    fn dataref_name(&self, handle: DatarefHandle) -> Result<String> {
        self.state
            .lock()
            .unwrap()
            .dataref_names
            .get(&handle.0)
            .cloned()
            .ok_or_else(|| BravoError::Resolution {
                name: format!("dataref #{}", handle.0),
            })
    }
}

impl TelemetryService for MockSim {
    fn lookup_dataref(&self, name: &str) -> Result<DatarefHandle> {
        self.record_op(Operation::LookupDataref {
            name: name.to_string(),
        });
        self.check_error()?;
        self.state
            .lock()
            .unwrap()
            .dataref_ids
            .get(name)
            .map(|id| DatarefHandle(*id))
            .ok_or_else(|| BravoError::Resolution {
                name: name.to_string(),
            })
    }

    fn lookup_command(&self, name: &str) -> Result<CommandHandle> {
        self.record_op(Operation::LookupCommand {
            name: name.to_string(),
        });
        self.check_error()?;
        self.state
            .lock()
            .unwrap()
            .command_ids
            .get(name)
            .map(|id| CommandHandle(*id))
            .ok_or_else(|| BravoError::Resolution {
                name: name.to_string(),
            })
    }

    fn read(&self, handle: DatarefHandle) -> Result<Sample> {
        let name = self.dataref_name(handle)?;
        self.record_op(Operation::Read { name });
        self.check_error()?;
        self.state
            .lock()
            .unwrap()
            .values
            .get(&handle.0)
            .cloned()
            .ok_or_else(|| BravoError::Transport(format!("no value for #{}", handle.0)))
    }

    fn write(&self, handle: DatarefHandle, index: Option<u32>, value: f64) -> Result<()> {
        let name = self.dataref_name(handle)?;
        self.record_op(Operation::Write {
            name,
            index,
            value,
        });
        self.check_error()?;

        let mut state = self.state.lock().unwrap();
        let slot = state.values.entry(handle.0).or_insert(Sample::Number(0.0));
        match (slot, index) {
            (Sample::Array(values), Some(i)) => {
                let i = i as usize;
                if values.len() <= i {
                    values.resize(i + 1, 0.0);
                }
                values[i] = value;
            }
            (slot, _) => *slot = Sample::Number(value),
        }
        Ok(())
    }

    fn invoke(&self, handle: CommandHandle) -> Result<()> {
        let name = self
            .state
            .lock()
            .unwrap()
            .command_names
            .get(&handle.0)
            .cloned()
            .ok_or_else(|| BravoError::Resolution {
                name: format!("command #{}", handle.0),
            })?;
        self.record_op(Operation::Invoke { name: name.clone() });
        self.check_error()?;

        if self.failing_commands.lock().unwrap().contains(&name) {
            return Err(BravoError::Dispatch {
                command: name,
                reason: "mock command configured to fail".to_string(),
            });
        }
        Ok(())
    }
}
