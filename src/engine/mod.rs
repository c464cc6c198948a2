//! The synchronization engine.
//!
//! [`Engine`] owns the active profile and the indicator state machine. It
//! is shared between the periodic tick driver and the input path; every
//! method takes `&self`.
//!
//! Locking: the active profile sits behind its own `RwLock` and is only
//! ever replaced whole, so readers clone the `Arc` and release the lock
//! before doing any I/O. Indicator states have a separate `Mutex` that
//! serializes ticks. The resolver cache locks independently of both.

pub mod compiled;
pub mod conditions;
pub mod dispatch;
pub mod input;
pub mod outputs;

pub use compiled::{ActiveProfile, CompiledCondition, KnobAction};
pub use conditions::{Edge, GearLights, IndicatorStates, LedState, Snapshot, WheelLight};
pub use dispatch::{ClickKind, Direction, DispatchReport};
pub use input::{ApMode, ClickDetector, InputRouter, KnobAccelerator};
pub use outputs::{IndicatorOutputs, OutputBinding};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use serde::Serialize;
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{BravoError, Result};
use crate::profile::{ButtonId, KnobId, LedId, Profile, selector};
use crate::telemetry::{Resolver, TelemetryService};

/// Dataref holding the loaded aircraft's ICAO type code.
pub const ICAO_DATAREF: &str = "sim/aircraft/view/acf_ICAO";

/// Dataref holding the loaded aircraft's display name.
pub const UI_NAME_DATAREF: &str = "sim/aircraft/view/acf_ui_name";

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub activated: usize,
    pub deactivated: usize,
    /// Polled datarefs that could not be read this tick.
    pub missing: usize,
    /// True when no profile was active or the engine was stopped.
    pub skipped: bool,
}

/// Profile-driven bridge between telemetry and the panel.
pub struct Engine {
    resolver: Resolver,
    catalog: RwLock<Vec<Profile>>,
    active: RwLock<Option<Arc<ActiveProfile>>>,
    states: Mutex<IndicatorStates>,
    outputs: RwLock<IndicatorOutputs>,
    stopped: AtomicBool,
}

impl Engine {
    pub fn new(service: Arc<dyn TelemetryService>) -> Self {
        Self {
            resolver: Resolver::new(service),
            catalog: RwLock::new(Vec::new()),
            active: RwLock::new(None),
            states: Mutex::new(IndicatorStates::new()),
            outputs: RwLock::new(IndicatorOutputs::new()),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    fn states(&self) -> MutexGuard<'_, IndicatorStates> {
        self.states.lock().expect("indicator state lock poisoned")
    }

    /// Replace the profiles selection chooses from, in selection order.
    pub fn set_catalog(&self, profiles: Vec<Profile>) {
        debug!(count = profiles.len(), "Catalog replaced");
        *self.catalog.write().expect("catalog lock poisoned") = profiles;
    }

    /// Install the hardware callbacks.
    pub fn bind_outputs(&self, outputs: IndicatorOutputs) {
        debug!(bound = outputs.len(), "Outputs bound");
        *self.outputs.write().expect("outputs lock poisoned") = outputs;
    }

    /// Currently active profile, if any.
    pub fn active_profile(&self) -> Option<Arc<ActiveProfile>> {
        self.active.read().expect("active profile lock poisoned").clone()
    }

    pub fn active_profile_name(&self) -> Option<String> {
        self.active_profile().map(|active| active.name().to_string())
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Activate the first catalog profile matching `identity`.
    ///
    /// Returns the activated profile's name. On a miss or a load error the
    /// current profile stays active.
    #[instrument(skip(self))]
    pub fn select_profile(&self, identity: &str) -> Result<String> {
        let profile = {
            let catalog = self.catalog.read().expect("catalog lock poisoned");
            let index = selector::select_profile(&catalog, identity)?;
            catalog[index].clone()
        };
        let name = profile.name().to_string();
        self.reload_profile(profile)?;
        Ok(name)
    }

    /// Identity strings of the loaded aircraft: ICAO code, then UI name.
    pub fn aircraft_identity(&self) -> Vec<String> {
        [ICAO_DATAREF, UI_NAME_DATAREF]
            .iter()
            .filter_map(|name| self.resolver.read_text(name))
            .filter(|identity| !identity.is_empty())
            .collect()
    }

    /// Select a profile for whatever aircraft the simulator has loaded.
    ///
    /// The ICAO code is tried first, then the UI name.
    pub fn select_for_loaded_aircraft(&self) -> Result<String> {
        let identities = self.aircraft_identity();
        if identities.is_empty() {
            return Err(BravoError::Transport(
                "aircraft identity is not available".to_string(),
            ));
        }

        for identity in &identities {
            match self.select_profile(identity) {
                Err(BravoError::NoMatchingProfile { .. }) => continue,
                other => return other,
            }
        }
        Err(BravoError::NoMatchingProfile {
            identity: identities.join(" / "),
        })
    }

    /// Compile `profile` and make it active.
    ///
    /// The resolver cache is dropped first so identifiers that failed
    /// for the previous aircraft get another chance. Indicator states
    /// carry over; the next tick reconciles them with the new conditions.
    #[instrument(skip_all, fields(name = %profile.name()))]
    pub fn reload_profile(&self, profile: Profile) -> Result<()> {
        if self.is_stopped() {
            return Err(BravoError::Other("engine is shut down".to_string()));
        }

        self.resolver.clear();
        let compiled = match ActiveProfile::compile(profile, Some(&self.resolver)) {
            Ok(compiled) => compiled,
            Err(e) => {
                warn!(error = %e, "Profile rejected, keeping the previous one");
                return Err(e);
            }
        };
        if !compiled.unresolved().is_empty() {
            info!(unresolved = ?compiled.unresolved(), "Some datarefs are unknown to the simulator");
        }

        let name = compiled.name().to_string();
        *self.active.write().expect("active profile lock poisoned") = Some(Arc::new(compiled));
        info!(profile = %name, "Profile active");
        Ok(())
    }

    /// Poll telemetry once and drive indicator edges.
    pub fn tick(&self) -> TickReport {
        let mut report = TickReport::default();
        if self.is_stopped() {
            report.skipped = true;
            return report;
        }
        let Some(active) = self.active_profile() else {
            report.skipped = true;
            return report;
        };

        let snapshot = Snapshot::capture(active.polled(), &self.resolver);
        report.missing = snapshot.missing();
        let desired = conditions::desired_states(&active, &snapshot);
        let gear_on = desired.contains(&(LedId::Gear, true));
        let wheels = conditions::gear_lights(&active, &snapshot, gear_on);

        let mut states = self.states();
        // Shutdown may have switched everything off while telemetry was read.
        if self.is_stopped() {
            report.skipped = true;
            return report;
        }
        let outputs = self.outputs.read().expect("outputs lock poisoned");
        for (led, on) in desired {
            match states.transition(led, on) {
                Some(Edge::Activate) => {
                    debug!(%led, "Indicator on");
                    report.activated += 1;
                    if let Some(binding) = outputs.get(led) {
                        binding.activate();
                    }
                }
                Some(Edge::Deactivate) => {
                    debug!(%led, "Indicator off");
                    report.deactivated += 1;
                    if let Some(binding) = outputs.get(led) {
                        binding.deactivate();
                    }
                }
                None => {}
            }
        }
        if states.set_gear(wheels) {
            debug!(?wheels, "Gear lights changed");
            outputs.show_gear(wheels);
        }

        trace!(?report, "Tick complete");
        report
    }

    /// Button event. Never blocks on a tick.
    pub fn on_button(&self, button: ButtonId, click: ClickKind) -> DispatchReport {
        if self.is_stopped() {
            return DispatchReport::default();
        }
        match self.active_profile() {
            Some(active) => dispatch::dispatch_button(&active, &self.resolver, button, click),
            None => {
                debug!(%button, "No active profile, button ignored");
                DispatchReport::default()
            }
        }
    }

    /// Knob event of `count` detents.
    pub fn on_knob(&self, knob: KnobId, direction: Direction, count: u32) -> DispatchReport {
        if self.is_stopped() {
            return DispatchReport::default();
        }
        match self.active_profile() {
            Some(active) => dispatch::dispatch_knob(&active, &self.resolver, knob, direction, count),
            None => {
                debug!(%knob, "No active profile, knob ignored");
                DispatchReport::default()
            }
        }
    }

    pub fn indicator_state(&self, led: LedId) -> LedState {
        self.states().get(led)
    }

    /// Indicators currently on.
    pub fn lit(&self) -> Vec<LedId> {
        self.states().lit()
    }

    pub fn gear_lights(&self) -> GearLights {
        self.states().gear()
    }

    /// Stop ticks and events, switch every lit indicator off and drop the
    /// resolver cache.
    pub fn shutdown(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut states = self.states();
        let outputs = self.outputs.read().expect("outputs lock poisoned");
        for led in states.lit() {
            if states.transition(led, false) == Some(Edge::Deactivate) {
                if let Some(binding) = outputs.get(led) {
                    binding.deactivate();
                }
            }
        }
        if states.set_gear(GearLights::default()) {
            outputs.show_gear(GearLights::default());
        }
        drop(outputs);
        drop(states);

        self.resolver.clear();
        info!("Engine stopped");
    }
}
