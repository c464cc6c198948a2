//! Condition evaluation, gating and edge detection for indicators.

use std::collections::HashMap;

use serde::Serialize;
use tracing::trace;

use super::compiled::ActiveProfile;
use crate::profile::{GateId, LedId};
use crate::telemetry::{DatarefHandle, Reading, Resolver, Sample};

/// Dataref values read at the start of a tick.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    samples: HashMap<DatarefHandle, Sample>,
    missing: usize,
}

impl Snapshot {
    /// Read every handle once. Failed reads are recorded as missing.
    pub fn capture(handles: &[DatarefHandle], resolver: &Resolver) -> Self {
        let mut snapshot = Self::default();
        for handle in handles {
            match resolver.sample(*handle) {
                Ok(sample) => {
                    snapshot.samples.insert(*handle, sample);
                }
                Err(e) => {
                    trace!(handle = handle.0, error = %e, "Snapshot read failed");
                    snapshot.missing += 1;
                }
            }
        }
        snapshot
    }

    pub fn insert(&mut self, handle: DatarefHandle, sample: Sample) {
        self.samples.insert(handle, sample);
    }

    pub fn sample(&self, handle: DatarefHandle) -> Option<&Sample> {
        self.samples.get(&handle)
    }

    pub fn reading(&self, handle: DatarefHandle, index: u32) -> Reading {
        self.samples
            .get(&handle)
            .map_or(Reading::Missing, |sample| sample.at(index))
    }

    /// Number of handles that could not be read.
    pub const fn missing(&self) -> usize {
        self.missing
    }
}

/// Last state driven onto an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LedState {
    /// Never driven; behaves as off.
    #[default]
    Unknown,
    On,
    Off,
}

/// A change the outputs must be told about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Activate,
    Deactivate,
}

/// One wheel of the gear indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WheelLight {
    #[default]
    Off,
    /// Down and locked.
    Green,
    /// In transit.
    Red,
}

impl WheelLight {
    /// Extension ratio of 1 is down, 0 is up.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= GEAR_DOWN {
            Self::Green
        } else if ratio > GEAR_UP {
            Self::Red
        } else {
            Self::Off
        }
    }
}

const GEAR_DOWN: f64 = 0.99;
const GEAR_UP: f64 = 0.01;

/// Nose, left and right gear lights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GearLights {
    pub nose: WheelLight,
    pub left: WheelLight,
    pub right: WheelLight,
}

impl GearLights {
    pub const fn uniform(light: WheelLight) -> Self {
        Self {
            nose: light,
            left: light,
            right: light,
        }
    }

    /// Lights for per-wheel ratios ordered nose, left, right.
    pub fn from_ratios(ratios: &[f64]) -> Self {
        let wheel = |i: usize| ratios.get(i).map_or(WheelLight::Off, |r| WheelLight::from_ratio(*r));
        Self {
            nose: wheel(0),
            left: wheel(1),
            right: wheel(2),
        }
    }
}

/// Per-indicator state machine.
#[derive(Debug, Clone, Default)]
pub struct IndicatorStates {
    states: HashMap<LedId, LedState>,
    gear: GearLights,
}

impl IndicatorStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, led: LedId) -> LedState {
        self.states.get(&led).copied().unwrap_or_default()
    }

    /// Record the desired state and return the edge to fire, if any.
    ///
    /// An indicator that has never been on produces no edge while it stays
    /// off.
    pub fn transition(&mut self, led: LedId, desired: bool) -> Option<Edge> {
        let state = self.states.entry(led).or_default();
        match (*state, desired) {
            (LedState::On, true) | (LedState::Off | LedState::Unknown, false) => None,
            (LedState::Off | LedState::Unknown, true) => {
                *state = LedState::On;
                Some(Edge::Activate)
            }
            (LedState::On, false) => {
                *state = LedState::Off;
                Some(Edge::Deactivate)
            }
        }
    }

    pub const fn gear(&self) -> GearLights {
        self.gear
    }

    /// Record the gear lights; true when they changed.
    pub fn set_gear(&mut self, lights: GearLights) -> bool {
        if self.gear == lights {
            return false;
        }
        self.gear = lights;
        true
    }

    /// Indicators currently on.
    pub fn lit(&self) -> Vec<LedId> {
        let mut lit: Vec<LedId> = self
            .states
            .iter()
            .filter(|(_, state)| **state == LedState::On)
            .map(|(led, _)| *led)
            .collect();
        lit.sort();
        lit
    }
}

/// True unless an enabled gate evaluates false.
pub fn gates_open(active: &ActiveProfile, snapshot: &Snapshot) -> bool {
    GateId::ALL
        .iter()
        .filter_map(|id| active.gate(*id))
        .all(|gate| gate.evaluate(snapshot))
}

/// Desired on/off state of every indicator for one snapshot.
///
/// An indicator is on when its own condition holds and every enabled gate
/// holds too. Indicators without a condition are off.
pub fn desired_states(active: &ActiveProfile, snapshot: &Snapshot) -> Vec<(LedId, bool)> {
    let open = gates_open(active, snapshot);
    LedId::ALL
        .iter()
        .map(|led| {
            let own = open && active.led(*led).is_some_and(|c| c.evaluate(snapshot));
            (*led, own)
        })
        .collect()
}

/// Wheel lights for one snapshot.
///
/// The gear indicator's first dataref holds the extension ratios: an array
/// gives one ratio per wheel, a scalar drives all three. Without a readable
/// dataref the lights follow the indicator itself, three greens when on.
pub fn gear_lights(active: &ActiveProfile, snapshot: &Snapshot, gear_on: bool) -> GearLights {
    if !gates_open(active, snapshot) {
        return GearLights::default();
    }
    let Some(source) = active.gear_source() else {
        let light = if gear_on { WheelLight::Green } else { WheelLight::Off };
        return GearLights::uniform(light);
    };
    match source.handle.and_then(|handle| snapshot.sample(handle)) {
        Some(Sample::Array(ratios)) => GearLights::from_ratios(ratios),
        Some(Sample::Number(ratio)) => GearLights::uniform(WheelLight::from_ratio(*ratio)),
        Some(Sample::Text(_)) | None => GearLights::default(),
    }
}
