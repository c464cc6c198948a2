//! Indicator output callbacks.
//!
//! Kept apart from the profile so a profile can be saved, reloaded or
//! swapped without ever touching the hardware bindings.

use std::collections::HashMap;
use std::fmt;

use super::conditions::GearLights;
use crate::profile::LedId;

type Callback = Box<dyn Fn() + Send + Sync>;
type GearCallback = Box<dyn Fn(GearLights) + Send + Sync>;

/// On/off callbacks for one indicator.
pub struct OutputBinding {
    activate: Callback,
    deactivate: Callback,
}

impl OutputBinding {
    pub fn new(
        activate: impl Fn() + Send + Sync + 'static,
        deactivate: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            activate: Box::new(activate),
            deactivate: Box::new(deactivate),
        }
    }

    pub fn activate(&self) {
        (self.activate)();
    }

    pub fn deactivate(&self) {
        (self.deactivate)();
    }
}

impl fmt::Debug for OutputBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputBinding").finish_non_exhaustive()
    }
}

/// Callbacks for every bound indicator. Unbound indicators are tracked
/// by the engine but drive nothing.
#[derive(Default)]
pub struct IndicatorOutputs {
    bindings: HashMap<LedId, OutputBinding>,
    gear: Option<GearCallback>,
}

impl IndicatorOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `led`, replacing any earlier binding.
    pub fn bind(&mut self, led: LedId, binding: OutputBinding) -> &mut Self {
        self.bindings.insert(led, binding);
        self
    }

    pub fn get(&self, led: LedId) -> Option<&OutputBinding> {
        self.bindings.get(&led)
    }

    /// Bind the per-wheel gear lights.
    pub fn bind_gear(&mut self, show: impl Fn(GearLights) + Send + Sync + 'static) -> &mut Self {
        self.gear = Some(Box::new(show));
        self
    }

    pub fn show_gear(&self, lights: GearLights) {
        if let Some(show) = &self.gear {
            show(lights);
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Debug for IndicatorOutputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndicatorOutputs")
            .field("bindings", &self.bindings)
            .field("gear", &self.gear.is_some())
            .finish()
    }
}
