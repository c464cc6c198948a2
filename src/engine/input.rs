//! Raw panel input turned into engine events.
//!
//! Buttons are debounced into single or double clicks, knob detents are
//! accelerated when turned quickly, and the autopilot mode selector picks
//! which knob profile a turn applies to.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::trace;

use super::Engine;
use super::dispatch::{ClickKind, Direction, DispatchReport};
use crate::error::BravoError;
use crate::profile::{ButtonId, KnobId};

/// Default window for a second press to count as a double click.
pub const DOUBLE_CLICK_THRESHOLD: Duration = Duration::from_millis(500);

/// Turns presses into clicks.
///
/// The first press of a button is held back; a second press inside the
/// threshold makes it a double click, otherwise [`expire`](Self::expire)
/// releases it as a single click.
#[derive(Debug, Clone)]
pub struct ClickDetector {
    threshold: Duration,
    pending: HashMap<ButtonId, Instant>,
}

impl Default for ClickDetector {
    fn default() -> Self {
        Self::new(DOUBLE_CLICK_THRESHOLD)
    }
}

impl ClickDetector {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            pending: HashMap::new(),
        }
    }

    pub const fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Register a press; returns `Double` when it completes a double click.
    pub fn press(&mut self, button: ButtonId, now: Instant) -> Option<ClickKind> {
        match self.pending.remove(&button) {
            Some(first) if now.saturating_duration_since(first) < self.threshold => {
                Some(ClickKind::Double)
            }
            _ => {
                self.pending.insert(button, now);
                None
            }
        }
    }

    /// Release presses whose double-click window has closed.
    pub fn expire(&mut self, now: Instant) -> Vec<ButtonId> {
        let threshold = self.threshold;
        let mut expired: Vec<ButtonId> = self
            .pending
            .iter()
            .filter(|(_, first)| now.saturating_duration_since(**first) >= threshold)
            .map(|(button, _)| *button)
            .collect();
        expired.sort();
        for button in &expired {
            self.pending.remove(button);
        }
        expired
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Scales detents by how fast the knob is being turned.
#[derive(Debug, Clone, Default)]
pub struct KnobAccelerator {
    last_turn: Option<Instant>,
}

impl KnobAccelerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Detents for one physical click of `knob` at `now`.
    ///
    /// Under 100 ms since the previous turn counts ×5, under 200 ms ×3.
    /// Altitude gets a further ×5 / ×2 on top.
    pub fn detents(&mut self, knob: KnobId, now: Instant) -> u32 {
        let elapsed = self
            .last_turn
            .map_or(Duration::from_secs(1), |last| now.saturating_duration_since(last));
        self.last_turn = Some(now);

        let fast = elapsed < Duration::from_millis(100);
        let quick = elapsed < Duration::from_millis(200);
        let base = if fast {
            5
        } else if quick {
            3
        } else {
            1
        };
        let extra = match knob {
            KnobId::ApAlt if fast => 5,
            KnobId::ApAlt if quick => 2,
            _ => 1,
        };
        base * extra
    }
}

/// Position of the autopilot mode selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApMode {
    Ias,
    Alt,
    Vs,
    #[default]
    Hdg,
    Crs,
}

impl ApMode {
    pub const ALL: [Self; 5] = [Self::Ias, Self::Alt, Self::Vs, Self::Hdg, Self::Crs];

    /// Knob profile the value knob drives in this mode.
    pub const fn knob(self) -> KnobId {
        match self {
            Self::Ias => KnobId::ApIas,
            Self::Alt => KnobId::ApAlt,
            Self::Vs => KnobId::ApVs,
            Self::Hdg => KnobId::ApHdg,
            Self::Crs => KnobId::ApCrs,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ias => "ias",
            Self::Alt => "alt",
            Self::Vs => "vs",
            Self::Hdg => "hdg",
            Self::Crs => "crs",
        }
    }
}

impl fmt::Display for ApMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApMode {
    type Err = BravoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == wanted)
            .ok_or_else(|| {
                BravoError::Other(format!(
                    "Unknown selector mode '{s}' (expected ias, alt, vs, hdg or crs)"
                ))
            })
    }
}

#[derive(Debug, Default)]
struct RouterState {
    clicks: ClickDetector,
    accelerator: KnobAccelerator,
    mode: ApMode,
}

/// Feeds raw panel input into an [`Engine`].
pub struct InputRouter {
    engine: Arc<Engine>,
    state: Mutex<RouterState>,
}

impl InputRouter {
    pub fn new(engine: Arc<Engine>, double_click: Duration) -> Self {
        Self {
            engine,
            state: Mutex::new(RouterState {
                clicks: ClickDetector::new(double_click),
                ..RouterState::default()
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, RouterState> {
        self.state.lock().expect("input router lock poisoned")
    }

    pub fn mode(&self) -> ApMode {
        self.state().mode
    }

    pub fn set_mode(&self, mode: ApMode) {
        trace!(%mode, "Selector moved");
        self.state().mode = mode;
    }

    /// A button went down. Dispatches immediately on a double click.
    pub fn press(&self, button: ButtonId, now: Instant) -> Option<DispatchReport> {
        let click = self.state().clicks.press(button, now)?;
        Some(self.engine.on_button(button, click))
    }

    /// Dispatch single clicks whose double-click window has passed.
    pub fn poll(&self, now: Instant) -> Vec<(ButtonId, DispatchReport)> {
        let expired = self.state().clicks.expire(now);
        expired
            .into_iter()
            .map(|button| (button, self.engine.on_button(button, ClickKind::Single)))
            .collect()
    }

    /// One detent of the value knob in the selected mode.
    pub fn turn(&self, direction: Direction, now: Instant) -> DispatchReport {
        let (knob, detents) = {
            let mut state = self.state();
            let knob = state.mode.knob();
            (knob, state.accelerator.detents(knob, now))
        };
        self.engine.on_knob(knob, direction, detents)
    }
}
