//! LED bit layout of the Bravo throttle quadrant.
//!
//! The panel takes a four byte LED state: autopilot annunciators in byte
//! 0, gear and two warnings in byte 1, the annunciator panel across bytes
//! 2 and 3.

use std::sync::{Arc, Mutex};

use crate::engine::{GearLights, IndicatorOutputs, OutputBinding, WheelLight};
use crate::profile::LedId;

/// Gear lights, three green/red pairs in byte 1.
pub mod gear {
    use crate::engine::WheelLight;

    pub const LEFT_GREEN: u8 = 1;
    pub const LEFT_RED: u8 = 2;
    pub const NOSE_GREEN: u8 = 4;
    pub const NOSE_RED: u8 = 8;
    pub const RIGHT_GREEN: u8 = 16;
    pub const RIGHT_RED: u8 = 32;

    pub const ALL_GREEN: u8 = LEFT_GREEN | NOSE_GREEN | RIGHT_GREEN;
    pub const ALL_RED: u8 = LEFT_RED | NOSE_RED | RIGHT_RED;

    /// Bits for one wheel given its green and red bits.
    pub const fn wheel(light: WheelLight, green: u8, red: u8) -> u8 {
        match light {
            WheelLight::Off => 0,
            WheelLight::Green => green,
            WheelLight::Red => red,
        }
    }
}

/// Byte index and bit mask of `led`.
pub const fn mask(led: LedId) -> (usize, u8) {
    match led {
        LedId::Hdg => (0, 1),
        LedId::Nav => (0, 2),
        LedId::Apr => (0, 4),
        LedId::Rev => (0, 8),
        LedId::Alt => (0, 16),
        LedId::Vs => (0, 32),
        LedId::Ias => (0, 64),
        LedId::Ap => (0, 128),

        LedId::Gear => (1, gear::ALL_GREEN),
        LedId::MasterWarn => (1, 64),
        LedId::Fire => (1, 128),

        LedId::OilLowPressure => (2, 1),
        LedId::FuelLowPressure => (2, 2),
        LedId::AntiIce => (2, 4),
        LedId::EngStarter => (2, 8),
        LedId::Apu => (2, 16),
        LedId::MasterCaution => (2, 32),
        LedId::Vacuum => (2, 64),
        LedId::HydroLowPressure => (2, 128),

        LedId::AuxFuelPump => (3, 1),
        LedId::ParkingBrake => (3, 2),
        LedId::VoltLow => (3, 4),
        LedId::Doors => (3, 8),
    }
}

/// Shared LED state, written by indicator callbacks and read by the
/// panel flusher.
#[derive(Debug, Clone, Default)]
pub struct LedBank {
    bytes: Arc<Mutex<[u8; 4]>>,
}

impl LedBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, led: LedId, on: bool) {
        let (index, bits) = mask(led);
        let mut bytes = self.bytes.lock().expect("led bank lock poisoned");
        if on {
            bytes[index] |= bits;
        } else {
            bytes[index] &= !bits;
        }
    }

    /// Drive the three gear wheels, replacing whatever they showed.
    pub fn set_gear(&self, lights: GearLights) {
        let bits = gear::wheel(lights.nose, gear::NOSE_GREEN, gear::NOSE_RED)
            | gear::wheel(lights.left, gear::LEFT_GREEN, gear::LEFT_RED)
            | gear::wheel(lights.right, gear::RIGHT_GREEN, gear::RIGHT_RED);
        let mut bytes = self.bytes.lock().expect("led bank lock poisoned");
        bytes[1] = (bytes[1] & !(gear::ALL_GREEN | gear::ALL_RED)) | bits;
    }

    pub fn gear(&self) -> GearLights {
        let byte = self.bytes.lock().expect("led bank lock poisoned")[1];
        let wheel = |green: u8, red: u8| {
            if byte & green != 0 {
                WheelLight::Green
            } else if byte & red != 0 {
                WheelLight::Red
            } else {
                WheelLight::Off
            }
        };
        GearLights {
            nose: wheel(gear::NOSE_GREEN, gear::NOSE_RED),
            left: wheel(gear::LEFT_GREEN, gear::LEFT_RED),
            right: wheel(gear::RIGHT_GREEN, gear::RIGHT_RED),
        }
    }

    pub fn is_on(&self, led: LedId) -> bool {
        let (index, bits) = mask(led);
        self.bytes.lock().expect("led bank lock poisoned")[index] & bits == bits
    }

    pub fn bytes(&self) -> [u8; 4] {
        *self.bytes.lock().expect("led bank lock poisoned")
    }

    pub fn clear(&self) {
        *self.bytes.lock().expect("led bank lock poisoned") = [0; 4];
    }

    /// Output callbacks for every indicator, each toggling its bits here.
    /// The gear bits follow the per-wheel lights rather than the gear
    /// indicator's on/off edges.
    pub fn bindings(&self) -> IndicatorOutputs {
        let mut outputs = IndicatorOutputs::new();
        for led in LedId::ALL.iter().copied().filter(|led| *led != LedId::Gear) {
            let on = self.clone();
            let off = self.clone();
            outputs.bind(
                led,
                OutputBinding::new(move || on.set(led, true), move || off.set(led, false)),
            );
        }
        let bank = self.clone();
        outputs.bind_gear(move |lights| bank.set_gear(lights));
        outputs
    }
}
