//! Fixed panel slots addressed by profile sections.
//!
//! Every section of a profile is a map keyed by one of these enums, so a
//! misspelled key is rejected when the YAML is parsed instead of being
//! silently ignored.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BravoError;

macro_rules! slot_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $key:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every slot, in panel order.
            pub const ALL: &'static [Self] = &[ $( Self::$variant ),+ ];

            /// YAML key of this slot.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $key ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = BravoError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_lowercase();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|slot| slot.as_str() == wanted)
                    .ok_or_else(|| {
                        BravoError::Other(format!(
                            "Unknown {} '{s}' (expected one of: {})",
                            $kind,
                            Self::ALL
                                .iter()
                                .map(|slot| slot.as_str())
                                .collect::<Vec<_>>()
                                .join(", ")
                        ))
                    })
            }
        }
    };
}

slot_enum! {
    /// Indicator lights on the panel.
    LedId, "led" {
        Hdg => "hdg",
        Nav => "nav",
        Alt => "alt",
        Apr => "apr",
        Vs => "vs",
        Ap => "ap",
        Ias => "ias",
        Rev => "rev",
        /// Landing gear (three green/red pairs on the hardware).
        Gear => "gear",
        MasterWarn => "master_warn",
        MasterCaution => "master_caution",
        Fire => "fire",
        OilLowPressure => "oil_low_pressure",
        FuelLowPressure => "fuel_low_pressure",
        AntiIce => "anti_ice",
        EngStarter => "eng_starter",
        Apu => "apu",
        Vacuum => "vacuum",
        HydroLowPressure => "hydro_low_pressure",
        AuxFuelPump => "aux_fuel_pump",
        ParkingBrake => "parking_brake",
        VoltLow => "volt_low",
        Doors => "doors",
    }
}

slot_enum! {
    /// Autopilot mode buttons.
    ButtonId, "button" {
        Hdg => "hdg",
        Nav => "nav",
        Alt => "alt",
        Apr => "apr",
        Vs => "vs",
        Ap => "ap",
        Ias => "ias",
        Rev => "rev",
    }
}

slot_enum! {
    /// Targets of the autopilot value knob, picked by the mode selector.
    KnobId, "knob" {
        ApHdg => "ap_hdg",
        ApVs => "ap_vs",
        ApAlt => "ap_alt",
        ApIas => "ap_ias",
        ApCrs => "ap_crs",
    }
}

slot_enum! {
    /// Step sizes for aircraft without native step commands.
    StepId, "step" {
        ApAltStep => "ap_alt_step",
        ApVsStep => "ap_vs_step",
        ApIasStep => "ap_ias_step",
    }
}

slot_enum! {
    /// Panel-wide gating conditions. Each one, when declared and false,
    /// holds every light off.
    GateId, "gate" {
        /// Electrical bus powered.
        BusVoltage => "bus_voltage",
        /// Aircraft has retractable gear.
        RetractableGear => "retractable_gear",
    }
}

impl KnobId {
    /// Step profile that replaces this knob's commands, if one exists.
    #[must_use]
    pub const fn step(self) -> Option<StepId> {
        match self {
            Self::ApAlt => Some(StepId::ApAltStep),
            Self::ApVs => Some(StepId::ApVsStep),
            Self::ApIas => Some(StepId::ApIasStep),
            Self::ApHdg | Self::ApCrs => None,
        }
    }

    /// Step used when neither a step dataref nor a step value is available.
    #[must_use]
    pub const fn default_step(self) -> f64 {
        match self {
            Self::ApAlt => 100.0,
            Self::ApHdg | Self::ApVs | Self::ApIas | Self::ApCrs => 1.0,
        }
    }
}
