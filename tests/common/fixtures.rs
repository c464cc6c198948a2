//! Test fixture helpers: profile folders and a preloaded simulator.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bravo::telemetry::Sample;
use bravo::telemetry::mock::MockSim;
use tempfile::TempDir;

pub const BUS_VOLTS: &str = "sim/cockpit2/electrical/bus_volts";
pub const AP_MODE: &str = "sim/cockpit/autopilot/autopilot_mode";
pub const PARKING_BRAKE: &str = "sim/cockpit2/controls/parking_brake_ratio";
pub const GEAR_DEPLOY: &str = "sim/flightmodel2/gear/deploy_ratio";
pub const RETRACTABLE: &str = "sim/aircraft/gear/acf_gear_retract";
pub const AP_ALTITUDE: &str = "sim/cockpit/autopilot/altitude";
pub const HDG_UP: &str = "sim/autopilot/heading_up";
pub const HDG_DOWN: &str = "sim/autopilot/heading_down";
pub const HDG_MODE: &str = "sim/autopilot/heading";
pub const HDG_SYNC: &str = "sim/autopilot/heading_sync";

pub const DEFAULT_YAML: &str = r"
metadata:
  name: Default
  description: Template for new aircraft
  selectors: []
buttons:
  hdg:
    single_click:
      - command_str: sim/autopilot/heading
    double_click:
      - command_str: sim/autopilot/heading_sync
knobs:
  ap_hdg:
    commands:
      - command_str: sim/autopilot/heading_up
      - command_str: sim/autopilot/heading_down
leds:
  parking_brake:
    datarefs:
      - dataref_str: sim/cockpit2/controls/parking_brake_ratio
        operator: '>'
        threshold: 0.1
";

pub const A320_YAML: &str = r"
metadata:
  name: Airbus A320
  description: ToLiss A320
  selectors: [A320, A320 Neo]
conditions:
  bus_voltage:
    datarefs:
      - dataref_str: sim/cockpit2/electrical/bus_volts
        operator: '>'
        threshold: 20
  retractable_gear:
    datarefs:
      - dataref_str: sim/aircraft/gear/acf_gear_retract
buttons:
  hdg:
    single_click:
      - command_str: sim/autopilot/heading
knobs:
  ap_hdg:
    commands:
      - command_str: sim/autopilot/heading_up
      - command_str: sim/autopilot/heading_down
  ap_alt:
    datarefs:
      - dataref_str: sim/cockpit/autopilot/altitude
data:
  ap_alt_step:
    value: 100
leds:
  ap:
    datarefs:
      - dataref_str: sim/cockpit/autopilot/autopilot_mode
    condition: autopilot_mode == 2
  parking_brake:
    datarefs:
      - dataref_str: sim/cockpit2/controls/parking_brake_ratio
        operator: '>'
        threshold: 0.1
  gear:
    datarefs:
      - dataref_str: sim/flightmodel2/gear/deploy_ratio
        operator: '=='
        threshold: 1
";

pub const C172_YAML: &str = r"
metadata:
  name: Cessna 172
  description: Laminar C172
  selectors: [C172, Cessna 172 SP]
leds:
  parking_brake:
    datarefs:
      - dataref_str: sim/cockpit2/controls/parking_brake_ratio
        operator: '>'
        threshold: 0.1
";

/// A temporary profiles folder.
pub struct ProfilesFixture {
    pub dir: TempDir,
}

impl ProfilesFixture {
    /// Folder holding the given `(file name, yaml)` pairs.
    #[must_use]
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        for (name, content) in files {
            fs::write(dir.path().join(name), content)
                .unwrap_or_else(|_| panic!("Failed to write {name}"));
        }
        Self { dir }
    }

    /// `default.yaml`, `a320.yaml` and `c172.yaml`.
    #[must_use]
    pub fn standard() -> Self {
        Self::with_files(&[
            ("default.yaml", DEFAULT_YAML),
            ("a320.yaml", A320_YAML),
            ("c172.yaml", C172_YAML),
        ])
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    #[must_use]
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// Simulator with powered bus, autopilot engaged and retractable gear down.
#[must_use]
pub fn cockpit_sim() -> Arc<MockSim> {
    Arc::new(
        MockSim::new()
            .with_dataref(BUS_VOLTS, Sample::Number(28.0))
            .with_dataref(AP_MODE, Sample::Number(2.0))
            .with_dataref(PARKING_BRAKE, Sample::Number(1.0))
            .with_dataref(GEAR_DEPLOY, Sample::Array(vec![1.0, 1.0, 1.0]))
            .with_dataref(RETRACTABLE, Sample::Number(1.0))
            .with_dataref(AP_ALTITUDE, Sample::Number(5000.0))
            .with_command(HDG_UP)
            .with_command(HDG_DOWN)
            .with_command(HDG_MODE)
            .with_command(HDG_SYNC),
    )
}
