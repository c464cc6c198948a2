//! Button and knob dispatch.
//!
//! Dispatch is best effort: a failing command is logged and the rest of
//! the list still runs.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, instrument, warn};

use super::compiled::{ActiveProfile, BoundCommand, KnobAction};
use crate::error::BravoError;
use crate::profile::{ButtonId, KnobId};
use crate::telemetry::{Reading, Resolver};

/// Which command list a button press selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickKind {
    Single,
    Double,
}

/// Knob rotation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub const fn sign(self) -> f64 {
        match self {
            Self::Up => 1.0,
            Self::Down => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Up => "up",
            Self::Down => "down",
        })
    }
}

impl FromStr for Direction {
    type Err = BravoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" | "inc" | "+" | "cw" => Ok(Self::Up),
            "down" | "dec" | "-" | "ccw" => Ok(Self::Down),
            other => Err(BravoError::Other(format!(
                "Unknown direction '{other}' (expected up or down)"
            ))),
        }
    }
}

/// Outcome of one input event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// Commands invoked successfully.
    pub invoked: usize,
    /// Datarefs written successfully.
    pub written: usize,
    /// Commands or writes that failed.
    pub failed: usize,
}

impl DispatchReport {
    pub const fn is_empty(&self) -> bool {
        self.invoked == 0 && self.written == 0 && self.failed == 0
    }
}

fn invoke(command: &BoundCommand, resolver: &Resolver, report: &mut DispatchReport) {
    let Some(handle) = command.handle else {
        debug!(command = %command.name, "Skipping unresolved command");
        report.failed += 1;
        return;
    };
    match resolver.invoke(handle) {
        Ok(()) => report.invoked += 1,
        Err(e) => {
            let error = BravoError::Dispatch {
                command: command.name.clone(),
                reason: e.to_string(),
            };
            warn!(error = %error, "Command failed");
            report.failed += 1;
        }
    }
}

/// Run the single- or double-click command list of `button`.
#[instrument(level = "debug", skip(active, resolver), fields(profile = %active.name()))]
pub fn dispatch_button(
    active: &ActiveProfile,
    resolver: &Resolver,
    button: ButtonId,
    click: ClickKind,
) -> DispatchReport {
    let mut report = DispatchReport::default();
    let Some(compiled) = active.button(button) else {
        debug!("Button not bound");
        return report;
    };

    let commands = match click {
        ClickKind::Single => &compiled.single_click,
        ClickKind::Double => &compiled.double_click,
    };
    for command in commands {
        invoke(command, resolver, &mut report);
    }
    report
}

/// Turn `knob` by `detents` in `direction`.
#[instrument(level = "debug", skip(active, resolver), fields(profile = %active.name()))]
pub fn dispatch_knob(
    active: &ActiveProfile,
    resolver: &Resolver,
    knob: KnobId,
    direction: Direction,
    detents: u32,
) -> DispatchReport {
    let mut report = DispatchReport::default();
    match active.knob(knob) {
        KnobAction::Unbound => debug!("Knob not bound"),
        KnobAction::Commands { increase, decrease } => {
            let command = match direction {
                Direction::Up => Some(increase),
                Direction::Down => decrease.as_ref(),
            };
            match command {
                Some(command) => {
                    for _ in 0..detents {
                        invoke(command, resolver, &mut report);
                    }
                }
                None => debug!("Knob has no decrease command"),
            }
        }
        KnobAction::StepWrite { targets, step } => {
            let delta = direction.sign() * f64::from(detents) * step.current(resolver);
            for target in targets {
                let (Some(handle), Reading::Value(current)) = (target.handle, target.read(resolver))
                else {
                    debug!(dataref = %target.name, "Step target unreadable");
                    report.failed += 1;
                    continue;
                };
                match resolver.write(handle, target.write_index(), current + delta) {
                    Ok(()) => report.written += 1,
                    Err(e) => {
                        warn!(dataref = %target.name, error = %e, "Step write failed");
                        report.failed += 1;
                    }
                }
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Profile;
    use crate::telemetry::mock::MockSim;
    use crate::telemetry::{Sample, TelemetryService};
    use std::sync::Arc;

    const PROFILE: &str = r"
buttons:
  hdg:
    single_click:
      - command_str: sim/autopilot/heading
      - command_str: sim/autopilot/broken
      - command_str: sim/autopilot/heading_hold
    double_click:
      - command_str: sim/autopilot/heading_sync
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
    value: 1000
";

    fn setup() -> (Arc<MockSim>, Resolver, ActiveProfile) {
        let sim = Arc::new(
            MockSim::new()
                .with_command("sim/autopilot/heading")
                .with_command("sim/autopilot/broken")
                .with_command("sim/autopilot/heading_hold")
                .with_command("sim/autopilot/heading_sync")
                .with_command("sim/autopilot/heading_up")
                .with_command("sim/autopilot/heading_down")
                .with_dataref("sim/cockpit/autopilot/altitude", Sample::Number(5000.0)),
        );
        sim.fail_command("sim/autopilot/broken");
        let resolver = Resolver::new(Arc::clone(&sim) as Arc<dyn TelemetryService>);
        let active =
            ActiveProfile::compile(Profile::from_yaml(PROFILE).unwrap(), Some(&resolver)).unwrap();
        (sim, resolver, active)
    }

    #[test]
    fn test_button_is_best_effort_and_ordered() {
        let (sim, resolver, active) = setup();
        let report = dispatch_button(&active, &resolver, ButtonId::Hdg, ClickKind::Single);

        assert_eq!(report.invoked, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(
            sim.invocations(),
            vec![
                "sim/autopilot/heading".to_string(),
                "sim/autopilot/broken".to_string(),
                "sim/autopilot/heading_hold".to_string(),
            ]
        );
    }

    #[test]
    fn test_double_click_list() {
        let (sim, resolver, active) = setup();
        dispatch_button(&active, &resolver, ButtonId::Hdg, ClickKind::Double);
        assert_eq!(sim.invocations(), vec!["sim/autopilot/heading_sync".to_string()]);
    }

    #[test]
    fn test_unbound_button_does_nothing() {
        let (sim, resolver, active) = setup();
        let report = dispatch_button(&active, &resolver, ButtonId::Rev, ClickKind::Single);
        assert!(report.is_empty());
        assert!(sim.invocations().is_empty());
    }

    #[test]
    fn test_knob_commands_repeat_per_detent() {
        let (sim, resolver, active) = setup();
        dispatch_knob(&active, &resolver, KnobId::ApHdg, Direction::Down, 3);
        assert_eq!(sim.invocations(), vec!["sim/autopilot/heading_down".to_string(); 3]);
    }

    #[test]
    fn test_knob_step_write() {
        let (sim, resolver, active) = setup();
        let report = dispatch_knob(&active, &resolver, KnobId::ApAlt, Direction::Up, 2);
        assert_eq!(report.written, 1);
        assert!(sim.invocations().is_empty());
        assert_eq!(
            sim.get("sim/cockpit/autopilot/altitude"),
            Some(Sample::Number(7000.0))
        );
    }

    #[test]
    fn test_step_write_skips_unreadable_target() {
        let (sim, resolver, active) = setup();
        sim.set_offline(true);
        let report = dispatch_knob(&active, &resolver, KnobId::ApAlt, Direction::Down, 1);
        assert_eq!(report.written, 0);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("UP".parse::<Direction>().unwrap(), Direction::Up);
        assert_eq!("ccw".parse::<Direction>().unwrap(), Direction::Down);
        assert!("sideways".parse::<Direction>().is_err());
    }
}
