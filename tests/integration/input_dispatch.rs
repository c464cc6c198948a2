//! Button and knob dispatch against the mock simulator.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bravo::engine::{ApMode, ClickKind, Direction, Engine, InputRouter};
use bravo::profile::{ButtonId, KnobId, ProfileStore};
use bravo::telemetry::Sample;
use bravo::telemetry::mock::{MockSim, Operation};

use crate::common::fixtures::{
    AP_ALTITUDE, HDG_DOWN, HDG_MODE, HDG_SYNC, HDG_UP, ProfilesFixture, cockpit_sim,
};

fn engine_for(sim: &Arc<MockSim>, identity: &str) -> Engine {
    let fixture = ProfilesFixture::standard();
    let store = ProfileStore::load_dir(fixture.path()).unwrap();
    let engine = Engine::new(sim.clone());
    engine.set_catalog(store.profiles().to_vec());
    engine.select_profile(identity).unwrap();
    sim.clear_operations();
    engine
}

#[test]
fn button_runs_single_click_commands() {
    let sim = cockpit_sim();
    let engine = engine_for(&sim, "A320");

    let report = engine.on_button(ButtonId::Hdg, ClickKind::Single);
    assert_eq!(report.invoked, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(sim.invocations(), vec![HDG_MODE.to_string()]);
}

#[test]
fn unbound_button_does_nothing() {
    let sim = cockpit_sim();
    let engine = engine_for(&sim, "A320");

    assert!(engine.on_button(ButtonId::Rev, ClickKind::Single).is_empty());
    assert!(engine.on_button(ButtonId::Hdg, ClickKind::Double).is_empty());
    assert!(sim.invocations().is_empty());
}

#[test]
fn failing_command_does_not_stop_the_list() {
    let fixture = ProfilesFixture::with_files(&[(
        "pair.yaml",
        r"
metadata:
  name: Pair
  selectors: [PAIR]
buttons:
  ap:
    single_click:
      - command_str: sim/autopilot/heading
      - command_str: sim/autopilot/heading_sync
",
    )]);
    let sim = cockpit_sim();
    sim.fail_command(HDG_MODE);
    let engine = Engine::new(sim.clone());
    engine.set_catalog(ProfileStore::load_dir(fixture.path()).unwrap().profiles().to_vec());
    engine.select_profile("PAIR").unwrap();

    let report = engine.on_button(ButtonId::Ap, ClickKind::Single);
    assert_eq!(report.failed, 1);
    assert_eq!(report.invoked, 1);
    sim.assert_contains(&Operation::Invoke {
        name: HDG_SYNC.to_string(),
    });
}

#[test]
fn knob_commands_repeat_per_detent() {
    let sim = cockpit_sim();
    let engine = engine_for(&sim, "A320");

    let report = engine.on_knob(KnobId::ApHdg, Direction::Up, 3);
    assert_eq!(report.invoked, 3);
    let report = engine.on_knob(KnobId::ApHdg, Direction::Down, 1);
    assert_eq!(report.invoked, 1);

    assert_eq!(
        sim.invocations(),
        vec![
            HDG_UP.to_string(),
            HDG_UP.to_string(),
            HDG_UP.to_string(),
            HDG_DOWN.to_string()
        ]
    );
}

#[test]
fn knob_step_writes_current_plus_step() {
    let sim = cockpit_sim();
    let engine = engine_for(&sim, "A320");

    let report = engine.on_knob(KnobId::ApAlt, Direction::Up, 2);
    assert_eq!(report.written, 1);
    assert!(matches!(sim.get(AP_ALTITUDE), Some(Sample::Number(v)) if v == 5200.0));

    engine.on_knob(KnobId::ApAlt, Direction::Down, 1);
    assert!(matches!(sim.get(AP_ALTITUDE), Some(Sample::Number(v)) if v == 5100.0));
}

#[test]
fn knob_write_fails_when_target_unreadable() {
    let sim = cockpit_sim();
    let engine = engine_for(&sim, "A320");
    sim.set_offline(true);

    let report = engine.on_knob(KnobId::ApAlt, Direction::Up, 1);
    assert_eq!(report.written, 0);
    assert_eq!(report.failed, 1);
}

#[test]
fn router_detects_double_click() {
    let sim = cockpit_sim();
    let engine = Arc::new(engine_for(&sim, "C172"));
    engine
        .reload_profile(
            bravo::profile::Profile::from_yaml(crate::common::fixtures::DEFAULT_YAML).unwrap(),
        )
        .unwrap();
    sim.clear_operations();

    let router = InputRouter::new(Arc::clone(&engine), Duration::from_millis(500));
    let start = Instant::now();

    assert!(router.press(ButtonId::Hdg, start).is_none());
    let report = router.press(ButtonId::Hdg, start + Duration::from_millis(200));
    assert_eq!(report.map(|r| r.invoked), Some(1));
    assert_eq!(sim.invocations(), vec![HDG_SYNC.to_string()]);

    assert!(router.press(ButtonId::Hdg, start + Duration::from_secs(2)).is_none());
    let fired = router.poll(start + Duration::from_secs(3));
    assert_eq!(fired.len(), 1);
    assert_eq!(sim.invocations().last().map(String::as_str), Some(HDG_MODE));
}

#[test]
fn router_turns_the_selected_knob() {
    let sim = cockpit_sim();
    let engine = Arc::new(engine_for(&sim, "A320"));
    let router = InputRouter::new(Arc::clone(&engine), Duration::from_millis(500));
    assert_eq!(router.mode(), ApMode::Hdg);

    let report = router.turn(Direction::Up, Instant::now());
    assert_eq!(report.invoked, 1);
    assert_eq!(sim.invocations(), vec![HDG_UP.to_string()]);

    router.set_mode(ApMode::Alt);
    let report = router.turn(Direction::Up, Instant::now());
    assert_eq!(report.written, 1);
}
