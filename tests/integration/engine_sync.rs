//! Indicator edges, gating and missing telemetry through the engine.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bravo::engine::{
    Engine, ICAO_DATAREF, IndicatorOutputs, LedState, OutputBinding, UI_NAME_DATAREF, WheelLight,
};
use bravo::error::BravoError;
use bravo::panel::LedBank;
use bravo::panel::leds::gear;
use bravo::profile::{LedId, Profile, ProfileStore};
use bravo::telemetry::Sample;
use bravo::telemetry::mock::MockSim;

use crate::common::fixtures::{
    A320_YAML, AP_MODE, BUS_VOLTS, C172_YAML, GEAR_DEPLOY, PARKING_BRAKE, ProfilesFixture,
    RETRACTABLE, cockpit_sim,
};
use crate::common::init_test_logging;

fn engine_with_bank(sim: &Arc<MockSim>) -> (Engine, LedBank) {
    let fixture = ProfilesFixture::standard();
    let store = ProfileStore::load_dir(fixture.path()).unwrap();
    let engine = Engine::new(sim.clone());
    engine.set_catalog(store.profiles().to_vec());
    let bank = LedBank::new();
    engine.bind_outputs(bank.bindings());
    (engine, bank)
}

fn counting(engine: &Engine, led: LedId) -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let on = Arc::new(AtomicUsize::new(0));
    let off = Arc::new(AtomicUsize::new(0));
    let (on2, off2) = (Arc::clone(&on), Arc::clone(&off));
    let mut outputs = IndicatorOutputs::new();
    outputs.bind(
        led,
        OutputBinding::new(
            move || {
                on2.fetch_add(1, Ordering::SeqCst);
            },
            move || {
                off2.fetch_add(1, Ordering::SeqCst);
            },
        ),
    );
    engine.bind_outputs(outputs);
    (on, off)
}

#[test]
fn powered_cockpit_lights_indicators() {
    init_test_logging();
    let sim = cockpit_sim();
    let (engine, bank) = engine_with_bank(&sim);
    assert_eq!(engine.select_profile("A320").unwrap(), "Airbus A320");

    let report = engine.tick();
    assert_eq!(report.activated, 3);
    assert!(bank.is_on(LedId::Ap));
    assert!(bank.is_on(LedId::ParkingBrake));
    assert!(bank.is_on(LedId::Gear));
    assert_eq!(bank.bytes(), [128, 0b0001_0101, 0, 2]);
}

#[test]
fn dead_bus_switches_everything_off() {
    let sim = cockpit_sim();
    let (engine, bank) = engine_with_bank(&sim);
    engine.select_profile("A320").unwrap();
    engine.tick();

    sim.set(BUS_VOLTS, Sample::Number(0.0));
    let report = engine.tick();
    assert_eq!(report.deactivated, 3);
    assert_eq!(bank.bytes(), [0; 4]);
    assert!(engine.lit().is_empty());

    sim.set(BUS_VOLTS, Sample::Number(27.5));
    assert_eq!(engine.tick().activated, 3);
}

#[test]
fn each_gate_closes_every_indicator() {
    let sim = cockpit_sim();
    let (engine, bank) = engine_with_bank(&sim);
    engine.select_profile("A320").unwrap();
    let lit = [128, 0b0001_0101, 0, 2];

    engine.tick();
    assert_eq!(bank.bytes(), lit);

    sim.set(RETRACTABLE, Sample::Number(0.0));
    assert_eq!(engine.tick().deactivated, 3);
    assert_eq!(bank.bytes(), [0; 4]);

    sim.set(RETRACTABLE, Sample::Number(1.0));
    engine.tick();
    assert_eq!(bank.bytes(), lit);

    sim.set(BUS_VOLTS, Sample::Number(0.0));
    assert_eq!(engine.tick().deactivated, 3);
    assert_eq!(bank.bytes(), [0; 4]);
}

#[test]
fn gear_in_transit_shows_red() {
    let sim = cockpit_sim();
    let (engine, bank) = engine_with_bank(&sim);
    engine.select_profile("A320").unwrap();
    engine.tick();
    assert_eq!(bank.bytes()[1], gear::ALL_GREEN);

    // Nose locked down, left travelling, right still up.
    sim.set(GEAR_DEPLOY, Sample::Array(vec![1.0, 0.5, 0.0]));
    engine.tick();
    assert_eq!(bank.bytes()[1], gear::NOSE_GREEN | gear::LEFT_RED);
    assert_eq!(engine.gear_lights().right, WheelLight::Off);
    assert!(!bank.is_on(LedId::Gear));

    sim.set(GEAR_DEPLOY, Sample::Array(vec![0.5, 0.5, 0.5]));
    engine.tick();
    assert_eq!(bank.bytes()[1], gear::ALL_RED);

    sim.set(GEAR_DEPLOY, Sample::Array(vec![0.0, 0.0, 0.0]));
    engine.tick();
    assert_eq!(bank.bytes(), [128, 0, 0, 2]);
}

#[test]
fn edge_count_matches_adjacent_changes() {
    let sim = cockpit_sim();
    let (engine, _bank) = engine_with_bank(&sim);
    engine.select_profile("A320").unwrap();
    let (on, off) = counting(&engine, LedId::Ap);

    let modes = [0.0, 2.0, 2.0, 0.0, 2.0, 0.0, 0.0, 2.0];
    for mode in modes {
        sim.set(AP_MODE, Sample::Number(mode));
        engine.tick();
    }

    // The indicator starts Unknown, which behaves as off.
    let states: Vec<bool> = std::iter::once(false)
        .chain(modes.iter().map(|m| *m == 2.0))
        .collect();
    let rising = states.windows(2).filter(|w| !w[0] && w[1]).count();
    let falling = states.windows(2).filter(|w| w[0] && !w[1]).count();
    assert_eq!(on.load(Ordering::SeqCst), rising);
    assert_eq!(off.load(Ordering::SeqCst), falling);
}

#[test]
fn never_lit_indicator_stays_unknown() {
    let sim = cockpit_sim();
    sim.set(AP_MODE, Sample::Number(0.0));
    let (engine, _bank) = engine_with_bank(&sim);
    engine.select_profile("A320").unwrap();
    let (on, off) = counting(&engine, LedId::Ap);

    engine.tick();
    engine.tick();
    assert_eq!(on.load(Ordering::SeqCst), 0);
    assert_eq!(off.load(Ordering::SeqCst), 0);
    assert_eq!(engine.indicator_state(LedId::Ap), LedState::Unknown);
}

#[test]
fn missing_telemetry_reads_false() {
    let sim = cockpit_sim();
    let (engine, bank) = engine_with_bank(&sim);
    engine.select_profile("A320").unwrap();
    engine.tick();
    assert!(bank.is_on(LedId::Ap));

    sim.set_offline(true);
    let report = engine.tick();
    assert!(report.missing > 0);
    assert_eq!(report.deactivated, 3);
    assert_eq!(bank.bytes(), [0; 4]);

    sim.set_offline(false);
    assert_eq!(engine.tick().activated, 3);
}

#[test]
fn unknown_dataref_is_missing_not_fatal() {
    let sim = Arc::new(MockSim::new().with_dataref(PARKING_BRAKE, Sample::Number(1.0)));
    let (engine, bank) = engine_with_bank(&sim);
    engine.select_profile("A320").unwrap();

    let active = engine.active_profile().unwrap();
    assert!(active.unresolved().iter().any(|name| name == BUS_VOLTS));

    // bus_voltage can't be read, so the gate closes every indicator.
    let report = engine.tick();
    assert_eq!(report.activated, 0);
    assert_eq!(bank.bytes(), [0; 4]);
}

#[test]
fn rejected_reload_keeps_previous_profile() {
    let sim = cockpit_sim();
    let (engine, _bank) = engine_with_bank(&sim);
    engine.select_profile("C172").unwrap();

    let broken = Profile::from_yaml(&A320_YAML.replace("autopilot_mode == 2", "autopilot_mode ==")).unwrap();
    let err = engine.reload_profile(broken).unwrap_err();
    assert!(err.is_load_error());
    assert_eq!(engine.active_profile_name().as_deref(), Some("Cessna 172"));

    let unknown_var = Profile::from_yaml(&A320_YAML.replace("autopilot_mode == 2", "ap_mode == 2")).unwrap();
    assert!(matches!(
        engine.reload_profile(unknown_var),
        Err(BravoError::UnknownVariable { .. })
    ));
    assert_eq!(engine.active_profile_name().as_deref(), Some("Cessna 172"));
}

#[test]
fn selects_for_loaded_aircraft() {
    let sim = cockpit_sim();
    sim.set(ICAO_DATAREF, Sample::Text("B738".to_string()));
    sim.set(UI_NAME_DATAREF, Sample::Text("Cessna 172 SP Skyhawk".to_string()));
    let (engine, _bank) = engine_with_bank(&sim);

    // No profile for the ICAO code, so the UI name decides.
    assert_eq!(engine.select_for_loaded_aircraft().unwrap(), "Cessna 172");

    sim.set(ICAO_DATAREF, Sample::Text("A320".to_string()));
    assert_eq!(engine.select_for_loaded_aircraft().unwrap(), "Airbus A320");
}

#[test]
fn selection_miss_keeps_active_profile() {
    let sim = cockpit_sim();
    let (engine, _bank) = engine_with_bank(&sim);
    engine.select_profile("A320").unwrap();

    assert!(matches!(
        engine.select_profile("B738"),
        Err(BravoError::NoMatchingProfile { .. })
    ));
    assert_eq!(engine.active_profile_name().as_deref(), Some("Airbus A320"));
}

#[test]
fn shutdown_turns_lit_indicators_off() {
    let sim = cockpit_sim();
    let (engine, bank) = engine_with_bank(&sim);
    engine.select_profile("A320").unwrap();
    engine.tick();
    assert_ne!(bank.bytes(), [0; 4]);

    engine.shutdown();
    assert_eq!(bank.bytes(), [0; 4]);
    assert!(engine.tick().skipped);
    engine.shutdown();
}

#[test]
fn profile_switch_drops_indicators_the_new_profile_lacks() {
    let sim = cockpit_sim();
    let (engine, bank) = engine_with_bank(&sim);
    engine.select_profile("A320").unwrap();
    engine.tick();
    assert!(bank.is_on(LedId::Ap));

    engine.reload_profile(Profile::from_yaml(C172_YAML).unwrap()).unwrap();
    engine.tick();
    assert!(!bank.is_on(LedId::Ap));
    assert!(bank.is_on(LedId::ParkingBrake));
}
