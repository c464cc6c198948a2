//! Ticks and input racing profile reloads.

use std::sync::Arc;
use std::thread;

use bravo::engine::{ClickKind, Direction, Engine};
use bravo::panel::LedBank;
use bravo::profile::{ButtonId, KnobId, Profile, ProfileStore};

use crate::common::fixtures::{A320_YAML, C172_YAML, ProfilesFixture, cockpit_sim};

#[test]
fn interleaved_ticks_and_input_never_see_a_torn_profile() {
    let sim = cockpit_sim();
    let fixture = ProfilesFixture::standard();
    let store = ProfileStore::load_dir(fixture.path()).unwrap();

    let engine = Arc::new(Engine::new(sim.clone()));
    engine.set_catalog(store.profiles().to_vec());
    let bank = LedBank::new();
    engine.bind_outputs(bank.bindings());
    engine.select_profile("A320").unwrap();

    let a320 = Profile::from_yaml(A320_YAML).unwrap();
    let c172 = Profile::from_yaml(C172_YAML).unwrap();
    let names = ["Airbus A320", "Cessna 172"];

    thread::scope(|scope| {
        let ticker = scope.spawn(|| {
            for _ in 0..100 {
                let report = engine.tick();
                assert!(!report.skipped);
                let active = engine.active_profile().unwrap();
                assert!(names.contains(&active.name()));
            }
        });

        let presser = scope.spawn(|| {
            for i in 0..100 {
                let report = engine.on_button(ButtonId::Hdg, ClickKind::Single);
                assert!(report.failed == 0);
                let direction = if i % 2 == 0 { Direction::Up } else { Direction::Down };
                let report = engine.on_knob(KnobId::ApHdg, direction, 1);
                assert!(report.failed == 0);
            }
        });

        let reloader = scope.spawn(|| {
            for i in 0..100 {
                let profile = if i % 2 == 0 { c172.clone() } else { a320.clone() };
                engine.reload_profile(profile).unwrap();
            }
        });

        ticker.join().unwrap();
        presser.join().unwrap();
        reloader.join().unwrap();
    });

    // The last reload installed the A320 profile.
    assert_eq!(engine.active_profile_name().as_deref(), Some("Airbus A320"));
    engine.tick();
    assert_eq!(bank.bytes(), [128, 0b0001_0101, 0, 2]);

    // Every profile the engine held was whole: its compiled view matches its source.
    let active = engine.active_profile().unwrap();
    assert_eq!(active.profile(), &a320);
}
