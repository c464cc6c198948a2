//! Profile folder loading, saving and template creation.

use std::fs;

use bravo::config::{ProfilesDirCandidates, normalize_dir, resolve_profiles_dir};
use bravo::error::BravoError;
use bravo::profile::{LedId, Profile, ProfileStore};

use crate::common::env::{with_profiles_dir, without_profiles_dir};
use crate::common::fixtures::{A320_YAML, C172_YAML, ProfilesFixture};

#[test]
fn load_dir_sorts_and_counts() {
    let fixture = ProfilesFixture::standard();
    fs::write(fixture.file("notes.txt"), "not a profile").unwrap();
    fs::write(fixture.file("UPPER.YAML"), C172_YAML).unwrap();

    let store = ProfileStore::load_dir(fixture.path()).unwrap();
    let names: Vec<_> = store
        .files()
        .iter()
        .map(|f| f.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, ["UPPER.YAML", "a320.yaml", "c172.yaml", "default.yaml"]);

    let status = store.status();
    assert_eq!(status.profiles_count, 4);
    assert_eq!(status.profiles_dir, fixture.path());
}

#[test]
fn load_dir_reports_the_broken_file() {
    let fixture = ProfilesFixture::with_files(&[
        ("a320.yaml", A320_YAML),
        ("broken.yaml", "metadata: [unclosed"),
    ]);
    match ProfileStore::load_dir(fixture.path()) {
        Err(BravoError::ProfileParse { path, .. }) => assert!(path.ends_with("broken.yaml")),
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn load_dir_rejects_unknown_slot() {
    let yaml = A320_YAML.replace("  parking_brake:\n", "  parking_brakes:\n");
    let fixture = ProfilesFixture::with_files(&[("a320.yaml", yaml.as_str())]);
    assert!(matches!(
        ProfileStore::load_dir(fixture.path()),
        Err(BravoError::ProfileParse { .. })
    ));
}

#[test]
fn save_and_reload_round_trip() {
    let fixture = ProfilesFixture::standard();
    let mut store = ProfileStore::load_dir(fixture.path()).unwrap();
    let index = store.index_of(&fixture.file("a320.yaml")).unwrap();

    let mut profile = store.profiles()[index].clone();
    profile.metadata.description = "Edited".to_string();
    store.save_by_index(index, profile.clone()).unwrap();
    assert_eq!(store.profiles()[index], profile);

    let written = fs::read_to_string(fixture.file("a320.yaml")).unwrap();
    assert!(!written.contains("handle"));
    assert!(!written.contains("activate"));

    let reloaded = ProfileStore::load_dir(fixture.path()).unwrap();
    assert_eq!(reloaded.profiles()[index], profile);
    assert!(reloaded.profiles()[index].led(LedId::Ap).is_some());
}

#[test]
fn save_out_of_range_is_rejected() {
    let fixture = ProfilesFixture::standard();
    let mut store = ProfileStore::load_dir(fixture.path()).unwrap();
    let result = store.save_by_index(3, Profile::default());
    assert!(matches!(
        result,
        Err(BravoError::ProfileIndexOutOfRange { index: 3, len: 3 })
    ));
}

#[test]
fn create_from_default_merges_selectors_and_copies_sections() {
    let fixture = ProfilesFixture::standard();
    let mut store = ProfileStore::load_dir(fixture.path()).unwrap();
    let template = store.profiles()[store.index_of(&fixture.file("default.yaml")).unwrap()].clone();

    let selectors: Vec<String> = ["A320 Neo", "A320 Neo", "", "A320 CEO"]
        .iter()
        .map(ToString::to_string)
        .collect();
    let path = store
        .create_from_default("a320neo", "A320 Neo", "Neo variant", &selectors)
        .unwrap();
    assert_eq!(path, fixture.file("a320neo.yaml"));
    assert_eq!(store.profiles().len(), 4);

    let created = &store.profiles()[store.index_of(&path).unwrap()];
    assert_eq!(created.metadata.name, "A320 Neo");
    assert_eq!(created.metadata.description, "Neo variant");
    assert_eq!(created.metadata.selectors, ["A320 Neo", "A320 CEO"]);
    assert_eq!(created.buttons, template.buttons);
    assert_eq!(created.knobs, template.knobs);
    assert_eq!(created.leds, template.leds);
}

#[test]
fn create_requires_template_and_refuses_overwrite() {
    let fixture = ProfilesFixture::with_files(&[("a320.yaml", A320_YAML)]);
    let mut store = ProfileStore::load_dir(fixture.path()).unwrap();
    match store.create_from_default("new", "New", "", &[]) {
        Err(e @ BravoError::TemplateMissing { .. }) => assert!(e.to_string().contains("default.yaml")),
        other => panic!("expected TemplateMissing, got {other:?}"),
    }

    let fixture = ProfilesFixture::standard();
    let mut store = ProfileStore::load_dir(fixture.path()).unwrap();
    assert!(matches!(
        store.create_from_default("c172", "Dup", "", &[]),
        Err(BravoError::ProfileExists { .. })
    ));
}

#[test]
fn profiles_dir_from_environment() {
    let fixture = ProfilesFixture::standard();
    let _env = with_profiles_dir(fixture.path().to_str().unwrap());

    let candidates = ProfilesDirCandidates::from_process(None, None);
    let resolved = resolve_profiles_dir(&candidates).unwrap();
    assert_eq!(resolved, normalize_dir(fixture.path()).unwrap());
}

#[test]
fn cli_flag_beats_environment() {
    let from_env = ProfilesFixture::standard();
    let from_flag = ProfilesFixture::with_files(&[("c172.yaml", C172_YAML)]);
    let _env = with_profiles_dir(from_env.path().to_str().unwrap());

    let candidates = ProfilesDirCandidates::from_process(Some(from_flag.path().to_path_buf()), None);
    assert_eq!(
        resolve_profiles_dir(&candidates).unwrap(),
        normalize_dir(from_flag.path()).unwrap()
    );
}

#[test]
fn settings_dir_used_without_environment() {
    let fixture = ProfilesFixture::standard();
    let _env = without_profiles_dir();

    let candidates = ProfilesDirCandidates::from_process(None, Some(fixture.path().to_path_buf()));
    assert_eq!(
        resolve_profiles_dir(&candidates).unwrap(),
        normalize_dir(fixture.path()).unwrap()
    );
}
