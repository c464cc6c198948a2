//! Selector matching across a loaded profiles folder.

use bravo::error::BravoError;
use bravo::profile::selector::profile_matches;
use bravo::profile::{ProfileStore, select_profile};

use crate::common::fixtures::{C172_YAML, DEFAULT_YAML, ProfilesFixture};
use crate::common::init_test_logging;

#[test]
fn selection_picks_first_matching_file() {
    init_test_logging();
    let fixture = ProfilesFixture::standard();
    let store = ProfileStore::load_dir(fixture.path()).unwrap();

    let index = select_profile(store.profiles(), "A320").unwrap();
    assert_eq!(store.profiles()[index].name(), "Airbus A320");
    assert_eq!(store.files()[index], fixture.file("a320.yaml"));

    let index = select_profile(store.profiles(), "  cessna 172 sp ").unwrap();
    assert_eq!(store.profiles()[index].name(), "Cessna 172");
}

#[test]
fn selection_holds_iff_property() {
    let fixture = ProfilesFixture::standard();
    let store = ProfileStore::load_dir(fixture.path()).unwrap();
    let profiles = store.profiles();

    for identity in ["A320", "A320 Neo", "C172", "Cessna 172 SP", "B738", "", "a3"] {
        match select_profile(profiles, identity) {
            Ok(index) => {
                assert!(profile_matches(&profiles[index], identity));
                assert!(
                    profiles[..index].iter().all(|p| !profile_matches(p, identity)),
                    "an earlier profile also matches '{identity}'"
                );
            }
            Err(BravoError::NoMatchingProfile { identity: reported }) => {
                assert_eq!(reported, identity);
                assert!(profiles.iter().all(|p| !profile_matches(p, identity)));
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
}

#[test]
fn ties_resolve_in_file_name_order() {
    let fixture = ProfilesFixture::with_files(&[
        ("b_second.yaml", C172_YAML),
        ("a_first.yaml", C172_YAML.replace("Cessna 172\n", "Cessna 172 (tweaked)\n").as_str()),
    ]);
    let store = ProfileStore::load_dir(fixture.path()).unwrap();

    let index = select_profile(store.profiles(), "C172").unwrap();
    assert_eq!(index, 0);
    assert_eq!(store.files()[0], fixture.file("a_first.yaml"));
    assert_eq!(store.profiles()[0].name(), "Cessna 172 (tweaked)");
}

#[test]
fn template_without_selectors_never_matches() {
    let fixture = ProfilesFixture::with_files(&[("default.yaml", DEFAULT_YAML)]);
    let store = ProfileStore::load_dir(fixture.path()).unwrap();

    assert!(matches!(
        select_profile(store.profiles(), "Default"),
        Err(BravoError::NoMatchingProfile { .. })
    ));
}
