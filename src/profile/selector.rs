//! Aircraft-to-profile matching.
//!
//! A profile matches when one of its selectors is a case-insensitive
//! substring of the aircraft identity (ICAO code or UI name). The first
//! match in directory order wins.

use std::collections::HashSet;

use tracing::{debug, instrument};

use super::schema::Profile;
use crate::error::{BravoError, Result};

/// Trim and case-fold a selector or identity for comparison.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Whether `selector` matches `identity`. Blank selectors never match.
pub fn matches(selector: &str, identity: &str) -> bool {
    let needle = normalize(selector);
    !needle.is_empty() && identity.to_lowercase().contains(&needle)
}

/// Whether any selector of `profile` matches `identity`.
pub fn profile_matches(profile: &Profile, identity: &str) -> bool {
    profile
        .selectors()
        .iter()
        .any(|selector| matches(selector, identity))
}

/// Index of the first profile whose selectors match `identity`.
#[instrument(level = "debug", skip(profiles), fields(count = profiles.len()))]
pub fn select_profile(profiles: &[Profile], identity: &str) -> Result<usize> {
    let found = profiles
        .iter()
        .position(|profile| profile_matches(profile, identity));

    match found {
        Some(index) => {
            debug!(index, name = %profiles[index].name(), "Selected profile");
            Ok(index)
        }
        None => Err(BravoError::NoMatchingProfile {
            identity: identity.to_string(),
        }),
    }
}

/// Concatenate two selector lists, dropping blanks and duplicates.
///
/// Values are trimmed; duplicates are detected on the normalized form and
/// the first-seen spelling is kept.
pub fn merge_selectors(existing: &[String], incoming: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    existing
        .iter()
        .chain(incoming)
        .map(|selector| selector.trim())
        .filter(|selector| !selector.is_empty())
        .filter(|selector| seen.insert(normalize(selector)))
        .map(str::to_string)
        .collect()
}
