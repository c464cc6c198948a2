//! User settings and profiles folder discovery.

pub mod path;
mod settings;

pub use path::{
    ProfilesDirCandidates, home_dir, is_valid_profiles_dir, normalize_dir, resolve_profiles_dir,
    sibling_profiles_dir,
};
pub use settings::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, Settings};
