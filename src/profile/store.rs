//! Profile folder management.
//!
//! A profiles folder is a flat directory of `.yaml` files. Files are loaded
//! in file-name order, which is also the order profile selection walks.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::schema::{Metadata, Profile};
use super::selector::merge_selectors;
use crate::error::{BravoError, Result};

/// File name of the template used by [`ProfileStore::create_from_default`].
pub const TEMPLATE_FILE: &str = "default.yaml";

/// Whether `path` names a profile file (`.yaml`, any case).
pub fn is_profile_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml"))
}

/// Summary of the loaded folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfilesStatus {
    pub profiles_dir: PathBuf,
    pub profiles_count: usize,
}

/// Profiles loaded from one folder, with the file each came from.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    dir: PathBuf,
    profiles: Vec<Profile>,
    files: Vec<PathBuf>,
}

impl ProfileStore {
    /// Load every profile in `dir`.
    ///
    /// Fails when the folder can't be read, holds no `.yaml` files, or any
    /// file fails to parse.
    #[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let files = profile_files(dir)?;

        let profiles = files
            .iter()
            .map(|path| read_profile(path))
            .collect::<Result<Vec<_>>>()?;

        info!(count = profiles.len(), "Loaded profiles");

        Ok(Self {
            dir: dir.to_path_buf(),
            profiles,
            files,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn status(&self) -> ProfilesStatus {
        ProfilesStatus {
            profiles_dir: self.dir.clone(),
            profiles_count: self.profiles.len(),
        }
    }

    /// Position of the profile loaded from `path`.
    pub fn index_of(&self, path: &Path) -> Option<usize> {
        self.files.iter().position(|file| file == path)
    }

    /// Overwrite the profile at `index` on disk and in memory.
    #[instrument(skip(self, profile), fields(name = %profile.name()))]
    pub fn save_by_index(&mut self, index: usize, profile: Profile) -> Result<()> {
        if index >= self.profiles.len() || index >= self.files.len() {
            return Err(BravoError::ProfileIndexOutOfRange {
                index,
                len: self.profiles.len(),
            });
        }

        let path = &self.files[index];
        write_profile(path, &profile)?;
        debug!(path = %path.display(), "Saved profile");

        self.profiles[index] = profile;
        Ok(())
    }

    /// Create `<file_stem>.yaml` from the folder's `default.yaml` template.
    ///
    /// Every section except metadata is copied verbatim from the template.
    /// The new metadata carries `name`, `description` and the given
    /// selectors, trimmed and deduplicated. The folder is reloaded so the
    /// new profile takes its place in file-name order.
    #[instrument(skip(self, description, selectors))]
    pub fn create_from_default(
        &mut self,
        file_stem: &str,
        name: &str,
        description: &str,
        selectors: &[String],
    ) -> Result<PathBuf> {
        let template_path = self.dir.join(TEMPLATE_FILE);
        let template = self
            .index_of(&template_path)
            .map(|index| self.profiles[index].clone())
            .ok_or_else(|| BravoError::TemplateMissing {
                dir: self.dir.display().to_string(),
            })?;

        let stem = file_stem.trim().trim_end_matches(".yaml");
        if stem.is_empty() || stem.contains(['/', '\\']) {
            return Err(BravoError::Other(format!(
                "Invalid profile file name '{file_stem}'"
            )));
        }

        let path = self.dir.join(format!("{stem}.yaml"));
        if path.exists() {
            return Err(BravoError::ProfileExists {
                path: path.display().to_string(),
            });
        }

        let profile = Profile {
            metadata: Metadata {
                name: name.trim().to_string(),
                description: description.trim().to_string(),
                selectors: merge_selectors(&[], selectors),
            },
            ..template
        };

        write_profile(&path, &profile)?;
        info!(path = %path.display(), "Created profile from template");

        *self = Self::load_dir(&self.dir)?;
        Ok(path)
    }
}

/// Profile files directly inside `dir`, sorted by file name.
pub fn profile_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            BravoError::ProfilesDirNotFound {
                path: dir.display().to_string(),
            }
        } else {
            BravoError::Io(e)
        }
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_profile_file(path))
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    if files.is_empty() {
        return Err(BravoError::NoProfilesInDir {
            path: dir.display().to_string(),
        });
    }
    Ok(files)
}

/// Parse one profile file.
pub fn read_profile(path: &Path) -> Result<Profile> {
    let content = fs::read_to_string(path)?;
    Profile::from_yaml(&content).map_err(|e| {
        warn!(path = %path.display(), error = %e, "Profile failed to parse");
        BravoError::ProfileParse {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
    })
}

fn write_profile(path: &Path, profile: &Profile) -> Result<()> {
    let yaml = profile
        .to_yaml()
        .map_err(|e| BravoError::Other(format!("Failed to serialize profile: {e}")))?;
    fs::write(path, yaml)?;
    Ok(())
}
