//! Profiles folder resolution.
//!
//! Candidates are tried in order: explicit flag, `BRAVO_PROFILES_DIR`,
//! the remembered settings value, `profiles/` beside the executable (or
//! beside its `.app` bundle), then `./profiles`.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{BravoError, Result};
use crate::profile::store::is_profile_file;

pub const PROFILES_DIR_ENV: &str = "BRAVO_PROFILES_DIR";
pub const PROFILES_FOLDER_NAME: &str = "profiles";

/// Resolve the user's home directory (cross-platform).
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .ok_or_else(|| BravoError::ConfigParse("Could not determine home directory".to_string()))
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> Result<PathBuf> {
    let text = path.to_string_lossy();
    if text == "~" {
        return home_dir();
    }
    if let Some(rest) = text.strip_prefix("~/") {
        return Ok(home_dir()?.join(rest));
    }
    Ok(path.to_path_buf())
}

/// Make `path` absolute and lexically clean. Blank input gives `None`.
pub fn normalize_dir(path: &Path) -> Option<PathBuf> {
    if path.as_os_str().to_string_lossy().trim().is_empty() {
        return None;
    }
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    let mut clean = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !clean.pop() {
                    clean.push(component);
                }
            }
            other => clean.push(other),
        }
    }
    Some(clean)
}

/// True if `dir` exists and holds at least one `.yaml` file.
pub fn is_valid_profiles_dir(dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    entries
        .filter_map(std::result::Result::ok)
        .any(|entry| entry.path().is_file() && is_profile_file(&entry.path()))
}

/// `profiles/` next to the executable, or next to the enclosing `.app`
/// bundle when the binary lives inside one.
pub fn sibling_profiles_dir(executable: &Path) -> Option<PathBuf> {
    let exe_dir = executable.parent()?;
    let bundle = exe_dir
        .ancestors()
        .find(|dir| dir.extension().is_some_and(|ext| ext == "app"));

    let base = match bundle {
        Some(bundle) => bundle.parent()?,
        None => exe_dir,
    };
    Some(base.join(PROFILES_FOLDER_NAME))
}

/// Inputs to [`resolve_profiles_dir`], gathered by the caller.
#[derive(Debug, Default, Clone)]
pub struct ProfilesDirCandidates {
    pub cli: Option<PathBuf>,
    pub env: Option<PathBuf>,
    pub settings: Option<PathBuf>,
    pub executable: Option<PathBuf>,
    pub cwd: Option<PathBuf>,
}

impl ProfilesDirCandidates {
    /// Fill the environment, executable and working-directory candidates
    /// from the running process.
    pub fn from_process(cli: Option<PathBuf>, settings: Option<PathBuf>) -> Self {
        Self {
            cli,
            env: std::env::var_os(PROFILES_DIR_ENV).map(PathBuf::from),
            settings,
            executable: std::env::current_exe().ok(),
            cwd: std::env::current_dir().ok(),
        }
    }

    fn ordered(&self) -> Vec<(&'static str, PathBuf)> {
        let mut out = Vec::new();
        let explicit = [
            ("cli", &self.cli),
            ("env", &self.env),
            ("settings", &self.settings),
        ];
        for (source, dir) in explicit {
            if let Some(dir) = dir {
                out.push((source, expand_home(dir).unwrap_or_else(|_| dir.clone())));
            }
        }
        if let Some(dir) = self.executable.as_deref().and_then(sibling_profiles_dir) {
            out.push(("executable", dir));
        }
        if let Some(cwd) = &self.cwd {
            out.push(("cwd", cwd.join(PROFILES_FOLDER_NAME)));
        }
        out
    }
}

/// First valid profiles folder among the candidates.
pub fn resolve_profiles_dir(candidates: &ProfilesDirCandidates) -> Result<PathBuf> {
    for (source, dir) in candidates.ordered() {
        let Some(dir) = normalize_dir(&dir) else {
            continue;
        };
        trace!(source, dir = %dir.display(), "Trying profiles folder");
        if is_valid_profiles_dir(&dir) {
            debug!(source, dir = %dir.display(), "Resolved profiles folder");
            return Ok(dir);
        }
    }

    // An explicit folder that fails validation is reported by name.
    if let Some(dir) = candidates.cli.as_ref() {
        return Err(BravoError::ProfilesDirNotFound {
            path: dir.display().to_string(),
        });
    }
    Err(BravoError::ProfilesDirUnresolved)
}
