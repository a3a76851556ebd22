//! Persisted operator preferences.
//!
//! A single JSON object, `{"last_location": "<dir>"}`, stored under the
//! user's config directory. Reads never fail: a missing or unreadable file
//! yields the caller's default.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "psampler";
const FILE_NAME: &str = "preferences.json";
const FALLBACK_DIR: &str = "process-logs";

#[derive(Debug)]
pub enum PreferenceError {
    Io(io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for PreferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreferenceError::Io(e) => write!(f, "IO error: {}", e),
            PreferenceError::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for PreferenceError {}

impl From<io::Error> for PreferenceError {
    fn from(e: io::Error) -> Self {
        PreferenceError::Io(e)
    }
}

impl From<serde_json::Error> for PreferenceError {
    fn from(e: serde_json::Error) -> Self {
        PreferenceError::Json(e)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferenceFile {
    #[serde(default)]
    last_location: Option<String>,
}

/// Handle to the preference file at a fixed path.
#[derive(Debug, Clone)]
pub struct Preferences {
    path: PathBuf,
}

impl Preferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Preferences at the per-user default path.
    pub fn open_default() -> Self {
        Self::new(Self::default_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `$XDG_CONFIG_HOME/psampler/preferences.json`, else
    /// `$HOME/.config/psampler/preferences.json`.
    pub fn default_path() -> PathBuf {
        let xdg = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from);
        let home = std::env::var_os("HOME").map(PathBuf::from);
        default_path_in(xdg.as_deref(), home.as_deref())
    }

    /// Location offered when no preference has been stored.
    pub fn fallback_location() -> PathBuf {
        let home = std::env::var_os("HOME").map(PathBuf::from);
        fallback_location_in(home.as_deref())
    }

    /// Stored location, if the file holds a string under `last_location`.
    pub fn last_location(&self) -> Option<PathBuf> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No preferences at {}: {}", self.path.display(), e);
                return None;
            }
        };
        match serde_json::from_str::<PreferenceFile>(&content) {
            Ok(file) => file.last_location.map(PathBuf::from),
            Err(e) => {
                debug!("Ignoring unreadable preferences {}: {}", self.path.display(), e);
                None
            }
        }
    }

    pub fn last_location_or(&self, default: impl Into<PathBuf>) -> PathBuf {
        self.last_location().unwrap_or_else(|| default.into())
    }

    /// Overwrites the preference file with `location`.
    pub fn set_last_location(&self, location: &Path) -> Result<(), PreferenceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = PreferenceFile {
            last_location: Some(location.to_string_lossy().into_owned()),
        };
        fs::write(&self.path, serde_json::to_string(&file)?)?;
        debug!("Saved last location {} to {}", location.display(), self.path.display());
        Ok(())
    }
}

fn default_path_in(xdg_config_home: Option<&Path>, home: Option<&Path>) -> PathBuf {
    let base = match (xdg_config_home, home) {
        (Some(xdg), _) if !xdg.as_os_str().is_empty() => xdg.to_path_buf(),
        (_, Some(home)) => home.join(".config"),
        _ => PathBuf::from(".config"),
    };
    base.join(APP_DIR).join(FILE_NAME)
}

fn fallback_location_in(home: Option<&Path>) -> PathBuf {
    match home {
        Some(home) if !home.as_os_str().is_empty() => home.join("Desktop").join(FALLBACK_DIR),
        _ => PathBuf::from(".").join(FALLBACK_DIR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempdir().unwrap();
        let prefs = Preferences::new(dir.path().join("preferences.json"));
        assert_eq!(prefs.last_location(), None);
        assert_eq!(prefs.last_location_or("/tmp/x"), PathBuf::from("/tmp/x"));
    }

    #[test]
    fn test_corrupt_file_falls_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        let prefs = Preferences::new(&path);

        fs::write(&path, "{not json").unwrap();
        assert_eq!(prefs.last_location(), None);

        fs::write(&path, r#"{"last_location": 42}"#).unwrap();
        assert_eq!(prefs.last_location(), None);

        fs::write(&path, r#"{"other": "value"}"#).unwrap();
        assert_eq!(prefs.last_location(), None);
    }

    #[test]
    fn test_set_then_get() {
        let dir = tempdir().unwrap();
        let prefs = Preferences::new(dir.path().join("nested").join("preferences.json"));

        prefs.set_last_location(Path::new("/var/log/samples")).unwrap();
        assert_eq!(
            prefs.last_location(),
            Some(PathBuf::from("/var/log/samples"))
        );

        prefs.set_last_location(Path::new("/srv/other")).unwrap();
        assert_eq!(prefs.last_location_or("/unused"), PathBuf::from("/srv/other"));

        let raw = fs::read_to_string(prefs.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["last_location"], "/srv/other");
    }

    #[test]
    fn test_set_fails_when_parent_is_file() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let prefs = Preferences::new(blocker.join("preferences.json"));

        let err = prefs.set_last_location(Path::new("/tmp")).unwrap_err();
        assert!(matches!(err, PreferenceError::Io(_)));
    }

    #[test]
    fn test_default_path() {
        assert_eq!(
            default_path_in(Some(Path::new("/xdg")), Some(Path::new("/home/u"))),
            PathBuf::from("/xdg/psampler/preferences.json")
        );
        assert_eq!(
            default_path_in(None, Some(Path::new("/home/u"))),
            PathBuf::from("/home/u/.config/psampler/preferences.json")
        );
        assert_eq!(
            default_path_in(Some(Path::new("")), Some(Path::new("/home/u"))),
            PathBuf::from("/home/u/.config/psampler/preferences.json")
        );
    }

    #[test]
    fn test_fallback_location() {
        assert_eq!(
            fallback_location_in(Some(Path::new("/home/u"))),
            PathBuf::from("/home/u/Desktop/process-logs")
        );
        assert_eq!(fallback_location_in(None), PathBuf::from("./process-logs"));
    }
}
