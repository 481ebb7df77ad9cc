//! Unified path management for parley data and configuration files.

use parley_core::error::{ParleyError, Result};
use std::path::{Path, PathBuf};

/// Path layout rooted at one data directory.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/parley/            # Root (overridable with --config-dir)
/// ├── config.toml              # Application settings
/// ├── config/
/// │   ├── config.json          # User profile and feature toggles
/// │   ├── scene.json           # Scene template
/// │   └── presets.json         # Generation presets
/// ├── persona/
/// │   └── <name>/<name>.json   # One directory per persona
/// ├── sessions/                # Append-only session logs (JSONL)
/// └── logs/                    # Application logs
///     └── parley.log.YYYY-MM-DD
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParleyPaths {
    root: PathBuf,
}

impl ParleyPaths {
    /// Creates a path layout rooted at `base_dir`, or at the platform config
    /// directory when `None`.
    ///
    /// # Errors
    ///
    /// Returns `ParleyError::Configuration` when no base directory is given and
    /// the platform config directory cannot be determined.
    pub fn new(base_dir: Option<&Path>) -> Result<Self> {
        let root = match base_dir {
            Some(dir) => dir.to_path_buf(),
            None => dirs::config_dir()
                .ok_or_else(|| ParleyError::config("Cannot find config directory"))?
                .join("parley"),
        };
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the path to `config.toml`.
    pub fn app_config_file(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn persona_file(&self, name: &str) -> PathBuf {
        self.root
            .join("persona")
            .join(name)
            .join(format!("{name}.json"))
    }

    pub fn user_config_file(&self) -> PathBuf {
        self.config_dir().join("config.json")
    }

    pub fn scene_file(&self) -> PathBuf {
        self.config_dir().join("scene.json")
    }

    pub fn presets_file(&self) -> PathBuf {
        self.config_dir().join("presets.json")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    fn config_dir(&self) -> PathBuf {
        self.root.join("config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_root() {
        if let Ok(paths) = ParleyPaths::new(None) {
            assert!(paths.root().ends_with("parley"));
        }
    }

    #[test]
    fn test_layout_under_override() {
        let paths = ParleyPaths::new(Some(Path::new("/tmp/parley-test"))).unwrap();

        assert_eq!(paths.app_config_file(), Path::new("/tmp/parley-test/config.toml"));
        assert_eq!(
            paths.persona_file("mira"),
            Path::new("/tmp/parley-test/persona/mira/mira.json")
        );
        assert_eq!(
            paths.user_config_file(),
            Path::new("/tmp/parley-test/config/config.json")
        );
        assert!(paths.scene_file().ends_with("config/scene.json"));
        assert!(paths.presets_file().ends_with("config/presets.json"));
        assert!(paths.sessions_dir().starts_with(paths.root()));
        assert!(paths.logs_dir().ends_with("logs"));
    }
}
