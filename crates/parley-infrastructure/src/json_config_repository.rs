//! JSON-file-backed ConfigRepository implementation.

use crate::paths::ParleyPaths;
use parley_core::error::{ParleyError, Result};
use parley_core::persona::Persona;
use parley_core::preset::PresetTable;
use parley_core::repository::ConfigRepository;
use parley_core::scene::Scene;
use parley_core::user::UserConfig;
use std::path::Path;

/// Reads persona, user, scene, and preset data from the layout described by
/// [`ParleyPaths`].
#[derive(Debug, Clone)]
pub struct JsonConfigRepository {
    paths: ParleyPaths,
}

impl JsonConfigRepository {
    pub fn new(paths: ParleyPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ParleyPaths {
        &self.paths
    }
}

/// Reads a whole configuration file, mapping every failure to `Configuration`.
async fn read_source(kind: &str, path: &Path) -> Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ParleyError::config(format!(
            "{kind} file not found at {}",
            path.display()
        ))),
        Err(e) => Err(ParleyError::config(format!(
            "failed to read {kind} file at {}: {e}",
            path.display()
        ))),
    }
}

/// Prefixes a configuration error with the offending file.
fn at_path(path: &Path) -> impl FnOnce(ParleyError) -> ParleyError + '_ {
    move |err| match err {
        ParleyError::Configuration(message) => {
            ParleyError::config(format!("{message} ({})", path.display()))
        }
        other => other,
    }
}

#[async_trait::async_trait]
impl ConfigRepository for JsonConfigRepository {
    async fn load_persona(&self, name: &str) -> Result<Persona> {
        if name.trim().is_empty() || name.contains(['/', '\\']) || name == ".." {
            return Err(ParleyError::config(format!("invalid persona name '{name}'")));
        }

        let path = self.paths.persona_file(name);
        tracing::debug!(persona = name, path = %path.display(), "Loading persona");
        let content = read_source("persona", &path).await?;
        Persona::from_json_str(&content).map_err(at_path(&path))
    }

    async fn load_user(&self) -> Result<UserConfig> {
        let path = self.paths.user_config_file();
        let content = read_source("user config", &path).await?;
        UserConfig::from_json_str(&content).map_err(at_path(&path))
    }

    async fn load_scene(&self) -> Result<Scene> {
        let path = self.paths.scene_file();
        let content = read_source("scene", &path).await?;
        Scene::from_json_str(&content).map_err(at_path(&path))
    }

    async fn load_presets(&self) -> Result<PresetTable> {
        let path = self.paths.presets_file();
        let content = read_source("preset store", &path).await?;
        let table = PresetTable::from_json_str(&content).map_err(at_path(&path))?;
        tracing::debug!(presets = ?table.names(), "Loaded preset store");
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn repository(dir: &TempDir) -> JsonConfigRepository {
        JsonConfigRepository::new(ParleyPaths::new(Some(dir.path())).unwrap())
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_loads_all_sources() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);
        let paths = repo.paths().clone();

        write(
            &paths.persona_file("mira"),
            r#"{"core_identity": {"name": "Mira", "birthday": "1994-03-02", "sex": "female",
                "race": "human", "lat": 47.6, "lon": -122.3}}"#,
        );
        write(
            &paths.user_config_file(),
            r#"{"user_data": {"name": "Ada", "birthday": "1990-12-10", "sex": "female",
                "race": "human", "lat": 51.5, "lon": -0.1}}"#,
        );
        write(
            &paths.scene_file(),
            r#"{"setting": "cafe", "relationship": "friends", "tone": "warm"}"#,
        );
        write(&paths.presets_file(), r#"{"realism": {"temperature": 0.8}}"#);

        assert_eq!(repo.load_persona("mira").await.unwrap().name(), "Mira");
        assert_eq!(repo.load_user().await.unwrap().user_data.name, "Ada");
        assert_eq!(repo.load_scene().await.unwrap().tone, "warm");
        assert_eq!(repo.load_presets().await.unwrap().names(), vec!["realism"]);
    }

    #[tokio::test]
    async fn test_missing_files_are_configuration_errors() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);

        assert!(repo.load_persona("ghost").await.unwrap_err().is_config());
        assert!(repo.load_user().await.unwrap_err().is_config());
        assert!(repo.load_scene().await.unwrap_err().is_config());
        assert!(repo.load_presets().await.unwrap_err().is_config());
    }

    #[tokio::test]
    async fn test_malformed_file_names_path() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);
        write(&repo.paths().scene_file(), "{ not json");

        let err = repo.load_scene().await.unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("scene.json"));
    }

    #[tokio::test]
    async fn test_rejects_path_like_persona_names() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);

        assert!(repo.load_persona("../etc").await.unwrap_err().is_config());
        assert!(repo.load_persona("").await.unwrap_err().is_config());
    }
}
