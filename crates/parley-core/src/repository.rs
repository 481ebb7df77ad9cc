//! Configuration source contract.
//!
//! Persona, user, scene, and preset data are read once before a session is
//! created. Storage details (directory layout, file format) belong to the
//! implementation in `parley-infrastructure`.

use crate::error::Result;
use crate::persona::Persona;
use crate::preset::PresetTable;
use crate::scene::Scene;
use crate::user::UserConfig;
use async_trait::async_trait;

/// Read-only access to the data a session is configured from.
///
/// # Implementation Notes
///
/// Every method fails with `ParleyError::Configuration` when its source is
/// missing or malformed.
#[async_trait]
pub trait ConfigRepository: Send + Sync {
    /// Loads the persona registered under `name`.
    async fn load_persona(&self, name: &str) -> Result<Persona>;

    /// Loads the user profile and feature toggles.
    async fn load_user(&self) -> Result<UserConfig>;

    /// Loads the scene template.
    async fn load_scene(&self) -> Result<Scene>;

    /// Loads every generation preset.
    async fn load_presets(&self) -> Result<PresetTable>;
}
