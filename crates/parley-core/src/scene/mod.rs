//! Scene the conversation takes place in.

use crate::error::{ParleyError, Result};
use serde::{Deserialize, Serialize};

/// Setting, cast, and tone of the conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub setting: String,
    /// Replaced with `[user, persona]` when the preamble is assembled
    #[serde(default)]
    pub characters: Vec<String>,
    pub relationship: String,
    pub tone: String,
}

impl Scene {
    /// Parses `config/scene.json`.
    pub fn from_json_str(source: &str) -> Result<Self> {
        serde_json::from_str(source).map_err(|e| ParleyError::config(format!("malformed scene: {e}")))
    }

    /// Returns a copy with the cast set to the given names.
    pub fn with_characters(&self, characters: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            characters: characters.into_iter().map(Into::into).collect(),
            ..self.clone()
        }
    }

    pub fn to_prompt_block(&self) -> String {
        format!(
            "Setting: {}\nCharacters: {}\nRelationship: {}\nTone: {}",
            self.setting,
            self.characters.join(", "),
            self.relationship,
            self.tone
        )
    }
}
