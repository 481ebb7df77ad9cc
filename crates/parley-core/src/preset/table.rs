//! Keyed preset store.
//!
//! The store is a JSON object mapping preset names to preset records:
//!
//! ```json
//! {
//!   "realism": {
//!     "temperature": 0.8,
//!     "max_length": 200,
//!     "system_message": "Stay grounded and conversational."
//!   }
//! }
//! ```
//!
//! Absent fields take the defaults of [`DecodingParameters`]. Unknown fields
//! make the store malformed.

use super::model::{DecodingParameters, GenerationPreset};
use crate::error::{ParleyError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Preset table resolved once at startup.
#[derive(Debug, Clone, Default)]
pub struct PresetTable {
    presets: BTreeMap<String, Arc<GenerationPreset>>,
}

impl PresetTable {
    /// Parses a preset store.
    ///
    /// # Errors
    ///
    /// Returns `ParleyError::Configuration` when the store is not a JSON object
    /// of well-formed preset records.
    pub fn from_json_str(source: &str) -> Result<Self> {
        let records: BTreeMap<String, PresetRecord> = serde_json::from_str(source)
            .map_err(|e| ParleyError::config(format!("malformed preset store: {e}")))?;

        let presets = records
            .into_iter()
            .map(|(name, record)| {
                let preset = record.into_preset(name.clone());
                (name, Arc::new(preset))
            })
            .collect();

        Ok(Self { presets })
    }

    /// Resolves a preset by name.
    ///
    /// # Errors
    ///
    /// Returns `ParleyError::NotFound` for an unregistered name.
    pub fn resolve(&self, name: &str) -> Result<Arc<GenerationPreset>> {
        self.presets
            .get(name)
            .cloned()
            .ok_or_else(|| ParleyError::not_found("preset", name))
    }

    /// Returns the registered preset names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.presets.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

/// On-disk preset record.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PresetRecord {
    temperature: Option<f32>,
    top_k: Option<u32>,
    top_p: Option<f32>,
    repetition_penalty: Option<f32>,
    #[serde(alias = "max_length")]
    max_new_tokens: Option<u32>,
    min_length: Option<u32>,
    length_penalty: Option<f32>,
    #[serde(alias = "num_beams")]
    beam_count: Option<u32>,
    #[serde(alias = "system_message")]
    system_message_template: Option<String>,
}

impl PresetRecord {
    fn into_preset(self, name: String) -> GenerationPreset {
        let defaults = DecodingParameters::default();
        GenerationPreset {
            name,
            parameters: DecodingParameters {
                temperature: self.temperature.unwrap_or(defaults.temperature),
                top_k: self.top_k.unwrap_or(defaults.top_k),
                top_p: self.top_p.unwrap_or(defaults.top_p),
                repetition_penalty: self
                    .repetition_penalty
                    .unwrap_or(defaults.repetition_penalty),
                max_new_tokens: self.max_new_tokens.unwrap_or(defaults.max_new_tokens),
                min_length: self.min_length.unwrap_or(defaults.min_length),
                length_penalty: self.length_penalty.unwrap_or(defaults.length_penalty),
                beam_count: self.beam_count.unwrap_or(defaults.beam_count),
            },
            system_message_template: self
                .system_message_template
                .unwrap_or_else(|| GenerationPreset::DEFAULT_SYSTEM_MESSAGE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORE: &str = r#"{
        "realism": {
            "temperature": 0.8,
            "top_k": 40,
            "max_length": 200,
            "num_beams": 2,
            "system_message": "Stay grounded."
        },
        "plain": {}
    }"#;

    #[test]
    fn resolves_registered_preset_with_aliases() {
        let table = PresetTable::from_json_str(STORE).unwrap();
        let realism = table.resolve("realism").unwrap();

        assert_eq!(realism.name, "realism");
        assert_eq!(realism.parameters.temperature, 0.8);
        assert_eq!(realism.parameters.top_k, 40);
        assert_eq!(realism.parameters.max_new_tokens, 200);
        assert_eq!(realism.parameters.beam_count, 2);
        assert_eq!(realism.parameters.top_p, 0.9);
        assert_eq!(realism.system_message_template, "Stay grounded.");
    }

    #[test]
    fn empty_record_uses_defaults() {
        let table = PresetTable::from_json_str(STORE).unwrap();
        let plain = table.resolve("plain").unwrap();
        assert_eq!(plain.parameters, DecodingParameters::default());
        assert_eq!(
            plain.system_message_template,
            GenerationPreset::DEFAULT_SYSTEM_MESSAGE
        );
    }

    #[test]
    fn unknown_name_is_not_found() {
        let table = PresetTable::from_json_str(STORE).unwrap();
        let err = table.resolve("noir").unwrap_err();
        assert_eq!(err, ParleyError::not_found("preset", "noir"));
    }

    #[test]
    fn malformed_store_is_configuration_error() {
        assert!(PresetTable::from_json_str("[1, 2]").unwrap_err().is_config());
        assert!(PresetTable::from_json_str("{").unwrap_err().is_config());
        assert!(
            PresetTable::from_json_str(r#"{"x": {"temprature": 1.0}}"#)
                .unwrap_err()
                .is_config()
        );
    }

    #[test]
    fn resolved_presets_share_one_allocation() {
        let table = PresetTable::from_json_str(STORE).unwrap();
        let a = table.resolve("realism").unwrap();
        let b = table.resolve("realism").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(table.names(), vec!["plain", "realism"]);
    }
}
