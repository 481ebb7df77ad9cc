//! Persona domain model.
//!
//! A persona describes the character the assistant plays. Only the core
//! identity is required; every other section is a free-form object that is
//! rendered into the preamble key by key.

use crate::error::{ParleyError, Result};
use crate::prompt::render::{capitalize, push_section, render_value};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Required identity of a persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreIdentity {
    pub name: String,
    pub birthday: String,
    pub sex: String,
    pub race: String,
    /// Latitude used for the weather lookup
    pub lat: f64,
    /// Longitude used for the weather lookup
    pub lon: f64,
}

/// Background of a persona; only `relationships` is rendered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonaHistory {
    #[serde(default)]
    pub relationships: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A character definition loaded from `persona/<name>/<name>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub core_identity: CoreIdentity,
    #[serde(default)]
    pub physical_form: Map<String, Value>,
    #[serde(default)]
    pub psychology: Map<String, Value>,
    #[serde(default)]
    pub history: PersonaHistory,
    #[serde(default)]
    pub communication: Map<String, Value>,
    #[serde(default)]
    pub knowledge: Map<String, Value>,
    #[serde(default)]
    pub hobbies_and_passions: Map<String, Value>,
    #[serde(default)]
    pub skills: Map<String, Value>,
    /// Sections this model does not know about, kept for round-tripping
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Persona {
    /// Parses a persona document.
    ///
    /// # Errors
    ///
    /// Returns `ParleyError::Configuration` when the document is malformed or
    /// the core identity has an empty name.
    pub fn from_json_str(source: &str) -> Result<Self> {
        let persona: Persona = serde_json::from_str(source)
            .map_err(|e| ParleyError::config(format!("malformed persona: {e}")))?;
        if persona.core_identity.name.trim().is_empty() {
            return Err(ParleyError::config("persona name must not be empty"));
        }
        Ok(persona)
    }

    pub fn name(&self) -> &str {
        &self.core_identity.name
    }

    /// Renders the persona as the "info about yourself" preamble block.
    pub fn to_prompt_block(&self) -> String {
        let identity = &self.core_identity;
        let mut lines = vec![
            format!("Name: {}", identity.name),
            format!("Birthday: {}", identity.birthday),
            format!("Sex: {}", identity.sex),
            format!("Race: {}", identity.race),
            format!("Lat: {}", identity.lat),
            format!("Lon: {}", identity.lon),
            String::new(),
        ];

        push_section(&mut lines, "Physical Form", &self.physical_form);
        push_section(&mut lines, "Mind", &self.psychology);

        lines.push("Social Connections:".to_string());
        for (category, connections) in &self.history.relationships {
            match connections {
                Value::Object(relations) => {
                    lines.push(format!("  {}:", capitalize(category)));
                    for (relation, names) in relations {
                        lines.push(format!("    {}: {}", capitalize(relation), render_value(names)));
                    }
                }
                other => lines.push(format!("  {}: {}", capitalize(category), render_value(other))),
            }
        }

        push_section(&mut lines, "Communication", &self.communication);
        push_section(&mut lines, "Knowledge", &self.knowledge);
        push_section(&mut lines, "Hobbies & Passions", &self.hobbies_and_passions);
        push_section(&mut lines, "Skills", &self.skills);

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIRA: &str = r#"{
        "core_identity": {
            "name": "Mira",
            "birthday": "1994-03-02",
            "sex": "female",
            "race": "human",
            "lat": 47.6,
            "lon": -122.3
        },
        "physical_form": { "height": "170cm", "hair": "auburn" },
        "psychology": { "traits": ["curious", "warm"] },
        "history": {
            "relationships": {
                "family": { "sister": ["Lena"] },
                "mentor": "Dr. Hale"
            },
            "childhood": "coastal town"
        },
        "hobbies_and_passions": { "outdoor": ["hiking", "kayaking"] },
        "favorite_color": "teal"
    }"#;

    #[test]
    fn parses_known_and_unknown_sections() {
        let persona = Persona::from_json_str(MIRA).unwrap();
        assert_eq!(persona.name(), "Mira");
        assert_eq!(persona.history.extra["childhood"], "coastal town");
        assert_eq!(persona.extra["favorite_color"], "teal");
        assert!(persona.skills.is_empty());
    }

    #[test]
    fn renders_sections_in_order() {
        let block = Persona::from_json_str(MIRA).unwrap().to_prompt_block();
        let expected = "Name: Mira\nBirthday: 1994-03-02\nSex: female\nRace: human\nLat: 47.6\nLon: -122.3\n\n\
Physical Form:\n  Height: 170cm\n  Hair: auburn\n\
Mind:\n  Traits: curious, warm\n\
Social Connections:\n  Family:\n    Sister: Lena\n  Mentor: Dr. Hale\n\
Communication:\nKnowledge:\n\
Hobbies & Passions:\n  Outdoor: hiking, kayaking\n\
Skills:";
        assert_eq!(block, expected);
    }

    #[test]
    fn missing_core_identity_is_configuration_error() {
        let err = Persona::from_json_str(r#"{"physical_form": {}}"#).unwrap_err();
        assert!(err.is_config());
    }
}
