//! Session preamble assembly.
//!
//! The preamble is message 0 of every session. Its sections appear in a fixed
//! order under fixed labels; the weather section is present only when a
//! weather report was obtained.

pub(crate) mod render;

use crate::persona::Persona;
use crate::preset::GenerationPreset;
use crate::scene::Scene;
use crate::user::UserProfile;

const HEADER: &str = "USE THE FOLLOWING INFORMATION FOR REFERENCE AND INSTRUCTION.\n\
NEVER BREAK CHARACTER UNDER ANY CIRCUMSTANCE.\n";
const PERSONA_LABEL: &str = "INFO ABOUT YOURSELF:\n";
const WEATHER_LABEL: &str = "\nTHE WEATHER AND TIME WHERE YOU ARE:\n";
const TASK_LABEL: &str = "\nYOUR TASK:\n";
const USER_LABEL: &str = "\nINFO ABOUT THE USER YOU'RE CONVERSING WITH:\n";
const SCENE_LABEL: &str = "\nTHE SCENE YOU'RE IN:\n";

/// Builds the preamble from the session's configuration sources.
#[derive(Debug, Clone)]
pub struct PromptAssembler<'a> {
    persona: &'a Persona,
    user: &'a UserProfile,
    scene: &'a Scene,
    preset: &'a GenerationPreset,
    weather: Option<String>,
}

impl<'a> PromptAssembler<'a> {
    pub fn new(
        persona: &'a Persona,
        user: &'a UserProfile,
        scene: &'a Scene,
        preset: &'a GenerationPreset,
    ) -> Self {
        Self {
            persona,
            user,
            scene,
            preset,
            weather: None,
        }
    }

    /// Adds the weather section.
    pub fn with_weather(mut self, report: impl Into<String>) -> Self {
        self.weather = Some(report.into());
        self
    }

    pub fn assemble(&self) -> String {
        let scene = self
            .scene
            .with_characters([self.user.name.as_str(), self.persona.name()]);

        let mut preamble = String::from(HEADER);
        preamble.push_str(PERSONA_LABEL);
        preamble.push_str(&self.persona.to_prompt_block());

        if let Some(weather) = &self.weather {
            preamble.push_str(WEATHER_LABEL);
            preamble.push_str(weather);
        }

        preamble.push_str(TASK_LABEL);
        preamble.push_str(&self.preset.system_message_template);
        preamble.push_str(USER_LABEL);
        preamble.push_str(&self.user.to_prompt_block());
        preamble.push_str(SCENE_LABEL);
        preamble.push_str(&scene.to_prompt_block());
        preamble
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::CoreIdentity;
    use serde_json::Map;

    fn persona() -> Persona {
        Persona {
            core_identity: CoreIdentity {
                name: "Mira".to_string(),
                birthday: "1994-03-02".to_string(),
                sex: "female".to_string(),
                race: "human".to_string(),
                lat: 47.6,
                lon: -122.3,
            },
            physical_form: Map::new(),
            psychology: Map::new(),
            history: Default::default(),
            communication: Map::new(),
            knowledge: Map::new(),
            hobbies_and_passions: Map::new(),
            skills: Map::new(),
            extra: Map::new(),
        }
    }

    fn user() -> UserProfile {
        UserProfile {
            name: "Ada".to_string(),
            birthday: "1990-12-10".to_string(),
            sex: "female".to_string(),
            race: "human".to_string(),
            lat: 51.5,
            lon: -0.1,
            details: String::new(),
        }
    }

    fn scene() -> Scene {
        Scene {
            setting: "a quiet cafe".to_string(),
            characters: vec!["someone".to_string()],
            relationship: "old friends".to_string(),
            tone: "relaxed".to_string(),
        }
    }

    fn preset() -> GenerationPreset {
        let mut preset = GenerationPreset::named("realism");
        preset.system_message_template = "Chat naturally.".to_string();
        preset
    }

    fn position(haystack: &str, needle: &str) -> usize {
        haystack.find(needle).unwrap_or_else(|| panic!("missing {needle:?}"))
    }

    #[test]
    fn sections_appear_in_fixed_order() {
        let (persona, user, scene, preset) = (persona(), user(), scene(), preset());
        let preamble = PromptAssembler::new(&persona, &user, &scene, &preset)
            .with_weather("Weather: clear - clear sky")
            .assemble();

        assert!(preamble.starts_with(HEADER));
        let labels = [PERSONA_LABEL, WEATHER_LABEL, TASK_LABEL, USER_LABEL, SCENE_LABEL];
        let positions: Vec<usize> = labels.iter().map(|l| position(&preamble, l)).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(preamble.contains("YOUR TASK:\nChat naturally.\n"));
        assert!(preamble.ends_with("Characters: Ada, Mira\nRelationship: old friends\nTone: relaxed"));
    }

    #[test]
    fn weather_section_is_omitted_without_report() {
        let (persona, user, scene, preset) = (persona(), user(), scene(), preset());
        let preamble = PromptAssembler::new(&persona, &user, &scene, &preset).assemble();

        assert!(!preamble.contains("THE WEATHER AND TIME"));
        assert!(preamble.contains("Skills:\nYOUR TASK:\n"));
    }
}
