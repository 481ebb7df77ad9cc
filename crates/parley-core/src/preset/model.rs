//! Generation preset domain model.

use serde::{Deserialize, Serialize};

/// Decoding parameters forwarded to the generation backend on every turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodingParameters {
    /// Sampling temperature
    pub temperature: f32,
    /// Top-k sampling cutoff
    pub top_k: u32,
    /// Nucleus sampling cutoff
    pub top_p: f32,
    /// Penalty applied to already generated tokens
    pub repetition_penalty: f32,
    /// Upper bound on generated tokens per reply
    pub max_new_tokens: u32,
    /// Lower bound on generated tokens per reply
    pub min_length: u32,
    /// Exponential length penalty used by beam search
    pub length_penalty: f32,
    /// Number of beams (1 disables beam search)
    pub beam_count: u32,
}

impl Default for DecodingParameters {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 50,
            top_p: 0.9,
            repetition_penalty: 1.0,
            max_new_tokens: 256,
            min_length: 0,
            length_penalty: 1.0,
            beam_count: 1,
        }
    }
}

/// A named bundle of decoding parameters plus the task description.
///
/// Presets are immutable once loaded; sessions hold them behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationPreset {
    /// Key the preset was registered under
    pub name: String,
    /// Decoding parameters for every generation call
    pub parameters: DecodingParameters,
    /// Task description placed in the session preamble
    pub system_message_template: String,
}

impl GenerationPreset {
    pub const DEFAULT_SYSTEM_MESSAGE: &'static str = "You are a helpful assistant.";

    /// Creates a preset with default parameters and task description.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: DecodingParameters::default(),
            system_message_template: Self::DEFAULT_SYSTEM_MESSAGE.to_string(),
        }
    }
}
