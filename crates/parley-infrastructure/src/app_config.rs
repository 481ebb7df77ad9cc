//! Application settings loaded from `config.toml`.
//!
//! ```toml
//! log_level = "info"
//!
//! [session]
//! persona = "mira"
//! preset = "realism"
//!
//! [compaction]
//! interval = 8
//! recent_skip = 4
//! length_threshold = 130
//!
//! [generation]
//! base_url = "http://localhost:8080"
//! model = "local-model"
//! timeout_secs = 120
//!
//! [summarization]
//! base_url = "http://localhost:8081"
//!
//! [weather]
//! api_key = ""
//! ```
//!
//! Every field has a default and a missing file yields the defaults. API keys
//! may also come from the environment.

use parley_core::backend::SummaryBounds;
use parley_core::error::{ParleyError, Result};
use parley_core::session::CompactionConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const GENERATION_API_KEY_ENV: &str = "PARLEY_GENERATION_API_KEY";
pub const SUMMARIZATION_API_KEY_ENV: &str = "PARLEY_SUMMARIZATION_API_KEY";
pub const WEATHER_API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub persona: String,
    pub preset: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            persona: "generic".to_string(),
            preset: "realism".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactionSettings {
    pub interval: usize,
    pub recent_skip: usize,
    pub length_threshold: usize,
    pub summary_min_length: u32,
    pub summary_max_length: u32,
}

impl Default for CompactionSettings {
    fn default() -> Self {
        let defaults = CompactionConfig::default();
        Self {
            interval: defaults.interval,
            recent_skip: defaults.recent_skip,
            length_threshold: defaults.length_threshold,
            summary_min_length: defaults.summary_bounds.min_length,
            summary_max_length: defaults.summary_bounds.max_length,
        }
    }
}

impl CompactionSettings {
    pub fn to_config(&self) -> CompactionConfig {
        CompactionConfig {
            interval: self.interval,
            recent_skip: self.recent_skip,
            length_threshold: self.length_threshold,
            summary_bounds: SummaryBounds {
                min_length: self.summary_min_length,
                max_length: self.summary_max_length,
            },
        }
    }
}

/// Connection settings of an HTTP backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointSettings {
    pub base_url: String,
    /// Model name sent with each request, when the server needs one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl EndpointSettings {
    fn with_url(base_url: &str, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.to_string(),
            model: None,
            api_key: None,
            timeout_secs,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self::with_url("http://localhost:8080", 120)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Root of `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub session: SessionSettings,
    pub compaction: CompactionSettings,
    pub generation: EndpointSettings,
    pub summarization: EndpointSettings,
    pub weather: WeatherSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            session: SessionSettings::default(),
            compaction: CompactionSettings::default(),
            generation: EndpointSettings::default(),
            summarization: EndpointSettings::with_url("http://localhost:8081", 60),
            weather: WeatherSettings::default(),
        }
    }
}

impl AppConfig {
    /// Parses `config.toml` content; an empty document yields the defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        toml::from_str(source).map_err(|e| ParleyError::config(format!("malformed config.toml: {e}")))
    }

    /// Loads settings from `path`, falling back to defaults when it is absent.
    ///
    /// Only parses; callers apply their overrides and then [`validate`](Self::validate).
    pub fn load(path: &Path) -> Result<Self> {
        let config = match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content)
                .map_err(|e| ParleyError::config(format!("{e} ({})", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config.toml found, using defaults");
                Self::default()
            }
            Err(e) => {
                return Err(ParleyError::config(format!(
                    "failed to read {}: {e}",
                    path.display()
                )));
            }
        };
        Ok(config)
    }

    /// Replaces API keys with non-empty values returned by `lookup`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(key) = lookup(GENERATION_API_KEY_ENV) {
            self.generation.api_key = Some(key);
        }
        if let Some(key) = lookup(SUMMARIZATION_API_KEY_ENV) {
            self.summarization.api_key = Some(key);
        }
        if let Some(key) = lookup(WEATHER_API_KEY_ENV) {
            self.weather.api_key = Some(key);
        }
    }

    /// Rejects settings no session could run with.
    pub fn validate(&self) -> Result<()> {
        if self.compaction.interval == 0 {
            return Err(ParleyError::config("compaction.interval must be at least 1"));
        }
        if self.compaction.summary_min_length > self.compaction.summary_max_length {
            return Err(ParleyError::config(
                "compaction.summary_min_length must not exceed summary_max_length",
            ));
        }
        if self.session.persona.trim().is_empty() || self.session.preset.trim().is_empty() {
            return Err(ParleyError::config("session.persona and session.preset must be set"));
        }
        Ok(())
    }
}
