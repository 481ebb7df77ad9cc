//! User profile domain model.
//!
//! Read from `config/config.json`:
//!
//! ```json
//! {
//!   "user_data": { "name": "Ada", "birthday": "1990-12-10", "sex": "female",
//!                  "race": "human", "lat": 51.5, "lon": -0.1, "details": "" },
//!   "features": { "weather_enabled": true }
//! }
//! ```

use crate::error::{ParleyError, Result};
use serde::{Deserialize, Serialize};

/// The human taking part in the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub birthday: String,
    pub sex: String,
    pub race: String,
    pub lat: f64,
    pub lon: f64,
    /// Free-form notes about the user
    #[serde(default)]
    pub details: String,
}

impl UserProfile {
    /// Renders the profile as the "info about the user" preamble block.
    pub fn to_prompt_block(&self) -> String {
        let details = if self.details.trim().is_empty() {
            "N/A"
        } else {
            self.details.as_str()
        };

        format!(
            "Name: {}\nBirthday: {}\nSex: {}\nRace: {}\nLat: {}\nLon: {}\nDetails: {}\n",
            self.name, self.birthday, self.sex, self.race, self.lat, self.lon, details
        )
    }
}

/// Optional features toggled per user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Include current weather and local time in the preamble
    #[serde(default)]
    pub weather_enabled: bool,
}

/// Contents of the user configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    pub user_data: UserProfile,
    #[serde(default)]
    pub features: FeatureFlags,
}

impl UserConfig {
    /// Parses the user configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ParleyError::Configuration` when the document is malformed or
    /// the user name is empty.
    pub fn from_json_str(source: &str) -> Result<Self> {
        let config: UserConfig = serde_json::from_str(source)
            .map_err(|e| ParleyError::config(format!("malformed user config: {e}")))?;
        if config.user_data.name.trim().is_empty() {
            return Err(ParleyError::config("user name must not be empty"));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "user_data": {
            "name": "Ada",
            "birthday": "1990-12-10",
            "sex": "female",
            "race": "human",
            "lat": 51.5,
            "lon": -0.1
        },
        "features": { "weather_enabled": true, "chess_enabled": false }
    }"#;

    #[test]
    fn parses_profile_and_features() {
        let config = UserConfig::from_json_str(CONFIG).unwrap();
        assert_eq!(config.user_data.name, "Ada");
        assert!(config.features.weather_enabled);
    }

    #[test]
    fn renders_missing_details_as_na() {
        let config = UserConfig::from_json_str(CONFIG).unwrap();
        assert_eq!(
            config.user_data.to_prompt_block(),
            "Name: Ada\nBirthday: 1990-12-10\nSex: female\nRace: human\nLat: 51.5\nLon: -0.1\nDetails: N/A\n"
        );
    }

    #[test]
    fn features_default_to_disabled() {
        let source = r#"{"user_data": {"name": "Ada", "birthday": "", "sex": "", "race": "", "lat": 0, "lon": 0}}"#;
        let config = UserConfig::from_json_str(source).unwrap();
        assert!(!config.features.weather_enabled);
    }

    #[test]
    fn missing_user_data_is_configuration_error() {
        assert!(UserConfig::from_json_str("{}").unwrap_err().is_config());
    }
}
