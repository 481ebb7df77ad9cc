//! OpenWeatherMapClient - current weather and local time at a coordinate.

use crate::http::{self, Service};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use parley_core::backend::WeatherProvider;
use parley_core::error::Result;
use reqwest::Client;
use serde::Deserialize;

const BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const NOT_AVAILABLE: &str = "N/A";

#[derive(Clone)]
pub struct OpenWeatherMapClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherMapClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Points the client at another server (for testing).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherMapClient {
    async fn report(&self, lat: f64, lon: f64) -> Result<String> {
        let request = self.client.get(&self.base_url).query(&[
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("appid", self.api_key.clone()),
            ("units", "imperial".to_string()),
        ]);

        let response = http::send(Service::Weather, request).await?;
        let current: CurrentWeather = http::json(Service::Weather, response).await?;
        Ok(render_report(&current, Utc::now()))
    }
}

#[derive(Debug, Default, Deserialize)]
struct CurrentWeather {
    #[serde(default)]
    weather: Vec<Condition>,
    #[serde(default)]
    main: Readings,
    #[serde(default)]
    wind: Wind,
    name: Option<String>,
    #[serde(default)]
    sys: Sys,
    /// Offset from UTC in seconds
    timezone: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
struct Condition {
    main: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Readings {
    temp: Option<f64>,
    feels_like: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct Wind {
    speed: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct Sys {
    country: Option<String>,
}

fn text_or_na(value: Option<&str>) -> String {
    value.map(str::to_lowercase).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn number_or_na(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| v.to_string())
}

/// Local wall-clock time at the reported location.
fn local_time(timezone: Option<i32>, now: DateTime<Utc>) -> String {
    match timezone.and_then(FixedOffset::east_opt) {
        Some(offset) => now.with_timezone(&offset).format("%Y-%m-%d %H:%M:%S").to_string(),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn render_report(current: &CurrentWeather, now: DateTime<Utc>) -> String {
    let condition = current.weather.first();
    format!(
        "Weather: {} - {}\nTemperature: {}°F, Feels like: {}°F\nWind Speed: {} mph\nCity: {}, {}\nCurrent Time: {}",
        text_or_na(condition.and_then(|c| c.main.as_deref())),
        text_or_na(condition.and_then(|c| c.description.as_deref())),
        number_or_na(current.main.temp),
        number_or_na(current.main.feels_like),
        number_or_na(current.wind.speed),
        current.name.as_deref().unwrap_or(NOT_AVAILABLE),
        current.sys.country.as_deref().unwrap_or(NOT_AVAILABLE),
        local_time(current.timezone, now),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-06T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_renders_full_report() {
        let current: CurrentWeather = serde_json::from_value(json!({
            "weather": [{"main": "Clouds", "description": "Broken Clouds"}],
            "main": {"temp": 61.5, "feels_like": 60.1},
            "wind": {"speed": 8.05},
            "name": "Seattle",
            "sys": {"country": "US"},
            "timezone": -25200
        }))
        .unwrap();

        assert_eq!(
            render_report(&current, now()),
            "Weather: clouds - broken clouds\nTemperature: 61.5°F, Feels like: 60.1°F\n\
Wind Speed: 8.05 mph\nCity: Seattle, US\nCurrent Time: 2024-05-06 05:00:00"
        );
    }

    #[test]
    fn test_missing_fields_render_na() {
        let report = render_report(&CurrentWeather::default(), now());
        assert!(report.starts_with("Weather: N/A - N/A\n"));
        assert!(report.ends_with("City: N/A, N/A\nCurrent Time: N/A"));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_weather_error() {
        let client = OpenWeatherMapClient::new("key").with_base_url("http://127.0.0.1:9/weather");
        let err = client.report(47.6, -122.3).await.unwrap_err();
        assert!(matches!(err, parley_core::ParleyError::Weather(_)));
    }
}
