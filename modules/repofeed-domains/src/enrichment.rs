//! Best-effort enrichment of user profiles: geocoding a free-text location and
//! fetching current weather for the resulting coordinates.
//!
//! Every call is independent and returns either a value or an
//! [`EnrichmentError`]; the API layer turns failures into field-level errors so
//! sibling fields still resolve.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use repofeed_common::RepoFeedError;

#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("No match for \"{0}\"")]
    NotFound(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for EnrichmentError {
    fn from(err: reqwest::Error) -> Self {
        EnrichmentError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for EnrichmentError {
    fn from(err: serde_json::Error) -> Self {
        EnrichmentError::Parse(err.to_string())
    }
}

impl From<EnrichmentError> for RepoFeedError {
    fn from(err: EnrichmentError) -> Self {
        RepoFeedError::Enrichment(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub temperature_c: f64,
    pub wind_speed_kmh: f64,
    /// WMO weather interpretation code.
    pub weather_code: i32,
    pub observed_at: String,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, place: &str) -> Result<Location, EnrichmentError>;
}

#[async_trait]
pub trait WeatherService: Send + Sync {
    async fn current(&self, latitude: f64, longitude: f64) -> Result<Weather, EnrichmentError>;
}

// --- Open-Meteo ---

#[derive(Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<GeocodingResult>,
}

#[derive(Deserialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
}

#[derive(Deserialize)]
struct ForecastResponse {
    current_weather: CurrentWeather,
}

#[derive(Deserialize)]
struct CurrentWeather {
    temperature: f64,
    windspeed: f64,
    weathercode: i32,
    time: String,
}

/// Open-Meteo geocoding + forecast APIs. No key required.
#[derive(Clone)]
pub struct OpenMeteo {
    client: reqwest::Client,
    geocoding_url: String,
    weather_url: String,
}

impl OpenMeteo {
    pub fn new(geocoding_url: impl Into<String>, weather_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            geocoding_url: geocoding_url.into(),
            weather_url: weather_url.into(),
        }
    }

    async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String, EnrichmentError> {
        let resp = self.client.get(url).query(query).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EnrichmentError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl Geocoder for OpenMeteo {
    async fn geocode(&self, place: &str) -> Result<Location, EnrichmentError> {
        let body = self
            .get_text(
                &self.geocoding_url,
                &[("name", place.to_string()), ("count", "1".to_string())],
            )
            .await?;
        parse_geocoding(place, &body)
    }
}

#[async_trait]
impl WeatherService for OpenMeteo {
    async fn current(&self, latitude: f64, longitude: f64) -> Result<Weather, EnrichmentError> {
        let body = self
            .get_text(
                &self.weather_url,
                &[
                    ("latitude", latitude.to_string()),
                    ("longitude", longitude.to_string()),
                    ("current_weather", "true".to_string()),
                ],
            )
            .await?;
        parse_forecast(&body)
    }
}

fn parse_geocoding(place: &str, body: &str) -> Result<Location, EnrichmentError> {
    let resp: GeocodingResponse = serde_json::from_str(body)?;
    resp.results
        .into_iter()
        .next()
        .map(|r| Location {
            name: r.name,
            latitude: r.latitude,
            longitude: r.longitude,
            country: r.country,
        })
        .ok_or_else(|| EnrichmentError::NotFound(place.to_string()))
}

fn parse_forecast(body: &str) -> Result<Weather, EnrichmentError> {
    let resp: ForecastResponse = serde_json::from_str(body)?;
    Ok(Weather {
        temperature_c: resp.current_weather.temperature,
        wind_speed_kmh: resp.current_weather.windspeed,
        weather_code: resp.current_weather.weathercode,
        observed_at: resp.current_weather.time,
    })
}
