// Test doubles for the external collaborators.
//
// - StaticDirectory (RepositoryDirectory + UserDirectory): fixed set of known repos/users
// - StaticGeocoder (Geocoder): place → Location map, NotFound otherwise
// - StaticWeather (WeatherService): fixed reading, or always failing
//
// No network: everything the orchestrator and API touch can run in `cargo test`.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use github_client::{Owner, Repository, User};

use crate::directory::{RepositoryDirectory, UserDirectory};
use crate::enrichment::{EnrichmentError, Geocoder, Location, Weather, WeatherService};

pub fn repository(full_name: &str) -> Repository {
    let (owner, name) = full_name.split_once('/').unwrap_or((full_name, full_name));
    Repository {
        name: name.to_string(),
        full_name: full_name.to_string(),
        description: Some(format!("{name} description")),
        html_url: format!("https://github.com/{full_name}"),
        stars: 42,
        open_issues: 1,
        owner: Owner {
            login: owner.to_string(),
            avatar_url: format!("https://avatars.example/{owner}"),
            html_url: format!("https://github.com/{owner}"),
        },
    }
}

pub fn user(login: &str, location: Option<&str>) -> User {
    User {
        login: login.to_string(),
        avatar_url: format!("https://avatars.example/{login}"),
        html_url: format!("https://github.com/{login}"),
        location: location.map(str::to_string),
    }
}

/// Known repositories and users. Builder pattern: `.with_repo()`, `.with_user()`.
#[derive(Default)]
pub struct StaticDirectory {
    repos: HashMap<String, Repository>,
    users: HashMap<String, User>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repo(mut self, full_name: &str) -> Self {
        self.repos
            .insert(full_name.to_string(), repository(full_name));
        self
    }

    pub fn with_user(mut self, login: &str, location: Option<&str>) -> Self {
        self.users.insert(login.to_string(), user(login, location));
        self
    }
}

#[async_trait]
impl RepositoryDirectory for StaticDirectory {
    async fn repository(&self, repo_full_name: &str) -> Result<Option<Repository>> {
        Ok(self.repos.get(repo_full_name).cloned())
    }
}

#[async_trait]
impl UserDirectory for StaticDirectory {
    async fn users(&self, logins: &[String]) -> Result<HashMap<String, User>> {
        Ok(logins
            .iter()
            .filter_map(|login| self.users.get(login).map(|u| (login.clone(), u.clone())))
            .collect())
    }
}

#[derive(Default)]
pub struct StaticGeocoder {
    places: HashMap<String, Location>,
}

impl StaticGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_place(mut self, place: &str, latitude: f64, longitude: f64) -> Self {
        self.places.insert(
            place.to_string(),
            Location {
                name: place.to_string(),
                latitude,
                longitude,
                country: None,
            },
        );
        self
    }
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn geocode(&self, place: &str) -> Result<Location, EnrichmentError> {
        self.places
            .get(place)
            .cloned()
            .ok_or_else(|| EnrichmentError::NotFound(place.to_string()))
    }
}

pub enum StaticWeather {
    Reading(Weather),
    Failing,
}

impl StaticWeather {
    pub fn mild() -> Self {
        StaticWeather::Reading(Weather {
            temperature_c: 18.5,
            wind_speed_kmh: 7.0,
            weather_code: 1,
            observed_at: "2026-10-18T12:00".to_string(),
        })
    }
}

#[async_trait]
impl WeatherService for StaticWeather {
    async fn current(&self, _latitude: f64, _longitude: f64) -> Result<Weather, EnrichmentError> {
        match self {
            StaticWeather::Reading(weather) => Ok(weather.clone()),
            StaticWeather::Failing => Err(EnrichmentError::Api {
                status: 503,
                message: "weather service unavailable".to_string(),
            }),
        }
    }
}
