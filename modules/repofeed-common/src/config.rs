use anyhow::{bail, Context, Result};

pub const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const DEFAULT_WEATHER_URL: &str = "https://api.open-meteo.com/v1/forecast";
const DEFAULT_SUBSCRIBER_BUFFER: usize = 64;

/// Application configuration loaded from environment variables.
/// Everything except the listen address is optional; missing backends fall
/// back to in-memory or anonymous behaviour.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Web server
    pub host: String,
    pub port: u16,

    // Database (None = in-memory store)
    pub database_url: Option<String>,

    // Auth
    pub jwt_secret: Option<String>,

    // GitHub
    pub github_token: Option<String>,

    // Enrichment
    pub geocoding_url: String,
    pub weather_url: String,

    // Event bus
    pub subscriber_buffer: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .context("API_PORT must be a number")?,
            database_url: non_empty_var("DATABASE_URL"),
            jwt_secret: non_empty_var("JWT_SECRET"),
            github_token: non_empty_var("GITHUB_TOKEN"),
            geocoding_url: std::env::var("GEOCODING_URL")
                .unwrap_or_else(|_| DEFAULT_GEOCODING_URL.to_string()),
            weather_url: std::env::var("WEATHER_URL")
                .unwrap_or_else(|_| DEFAULT_WEATHER_URL.to_string()),
            subscriber_buffer: match std::env::var("SUBSCRIBER_BUFFER") {
                Ok(raw) => parse_subscriber_buffer(&raw)?,
                Err(_) => DEFAULT_SUBSCRIBER_BUFFER,
            },
        };

        config.log_keys();
        Ok(config)
    }

    fn log_keys(&self) {
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) if !v.is_empty() => format!("<set>({} chars)", v.len()),
                _ => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  API: {}:{}", self.host, self.port);
        tracing::info!("  DATABASE_URL: {}", preview_opt(&self.database_url));
        tracing::info!("  JWT_SECRET: {}", preview_opt(&self.jwt_secret));
        tracing::info!("  GITHUB_TOKEN: {}", preview_opt(&self.github_token));
        tracing::info!("  GEOCODING_URL: {}", self.geocoding_url);
        tracing::info!("  WEATHER_URL: {}", self.weather_url);
        tracing::info!("  SUBSCRIBER_BUFFER: {}", self.subscriber_buffer);
    }
}

fn parse_subscriber_buffer(raw: &str) -> Result<usize> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => bail!("SUBSCRIBER_BUFFER must be a positive integer, got {raw:?}"),
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_count_as_unset() {
        std::env::set_var("REPOFEED_TEST_BLANK", "   ");
        std::env::set_var("REPOFEED_TEST_SET", "secret");
        assert_eq!(non_empty_var("REPOFEED_TEST_BLANK"), None);
        assert_eq!(non_empty_var("REPOFEED_TEST_SET").as_deref(), Some("secret"));
        assert_eq!(non_empty_var("REPOFEED_TEST_MISSING"), None);
    }

    #[test]
    fn subscriber_buffer_must_be_positive() {
        assert_eq!(parse_subscriber_buffer("128").unwrap(), 128);
        assert_eq!(parse_subscriber_buffer(" 1 ").unwrap(), 1);
        assert!(parse_subscriber_buffer("0").is_err());
        assert!(parse_subscriber_buffer("-4").is_err());
        assert!(parse_subscriber_buffer("lots").is_err());
    }
}
